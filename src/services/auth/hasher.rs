//! One-way hashing of API tokens.
//!
//! The authenticator only depends on `SecretVerifier`. Token issuance uses
//! `SecretHasher`. Both implementations compare in constant time with respect
//! to the presented value.
use std::str::FromStr;

use argon2::Argon2;
use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

use super::lookup::StoredSecretHash;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("stored hash is malformed: {0}")]
    Malformed(String),
    #[error("hashing failed: {0}")]
    Hashing(String),
    #[error("verifier task failed: {0}")]
    Unavailable(String),
}

pub trait SecretVerifier: Send + Sync + 'static {
    /// `Ok(false)` on mismatch. `Err` only when verification could not run.
    fn verify(&self, stored: &StoredSecretHash, presented: &str) -> Result<bool, HashError>;
}

pub trait SecretHasher: Send + Sync + 'static {
    fn hash(&self, plain: &str) -> Result<StoredSecretHash, HashError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HasherKind {
    Argon2,
    Sha256,
}

impl FromStr for HasherKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "argon2" | "argon2id" => Ok(Self::Argon2),
            "sha256" => Ok(Self::Sha256),
            _ => Err(()),
        }
    }
}

/// Argon2id in PHC string format (`$argon2id$v=19$...`).
#[derive(Clone, Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl SecretHasher for Argon2Hasher {
    fn hash(&self, plain: &str) -> Result<StoredSecretHash, HashError> {
        let mut salt = [0u8; 16];
        getrandom::fill(&mut salt).map_err(|e| HashError::Hashing(e.to_string()))?;
        let salt = SaltString::encode_b64(&salt).map_err(|e| HashError::Hashing(e.to_string()))?;

        let hash = self
            .argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| HashError::Hashing(e.to_string()))?;

        Ok(StoredSecretHash::new(hash.to_string()))
    }
}

impl SecretVerifier for Argon2Hasher {
    fn verify(&self, stored: &StoredSecretHash, presented: &str) -> Result<bool, HashError> {
        let parsed =
            PasswordHash::new(stored.expose()).map_err(|e| HashError::Malformed(e.to_string()))?;

        match self.argon2.verify_password(presented.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(HashError::Malformed(e.to_string())),
        }
    }
}

/// Unsalted SHA-256, stored as lowercase hex.
///
/// Only suitable for high-entropy generated tokens, never for passwords.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha256Hasher;

impl Sha256Hasher {
    fn digest(plain: &str) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(plain.as_bytes());
        hasher.finalize().into()
    }
}

impl SecretHasher for Sha256Hasher {
    fn hash(&self, plain: &str) -> Result<StoredSecretHash, HashError> {
        Ok(StoredSecretHash::new(hex::encode(Self::digest(plain))))
    }
}

impl SecretVerifier for Sha256Hasher {
    fn verify(&self, stored: &StoredSecretHash, presented: &str) -> Result<bool, HashError> {
        let expected =
            hex::decode(stored.expose()).map_err(|e| HashError::Malformed(e.to_string()))?;
        if expected.len() != 32 {
            return Err(HashError::Malformed(format!(
                "expected 32 byte digest, got {}",
                expected.len()
            )));
        }

        let actual = Self::digest(presented);
        Ok(actual.as_slice().ct_eq(expected.as_slice()).into())
    }
}
