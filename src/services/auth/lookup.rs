//! Identity store interface consumed by the authenticator.
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Opaque secret hash owned by the identity store.
///
/// The authenticator only passes it to a `SecretVerifier`; `Debug` never
/// prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct StoredSecretHash(String);

impl StoredSecretHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StoredSecretHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StoredSecretHash([redacted])")
    }
}

/// A user as returned by the identity store.
#[derive(Clone, Debug)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    /// `None` when the user never had an API token issued.
    pub api_token_hash: Option<StoredSecretHash>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user store unavailable: {0}")]
    Unavailable(String),
}

/// Resolves an identity claim to a user.
///
/// Matching rules (case sensitivity, uniqueness, disabled accounts) belong to
/// the implementation.
#[async_trait]
pub trait UserLookup: Send + Sync + 'static {
    async fn find_by_identity(&self, claim: &str) -> Result<Option<UserRecord>, StoreError>;
}
