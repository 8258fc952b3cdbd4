//! API token issuance.
//!
//! Tokens are shown to the user once and only their hash is stored.
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

use super::hasher::{HashError, SecretHasher};
use super::lookup::{StoreError, StoredSecretHash};

#[derive(Debug, Error)]
pub enum TokenIssueError {
    #[error("user not found")]
    UnknownUser,
    #[error("random source failed: {0}")]
    Random(String),
    #[error(transparent)]
    Hash(#[from] HashError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Write side of the user store used for token rotation.
#[async_trait]
pub trait ApiTokenStore: Send + Sync + 'static {
    /// Returns `false` when no user with `user_id` exists.
    async fn store_api_token(
        &self,
        user_id: Uuid,
        hash: &StoredSecretHash,
        issued_at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
}

/// A freshly generated token. `token` is the only copy of the plaintext.
#[derive(Clone)]
pub struct IssuedApiToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
}

impl std::fmt::Debug for IssuedApiToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedApiToken")
            .field("token", &"[redacted]")
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// 32 bytes of entropy as URL-safe base64 without padding (43 chars).
pub fn generate_api_token() -> Result<String, TokenIssueError> {
    let mut bytes = [0u8; 32];
    getrandom::fill(&mut bytes).map_err(|e| TokenIssueError::Random(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

#[derive(Clone)]
pub struct ApiTokenService {
    store: Arc<dyn ApiTokenStore>,
    hasher: Arc<dyn SecretHasher>,
}

impl std::fmt::Debug for ApiTokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiTokenService").finish_non_exhaustive()
    }
}

impl ApiTokenService {
    pub fn new(store: Arc<dyn ApiTokenStore>, hasher: Arc<dyn SecretHasher>) -> Self {
        Self { store, hasher }
    }

    /// Replace the user's API token with a new random one.
    ///
    /// The previous token stops working as soon as the hash is stored.
    pub async fn rotate(&self, user_id: Uuid) -> Result<IssuedApiToken, TokenIssueError> {
        let token = generate_api_token()?;

        let hasher = Arc::clone(&self.hasher);
        let plain = token.clone();
        let hash = tokio::task::spawn_blocking(move || hasher.hash(&plain))
            .await
            .map_err(|e| HashError::Unavailable(e.to_string()))
            .and_then(|hashed| hashed)
            .map_err(|e| {
                error!(user_id = %user_id, error = %e, "Failed to hash api token");
                e
            })?;

        let issued_at = Utc::now();
        let updated = self
            .store
            .store_api_token(user_id, &hash, issued_at)
            .await
            .map_err(|e| {
                error!(user_id = %user_id, error = %e, "Failed to store api token");
                e
            })?;

        if !updated {
            return Err(TokenIssueError::UnknownUser);
        }

        debug!(user_id = %user_id, issued_at = %issued_at, "Issued api token");

        Ok(IssuedApiToken { token, issued_at })
    }
}
