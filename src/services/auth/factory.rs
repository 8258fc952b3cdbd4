/// Factory: build the authenticator and token service from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::api_token::generate_api_token;
use crate::services::auth::hasher::{Argon2Hasher, Sha256Hasher};
use crate::services::auth::{
    ApiTokenService, ApiTokenStore, HasherKind, SecretHasher, SecretVerifier, TokenAuthenticator,
    TokenIssueError, UserLookup,
};

#[derive(Clone, Debug)]
pub struct AuthServices {
    pub authenticator: Arc<TokenAuthenticator>,
    pub api_tokens: Arc<ApiTokenService>,
}

/// `users` is both the lookup side used per request and the write side used
/// for token rotation.
pub fn build_auth_services<S>(
    config: &Config,
    users: Arc<S>,
) -> Result<AuthServices, TokenIssueError>
where
    S: UserLookup + ApiTokenStore,
{
    let (verifier, hasher) = build_hasher(config.api_token_hasher);

    // Same algorithm and cost as real tokens, so a decoy check takes as long.
    let decoy = hasher.hash(&generate_api_token()?)?;

    let authenticator =
        TokenAuthenticator::new(config.auth.clone(), users.clone(), verifier, decoy);
    let api_tokens = ApiTokenService::new(users, hasher);

    Ok(AuthServices {
        authenticator: Arc::new(authenticator),
        api_tokens: Arc::new(api_tokens),
    })
}

fn build_hasher(kind: HasherKind) -> (Arc<dyn SecretVerifier>, Arc<dyn SecretHasher>) {
    match kind {
        HasherKind::Argon2 => {
            let hasher = Arc::new(Argon2Hasher::default());
            let verifier: Arc<dyn SecretVerifier> = hasher.clone();
            let hasher: Arc<dyn SecretHasher> = hasher;
            (verifier, hasher)
        }
        HasherKind::Sha256 => {
            let hasher = Arc::new(Sha256Hasher);
            let verifier: Arc<dyn SecretVerifier> = hasher.clone();
            let hasher: Arc<dyn SecretHasher> = hasher;
            (verifier, hasher)
        }
    }
}
