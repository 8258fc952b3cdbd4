/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - authenticator: TokenAuthenticator, api_tokens: ApiTokenService
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::services::auth::{ApiTokenService, AuthServices, TokenAuthenticator};

#[derive(Clone, Debug)]
pub struct AppState {
    pub authenticator: Arc<TokenAuthenticator>,
    pub api_tokens: Arc<ApiTokenService>,
}

impl AppState {
    pub fn new(auth: AuthServices) -> Self {
        Self {
            authenticator: auth.authenticator,
            api_tokens: auth.api_tokens,
        }
    }
}
