/*
 * Responsibility
 * - v1 の URL 構造を定義 (/me, /me/api-token)
 * - 認証は app 全体に掛けた token middleware が担当する
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use crate::api::v1::handlers::me::{get_me, rotate_api_token};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route("/me/api-token", post(rotate_api_token))
}
