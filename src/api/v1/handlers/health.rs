/*
 * Responsibility
 * - GET /health (疎通用)
 * - API prefix の外に置くので token 認証の対象外
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}
