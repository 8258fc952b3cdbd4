/*
 * Responsibility
 * - GET /me: token で認証された主体を返す
 * - POST /me/api-token: 自分の API token を再発行 (平文はこの response でのみ返す)
 */
use axum::{Json, extract::State, http::StatusCode};

use crate::{
    api::v1::{
        dto::me::{ApiTokenResponse, MeResponse},
        extractors::AuthCtxExtractor,
    },
    error::AppError,
    state::AppState,
};

pub async fn get_me(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<MeResponse> {
    Json(MeResponse {
        id: ctx.user_id,
        username: ctx.username,
        remember_me: ctx.remember_me,
    })
}

pub async fn rotate_api_token(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
) -> Result<(StatusCode, Json<ApiTokenResponse>), AppError> {
    let issued = state.api_tokens.rotate(ctx.user_id).await?;

    tracing::info!(user_id = %ctx.user_id, "api token rotated");

    Ok((
        StatusCode::CREATED,
        Json(ApiTokenResponse {
            api_token: issued.token,
            issued_at: issued.issued_at,
        }),
    ))
}
