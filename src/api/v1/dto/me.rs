/*
 * Responsibility
 * - /me 系の response DTO
 */
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub username: String,
    pub remember_me: bool,
}

/// Returned once on rotation. The plaintext is not stored anywhere.
#[derive(Serialize)]
pub struct ApiTokenResponse {
    pub api_token: String,
    pub issued_at: DateTime<Utc>,
}
