/*
 * Responsibility
 * - users テーブル向け SQLx 操作 (lookup by name, api token update)
 * - PgPool を受け取り、auth service の UserLookup / ApiTokenStore を実装する
 * - DB エラーは RepoError → StoreError に変換して返す
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::repos::error::RepoError;
use crate::services::auth::{ApiTokenStore, StoreError, StoredSecretHash, UserLookup, UserRecord};

/// Expected schema:
/// - users.id (uuid)
/// - users.user_name (text, unique)
/// - users.api_token (text, nullable) // hash only, never the plaintext
/// - users.api_token_updated_at (timestamptz, nullable)
/// - users.enabled (bool)
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub user_name: String,
    pub api_token: Option<String>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        UserRecord {
            id: row.id,
            username: row.user_name,
            api_token_hash: row.api_token.map(StoredSecretHash::new),
        }
    }
}

#[derive(Clone, Debug)]
pub struct UserRepo {
    pool: PgPool,
}

impl UserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Exact, case-sensitive match on user_name. Disabled users are invisible.
    pub async fn find_enabled_by_name(&self, user_name: &str) -> Result<Option<UserRow>, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, user_name, api_token
            FROM users
            WHERE user_name = $1
                AND enabled = true
            "#,
        )
        .bind(user_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn set_api_token(
        &self,
        user_id: Uuid,
        api_token_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<u64, RepoError> {
        let done = sqlx::query(
            r#"
            UPDATE users
            SET api_token = $2,
                api_token_updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(api_token_hash)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        Ok(done.rows_affected())
    }
}

#[async_trait]
impl UserLookup for UserRepo {
    async fn find_by_identity(&self, claim: &str) -> Result<Option<UserRecord>, StoreError> {
        let row = self.find_enabled_by_name(claim).await?;
        Ok(row.map(UserRecord::from))
    }
}

#[async_trait]
impl ApiTokenStore for UserRepo {
    async fn store_api_token(
        &self,
        user_id: Uuid,
        hash: &StoredSecretHash,
        issued_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let n = self.set_api_token(user_id, hash.expose(), issued_at).await?;
        Ok(n > 0)
    }
}
