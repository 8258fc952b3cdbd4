/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - token middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 */

use uuid::Uuid;

use crate::services::auth::AuthenticatedUser;

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `remember_me` は token 認証では常に false。下流の session 層はこれを見て
///   remember-me cookie を発行してはならない
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub user_id: Uuid,
    pub username: String,
    pub remember_me: bool,
}

impl AuthCtx {
    pub fn new(user: AuthenticatedUser, remember_me: bool) -> Self {
        Self {
            user_id: user.id,
            username: user.username,
            remember_me,
        }
    }
}
