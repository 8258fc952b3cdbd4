/*
 * Responsibility
 * - API token 認証 (X-AUTH-USER / X-AUTH-TOKEN → TokenAuthenticator)
 * - 成功時に AuthCtx を request extensions に載せる
 * - 対象外 (NotApplicable) のリクエストはそのまま通す (session 認証側に委ねる)
 * - 拒否理由は log のみ。client には常に同じ 401 を返す
 */
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::{AuthOutcome, TokenAuthenticator};

/// Put the token authenticator in front of every route of `router`.
///
/// The authenticator decides applicability itself (path prefix + session
/// marker), so this is applied to the whole app rather than a nested router.
pub fn apply(router: Router, authenticator: Arc<TokenAuthenticator>) -> Router {
    router.layer(middleware::from_fn_with_state(authenticator, access_middleware))
}

async fn access_middleware(
    State(authenticator): State<Arc<TokenAuthenticator>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let signature = authenticator.signature(&req);

    match authenticator.authenticate(&signature).await {
        Ok(AuthOutcome::NotApplicable) => Ok(next.run(req).await),
        Ok(AuthOutcome::Authenticated(user)) => {
            tracing::debug!(user_id = %user.id, path = %signature.path, "api token accepted");

            let auth_ctx = AuthCtx::new(user, authenticator.supports_remember_me());
            req.extensions_mut().insert(auth_ctx);

            Ok(next.run(req).await)
        }
        Ok(AuthOutcome::Rejected(reason)) => {
            tracing::warn!(
                reason = reason.as_str(),
                path = %signature.path,
                claimed_user = ?signature.user.as_deref(),
                "api token rejected"
            );
            Err(AppError::Unauthorized)
        }
        Err(err) => {
            tracing::error!(error = %err, path = %signature.path, "api token check failed");
            Err(AppError::Unauthorized)
        }
    }
}
