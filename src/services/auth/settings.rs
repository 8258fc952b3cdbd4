use axum::http::HeaderName;

/// Request matching rules for the API token authenticator.
///
/// Header names are stored as `HeaderName`, so lookups are case-insensitive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthSettings {
    /// Exact prefix the request path must start with (e.g. `/api/`).
    pub path_prefix: String,
    /// Presence of a truthy value defers the request to session auth.
    pub session_header: HeaderName,
    pub user_header: HeaderName,
    pub token_header: HeaderName,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            path_prefix: "/api/".to_string(),
            session_header: HeaderName::from_static("x-auth-session"),
            user_header: HeaderName::from_static("x-auth-user"),
            token_header: HeaderName::from_static("x-auth-token"),
        }
    }
}
