//! Request-scoped inputs of the token authenticator.
//!
//! `RequestSignature` is the only view of the HTTP request the authenticator
//! sees. It is built once per request and dropped after the decision.

use axum::http::{HeaderMap, Request};

use super::settings::AuthSettings;

/// A header value as sent by the client.
///
/// `Present("")` and `Absent` are different things: an empty header was sent
/// deliberately and still counts as a credential.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Claim {
    Absent,
    Present(String),
}

impl Claim {
    pub fn as_deref(&self) -> Option<&str> {
        match self {
            Claim::Absent => None,
            Claim::Present(v) => Some(v.as_str()),
        }
    }
}

/// Identity and secret claims extracted from a request, unverified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    pub identity: Claim,
    pub secret: Claim,
}

/// Read-only view of the parts of a request that matter for authentication.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestSignature {
    pub path: String,
    pub session_marker: Claim,
    pub user: Claim,
    pub token: Claim,
}

impl RequestSignature {
    pub fn from_request<B>(req: &Request<B>, settings: &AuthSettings) -> Self {
        Self::from_parts(req.uri().path(), req.headers(), settings)
    }

    pub fn from_parts(path: &str, headers: &HeaderMap, settings: &AuthSettings) -> Self {
        Self {
            path: path.to_string(),
            session_marker: claim(headers, &settings.session_header),
            user: claim(headers, &settings.user_header),
            token: claim(headers, &settings.token_header),
        }
    }
}

fn claim(headers: &HeaderMap, name: &axum::http::HeaderName) -> Claim {
    // First value wins when the header is repeated.
    match headers.get(name) {
        Some(value) => Claim::Present(String::from_utf8_lossy(value.as_bytes()).into_owned()),
        None => Claim::Absent,
    }
}
