use thiserror::Error;
use uuid::Uuid;

use super::hasher::HashError;
use super::lookup::StoreError;

/// Identity attached to a request after a successful token check.
///
/// Carries no secret material.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub username: String,
}

/// Why a request that this authenticator owns was refused.
///
/// The variants are for server-side logs only. Clients always get the same
/// unauthorized response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    MissingCredentials,
    UnknownIdentity,
    BadSecret,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::MissingCredentials => "missing-credentials",
            RejectReason::UnknownIdentity => "unknown-identity",
            RejectReason::BadSecret => "bad-secret",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated(AuthenticatedUser),
    Rejected(RejectReason),
    /// Not ours; another authenticator (e.g. session cookies) should decide.
    NotApplicable,
}

/// Infrastructure faults. Wrong credentials are never an error.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Lookup(#[from] StoreError),
    #[error(transparent)]
    Verifier(#[from] HashError),
}
