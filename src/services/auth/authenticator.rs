//! API token authenticator.
//!
//! Decides per request whether the token path applies, pulls the claimed
//! user and token out of the headers, and checks the token against the hash
//! held by the identity store. Holds no per-request state.
use std::sync::Arc;

use axum::http::Request;

use super::hasher::{HashError, SecretVerifier};
use super::lookup::{StoredSecretHash, UserLookup};
use super::outcome::{AuthError, AuthOutcome, AuthenticatedUser, RejectReason};
use super::settings::AuthSettings;
use super::signature::{Claim, Credentials, RequestSignature};

#[derive(Clone)]
pub struct TokenAuthenticator {
    settings: AuthSettings,
    users: Arc<dyn UserLookup>,
    verifier: Arc<dyn SecretVerifier>,
    /// Hash of a throwaway token, verified when there is no real hash to
    /// check so every rejection after a lookup costs one verification.
    decoy: StoredSecretHash,
}

impl std::fmt::Debug for TokenAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthenticator")
            .field("settings", &self.settings)
            .finish()
    }
}

impl TokenAuthenticator {
    pub fn new(
        settings: AuthSettings,
        users: Arc<dyn UserLookup>,
        verifier: Arc<dyn SecretVerifier>,
        decoy: StoredSecretHash,
    ) -> Self {
        Self {
            settings,
            users,
            verifier,
            decoy,
        }
    }

    /// Capture the request fields this authenticator looks at.
    pub fn signature<B>(&self, req: &Request<B>) -> RequestSignature {
        RequestSignature::from_request(req, &self.settings)
    }

    /// Whether this request belongs to the token path.
    ///
    /// The path must start with the API prefix, and the session marker must
    /// not ask for session auth. AJAX calls from the web UI hit the same
    /// endpoints and set the marker.
    pub fn supports(&self, req: &RequestSignature) -> bool {
        if !req.path.starts_with(&self.settings.path_prefix) {
            return false;
        }

        !is_truthy(&req.session_marker)
    }

    /// Raw claims, independent of `supports`. No validation.
    pub fn extract_credentials(&self, req: &RequestSignature) -> Credentials {
        Credentials {
            identity: req.user.clone(),
            secret: req.token.clone(),
        }
    }

    pub async fn authenticate(&self, req: &RequestSignature) -> Result<AuthOutcome, AuthError> {
        if !self.supports(req) {
            return Ok(AuthOutcome::NotApplicable);
        }

        let credentials = self.extract_credentials(req);
        let (Claim::Present(identity), Claim::Present(secret)) =
            (credentials.identity, credentials.secret)
        else {
            return Ok(AuthOutcome::Rejected(RejectReason::MissingCredentials));
        };

        let Some(user) = self.users.find_by_identity(&identity).await? else {
            self.burn_verification(secret).await;
            return Ok(AuthOutcome::Rejected(RejectReason::UnknownIdentity));
        };

        // A user without an issued token can never match.
        let Some(hash) = user.api_token_hash else {
            self.burn_verification(secret).await;
            return Ok(AuthOutcome::Rejected(RejectReason::BadSecret));
        };

        if !self.verify(hash, secret).await? {
            return Ok(AuthOutcome::Rejected(RejectReason::BadSecret));
        }

        Ok(AuthOutcome::Authenticated(AuthenticatedUser {
            id: user.id,
            username: user.username,
        }))
    }

    async fn verify(&self, hash: StoredSecretHash, secret: String) -> Result<bool, HashError> {
        // Hash verification is CPU bound; keep it off the async workers.
        let verifier = Arc::clone(&self.verifier);
        tokio::task::spawn_blocking(move || verifier.verify(&hash, &secret))
            .await
            .map_err(|e| HashError::Unavailable(e.to_string()))?
    }

    /// Verify against the decoy and discard the result.
    async fn burn_verification(&self, secret: String) {
        let _ = self.verify(self.decoy.clone(), secret).await;
    }

    /// Token auth is per request and stateless, so never remember-me.
    pub fn supports_remember_me(&self) -> bool {
        false
    }
}

fn is_truthy(claim: &Claim) -> bool {
    match claim {
        Claim::Absent => false,
        Claim::Present(v) => {
            let v = v.trim().to_ascii_lowercase();
            !matches!(v.as_str(), "" | "0" | "false" | "no" | "off")
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::http::{HeaderMap, HeaderName, HeaderValue};

    use super::*;
    use crate::services::auth::hasher::{Argon2Hasher, SecretHasher, Sha256Hasher};
    use crate::services::auth::lookup::StoredSecretHash;
    use crate::services::auth::lookup::testing::MemoryUsers;

    #[derive(Default)]
    struct CountingVerifier {
        calls: AtomicUsize,
    }

    impl SecretVerifier for CountingVerifier {
        fn verify(&self, stored: &StoredSecretHash, presented: &str) -> Result<bool, HashError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Sha256Hasher.verify(stored, presented)
        }
    }

    struct BrokenVerifier;

    impl SecretVerifier for BrokenVerifier {
        fn verify(&self, _: &StoredSecretHash, _: &str) -> Result<bool, HashError> {
            Err(HashError::Unavailable("hsm offline".into()))
        }
    }

    fn sha256(plain: &str) -> String {
        Sha256Hasher.hash(plain).unwrap().expose().to_string()
    }

    fn decoy() -> StoredSecretHash {
        Sha256Hasher.hash("decoy").unwrap()
    }

    fn authenticator(users: MemoryUsers) -> TokenAuthenticator {
        TokenAuthenticator::new(
            AuthSettings::default(),
            Arc::new(users),
            Arc::new(Sha256Hasher),
            decoy(),
        )
    }

    fn sig(path: &str, headers: &[(&str, &str)]) -> RequestSignature {
        let mut map = HeaderMap::new();
        for (k, v) in headers {
            map.append(
                HeaderName::from_bytes(k.as_bytes()).unwrap(),
                HeaderValue::from_str(v).unwrap(),
            );
        }
        RequestSignature::from_parts(path, &map, &AuthSettings::default())
    }

    #[test]
    fn supports_requires_path_prefix_at_start() {
        let sut = authenticator(MemoryUsers::new());

        assert!(!sut.supports(&sig("dfghj/api/doc/dfghj", &[])));
        assert!(!sut.supports(&sig("/web/api/foo", &[])));
        assert!(!sut.supports(&sig("/apifoo", &[])));
        assert!(!sut.supports(&sig("/", &[])));
        assert!(sut.supports(&sig("/api/fooo", &[])));
    }

    #[test]
    fn session_marker_defers_to_session_auth() {
        let sut = authenticator(MemoryUsers::new());

        assert!(!sut.supports(&sig("/api/fooo", &[("X-AUTH-SESSION", "true")])));
        assert!(!sut.supports(&sig("/api/fooo", &[("X-AUTH-SESSION", "1")])));
        assert!(!sut.supports(&sig("/api/fooo", &[("x-auth-session", "yes")])));
    }

    #[test]
    fn falsy_session_marker_keeps_token_path() {
        let sut = authenticator(MemoryUsers::new());

        for value in ["", "0", "false", "FALSE", "no", "off", " 0 "] {
            assert!(
                sut.supports(&sig("/api/fooo", &[("X-AUTH-SESSION", value)])),
                "marker value {value:?}"
            );
        }
    }

    #[test]
    fn session_marker_outside_prefix_is_still_not_applicable() {
        let sut = authenticator(MemoryUsers::new());

        assert!(!sut.supports(&sig("/login", &[("X-AUTH-SESSION", "0")])));
    }

    #[test]
    fn extract_credentials_is_independent_of_supports() {
        let sut = authenticator(MemoryUsers::new());

        let req = sig("/api/fooo", &[("X-AUTH-SESSION", "true")]);
        assert!(!sut.supports(&req));
        assert_eq!(
            sut.extract_credentials(&req),
            Credentials {
                identity: Claim::Absent,
                secret: Claim::Absent,
            }
        );

        let req = sig("/api/fooo", &[("X-AUTH-USER", "foo")]);
        assert_eq!(
            sut.extract_credentials(&req),
            Credentials {
                identity: Claim::Present("foo".into()),
                secret: Claim::Absent,
            }
        );

        let req = sig("/other", &[("X-AUTH-USER", "foo"), ("X-AUTH-TOKEN", "bar")]);
        assert_eq!(
            sut.extract_credentials(&req),
            Credentials {
                identity: Claim::Present("foo".into()),
                secret: Claim::Present("bar".into()),
            }
        );
    }

    #[test]
    fn remember_me_is_never_supported() {
        let sut = authenticator(MemoryUsers::new().with_user("foo", Some(sha256("bar"))));

        assert!(!sut.supports_remember_me());
    }

    #[tokio::test]
    async fn missing_headers_reject_without_lookup() {
        let users = Arc::new(MemoryUsers::new().with_user("foo", Some(sha256("bar"))));
        let verifier = Arc::new(CountingVerifier::default());
        let sut = TokenAuthenticator::new(
            AuthSettings::default(),
            users.clone(),
            verifier.clone(),
            decoy(),
        );

        let req = sig("/api/foo", &[]);
        assert!(sut.supports(&req));
        assert_eq!(
            sut.authenticate(&req).await.unwrap(),
            AuthOutcome::Rejected(RejectReason::MissingCredentials)
        );

        let req = sig("/api/foo", &[("X-AUTH-USER", "foo")]);
        assert_eq!(
            sut.authenticate(&req).await.unwrap(),
            AuthOutcome::Rejected(RejectReason::MissingCredentials)
        );

        let req = sig("/api/foo", &[("X-AUTH-TOKEN", "bar")]);
        assert_eq!(
            sut.authenticate(&req).await.unwrap(),
            AuthOutcome::Rejected(RejectReason::MissingCredentials)
        );

        assert_eq!(users.calls(), 0);
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_headers_are_credentials_not_missing() {
        let sut = authenticator(MemoryUsers::new().with_user("foo", Some(sha256("bar"))));

        let req = sig("/api/foo", &[("X-AUTH-USER", ""), ("X-AUTH-TOKEN", "")]);
        assert_eq!(
            sut.authenticate(&req).await.unwrap(),
            AuthOutcome::Rejected(RejectReason::UnknownIdentity)
        );

        let req = sig("/api/foo", &[("X-AUTH-USER", "foo"), ("X-AUTH-TOKEN", "")]);
        assert_eq!(
            sut.authenticate(&req).await.unwrap(),
            AuthOutcome::Rejected(RejectReason::BadSecret)
        );
    }

    #[tokio::test]
    async fn session_marker_is_not_applicable_regardless_of_credentials() {
        let users = Arc::new(MemoryUsers::new().with_user("foo", Some(sha256("bar"))));
        let sut = TokenAuthenticator::new(
            AuthSettings::default(),
            users.clone(),
            Arc::new(Sha256Hasher),
            decoy(),
        );

        let req = sig(
            "/api/foo",
            &[
                ("X-AUTH-SESSION", "true"),
                ("X-AUTH-USER", "foo"),
                ("X-AUTH-TOKEN", "bar"),
            ],
        );
        assert_eq!(sut.authenticate(&req).await.unwrap(), AuthOutcome::NotApplicable);
        assert_eq!(users.calls(), 0);
    }

    #[tokio::test]
    async fn unknown_user_is_rejected() {
        let sut = authenticator(MemoryUsers::new());

        let req = sig("/api/foo", &[("X-AUTH-USER", "foo"), ("X-AUTH-TOKEN", "bar")]);
        assert_eq!(
            sut.authenticate(&req).await.unwrap(),
            AuthOutcome::Rejected(RejectReason::UnknownIdentity)
        );
    }

    #[tokio::test]
    async fn wrong_token_is_rejected() {
        let sut = authenticator(MemoryUsers::new().with_user("foo", Some(sha256("other"))));

        let req = sig("/api/foo", &[("X-AUTH-USER", "foo"), ("X-AUTH-TOKEN", "bar")]);
        assert_eq!(
            sut.authenticate(&req).await.unwrap(),
            AuthOutcome::Rejected(RejectReason::BadSecret)
        );
    }

    #[tokio::test]
    async fn user_without_token_still_pays_for_one_verification() {
        let verifier = Arc::new(CountingVerifier::default());
        let sut = TokenAuthenticator::new(
            AuthSettings::default(),
            Arc::new(MemoryUsers::new().with_user("foo", None)),
            verifier.clone(),
            decoy(),
        );

        let req = sig("/api/foo", &[("X-AUTH-USER", "foo"), ("X-AUTH-TOKEN", "bar")]);
        assert_eq!(
            sut.authenticate(&req).await.unwrap(),
            AuthOutcome::Rejected(RejectReason::BadSecret)
        );
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_user_still_pays_for_one_verification() {
        let verifier = Arc::new(CountingVerifier::default());
        let sut = TokenAuthenticator::new(
            AuthSettings::default(),
            Arc::new(MemoryUsers::new().with_user("foo", Some(sha256("bar")))),
            verifier.clone(),
            decoy(),
        );

        let req = sig("/api/foo", &[("X-AUTH-USER", "ghost"), ("X-AUTH-TOKEN", "bar")]);
        assert_eq!(
            sut.authenticate(&req).await.unwrap(),
            AuthOutcome::Rejected(RejectReason::UnknownIdentity)
        );
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);

        let req = sig("/api/foo", &[("X-AUTH-USER", "foo"), ("X-AUTH-TOKEN", "nope")]);
        assert_eq!(
            sut.authenticate(&req).await.unwrap(),
            AuthOutcome::Rejected(RejectReason::BadSecret)
        );
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn decoy_matching_the_secret_never_authenticates() {
        let sut = authenticator(MemoryUsers::new().with_user("tokenless", None));

        let req = sig("/api/foo", &[("X-AUTH-USER", "ghost"), ("X-AUTH-TOKEN", "decoy")]);
        assert_eq!(
            sut.authenticate(&req).await.unwrap(),
            AuthOutcome::Rejected(RejectReason::UnknownIdentity)
        );

        let req = sig("/api/foo", &[("X-AUTH-USER", "tokenless"), ("X-AUTH-TOKEN", "decoy")]);
        assert_eq!(
            sut.authenticate(&req).await.unwrap(),
            AuthOutcome::Rejected(RejectReason::BadSecret)
        );
    }

    #[tokio::test]
    async fn unknown_user_with_broken_verifier_is_still_a_rejection() {
        let sut = TokenAuthenticator::new(
            AuthSettings::default(),
            Arc::new(MemoryUsers::new()),
            Arc::new(BrokenVerifier),
            decoy(),
        );

        let req = sig("/api/foo", &[("X-AUTH-USER", "ghost"), ("X-AUTH-TOKEN", "bar")]);
        assert_eq!(
            sut.authenticate(&req).await.unwrap(),
            AuthOutcome::Rejected(RejectReason::UnknownIdentity)
        );
    }

    #[tokio::test]
    async fn matching_token_authenticates() {
        let users = MemoryUsers::new().with_user("foo", Some(sha256("bar")));
        let sut = authenticator(users);

        let req = sig("/api/foo", &[("X-AUTH-USER", "foo"), ("X-AUTH-TOKEN", "bar")]);
        let AuthOutcome::Authenticated(user) = sut.authenticate(&req).await.unwrap() else {
            panic!("expected authenticated outcome");
        };
        assert_eq!(user.username, "foo");
    }

    #[tokio::test]
    async fn identity_claim_is_passed_verbatim() {
        let sut = authenticator(MemoryUsers::new().with_user("foo", Some(sha256("bar"))));

        let req = sig("/api/foo", &[("X-AUTH-USER", "FOO"), ("X-AUTH-TOKEN", "bar")]);
        assert_eq!(
            sut.authenticate(&req).await.unwrap(),
            AuthOutcome::Rejected(RejectReason::UnknownIdentity)
        );

        let req = sig("/api/foo", &[("X-AUTH-USER", "foo"), ("X-AUTH-TOKEN", "bar ")]);
        assert_eq!(
            sut.authenticate(&req).await.unwrap(),
            AuthOutcome::Rejected(RejectReason::BadSecret)
        );
    }

    #[tokio::test]
    async fn argon2_tokens_authenticate() {
        let hasher = Argon2Hasher::default();
        let stored = hasher.hash("bar").unwrap();
        let sut = TokenAuthenticator::new(
            AuthSettings::default(),
            Arc::new(MemoryUsers::new().with_user("foo", Some(stored.expose().to_string()))),
            Arc::new(hasher.clone()),
            hasher.hash("decoy").unwrap(),
        );

        let ok = sig("/api/foo", &[("X-AUTH-USER", "foo"), ("X-AUTH-TOKEN", "bar")]);
        assert!(matches!(
            sut.authenticate(&ok).await.unwrap(),
            AuthOutcome::Authenticated(_)
        ));

        let bad = sig("/api/foo", &[("X-AUTH-USER", "foo"), ("X-AUTH-TOKEN", "baz")]);
        assert_eq!(
            sut.authenticate(&bad).await.unwrap(),
            AuthOutcome::Rejected(RejectReason::BadSecret)
        );
    }

    #[tokio::test]
    async fn authenticate_is_idempotent() {
        let sut = authenticator(MemoryUsers::new().with_user("foo", Some(sha256("bar"))));

        for headers in [
            vec![],
            vec![("X-AUTH-USER", "foo"), ("X-AUTH-TOKEN", "bar")],
            vec![("X-AUTH-USER", "foo"), ("X-AUTH-TOKEN", "nope")],
            vec![("X-AUTH-USER", "ghost"), ("X-AUTH-TOKEN", "bar")],
        ] {
            let req = sig("/api/foo", &headers);
            let first = sut.authenticate(&req).await.unwrap();
            let second = sut.authenticate(&req).await.unwrap();
            assert_eq!(first, second);
        }
    }

    #[tokio::test]
    async fn store_fault_propagates_as_error() {
        let sut = authenticator(MemoryUsers::failing());

        let req = sig("/api/foo", &[("X-AUTH-USER", "foo"), ("X-AUTH-TOKEN", "bar")]);
        let err = sut.authenticate(&req).await.unwrap_err();
        assert!(matches!(err, AuthError::Lookup(_)));
    }

    #[tokio::test]
    async fn verifier_fault_propagates_as_error() {
        let sut = TokenAuthenticator::new(
            AuthSettings::default(),
            Arc::new(MemoryUsers::new().with_user("foo", Some(sha256("bar")))),
            Arc::new(BrokenVerifier),
            decoy(),
        );

        let req = sig("/api/foo", &[("X-AUTH-USER", "foo"), ("X-AUTH-TOKEN", "bar")]);
        let err = sut.authenticate(&req).await.unwrap_err();
        assert!(matches!(err, AuthError::Verifier(_)));
    }

    #[tokio::test]
    async fn custom_prefix_and_headers_are_honoured() {
        let settings = AuthSettings {
            path_prefix: "/rest/".into(),
            session_header: HeaderName::from_static("x-web-session"),
            user_header: HeaderName::from_static("x-api-user"),
            token_header: HeaderName::from_static("x-api-key"),
        };
        let sut = TokenAuthenticator::new(
            settings.clone(),
            Arc::new(MemoryUsers::new().with_user("foo", Some(sha256("bar")))),
            Arc::new(Sha256Hasher),
            decoy(),
        );

        let req = Request::builder()
            .uri("/rest/items")
            .header("X-Api-User", "foo")
            .header("X-Api-Key", "bar")
            .body(())
            .unwrap();
        let signature = sut.signature(&req);
        assert!(matches!(
            sut.authenticate(&signature).await.unwrap(),
            AuthOutcome::Authenticated(_)
        ));

        let req = Request::builder().uri("/api/items").body(()).unwrap();
        assert!(!sut.supports(&sut.signature(&req)));
    }
}
