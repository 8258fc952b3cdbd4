pub mod api_token;
pub mod authenticator;
pub mod factory;
pub mod hasher;
pub mod lookup;
pub mod outcome;
pub mod settings;
pub mod signature;

pub use api_token::{ApiTokenService, ApiTokenStore, TokenIssueError};
pub use authenticator::TokenAuthenticator;
pub use factory::{AuthServices, build_auth_services};
pub use hasher::{HasherKind, SecretHasher, SecretVerifier};
pub use lookup::{StoreError, StoredSecretHash, UserLookup, UserRecord};
pub use outcome::{AuthOutcome, AuthenticatedUser};
pub use settings::AuthSettings;
