//! Auth handlers and supporting modules.
//!
//! The identity state machine lives here: registration creates unverified
//! identities, verification consumes single-use codes, login enforces the
//! verified-gate after the password check, and social sign-in reuses, links,
//! or creates identities from provider assertions.
//!
//! Every read-then-write step goes through `storage`, which keeps the
//! sequences atomic against concurrent requests. Collaborators (pool,
//! mailer, provider exchange) are injected through axum extensions.

mod error;
pub(crate) mod login;
pub(crate) mod me;
mod password;
pub(crate) mod register;
pub(crate) mod social;
mod state;
mod storage;
mod token;
pub(crate) mod types;
mod utils;
pub(crate) mod verification;

pub use error::AuthError;
pub use social::{GoogleConfig, Provider, ProviderAssertion, ProviderExchange};
pub use state::{AuthConfig, AuthState};
