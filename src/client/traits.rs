//! Seams between the flow and the storefront backend
//!
//! The flow only ever talks to these traits, so it can be driven by the HTTP
//! client in production and by recording mocks in tests.

use crate::models::{NewAccount, RemoteError, SessionOutcome};
use async_trait::async_trait;
use secrecy::SecretString;

/// Remote lookup answering "does this email already have an account"
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Check whether an account exists for `email`.
    ///
    /// Idempotent and safe to retry.
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteError`] when the backend cannot be reached, answers
    /// with a non-2xx status, or sends a body without a boolean `exists`.
    async fn check_exists(&self, email: &str) -> Result<bool, RemoteError>;
}

/// Remote login and registration
#[async_trait]
pub trait CredentialService: Send + Sync {
    /// Log in with an email and a secret.
    ///
    /// The secret is either the user's password or, for an identity sign-in
    /// of an existing account, the raw identity token.
    async fn login(&self, email: &str, secret: &SecretString) -> SessionOutcome;

    /// Create an account. A successful response is already a signed-in session.
    async fn register(&self, account: &NewAccount) -> SessionOutcome;
}
