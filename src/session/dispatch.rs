//! Session Dispatch: the only writer of the session store

use crate::client::CredentialService;
use crate::models::{NewAccount, SessionOutcome};
use crate::session::store::SessionStore;
use crate::utils::logging::LoggingHelper;
use secrecy::SecretString;
use std::sync::Arc;

/// Issues login and register calls and publishes their outcomes
#[derive(Clone)]
pub struct SessionDispatcher {
    service: Arc<dyn CredentialService>,
    store: Arc<SessionStore>,
}

impl SessionDispatcher {
    #[must_use]
    pub fn new(service: Arc<dyn CredentialService>, store: Arc<SessionStore>) -> Self {
        Self { service, store }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Log in and publish the outcome. Failures are not retried.
    pub async fn login(&self, email: &str, secret: &SecretString) -> SessionOutcome {
        LoggingHelper::log_session_request("login", email);
        self.store.begin_request();
        let outcome = self.service.login(email, secret).await;
        self.finish("login", email, &outcome);
        outcome
    }

    /// Register and publish the outcome. Failures are not retried.
    pub async fn register(&self, account: &NewAccount) -> SessionOutcome {
        LoggingHelper::log_session_request("register", &account.email);
        self.store.begin_request();
        let outcome = self.service.register(account).await;
        self.finish("register", &account.email, &outcome);
        outcome
    }

    /// Forget the signed-in user
    pub fn sign_out(&self) {
        if let Some(user) = self.store.current_user() {
            log::info!("Signing out {}", user.email);
        }
        self.store.clear();
    }

    fn finish(&self, operation: &str, email: &str, outcome: &SessionOutcome) {
        match outcome {
            Ok(user) => LoggingHelper::log_session_resolved(operation, &user.email, user.role),
            Err(e) => LoggingHelper::log_session_failed(operation, email, e),
        }
        self.store.publish(outcome);
    }
}
