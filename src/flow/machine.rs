//! The authentication resolution state machine
//!
//! One [`AuthFlow`] backs both the sign-in and sign-up screens. Every identity
//! event, manual submission and reset starts a new *generation*; when an
//! awaited call comes back and the generation has moved on, its result is
//! discarded instead of overwriting the newer state.

use crate::client::AccountDirectory;
use crate::flow::state::FlowState;
use crate::identity;
use crate::models::{
    AuthFlowError, Credentials, NewAccount, PendingRegistration, RegistrationForm, Role,
    SessionOutcome, ValidationError,
};
use crate::session::{SessionDispatcher, SessionStore};
use crate::utils::logging::LoggingHelper;
use log::debug;
use secrecy::{ExposeSecret, SecretString};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct FlowInner {
    generation: u64,
    state: FlowState,
}

impl FlowInner {
    fn transition(&mut self, to: FlowState) {
        LoggingHelper::log_transition(self.generation, &self.state, &to);
        self.state = to;
    }
}

/// Decides between direct login, register-then-login and manual credentials
pub struct AuthFlow {
    directory: Arc<dyn AccountDirectory>,
    dispatcher: SessionDispatcher,
    identity_role: Role,
    inner: Mutex<FlowInner>,
}

impl AuthFlow {
    #[must_use]
    pub fn new(directory: Arc<dyn AccountDirectory>, dispatcher: SessionDispatcher) -> Self {
        Self {
            directory,
            dispatcher,
            identity_role: Role::Buyer,
            inner: Mutex::new(FlowInner::default()),
        }
    }

    /// Role given to accounts created from an identity sign-up
    #[must_use]
    pub fn with_identity_role(mut self, role: Role) -> Self {
        self.identity_role = role;
        self
    }

    #[must_use]
    pub fn state(&self) -> FlowState {
        self.lock().state.clone()
    }

    #[must_use]
    pub fn pending_registration(&self) -> Option<PendingRegistration> {
        self.lock().state.pending_registration().cloned()
    }

    #[must_use]
    pub fn store(&self) -> &Arc<SessionStore> {
        self.dispatcher.store()
    }

    #[must_use]
    pub fn dispatcher(&self) -> &SessionDispatcher {
        &self.dispatcher
    }

    /// Handle a credential from the Google button or one-tap prompt.
    ///
    /// Decodes the token, asks the backend whether the email has an account,
    /// then either logs in with the token or parks a [`PendingRegistration`]
    /// until [`AuthFlow::password_entered`] is called.
    ///
    /// # Errors
    ///
    /// - [`AuthFlowError::Decode`] if the token is malformed; no remote call is made
    /// - [`AuthFlowError::Remote`] if the existence check or login fails
    /// - [`AuthFlowError::Superseded`] if a newer event took over meanwhile
    pub async fn identity_received(&self, raw_token: &str) -> Result<FlowState, AuthFlowError> {
        let assertion = match identity::decode(raw_token) {
            Ok(assertion) => assertion,
            Err(e) => {
                LoggingHelper::log_decode_failed(&e);
                self.begin(FlowState::Idle);
                return Err(e.into());
            }
        };
        LoggingHelper::log_identity_decoded(&assertion);

        let email = assertion.email.clone();
        let generation = self.begin(FlowState::AwaitingExistenceCheck {
            email: email.clone(),
        });

        let exists = match self.directory.check_exists(&email).await {
            Ok(exists) => exists,
            Err(e) => {
                LoggingHelper::log_existence_failed(&email, &e);
                self.advance(
                    generation,
                    "existence check",
                    FlowState::Failed {
                        message: e.user_message(),
                    },
                )?;
                return Err(e.into());
            }
        };
        LoggingHelper::log_existence_result(&email, exists);

        if exists {
            self.advance(
                generation,
                "existence check",
                FlowState::DirectLogin {
                    email: email.clone(),
                },
            )?;
            let outcome = self.dispatcher.login(&email, &assertion.raw_token).await;
            self.settle(generation, "login", outcome)
        } else {
            let state = FlowState::AwaitingPasswordEntry(PendingRegistration::from(&assertion));
            self.advance(generation, "existence check", state.clone())?;
            Ok(state)
        }
    }

    /// Handle the password chosen for a pending identity sign-up.
    ///
    /// Registers the pending account, then logs in with the new password.
    /// The sign-up screen also passes along the PayPal client id from its form.
    /// Without a pending registration, or with an empty password, this is a
    /// no-op that returns the current state.
    ///
    /// # Errors
    ///
    /// - [`AuthFlowError::Remote`] if registration or the follow-up login fails
    /// - [`AuthFlowError::Superseded`] if a newer event took over meanwhile
    pub async fn password_entered(
        &self,
        password: SecretString,
        paypal_client_id: Option<String>,
    ) -> Result<FlowState, AuthFlowError> {
        let (generation, pending) = {
            let mut inner = self.lock();
            let Some(pending) = inner.state.pending_registration().cloned() else {
                debug!("Ignoring password entry, no registration is pending");
                return Ok(inner.state.clone());
            };
            if password.expose_secret().is_empty() {
                debug!("Ignoring empty password for pending registration");
                return Ok(inner.state.clone());
            }
            inner.transition(FlowState::SessionRequested {
                email: pending.email.clone(),
            });
            (inner.generation, pending)
        };

        let account = NewAccount::from_pending(pending, password, self.identity_role)
            .with_paypal_client_id(paypal_client_id);
        if let Err(e) = self.dispatcher.register(&account).await {
            return self.settle(generation, "register", Err(e));
        }

        // The new account belongs to this attempt only
        self.ensure_current(generation, "register")?;
        let outcome = self.dispatcher.login(&account.email, &account.password).await;
        self.settle(generation, "login", outcome)
    }

    /// Dismiss the password prompt, dropping the pending registration
    pub fn cancel_password_entry(&self) -> FlowState {
        let mut inner = self.lock();
        if inner.state.pending_registration().is_some() {
            inner.generation += 1;
            inner.transition(FlowState::Idle);
        }
        inner.state.clone()
    }

    /// Handle the sign-in form. Skips decoding and the existence check.
    ///
    /// # Errors
    ///
    /// - [`AuthFlowError::Remote`] if the login fails
    /// - [`AuthFlowError::Superseded`] if a newer event took over meanwhile
    pub async fn submit_login(&self, credentials: Credentials) -> Result<FlowState, AuthFlowError> {
        let generation = self.begin(FlowState::SessionRequested {
            email: credentials.email.clone(),
        });
        let outcome = self
            .dispatcher
            .login(&credentials.email, &credentials.password)
            .await;
        self.settle(generation, "login", outcome)
    }

    /// Handle the sign-up form. The register response is the session.
    ///
    /// # Errors
    ///
    /// - [`AuthFlowError::Validation`] if the passwords differ; no remote call is made
    ///   and the flow state is left untouched
    /// - [`AuthFlowError::Remote`] if registration fails
    /// - [`AuthFlowError::Superseded`] if a newer event took over meanwhile
    pub async fn submit_registration(
        &self,
        form: RegistrationForm,
    ) -> Result<FlowState, AuthFlowError> {
        if form.password.expose_secret() != form.confirm_password.expose_secret() {
            return Err(ValidationError::PasswordMismatch.into());
        }

        let generation = self.begin(FlowState::SessionRequested {
            email: form.email.clone(),
        });
        let account = NewAccount {
            name: form.name,
            email: form.email,
            password: form.password,
            role: form.role,
            paypal_client_id: form.paypal_client_id,
        };
        let outcome = self.dispatcher.register(&account).await;
        self.settle(generation, "register", outcome)
    }

    /// Return to `Idle`, abandoning whatever is in progress
    pub fn reset(&self) -> FlowState {
        {
            let inner = self.lock();
            if inner.state.is_in_flight() {
                debug!(
                    "Reset abandons in-flight {} of flow #{}",
                    inner.state.name(),
                    inner.generation
                );
            }
        }
        self.begin(FlowState::Idle);
        FlowState::Idle
    }

    /// Start a new generation in state `to`
    fn begin(&self, to: FlowState) -> u64 {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.transition(to);
        inner.generation
    }

    /// Move to `to` unless a newer generation has started
    fn advance(&self, generation: u64, step: &str, to: FlowState) -> Result<(), AuthFlowError> {
        let mut inner = self.lock();
        Self::check_generation(&inner, generation, step)?;
        inner.transition(to);
        Ok(())
    }

    fn ensure_current(&self, generation: u64, step: &str) -> Result<(), AuthFlowError> {
        Self::check_generation(&self.lock(), generation, step)
    }

    fn check_generation(inner: &FlowInner, generation: u64, step: &str) -> Result<(), AuthFlowError> {
        if inner.generation == generation {
            Ok(())
        } else {
            LoggingHelper::log_superseded(step, generation, inner.generation);
            Err(AuthFlowError::Superseded)
        }
    }

    /// Turn a session outcome into `Resolved` or `Failed`
    fn settle(
        &self,
        generation: u64,
        step: &str,
        outcome: SessionOutcome,
    ) -> Result<FlowState, AuthFlowError> {
        match outcome {
            Ok(user) => {
                let state = FlowState::Resolved(user);
                self.advance(generation, step, state.clone())?;
                Ok(state)
            }
            Err(e) => {
                self.advance(
                    generation,
                    step,
                    FlowState::Failed {
                        message: e.user_message(),
                    },
                )?;
                Err(e.into())
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, FlowInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
