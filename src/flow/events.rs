//! Explicit event sources feeding the flow
//!
//! The Google widget's callbacks and the screens' form submissions are turned
//! into [`FlowEvent`]s and pulled from an [`IdentityEventSource`], so the flow
//! can be driven by a channel in production and by a script in tests.

use crate::flow::machine::AuthFlow;
use crate::flow::state::FlowState;
use crate::models::{AuthFlowError, Credentials, RegistrationForm};
use async_trait::async_trait;
use log::{debug, info, warn};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::mpsc;

/// Something the user (or the identity widget) did
#[derive(Debug, Clone)]
pub enum FlowEvent {
    /// Google button or one-tap success with its raw credential
    IdentityCredential(SecretString),
    PasswordLogin(Credentials),
    Registration(RegistrationForm),
    /// Password typed into the "set password" prompt, with the sign-up
    /// form's PayPal client id when there is one
    PendingPassword {
        password: SecretString,
        paypal_client_id: Option<String>,
    },
    CancelPendingPassword,
    Reset,
}

impl FlowEvent {
    #[must_use]
    pub fn identity(raw_token: impl Into<String>) -> Self {
        Self::IdentityCredential(SecretString::from(raw_token.into()))
    }

    fn name(&self) -> &'static str {
        match self {
            FlowEvent::IdentityCredential(_) => "identity credential",
            FlowEvent::PasswordLogin(_) => "password login",
            FlowEvent::Registration(_) => "registration",
            FlowEvent::PendingPassword { .. } => "pending password",
            FlowEvent::CancelPendingPassword => "cancel",
            FlowEvent::Reset => "reset",
        }
    }
}

/// Source of flow events; `None` means the source is closed
#[async_trait]
pub trait IdentityEventSource: Send {
    async fn next_event(&mut self) -> Option<FlowEvent>;
}

#[async_trait]
impl IdentityEventSource for mpsc::Receiver<FlowEvent> {
    async fn next_event(&mut self) -> Option<FlowEvent> {
        self.recv().await
    }
}

impl AuthFlow {
    /// Apply a single event.
    ///
    /// Identity credentials are ignored while a session is already signed in,
    /// mirroring the one-tap prompt being disabled for signed-in users.
    ///
    /// # Errors
    ///
    /// Propagates the error of the operation the event maps to.
    pub async fn handle(&self, event: FlowEvent) -> Result<FlowState, AuthFlowError> {
        match event {
            FlowEvent::IdentityCredential(raw_token) => {
                if self.store().is_authenticated() {
                    info!("Ignoring identity credential, a session is already active");
                    return Ok(self.state());
                }
                self.identity_received(raw_token.expose_secret()).await
            }
            FlowEvent::PasswordLogin(credentials) => self.submit_login(credentials).await,
            FlowEvent::Registration(form) => self.submit_registration(form).await,
            FlowEvent::PendingPassword {
                password,
                paypal_client_id,
            } => self.password_entered(password, paypal_client_id).await,
            FlowEvent::CancelPendingPassword => Ok(self.cancel_password_entry()),
            FlowEvent::Reset => Ok(self.reset()),
        }
    }

    /// Apply events from `source` in order until it closes, returning the final state.
    ///
    /// Failures are logged and do not stop the loop; the user retries by
    /// producing another event.
    pub async fn run<S>(&self, source: &mut S) -> FlowState
    where
        S: IdentityEventSource + ?Sized,
    {
        while let Some(event) = source.next_event().await {
            let name = event.name();
            match self.handle(event).await {
                Ok(state) => debug!("Handled {name} event, flow is {}", state.name()),
                Err(e) if e.is_user_visible() => warn!("{name} event failed: {e}"),
                Err(e) => debug!("{name} event dropped: {e}"),
            }
        }
        debug!("Event source closed");
        self.state()
    }
}
