//! Wiring the flow to the real backend from settings

use crate::client::{ClientSetupError, StorefrontApiClient};
use crate::flow::machine::AuthFlow;
use crate::session::{SessionDispatcher, SessionStore};
use crate::settings::StorefrontSettings;
use std::sync::Arc;

/// Builds production [`AuthFlow`]s
pub struct AuthFlowFactory;

impl AuthFlowFactory {
    /// Create a flow backed by the HTTP client and a session store as configured
    ///
    /// # Errors
    ///
    /// Returns an error if the API endpoints are not valid URLs or the HTTP
    /// client cannot be built
    pub fn from_settings(settings: &StorefrontSettings) -> Result<AuthFlow, ClientSetupError> {
        log::info!("🏭 Building sign-in flow for {}", settings.api.base_url);

        let client = Arc::new(StorefrontApiClient::new(&settings.api)?);
        let store = Arc::new(Self::create_store(settings));
        let dispatcher = SessionDispatcher::new(client.clone(), store);

        Ok(AuthFlow::new(client, dispatcher)
            .with_identity_role(settings.registration.identity_role))
    }

    fn create_store(settings: &StorefrontSettings) -> SessionStore {
        match &settings.session.persist_file {
            Some(path) => SessionStore::with_persistence(path),
            None => SessionStore::anonymous(),
        }
    }
}
