#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the storefront-auth crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod client;
pub mod flow;
pub mod identity;
pub mod models;
pub mod navigation;
pub mod session;
pub mod settings;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use client::{AccountDirectory, CredentialService, StorefrontApiClient};
pub use flow::{AuthFlow, AuthFlowFactory, FlowEvent, FlowState, IdentityEventSource};
pub use models::{
    AuthFlowError, Credentials, IdentityAssertion, PendingRegistration, RegistrationForm, Role,
    UserSession,
};
pub use navigation::{Navigator, Screen};
pub use session::{SessionDispatcher, SessionSnapshot, SessionStore};
pub use settings::StorefrontSettings;
