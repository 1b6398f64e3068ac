//! Storefront backend access

pub mod http;
pub mod traits;

pub use http::{ClientSetupError, StorefrontApiClient};
pub use traits::{AccountDirectory, CredentialService};
