pub mod logging;
pub mod redirect_validator;

pub use logging::LoggingHelper;
pub use redirect_validator::{validate_post_auth_redirect, RedirectError};
