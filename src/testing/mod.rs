//! Testing utilities for storefront-auth
//!
//! - [`fixtures`] - Pre-built identity tokens, sessions and forms
//! - [`mock`] - Recording mocks for the account directory and credential service
//!
//! ## Usage
//!
//! ```rust,ignore
//! use storefront_auth::testing::{fixtures::TestFixtures, mock::{call_log, MockAccountDirectory}};
//!
//! let log = call_log();
//! let directory = MockAccountDirectory::new(log.clone()).with_existing("a@x.com");
//! let token = TestFixtures::identity_token("a@x.com", "A");
//! # let _ = (directory, token);
//! ```

pub mod fixtures;
pub mod mock;

pub use fixtures::TestFixtures;
pub use mock::{call_log, CallLog, MockAccountDirectory, MockCredentialService, RecordedCall};
