//! Session state and the dispatch layer that mutates it
//!
//! # Modules
//!
//! - [`store`] - Process-wide session snapshot with change subscription
//! - [`dispatch`] - Login and register calls that publish into the store

pub mod dispatch;
pub mod store;

pub use dispatch::SessionDispatcher;
pub use store::{SessionSnapshot, SessionStore};
