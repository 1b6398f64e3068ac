//! The authentication resolution flow shared by the sign-in and sign-up screens
//!
//! # Modules
//!
//! - [`state`] - Flow states and the pending registration they carry
//! - [`machine`] - The [`AuthFlow`] state machine
//! - [`events`] - Event sources that drive the machine
//! - [`factory`] - Construction from settings

pub mod events;
pub mod factory;
pub mod machine;
pub mod state;

pub use events::{FlowEvent, IdentityEventSource};
pub use factory::AuthFlowFactory;
pub use machine::AuthFlow;
pub use state::FlowState;
