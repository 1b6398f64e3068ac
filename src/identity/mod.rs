//! Identity token decoding
//!
//! Turns the opaque credential handed over by the Google sign-in widget into an
//! [`IdentityAssertion`](crate::models::IdentityAssertion). Decoding is local
//! and unverified; the backend is the only party that checks the signature.

pub mod decoder;

pub use decoder::{decode, IdTokenDecoder};
