//! Error types for the authentication resolution flow
//!
//! Decode failures stay local to one flow instance, remote failures are
//! surfaced to the user verbatim, and validation failures are caught before
//! any request leaves the client.

use thiserror::Error;

/// The identity token could not be turned into an assertion
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("identity token must have three segments, found {0}")]
    Segments(usize),
    #[error("identity token payload is not valid base64")]
    Base64,
    #[error("identity token payload is not valid UTF-8")]
    Utf8,
    #[error("identity token payload is not a JSON object")]
    Json,
    #[error("identity token carries no email claim")]
    MissingEmail,
}

/// A call to the storefront backend did not produce a usable answer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The request never got a response (connect, timeout, TLS)
    #[error("{0}")]
    Network(String),
    /// Non-2xx status; the message is the server's own when it sent one
    #[error("{message}")]
    Status { status: u16, message: String },
    /// 2xx status with a body that does not match the expected shape
    #[error("unexpected response from server: {0}")]
    MalformedResponse(String),
}

impl RemoteError {
    /// Message suitable for displaying to the user as-is
    #[must_use]
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

/// Local form validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Unknown role: {0}")]
    UnknownRole(String),
}

/// Errors returned by the flow state machine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthFlowError {
    #[error("Identity token rejected: {0}")]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A newer event started another generation before this step resolved
    #[error("superseded by a newer sign-in attempt")]
    Superseded,
}

impl AuthFlowError {
    /// Whether the error should be shown to the user.
    ///
    /// Superseded steps are silently dropped; the newer attempt reports its own result.
    #[must_use]
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, AuthFlowError::Superseded)
    }
}
