use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod auth;

pub use auth::{AuthFlowError, DecodeError, RemoteError, ValidationError};

/// Account role chosen at registration time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Buyer,
    Seller,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Buyer => "buyer",
            Role::Seller => "seller",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buyer" => Ok(Role::Buyer),
            "seller" => Ok(Role::Seller),
            other => Err(ValidationError::UnknownRole(other.to_string())),
        }
    }
}

/// Claims extracted from a third-party identity token.
///
/// Nothing here is verified. The assertion only drives UI decisions; the
/// backend re-verifies `raw_token` whenever it is presented as a credential.
#[derive(Debug, Clone)]
pub struct IdentityAssertion {
    pub email: String,
    pub display_name: String,
    pub raw_token: SecretString,
    pub subject: Option<String>,
    pub issuer: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// A new identity-derived account waiting for the user to choose a password
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRegistration {
    pub email: String,
    pub display_name: String,
}

impl From<&IdentityAssertion> for PendingRegistration {
    fn from(assertion: &IdentityAssertion) -> Self {
        Self {
            email: assertion.email.clone(),
            display_name: assertion.display_name.clone(),
        }
    }
}

/// Signed-in user as returned by the login and register endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    #[serde(rename = "_id", alias = "id")]
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    pub token: String,
}

/// Result of a login or register call
pub type SessionOutcome = Result<UserSession, RemoteError>;

/// Email and secret pair submitted through the sign-in form
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Everything the sign-up form collects
#[derive(Debug, Clone)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
    pub role: Role,
    pub paypal_client_id: Option<String>,
}

/// Payload of a register call after the form has been validated
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: SecretString,
    pub role: Role,
    pub paypal_client_id: Option<String>,
}

impl NewAccount {
    /// Account created from an identity sign-up once the user picked a password
    #[must_use]
    pub fn from_pending(pending: PendingRegistration, password: SecretString, role: Role) -> Self {
        Self {
            name: pending.display_name,
            email: pending.email,
            password,
            role,
            paypal_client_id: None,
        }
    }

    /// Attach a PayPal client id; blank ids are dropped
    #[must_use]
    pub fn with_paypal_client_id(mut self, paypal_client_id: Option<String>) -> Self {
        self.paypal_client_id = paypal_client_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        self
    }
}
