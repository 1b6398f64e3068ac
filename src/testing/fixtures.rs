//! Pre-built test data

use crate::models::{RegistrationForm, Role, UserSession};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use secrecy::SecretString;
use serde_json::{json, Value};

pub struct TestFixtures;

impl TestFixtures {
    /// A Google-style identity token for `email` and `name`, unsigned
    #[must_use]
    pub fn identity_token(email: &str, name: &str) -> String {
        Self::identity_token_from_claims(&json!({
            "iss": "https://accounts.google.com",
            "aud": "storefront-client-id.apps.googleusercontent.com",
            "sub": format!("google-{email}"),
            "email": email,
            "email_verified": true,
            "name": name,
            "iat": 1_750_000_000,
            "exp": 1_750_003_600
        }))
    }

    /// An identity token carrying exactly `claims`
    #[must_use]
    pub fn identity_token_from_claims(claims: &Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","kid":"test","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
        format!("{header}.{payload}.c2lnbmF0dXJl")
    }

    #[must_use]
    pub fn user_session(email: &str) -> UserSession {
        UserSession {
            user_id: "665f1c2a9b".to_string(),
            name: "Test User".to_string(),
            email: email.to_string(),
            role: Role::Buyer,
            token: "server-issued-token".to_string(),
        }
    }

    #[must_use]
    pub fn registration_form(
        name: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
        role: Role,
    ) -> RegistrationForm {
        RegistrationForm {
            name: name.to_string(),
            email: email.to_string(),
            password: SecretString::from(password.to_string()),
            confirm_password: SecretString::from(confirm_password.to_string()),
            role,
            paypal_client_id: None,
        }
    }
}
