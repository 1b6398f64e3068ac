//! Unverified decoding of Google identity tokens

use crate::models::{DecodeError, IdentityAssertion};
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, TimeZone, Utc};
use log::{debug, warn};
use secrecy::SecretString;
use serde_json::{Map, Value};

/// Decode a raw identity token into an assertion.
///
/// # Errors
///
/// Returns a [`DecodeError`] if the token is not a three-segment JWT, its
/// payload is not base64url encoded JSON, or it has no usable `email` claim.
pub fn decode(raw_token: &str) -> Result<IdentityAssertion, DecodeError> {
    IdTokenDecoder::decode(raw_token)
}

/// Claim extraction for third-party identity tokens
pub struct IdTokenDecoder;

impl IdTokenDecoder {
    /// Decode the token payload and pull out the claims the flow needs.
    ///
    /// The signature segment is never inspected. Surrounding whitespace is
    /// stripped, and the stripped token is what later serves as the login secret.
    ///
    /// # Errors
    ///
    /// See [`decode`].
    pub fn decode(raw_token: &str) -> Result<IdentityAssertion, DecodeError> {
        let raw_token = raw_token.trim();
        let claims = Self::decode_payload(raw_token)?;

        let email = Self::extract_email(&claims).ok_or(DecodeError::MissingEmail)?;
        let display_name = Self::extract_name(&claims).unwrap_or_else(|| {
            let fallback = email.split('@').next().unwrap_or_default().to_string();
            debug!("No name claim in identity token, using email local part: {fallback}");
            fallback
        });

        Ok(IdentityAssertion {
            email,
            display_name,
            raw_token: SecretString::from(raw_token.to_string()),
            subject: Self::extract_string(&claims, "sub"),
            issuer: Self::extract_string(&claims, "iss"),
            expires_at: Self::extract_timestamp(&claims, "exp"),
        })
    }

    /// Split the JWT and decode its middle segment as a JSON object
    fn decode_payload(raw_token: &str) -> Result<Map<String, Value>, DecodeError> {
        let parts: Vec<&str> = raw_token.split('.').collect();
        if parts.len() != 3 {
            return Err(DecodeError::Segments(parts.len()));
        }

        let payload_b64 = parts[1].trim_end_matches('=');
        let payload_bytes = general_purpose::URL_SAFE_NO_PAD
            .decode(payload_b64)
            .or_else(|_| general_purpose::STANDARD_NO_PAD.decode(payload_b64))
            .map_err(|_| DecodeError::Base64)?;

        let payload_str = String::from_utf8(payload_bytes).map_err(|_| DecodeError::Utf8)?;

        match serde_json::from_str(&payload_str) {
            Ok(Value::Object(claims)) => Ok(claims),
            _ => Err(DecodeError::Json),
        }
    }

    fn extract_string(claims: &Map<String, Value>, field_name: &str) -> Option<String> {
        claims
            .get(field_name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(ToString::to_string)
    }

    /// The email claim as issued; the backend matches accounts on it verbatim
    fn extract_email(claims: &Map<String, Value>) -> Option<String> {
        Self::extract_string(claims, "email")
    }

    /// `name`, else `given_name` + `family_name`
    fn extract_name(claims: &Map<String, Value>) -> Option<String> {
        if let Some(name) = Self::extract_string(claims, "name") {
            return Some(name);
        }

        let given_name = Self::extract_string(claims, "given_name").unwrap_or_default();
        let family_name = Self::extract_string(claims, "family_name").unwrap_or_default();
        let full_name = format!("{given_name} {family_name}").trim().to_string();
        if full_name.is_empty() {
            None
        } else {
            Some(full_name)
        }
    }

    fn extract_timestamp(claims: &Map<String, Value>, field_name: &str) -> Option<DateTime<Utc>> {
        let timestamp = claims.get(field_name).and_then(Value::as_i64)?;
        if let chrono::LocalResult::Single(dt) = Utc.timestamp_opt(timestamp, 0) {
            Some(dt)
        } else {
            warn!("Invalid '{field_name}' timestamp in identity token: {timestamp}");
            None
        }
    }
}
