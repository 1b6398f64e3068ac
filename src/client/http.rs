//! reqwest-backed implementation of the backend seams

use crate::client::traits::{AccountDirectory, CredentialService};
use crate::models::{NewAccount, RemoteError, Role, SessionOutcome, UserSession};
use crate::settings::{ApiSettings, SettingsError};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Failure to build the HTTP client from settings
#[derive(Debug, Error)]
pub enum ClientSetupError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
    role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    paypal_client_id: Option<&'a str>,
}

/// HTTP client for the storefront user endpoints
#[derive(Debug, Clone)]
pub struct StorefrontApiClient {
    http_client: reqwest::Client,
    check_email_url: Url,
    login_url: Url,
    register_url: Url,
}

impl StorefrontApiClient {
    /// Build a client for the endpoints described by `settings`
    ///
    /// # Errors
    ///
    /// Returns an error if an endpoint URL is invalid or the TLS backend
    /// cannot be initialised
    pub fn new(settings: &ApiSettings) -> Result<Self, ClientSetupError> {
        let http_client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .user_agent(concat!("storefront-auth/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            check_email_url: settings.endpoint(&settings.check_email_path)?,
            login_url: settings.endpoint(&settings.login_path)?,
            register_url: settings.endpoint(&settings.register_path)?,
        })
    }

    /// Read a session from a 2xx response, or the server's message otherwise
    async fn session_from_response(response: Response) -> SessionOutcome {
        let response = Self::ensure_success(response).await?;
        response
            .json::<UserSession>()
            .await
            .map_err(|e| RemoteError::MalformedResponse(format!("session body: {e}")))
    }

    async fn ensure_success(response: Response) -> Result<Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = Self::error_message(status, &body);
        warn!("Storefront API returned {status}: {message}");
        Err(RemoteError::Status {
            status: status.as_u16(),
            message,
        })
    }

    /// The backend's `message` field if it sent one, else the status line
    fn error_message(status: StatusCode, body: &str) -> String {
        serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|json| {
                json.get("message")
                    .or_else(|| json.get("error"))
                    .and_then(Value::as_str)
                    .map(ToString::to_string)
            })
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| status.to_string())
    }

    /// Normalise the existence answer into a strict boolean
    fn parse_exists(body: &Value) -> Result<bool, RemoteError> {
        match body.get("exists") {
            Some(Value::Bool(exists)) => Ok(*exists),
            Some(other) => Err(RemoteError::MalformedResponse(format!(
                "'exists' is not a boolean: {other}"
            ))),
            None => Err(RemoteError::MalformedResponse(
                "missing 'exists' field".to_string(),
            )),
        }
    }

    fn network_error(e: &reqwest::Error) -> RemoteError {
        RemoteError::Network(format!("Failed to reach storefront API: {e}"))
    }
}

#[async_trait]
impl AccountDirectory for StorefrontApiClient {
    async fn check_exists(&self, email: &str) -> Result<bool, RemoteError> {
        debug!("Checking whether an account exists for {email}");
        let response = self
            .http_client
            .get(self.check_email_url.clone())
            .query(&[("email", email)])
            .send()
            .await
            .map_err(|e| Self::network_error(&e))?;

        let response = Self::ensure_success(response).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| RemoteError::MalformedResponse(format!("existence body: {e}")))?;

        Self::parse_exists(&body)
    }
}

#[async_trait]
impl CredentialService for StorefrontApiClient {
    async fn login(&self, email: &str, secret: &SecretString) -> SessionOutcome {
        let body = LoginRequest {
            email,
            password: secret.expose_secret(),
        };
        let response = self
            .http_client
            .post(self.login_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::network_error(&e))?;

        Self::session_from_response(response).await
    }

    async fn register(&self, account: &NewAccount) -> SessionOutcome {
        let body = RegisterRequest {
            name: &account.name,
            email: &account.email,
            password: account.password.expose_secret(),
            role: account.role,
            paypal_client_id: account
                .paypal_client_id
                .as_deref()
                .filter(|id| !id.trim().is_empty()),
        };
        let response = self
            .http_client
            .post(self.register_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::network_error(&e))?;

        Self::session_from_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::net::TcpListener;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn client_for(server: &MockServer) -> StorefrontApiClient {
        let settings = ApiSettings {
            base_url: server.uri(),
            ..ApiSettings::default()
        };
        StorefrontApiClient::new(&settings).unwrap()
    }

    fn session_json(email: &str) -> Value {
        json!({
            "_id": "665f1c",
            "name": "A",
            "email": email,
            "role": "buyer",
            "token": "server-token"
        })
    }

    #[test]
    fn test_parse_exists_is_strict() {
        assert!(StorefrontApiClient::parse_exists(&json!({"exists": true})).unwrap());
        assert!(!StorefrontApiClient::parse_exists(&json!({"exists": false})).unwrap());
        assert!(matches!(
            StorefrontApiClient::parse_exists(&json!({})),
            Err(RemoteError::MalformedResponse(_))
        ));
        assert!(matches!(
            StorefrontApiClient::parse_exists(&json!({"exists": "false"})),
            Err(RemoteError::MalformedResponse(_))
        ));
        assert!(matches!(
            StorefrontApiClient::parse_exists(&json!({"exists": null})),
            Err(RemoteError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_error_message_prefers_server_message() {
        assert_eq!(
            StorefrontApiClient::error_message(
                StatusCode::UNAUTHORIZED,
                r#"{"message":"Invalid email or password"}"#
            ),
            "Invalid email or password"
        );
        assert_eq!(
            StorefrontApiClient::error_message(StatusCode::BAD_GATEWAY, "<html>oops</html>"),
            "502 Bad Gateway"
        );
    }

    #[tokio::test]
    async fn test_check_exists_sends_email_query() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users/check-email"))
            .and(query_param("email", "a+b@x.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"exists": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(client.check_exists("a+b@x.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_check_exists_missing_field_is_error_not_false() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users/check-email"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"found": false})))
            .mount(&server)
            .await;

        let err = client_for(&server).check_exists("a@x.com").await.unwrap_err();
        assert!(matches!(err, RemoteError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_check_exists_server_error() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users/check-email"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "db down"})))
            .mount(&server)
            .await;

        let err = client_for(&server).check_exists("a@x.com").await.unwrap_err();
        assert_eq!(
            err,
            RemoteError::Status {
                status: 500,
                message: "db down".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_login_posts_credentials() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/users/login"))
            .and(body_json(json!({"email": "a@x.com", "password": "p2"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_json("a@x.com")))
            .expect(1)
            .mount(&server)
            .await;

        let session = client_for(&server)
            .login("a@x.com", &SecretString::from("p2"))
            .await
            .unwrap();
        assert_eq!(session.user_id, "665f1c");
        assert_eq!(session.token, "server-token");
    }

    #[tokio::test]
    async fn test_login_failure_message_is_verbatim() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/users/login"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"message": "Invalid email or password"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .login("a@x.com", &SecretString::from("wrong"))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Invalid email or password");
    }

    #[tokio::test]
    async fn test_register_omits_blank_paypal_id() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/users"))
            .and(body_json(json!({
                "name": "B",
                "email": "b@x.com",
                "password": "p1",
                "role": "seller"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(session_json("b@x.com")))
            .expect(1)
            .mount(&server)
            .await;

        let account = NewAccount {
            name: "B".to_string(),
            email: "b@x.com".to_string(),
            password: SecretString::from("p1"),
            role: Role::Seller,
            paypal_client_id: Some("   ".to_string()),
        };
        let session = client_for(&server).register(&account).await.unwrap();
        assert_eq!(session.email, "b@x.com");
    }

    #[tokio::test]
    async fn test_register_sends_paypal_id_in_camel_case() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/users"))
            .and(body_json(json!({
                "name": "S",
                "email": "s@x.com",
                "password": "pw",
                "role": "seller",
                "paypalClientId": "AbC123"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(session_json("s@x.com")))
            .expect(1)
            .mount(&server)
            .await;

        let account = NewAccount {
            name: "S".to_string(),
            email: "s@x.com".to_string(),
            password: SecretString::from("pw"),
            role: Role::Seller,
            paypal_client_id: Some("AbC123".to_string()),
        };
        assert!(client_for(&server).register(&account).await.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        let settings = ApiSettings {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..ApiSettings::default()
        };
        let client = StorefrontApiClient::new(&settings).unwrap();
        let err = client.check_exists("a@x.com").await.unwrap_err();
        assert!(matches!(err, RemoteError::Network(_)));
    }
}
