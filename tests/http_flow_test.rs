//! The flow wired to the HTTP client, against a mock storefront backend

use secrecy::SecretString;
use serde_json::{json, Value};
use std::net::TcpListener;
use storefront_auth::{
    testing::fixtures::TestFixtures, AuthFlowError, AuthFlowFactory, Credentials, FlowState, Role,
    StorefrontSettings,
};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn settings_for(server: &MockServer) -> StorefrontSettings {
    let mut settings = StorefrontSettings::default();
    settings.api.base_url = server.uri();
    settings
}

fn session_json(email: &str, role: &str) -> Value {
    json!({
        "_id": "665f1c2a9b",
        "name": "Storefront User",
        "email": email,
        "role": role,
        "token": "server-issued-token"
    })
}

#[tokio::test]
async fn test_identity_sign_in_for_existing_account() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;
    let token = TestFixtures::identity_token("a@x.com", "A");

    Mock::given(method("GET"))
        .and(path("/api/users/check-email"))
        .and(query_param("email", "a@x.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"exists": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/users/login"))
        .and(body_json(json!({"email": "a@x.com", "password": token})))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_json("a@x.com", "buyer")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let flow = AuthFlowFactory::from_settings(&settings_for(&server)).unwrap();
    let state = flow.identity_received(&token).await.unwrap();

    assert!(matches!(state, FlowState::Resolved(_)));
    let user = flow.store().current_user().unwrap();
    assert_eq!(user.user_id, "665f1c2a9b");
    assert_eq!(user.token, "server-issued-token");
}

#[tokio::test]
async fn test_identity_sign_up_registers_then_logs_in() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users/check-email"))
        .and(query_param("email", "b@x.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"exists": false})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/users"))
        .and(body_json(json!({
            "name": "B",
            "email": "b@x.com",
            "password": "p1",
            "role": "buyer"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(session_json("b@x.com", "buyer")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/users/login"))
        .and(body_json(json!({"email": "b@x.com", "password": "p1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_json("b@x.com", "buyer")))
        .expect(1)
        .mount(&server)
        .await;

    let flow = AuthFlowFactory::from_settings(&settings_for(&server)).unwrap();
    let state = flow
        .identity_received(&TestFixtures::identity_token("b@x.com", "B"))
        .await
        .unwrap();
    assert!(matches!(state, FlowState::AwaitingPasswordEntry(_)));

    let state = flow
        .password_entered(SecretString::from("p1"), None)
        .await
        .unwrap();
    assert!(matches!(state, FlowState::Resolved(ref user) if user.role == Role::Buyer));

    let requests = server.received_requests().await.unwrap();
    let order: Vec<_> = requests.iter().map(|r| r.url.path().to_string()).collect();
    assert_eq!(
        order,
        vec!["/api/users/check-email", "/api/users", "/api/users/login"]
    );
}

#[tokio::test]
async fn test_manual_login_failure_surfaces_server_message() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/users/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid email or password"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let flow = AuthFlowFactory::from_settings(&settings_for(&server)).unwrap();
    let err = flow
        .submit_login(Credentials::new("c@x.com", "wrong"))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthFlowError::Remote(_)));
    assert_eq!(err.to_string(), "Invalid email or password");
    assert_eq!(
        flow.state(),
        FlowState::Failed {
            message: "Invalid email or password".to_string()
        }
    );
    assert_eq!(
        flow.store().snapshot().error.as_deref(),
        Some("Invalid email or password")
    );
}

#[tokio::test]
async fn test_unreachable_backend_fails_existence_check() {
    let mut settings = StorefrontSettings::default();
    // Port 9 (discard) on localhost is not expected to accept HTTP
    settings.api.base_url = "http://127.0.0.1:9".to_string();
    settings.api.timeout_secs = 2;

    let flow = AuthFlowFactory::from_settings(&settings).unwrap();
    let result = flow
        .identity_received(&TestFixtures::identity_token("a@x.com", "A"))
        .await;

    assert!(matches!(result, Err(AuthFlowError::Remote(_))));
    assert!(matches!(flow.state(), FlowState::Failed { .. }));
    assert!(!flow.store().is_authenticated());
}
