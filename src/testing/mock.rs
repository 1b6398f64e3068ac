//! Mock backends for exercising the flow without a server
//!
//! Both mocks can share one [`CallLog`] so tests can assert the order of
//! existence checks, registrations and logins across collaborators.

use crate::client::{AccountDirectory, CredentialService};
use crate::models::{NewAccount, RemoteError, Role, SessionOutcome, UserSession};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Ordered record of every call made to the mocks
pub type CallLog = Arc<Mutex<Vec<RecordedCall>>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    CheckExists {
        email: String,
    },
    Login {
        email: String,
        secret: String,
    },
    Register {
        name: String,
        email: String,
        password: String,
        role: Role,
        paypal_client_id: Option<String>,
    },
}

impl RecordedCall {
    #[must_use]
    pub fn check_exists(email: &str) -> Self {
        Self::CheckExists {
            email: email.to_string(),
        }
    }

    #[must_use]
    pub fn login(email: &str, secret: &str) -> Self {
        Self::Login {
            email: email.to_string(),
            secret: secret.to_string(),
        }
    }

    #[must_use]
    pub fn register(name: &str, email: &str, password: &str, role: Role) -> Self {
        Self::Register {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role,
            paypal_client_id: None,
        }
    }

    #[must_use]
    pub fn is_session_request(&self) -> bool {
        !matches!(self, Self::CheckExists { .. })
    }
}

/// Create an empty shared call log
#[must_use]
pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

fn record(log: &CallLog, call: RecordedCall) {
    log.lock().expect("call log poisoned").push(call);
}

fn snapshot(log: &CallLog) -> Vec<RecordedCall> {
    log.lock().expect("call log poisoned").clone()
}

/// Account directory answering from a fixed set of known emails
pub struct MockAccountDirectory {
    log: CallLog,
    existing: HashSet<String>,
    failure: Option<RemoteError>,
    gates: HashMap<String, Arc<Notify>>,
}

impl MockAccountDirectory {
    #[must_use]
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            existing: HashSet::new(),
            failure: None,
            gates: HashMap::new(),
        }
    }

    /// Report `email` as already registered
    #[must_use]
    pub fn with_existing(mut self, email: &str) -> Self {
        self.existing.insert(email.to_string());
        self
    }

    /// Fail every lookup with `error`
    #[must_use]
    pub fn failing(mut self, error: RemoteError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Hold lookups for `email` until `gate` is notified
    #[must_use]
    pub fn with_gate(mut self, email: &str, gate: Arc<Notify>) -> Self {
        self.gates.insert(email.to_string(), gate);
        self
    }

    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        snapshot(&self.log)
    }
}

#[async_trait]
impl AccountDirectory for MockAccountDirectory {
    async fn check_exists(&self, email: &str) -> Result<bool, RemoteError> {
        record(&self.log, RecordedCall::check_exists(email));
        if let Some(gate) = self.gates.get(email) {
            gate.notified().await;
        }
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(self.existing.contains(email)),
        }
    }
}

/// Credential service that signs everyone in unless told otherwise
pub struct MockCredentialService {
    log: CallLog,
    login_error: Option<RemoteError>,
    register_error: Option<RemoteError>,
}

impl MockCredentialService {
    #[must_use]
    pub fn succeeding() -> Self {
        Self::with_log(call_log())
    }

    #[must_use]
    pub fn with_log(log: CallLog) -> Self {
        Self {
            log,
            login_error: None,
            register_error: None,
        }
    }

    #[must_use]
    pub fn failing_login(error: RemoteError) -> Self {
        Self::succeeding().with_login_error(error)
    }

    #[must_use]
    pub fn with_login_error(mut self, error: RemoteError) -> Self {
        self.login_error = Some(error);
        self
    }

    #[must_use]
    pub fn with_register_error(mut self, error: RemoteError) -> Self {
        self.register_error = Some(error);
        self
    }

    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        snapshot(&self.log)
    }

    fn session_for(email: &str, name: &str, role: Role) -> UserSession {
        UserSession {
            user_id: format!("user-{email}"),
            name: name.to_string(),
            email: email.to_string(),
            role,
            token: format!("token-{email}"),
        }
    }
}

#[async_trait]
impl CredentialService for MockCredentialService {
    async fn login(&self, email: &str, secret: &SecretString) -> SessionOutcome {
        record(
            &self.log,
            RecordedCall::login(email, secret.expose_secret()),
        );
        match &self.login_error {
            Some(error) => Err(error.clone()),
            None => Ok(Self::session_for(email, "", Role::Buyer)),
        }
    }

    async fn register(&self, account: &NewAccount) -> SessionOutcome {
        record(
            &self.log,
            RecordedCall::Register {
                name: account.name.clone(),
                email: account.email.clone(),
                password: account.password.expose_secret().to_string(),
                role: account.role,
                paypal_client_id: account.paypal_client_id.clone(),
            },
        );
        match &self.register_error {
            Some(error) => Err(error.clone()),
            None => Ok(Self::session_for(&account.email, &account.name, account.role)),
        }
    }
}
