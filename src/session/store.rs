//! Shared session state observed by navigation
//!
//! The store starts anonymous (or from a persisted user) and only Session
//! Dispatch writes to it. Readers either take a snapshot or subscribe to
//! change notifications.

use crate::models::{SessionOutcome, UserSession};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use tokio::sync::watch;

/// What the screens see of the current session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// A login or register call is in flight
    pub loading: bool,
    /// Message from the last failed call, verbatim
    pub error: Option<String>,
    pub user: Option<UserSession>,
}

impl SessionSnapshot {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Process-wide session state with change notification
#[derive(Debug)]
pub struct SessionStore {
    sender: watch::Sender<SessionSnapshot>,
    persist_path: Option<PathBuf>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl SessionStore {
    /// An in-memory store with nobody signed in
    #[must_use]
    pub fn anonymous() -> Self {
        let (sender, _) = watch::channel(SessionSnapshot::default());
        Self {
            sender,
            persist_path: None,
        }
    }

    /// A store that keeps the signed-in user in `path`.
    ///
    /// An existing, readable file seeds the store. A missing or corrupt file
    /// leaves it anonymous.
    #[must_use]
    pub fn with_persistence(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let initial = SessionSnapshot {
            user: Self::read_persisted(&path),
            ..SessionSnapshot::default()
        };
        if let Some(user) = &initial.user {
            info!("Restored session for {} from {}", user.email, path.display());
        }

        let (sender, _) = watch::channel(initial);
        Self {
            sender,
            persist_path: Some(path),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.sender.borrow().clone()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<UserSession> {
        self.sender.borrow().user.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.sender.borrow().is_authenticated()
    }

    /// Receive every change to the session from now on
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.sender.subscribe()
    }

    pub(crate) fn begin_request(&self) {
        self.sender.send_modify(|snapshot| {
            snapshot.loading = true;
            snapshot.error = None;
        });
    }

    /// Record the outcome of a login or register call
    pub(crate) fn publish(&self, outcome: &SessionOutcome) {
        match outcome {
            Ok(user) => {
                self.persist(user);
                self.sender.send_replace(SessionSnapshot {
                    loading: false,
                    error: None,
                    user: Some(user.clone()),
                });
            }
            Err(e) => {
                // A failed attempt does not sign out an existing session
                self.sender.send_modify(|snapshot| {
                    snapshot.loading = false;
                    snapshot.error = Some(e.user_message());
                });
            }
        }
    }

    pub(crate) fn clear(&self) {
        if let Some(path) = &self.persist_path {
            match std::fs::remove_file(path) {
                Ok(()) => debug!("Removed persisted session {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove persisted session {}: {e}", path.display()),
            }
        }
        self.sender.send_replace(SessionSnapshot::default());
    }

    fn persist(&self, user: &UserSession) {
        let Some(path) = &self.persist_path else {
            return;
        };
        let result = serde_json::to_vec(user)
            .map_err(|e| e.to_string())
            .and_then(|json| std::fs::write(path, json).map_err(|e| e.to_string()));
        if let Err(e) = result {
            warn!("Failed to persist session to {}: {e}", path.display());
        }
    }

    fn read_persisted(path: &Path) -> Option<UserSession> {
        let contents = std::fs::read(path).ok()?;
        match serde_json::from_slice(&contents) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("Ignoring unreadable session file {}: {e}", path.display());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RemoteError;
    use crate::testing::fixtures::TestFixtures;

    #[test]
    fn test_starts_anonymous() {
        let store = SessionStore::anonymous();
        assert_eq!(store.snapshot(), SessionSnapshot::default());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_publish_success_and_failure() {
        let store = SessionStore::anonymous();
        store.begin_request();
        assert!(store.snapshot().loading);

        let user = TestFixtures::user_session("a@x.com");
        store.publish(&Ok(user.clone()));
        let snapshot = store.snapshot();
        assert!(!snapshot.loading);
        assert_eq!(snapshot.user, Some(user.clone()));

        store.begin_request();
        store.publish(&Err(RemoteError::Status {
            status: 401,
            message: "Invalid email or password".to_string(),
        }));
        let snapshot = store.snapshot();
        assert_eq!(snapshot.error.as_deref(), Some("Invalid email or password"));
        assert_eq!(snapshot.user, Some(user));
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let store = SessionStore::anonymous();
        let mut receiver = store.subscribe();

        store.publish(&Ok(TestFixtures::user_session("a@x.com")));
        receiver.changed().await.unwrap();
        assert!(receiver.borrow_and_update().is_authenticated());

        store.clear();
        receiver.changed().await.unwrap();
        assert!(!receiver.borrow_and_update().is_authenticated());
    }

    #[test]
    fn test_persistence_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = SessionStore::with_persistence(&path);
        assert!(!store.is_authenticated());
        store.publish(&Ok(TestFixtures::user_session("a@x.com")));
        assert!(path.exists());

        let restored = SessionStore::with_persistence(&path);
        assert_eq!(
            restored.current_user().map(|user| user.email),
            Some("a@x.com".to_string())
        );

        restored.clear();
        assert!(!path.exists());
        assert!(!restored.is_authenticated());
    }

    #[test]
    fn test_corrupt_session_file_starts_anonymous() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"{not json").unwrap();

        let store = SessionStore::with_persistence(&path);
        assert!(!store.is_authenticated());
    }
}
