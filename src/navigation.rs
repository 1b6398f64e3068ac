//! Where the sign-in and sign-up screens go once a session exists

use crate::session::SessionSnapshot;
use crate::utils::redirect_validator::validate_post_auth_redirect;
use log::debug;
use tokio::sync::watch;

pub const DEFAULT_REDIRECT: &str = "/";

/// The two screens sharing the authentication flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    SignIn,
    SignUp,
}

impl Screen {
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Screen::SignIn => "/login",
            Screen::SignUp => "/register",
        }
    }

    /// The other screen, for the "New customer?" / "Have an account?" links
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Screen::SignIn => Screen::SignUp,
            Screen::SignUp => Screen::SignIn,
        }
    }
}

/// Read the `redirect` query parameter, falling back to `/` when it is
/// missing, empty or not a safe same-origin path
///
/// The query is form-urlencoded, so `+` decodes to a space; links built by
/// [`Navigator::alternate_link`] percent-encode a literal plus.
#[must_use]
pub fn redirect_target(query: &str) -> String {
    let query = query.strip_prefix('?').unwrap_or(query);
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "redirect")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
        .and_then(|value| validate_post_auth_redirect(&value).ok())
        .unwrap_or_else(|| DEFAULT_REDIRECT.to_string())
}

/// Navigation decisions for one screen instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
    screen: Screen,
    redirect: String,
}

impl Navigator {
    /// Build from the screen and its raw query string
    #[must_use]
    pub fn new(screen: Screen, query: &str) -> Self {
        Self {
            screen,
            redirect: redirect_target(query),
        }
    }

    #[must_use]
    pub fn screen(&self) -> Screen {
        self.screen
    }

    #[must_use]
    pub fn redirect(&self) -> &str {
        &self.redirect
    }

    /// Link to the other screen, carrying the redirect target along
    #[must_use]
    pub fn alternate_link(&self) -> String {
        let path = self.screen.other().path();
        if self.redirect == DEFAULT_REDIRECT {
            path.to_string()
        } else {
            format!("{path}?redirect={}", urlencoding::encode(&self.redirect))
        }
    }

    /// Destination once `snapshot` holds a signed-in user
    #[must_use]
    pub fn destination(&self, snapshot: &SessionSnapshot) -> Option<String> {
        snapshot.is_authenticated().then(|| self.redirect.clone())
    }

    /// Immediate landing after an identity login of an existing account.
    ///
    /// Sign-up leaves for `/` right away; sign-in waits for the session.
    #[must_use]
    pub fn identity_login_landing(&self) -> Option<&'static str> {
        match self.screen {
            Screen::SignUp => Some(DEFAULT_REDIRECT),
            Screen::SignIn => None,
        }
    }

    /// Destination after an identity-token login of an existing account
    #[must_use]
    pub fn after_identity_login(&self, snapshot: &SessionSnapshot) -> Option<String> {
        match self.identity_login_landing() {
            Some(landing) => Some(landing.to_string()),
            None => self.destination(snapshot),
        }
    }

        /// Wait until the store reports a signed-in user, then return the destination.
    ///
    /// Returns `None` if the store is dropped first.
    pub async fn wait_for_destination(
        &self,
        mut session: watch::Receiver<SessionSnapshot>,
    ) -> Option<String> {
        let snapshot = session
            .wait_for(SessionSnapshot::is_authenticated)
            .await
            .ok()?
            .clone();
        debug!("Session available on {}, navigating", self.screen.path());
        self.destination(&snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStore;
    use crate::testing::fixtures::TestFixtures;
    use std::sync::Arc;

    #[test]
    fn test_redirect_target_parsing() {
        assert_eq!(redirect_target(""), "/");
        assert_eq!(redirect_target("?redirect="), "/");
        assert_eq!(redirect_target("?redirect=/shipping"), "/shipping");
        assert_eq!(redirect_target("redirect=%2Fproduct%2F42"), "/product/42");
        assert_eq!(redirect_target("?foo=1&redirect=/cart"), "/cart");
    }

    #[test]
    fn test_redirect_target_rejects_foreign_targets() {
        assert_eq!(redirect_target("?redirect=https://evil.example.com"), "/");
        assert_eq!(redirect_target("?redirect=//evil.example.com"), "/");
        assert_eq!(redirect_target("?redirect=shipping"), "/");
    }

    #[test]
    fn test_alternate_links() {
        assert_eq!(Navigator::new(Screen::SignIn, "").alternate_link(), "/register");
        assert_eq!(
            Navigator::new(Screen::SignIn, "?redirect=/shipping").alternate_link(),
            "/register?redirect=%2Fshipping"
        );
        assert_eq!(
            Navigator::new(Screen::SignUp, "?redirect=/shipping").alternate_link(),
            "/login?redirect=%2Fshipping"
        );
    }

    #[test]
    fn test_identity_login_landing_differs_by_screen() {
        assert_eq!(
            Navigator::new(Screen::SignUp, "?redirect=/shipping").identity_login_landing(),
            Some("/")
        );
        assert_eq!(
            Navigator::new(Screen::SignIn, "?redirect=/shipping").identity_login_landing(),
            None
        );
    }

    #[test]
    fn test_after_identity_login_lands_by_screen() {
        let snapshot = SessionSnapshot {
            user: Some(TestFixtures::user_session("a@x.com")),
            ..SessionSnapshot::default()
        };
        assert_eq!(
            Navigator::new(Screen::SignUp, "?redirect=/shipping").after_identity_login(&snapshot),
            Some("/".to_string())
        );
        assert_eq!(
            Navigator::new(Screen::SignIn, "?redirect=/shipping").after_identity_login(&snapshot),
            Some("/shipping".to_string())
        );
        assert_eq!(
            Navigator::new(Screen::SignIn, "?redirect=/shipping")
                .after_identity_login(&SessionSnapshot::default()),
            None
        );
    }

    #[test]
    fn test_plus_in_redirect_decodes_as_space() {
        // Query strings are form-urlencoded; a literal plus arrives as %2B
        assert_eq!(redirect_target("?redirect=/search/a+b"), "/search/a b");
        assert_eq!(redirect_target("?redirect=/search/a%2Bb"), "/search/a+b");
    }

    #[test]
    fn test_destination_requires_session() {
        let navigator = Navigator::new(Screen::SignIn, "?redirect=/shipping");
        assert_eq!(navigator.destination(&SessionSnapshot::default()), None);

        let snapshot = SessionSnapshot {
            user: Some(TestFixtures::user_session("a@x.com")),
            ..SessionSnapshot::default()
        };
        assert_eq!(navigator.destination(&snapshot), Some("/shipping".to_string()));
    }

    #[tokio::test]
    async fn test_wait_for_destination_follows_store() {
        let store = Arc::new(SessionStore::anonymous());
        let navigator = Navigator::new(Screen::SignIn, "?redirect=/cart");
        let receiver = store.subscribe();

        let publisher = {
            let store = store.clone();
            tokio::spawn(async move {
                store.publish(&Ok(TestFixtures::user_session("a@x.com")));
            })
        };

        assert_eq!(
            navigator.wait_for_destination(receiver).await,
            Some("/cart".to_string())
        );
        publisher.await.unwrap();
    }
}
