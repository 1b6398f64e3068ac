use crate::models::{PendingRegistration, UserSession};

/// Where one sign-in attempt currently stands
///
/// A [`PendingRegistration`] only exists inside `AwaitingPasswordEntry`, so
/// there is never more than one per flow.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FlowState {
    #[default]
    Idle,
    AwaitingExistenceCheck {
        email: String,
    },
    /// Existing account, logging in with the identity token as the secret
    DirectLogin {
        email: String,
    },
    /// New identity, waiting for the user to choose a password
    AwaitingPasswordEntry(PendingRegistration),
    SessionRequested {
        email: String,
    },
    Resolved(UserSession),
    Failed {
        message: String,
    },
}

impl FlowState {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            FlowState::Idle => "Idle",
            FlowState::AwaitingExistenceCheck { .. } => "AwaitingExistenceCheck",
            FlowState::DirectLogin { .. } => "DirectLogin",
            FlowState::AwaitingPasswordEntry(_) => "AwaitingPasswordEntry",
            FlowState::SessionRequested { .. } => "SessionRequested",
            FlowState::Resolved(_) => "Resolved",
            FlowState::Failed { .. } => "Failed",
        }
    }

    #[must_use]
    pub fn pending_registration(&self) -> Option<&PendingRegistration> {
        match self {
            FlowState::AwaitingPasswordEntry(pending) => Some(pending),
            _ => None,
        }
    }

    /// A remote call is outstanding for this state
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            FlowState::AwaitingExistenceCheck { .. }
                | FlowState::DirectLogin { .. }
                | FlowState::SessionRequested { .. }
        )
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowState::Resolved(_) | FlowState::Failed { .. })
    }
}
