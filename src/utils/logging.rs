// Centralized logging for the sign-in flow. Secrets never reach these helpers.
use crate::flow::state::FlowState;
use crate::models::{DecodeError, IdentityAssertion, RemoteError, Role};
use log::{debug, info, warn};

pub struct LoggingHelper;

impl LoggingHelper {
    /// Log a decoded identity assertion (claims only, never the token)
    pub fn log_identity_decoded(assertion: &IdentityAssertion) {
        info!(
            "🔍 Identity token decoded for {} (issuer: {})",
            assertion.email,
            assertion.issuer.as_deref().unwrap_or("unknown")
        );
        debug!(
            "Identity claims: name={:?}, sub={:?}, exp={:?}",
            assertion.display_name, assertion.subject, assertion.expires_at
        );
    }

    /// Log a rejected identity token; this is the only place decode errors end up
    pub fn log_decode_failed(error: &DecodeError) {
        warn!("❌ Google identity token rejected: {error}");
    }

    pub fn log_existence_result(email: &str, exists: bool) {
        if exists {
            info!("Account exists for {email}, signing in with identity token");
        } else {
            info!("No account for {email}, waiting for a password before registering");
        }
    }

    pub fn log_existence_failed(email: &str, error: &RemoteError) {
        warn!("❌ Account existence check failed for {email}: {error}");
    }

    pub fn log_transition(generation: u64, from: &FlowState, to: &FlowState) {
        debug!(
            "Flow #{generation}: {} -> {}",
            from.name(),
            to.name()
        );
    }

    pub fn log_superseded(step: &str, generation: u64, current: u64) {
        debug!("Discarding {step} result from flow #{generation}, flow is now #{current}");
    }

    pub fn log_session_request(operation: &str, email: &str) {
        info!("🔄 Requesting {operation} for {email}");
    }

    pub fn log_session_resolved(operation: &str, email: &str, role: Role) {
        info!("✅ {operation} succeeded for {email} (role: {role})");
    }

    pub fn log_session_failed(operation: &str, email: &str, error: &RemoteError) {
        warn!("❌ {operation} failed for {email}: {error}");
    }
}
