//! Session gate: the password check every other flow sits behind.

use tracing::{info, warn};

use crate::client::ClientError;
use crate::flow::{RequestSeq, Ticket};

pub const REJECTED_ALERT: &str = "Incorrect password.";
pub const FAILED_ALERT: &str = "An error occurred during login.";

/// How a settled login attempt turned out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated,
    /// Backend said no, or could not be asked. Carries the alert text.
    Alert(String),
    /// Response to an attempt that is no longer current.
    Stale,
}

#[derive(Debug, Default)]
pub struct SessionGate {
    authenticated: bool,
    pub input_password: String,
    submitting: bool,
    seq: RequestSeq,
}

impl SessionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Start a login with the current password input. Returns `None` while a
    /// previous attempt is still outstanding, or once authenticated.
    pub fn begin_login(&mut self) -> Option<(Ticket, String)> {
        if self.submitting || self.authenticated {
            return None;
        }
        self.submitting = true;
        Some((self.seq.issue(), self.input_password.clone()))
    }

    pub fn settle_login(
        &mut self,
        ticket: Ticket,
        outcome: Result<bool, ClientError>,
    ) -> LoginOutcome {
        if !self.seq.is_current(ticket) {
            return LoginOutcome::Stale;
        }
        self.submitting = false;
        match outcome {
            Ok(true) => {
                if !self.authenticated {
                    info!("[session] authenticated");
                }
                self.authenticated = true;
                LoginOutcome::Authenticated
            }
            Ok(false) => {
                info!("[session] password rejected");
                LoginOutcome::Alert(REJECTED_ALERT.to_string())
            }
            Err(e) => {
                warn!("[session] login error: {}", e);
                LoginOutcome::Alert(FAILED_ALERT.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http_failure() -> ClientError {
        ClientError::Status {
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            message: "Login failed".to_string(),
        }
    }

    #[test]
    fn test_accepted_password_authenticates() {
        let mut gate = SessionGate::new();
        gate.input_password = "hunter2".to_string();
        let (ticket, password) = gate.begin_login().unwrap();
        assert_eq!(password, "hunter2");
        assert!(gate.is_submitting());

        assert_eq!(gate.settle_login(ticket, Ok(true)), LoginOutcome::Authenticated);
        assert!(gate.is_authenticated());
        assert!(!gate.is_submitting());

        // No further attempts, and nothing flips it back.
        assert!(gate.begin_login().is_none());
        gate.input_password.clear();
        assert!(gate.is_authenticated());
    }

    #[test]
    fn test_rejected_password_alerts_and_stays_locked() {
        let mut gate = SessionGate::new();
        let (ticket, _) = gate.begin_login().unwrap();
        assert_eq!(
            gate.settle_login(ticket, Ok(false)),
            LoginOutcome::Alert(REJECTED_ALERT.to_string())
        );
        assert!(!gate.is_authenticated());
        assert!(!gate.is_submitting());
        assert!(gate.begin_login().is_some());
    }

    #[test]
    fn test_transport_failure_treated_like_rejection() {
        let mut gate = SessionGate::new();
        let (ticket, _) = gate.begin_login().unwrap();
        assert_eq!(
            gate.settle_login(ticket, Err(http_failure())),
            LoginOutcome::Alert(FAILED_ALERT.to_string())
        );
        assert!(!gate.is_authenticated());
    }

    #[test]
    fn test_duplicate_submit_blocked_while_outstanding() {
        let mut gate = SessionGate::new();
        assert!(gate.begin_login().is_some());
        assert!(gate.begin_login().is_none());
    }

    #[test]
    fn test_empty_password_still_submitted() {
        let mut gate = SessionGate::new();
        let (_, password) = gate.begin_login().unwrap();
        assert!(password.is_empty());
    }
}
