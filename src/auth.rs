//! Login gate for the chat surface.

use serde::Serialize;
use tracing::{info, warn};

use crate::config::Credentials;
use crate::constants::{LOGIN_FAILURE, LOGIN_SUCCESS};

/// Compares submitted credentials against the configured pair.
#[derive(Debug)]
pub struct Gatekeeper {
    expected: Option<Credentials>,
}

impl Gatekeeper {
    /// Without credentials every attempt is denied.
    pub fn new(expected: Option<Credentials>) -> Self {
        if expected.is_none() {
            warn!("Login credentials are not configured; all logins will be rejected");
        }
        Self { expected }
    }

    pub fn authenticate(&self, username: &str, password: &str) -> bool {
        let accepted = self
            .expected
            .as_ref()
            .is_some_and(|expected| expected.matches(username, password));
        if accepted {
            info!(username, "Login accepted");
        } else {
            warn!(username, "Login rejected");
        }
        accepted
    }

    /// Runs one login attempt against a session's state.
    pub fn login(&self, state: &mut LoginState, username: &str, password: &str) -> LoginOutcome {
        if self.authenticate(username, password) {
            *state = LoginState::LoggedIn;
            LoginOutcome {
                status: LOGIN_SUCCESS.to_string(),
                chat_visible: true,
            }
        } else {
            LoginOutcome {
                status: LOGIN_FAILURE.to_string(),
                chat_visible: state.is_logged_in(),
            }
        }
    }
}

/// `LoggedIn` is terminal: there is no logout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoginState {
    #[default]
    LoggedOut,
    LoggedIn,
}

impl LoginState {
    pub fn is_logged_in(self) -> bool {
        self == LoginState::LoggedIn
    }
}

/// What the login form shows after a submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginOutcome {
    pub status: String,
    pub chat_visible: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gatekeeper() -> Gatekeeper {
        Gatekeeper::new(Credentials::new("alice", "secret"))
    }

    #[test]
    fn test_authenticate_exact_match_only() {
        let gate = gatekeeper();
        assert!(gate.authenticate("alice", "secret"));
        assert!(!gate.authenticate("alice", "wrong"));
        assert!(!gate.authenticate("bob", "secret"));
        assert!(!gate.authenticate("", ""));
        assert!(!gate.authenticate("Alice", "secret"));
        assert!(!gate.authenticate("alice ", "secret"));
        assert!(!gate.authenticate("alice", "secret\n"));
    }

    #[test]
    fn test_unconfigured_gatekeeper_denies_everything() {
        let gate = Gatekeeper::new(None);
        assert!(!gate.authenticate("", ""));
        assert!(!gate.authenticate("alice", "secret"));
    }

    #[test]
    fn test_login_state_starts_logged_out() {
        assert_eq!(LoginState::default(), LoginState::LoggedOut);
        assert!(!LoginState::default().is_logged_in());
    }

    #[test]
    fn test_failed_login_keeps_panel_hidden() {
        let gate = gatekeeper();
        let mut state = LoginState::default();

        let outcome = gate.login(&mut state, "alice", "wrong");

        assert_eq!(state, LoginState::LoggedOut);
        assert_eq!(outcome.status, "ユーザー名またはパスワードが間違っています。");
        assert!(!outcome.chat_visible);
    }

    #[test]
    fn test_successful_login_shows_panel() {
        let gate = gatekeeper();
        let mut state = LoginState::default();

        let outcome = gate.login(&mut state, "alice", "secret");

        assert_eq!(state, LoginState::LoggedIn);
        assert_eq!(outcome.status, "ログイン成功！");
        assert!(outcome.chat_visible);
    }

    #[test]
    fn test_no_input_returns_to_logged_out() {
        let gate = gatekeeper();
        let mut state = LoginState::default();
        gate.login(&mut state, "alice", "secret");

        for (user, password) in [("alice", "wrong"), ("", ""), ("mallory", "secret")] {
            let outcome = gate.login(&mut state, user, password);
            assert_eq!(state, LoginState::LoggedIn);
            assert!(outcome.chat_visible);
            assert_eq!(outcome.status, "ユーザー名またはパスワードが間違っています。");
        }
    }
}
