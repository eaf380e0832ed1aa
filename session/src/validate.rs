//! Session validity rules shared by the edge guard and the in-app controller.
//!
//! A session is a token plus an expiry timestamp. Both are read from the same
//! keys whether they come from cookies or from browser storage, and both are
//! judged by [`check_session`]. No signature is verified here; the external
//! API decides whether a token is genuine.

use serde::Serialize;

/// Storage key and cookie name for the obfuscated session token.
pub const TOKEN_KEY: &str = "access-token";
/// Storage key and cookie name for the expiry timestamp (epoch milliseconds).
pub const EXPIRES_AT_KEY: &str = "token-expires-at";
/// Transient storage key written to signal a logout to other tabs.
pub const LOGOUT_SIGNAL_KEY: &str = "logout-signal";

/// Result of inspecting a stored token/expiry pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionCheck {
    /// Token present and `now < expires_at`.
    Valid { expires_at: i64 },
    /// Token or expiry missing, empty, or unparseable.
    NoSession,
    /// Token present but the expiry has passed.
    Expired,
}

impl SessionCheck {
    #[must_use]
    pub fn is_valid(self) -> bool {
        matches!(self, Self::Valid { .. })
    }
}

/// Why a session ended. Every variant leads to the same place (the login
/// form); the reason exists for logs and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum SessionEnd {
    #[error("no session")]
    NoSession,
    #[error("session expired")]
    Expired,
    #[error("session rejected by server ({status})")]
    ServerRejected { status: u16 },
    #[error("session confirmation timed out")]
    Timeout,
}

/// Parse a stored expiry timestamp.
#[must_use]
pub fn parse_expires_at(raw: &str) -> Option<i64> {
    match raw.trim().parse::<i64>() {
        Ok(value) => Some(value),
        Err(_) => None,
    }
}

/// Judge a token/expiry pair against `now_ms`.
///
/// A token without an expiry, or an expiry without a token, is no session.
#[must_use]
pub fn check_session(token: Option<&str>, expires_at: Option<&str>, now_ms: i64) -> SessionCheck {
    if !token.is_some_and(|t| !t.trim().is_empty()) {
        return SessionCheck::NoSession;
    }
    let Some(expires_at) = expires_at.and_then(parse_expires_at) else {
        return SessionCheck::NoSession;
    };
    if now_ms < expires_at {
        SessionCheck::Valid { expires_at }
    } else {
        SessionCheck::Expired
    }
}

/// Whether an API status means the server no longer accepts the session.
#[must_use]
pub fn is_session_rejection(status: u16) -> bool {
    matches!(status, 401 | 419)
}

#[cfg(test)]
#[path = "validate_test.rs"]
mod tests;
