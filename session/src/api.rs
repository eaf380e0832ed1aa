//! Types and trait seam for the external auth API.
//!
//! The API itself lives elsewhere; this module only fixes what both contexts
//! need from it: a login that yields a token and expiry, a logout, a refresh,
//! and a "who am I" lookup returning the user with their permission list.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::validate::is_session_rejection;

/// Current user as returned by the API. Held in memory only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl AuthenticatedUser {
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// Response envelope used by every API endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

/// Login form payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Token issued by a login or refresh call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionGrant {
    pub token: String,
    /// Epoch milliseconds.
    pub expires_at: i64,
    #[serde(default)]
    pub user: Option<AuthenticatedUser>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// 401 or 419: the session is no longer accepted.
    #[error("session rejected ({status})")]
    Rejected { status: u16 },
    #[error("api returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("api unreachable: {0}")]
    Transport(String),
    #[error("unexpected api response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Classify a non-success status.
    #[must_use]
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        if is_session_rejection(status) {
            Self::Rejected { status }
        } else {
            Self::Status { status, message: message.into() }
        }
    }

    /// HTTP status carried by the error, if the request got that far.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status } | Self::Status { status, .. } => Some(*status),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }
}

/// Operations the external auth API offers.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<SessionGrant, ApiError>;
    async fn logout(&self, token: &str) -> Result<(), ApiError>;
    async fn refresh(&self, token: &str) -> Result<SessionGrant, ApiError>;
    async fn current_user(&self, token: &str) -> Result<AuthenticatedUser, ApiError>;
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
