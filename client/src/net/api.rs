//! HTTP client for the external auth API.
//!
//! Thin wrapper over the four auth endpoints. Response parsing lives in pure
//! functions (`parse_envelope`, `grant_from_login`) for testability.
//!
//! ERROR HANDLING
//! ==============
//! Every failure comes back as an [`ApiError`] value; nothing here panics.
//! Authenticated calls report their status to the [`SessionInterceptor`] so a
//! 401/419 ends the session app-wide. Login is not reported: a wrong password
//! is not a session ending.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use session::{
    ApiEnvelope, ApiError, AuthApi, AuthenticatedUser, Clock, Credentials, RetryPolicy, SessionGrant, SystemClock,
};

use super::interceptor::SessionInterceptor;
use crate::retry::retry_with_backoff;

const REQUEST_TIMEOUT_SECS: u64 = 15;
const CONNECT_TIMEOUT_SECS: u64 = 5;

pub const LOGIN_PATH: &str = "/auth/login";
pub const LOGOUT_PATH: &str = "/auth/logout";
pub const REFRESH_PATH: &str = "/auth/refresh";
pub const CURRENT_USER_PATH: &str = "/auth/me";

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpAuthApi {
    http: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
    clock: Arc<dyn Clock>,
    interceptor: Option<SessionInterceptor>,
}

impl HttpAuthApi {
    /// Build a client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            retry: RetryPolicy::default(),
            clock: Arc::new(SystemClock),
            interceptor: None,
        })
    }

    #[must_use]
    pub fn with_interceptor(mut self, interceptor: SessionInterceptor) -> Self {
        self.interceptor = Some(interceptor);
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Send a request and return `(status, body)`.
    async fn send(&self, request: reqwest::RequestBuilder, intercept: bool) -> Result<(u16, String), ApiError> {
        let response = request
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        if intercept {
            if let Some(interceptor) = &self.interceptor {
                interceptor.observe(status);
            }
        }
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        tracing::debug!(status, "auth api responded");
        Ok((status, body))
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, credentials: &Credentials) -> Result<SessionGrant, ApiError> {
        let request = self.http.post(self.endpoint(LOGIN_PATH)).json(credentials);
        let (status, body) = self.send(request, false).await?;
        let data: LoginData = parse_envelope(status, &body)?;
        grant_from_login(data, self.clock.now_ms())
    }

    async fn logout(&self, token: &str) -> Result<(), ApiError> {
        let request = self.http.post(self.endpoint(LOGOUT_PATH)).bearer_auth(token);
        let (status, body) = self.send(request, true).await?;
        if (200..300).contains(&status) {
            Ok(())
        } else {
            Err(ApiError::from_status(status, error_message(&body)))
        }
    }

    async fn refresh(&self, token: &str) -> Result<SessionGrant, ApiError> {
        let this = self;
        retry_with_backoff(self.retry, move || async move {
            let request = this.http.post(this.endpoint(REFRESH_PATH)).bearer_auth(token);
            let (status, body) = this.send(request, true).await?;
            let data: LoginData = parse_envelope(status, &body)?;
            grant_from_login(data, this.clock.now_ms())
        })
        .await
    }

    async fn current_user(&self, token: &str) -> Result<AuthenticatedUser, ApiError> {
        let request = self.http.get(self.endpoint(CURRENT_USER_PATH)).bearer_auth(token);
        let (status, body) = self.send(request, true).await?;
        parse_envelope(status, &body)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

/// Payload of a login or refresh response.
#[derive(Debug, Deserialize)]
pub(crate) struct LoginData {
    #[serde(alias = "access_token")]
    token: String,
    /// Epoch milliseconds.
    #[serde(default)]
    expires_at: Option<i64>,
    /// Seconds from now.
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    user: Option<AuthenticatedUser>,
}

// =============================================================================
// PARSING
// =============================================================================

/// Unwrap the `data` of a successful envelope, or classify the failure.
pub(crate) fn parse_envelope<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, ApiError> {
    if !(200..300).contains(&status) {
        return Err(ApiError::from_status(status, error_message(body)));
    }
    let envelope: ApiEnvelope<T> = serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;
    envelope
        .data
        .ok_or_else(|| ApiError::Decode(format!("response has no data: {}", envelope.message)))
}

/// Best-effort error text: the envelope message, else the raw body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ApiEnvelope<serde_json::Value>>(body) {
        Ok(envelope) if !envelope.message.is_empty() => envelope.message,
        _ => body.trim().to_owned(),
    }
}

/// Turn a login payload into a grant with an absolute expiry.
pub(crate) fn grant_from_login(data: LoginData, now_ms: i64) -> Result<SessionGrant, ApiError> {
    if data.token.trim().is_empty() {
        return Err(ApiError::Decode("login response has an empty token".into()));
    }
    let expires_at = data
        .expires_at
        .or_else(|| data.expires_in.map(|secs| now_ms.saturating_add(secs.saturating_mul(1_000))))
        .ok_or_else(|| ApiError::Decode("login response has no expiry".into()))?;
    Ok(SessionGrant { token: data.token, expires_at, user: data.user })
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
