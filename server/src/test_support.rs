//! Stub auth API and state builders for router tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, header};
use client::state::auth::AuthConfig;
use session::{ApiError, AuthApi, AuthenticatedUser, Credentials, ManualClock, PermissionMap, SessionGrant, codec};
use session::validate::{EXPIRES_AT_KEY, TOKEN_KEY};

use crate::config::GatewayConfig;
use crate::state::AppState;

pub const NOW: i64 = 1_700_000_000_000;
pub const HOUR_MS: i64 = 3_600_000;

pub fn user(permissions: &[&str]) -> AuthenticatedUser {
    AuthenticatedUser {
        id: "u1".into(),
        name: "Ada".into(),
        email: "ada@example.com".into(),
        avatar: None,
        permissions: permissions.iter().map(|p| (*p).to_owned()).collect(),
    }
}

/// Accepts password `secret` and token `good`; rejects everything else
/// with `reject_status`.
pub struct StubApi {
    pub permissions: Vec<&'static str>,
    pub reject_status: u16,
    pub logout_calls: AtomicU32,
}

impl Default for StubApi {
    fn default() -> Self {
        Self { permissions: Vec::new(), reject_status: 401, logout_calls: AtomicU32::new(0) }
    }
}

impl StubApi {
    fn check(&self, token: &str) -> Result<(), ApiError> {
        if token == "good" {
            Ok(())
        } else {
            Err(ApiError::from_status(self.reject_status, "Unauthenticated."))
        }
    }
}

#[async_trait]
impl AuthApi for StubApi {
    async fn login(&self, credentials: &Credentials) -> Result<SessionGrant, ApiError> {
        if credentials.password != "secret" {
            return Err(ApiError::Rejected { status: 401 });
        }
        Ok(SessionGrant { token: "good".into(), expires_at: NOW + HOUR_MS, user: Some(user(&self.permissions)) })
    }

    async fn logout(&self, token: &str) -> Result<(), ApiError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        self.check(token)
    }

    async fn refresh(&self, token: &str) -> Result<SessionGrant, ApiError> {
        self.check(token)?;
        Ok(SessionGrant { token: "good".into(), expires_at: NOW + 2 * HOUR_MS, user: None })
    }

    async fn current_user(&self, token: &str) -> Result<AuthenticatedUser, ApiError> {
        self.check(token)?;
        Ok(user(&self.permissions))
    }
}

pub fn config(upstream_url: Option<String>) -> GatewayConfig {
    GatewayConfig {
        port: 0,
        api_base_url: "http://api.invalid".into(),
        upstream_url,
        cookie_secure: false,
        auth: AuthConfig {
            permissions: PermissionMap::from_pairs([("/admin/roles", Some("roles.view"))]),
            ..AuthConfig::default()
        },
    }
}

pub fn state_with(api: Arc<StubApi>, upstream_url: Option<String>) -> AppState {
    AppState::new(config(upstream_url), api)
        .expect("state")
        .with_clock(Arc::new(ManualClock::new(NOW)))
}

pub fn state() -> AppState {
    state_with(Arc::new(StubApi::default()), None)
}

/// `Cookie` header for a session holding `token` until `expires_at`.
pub fn session_cookie(token: &str, expires_at: i64) -> String {
    format!("{TOKEN_KEY}={}; {EXPIRES_AT_KEY}={expires_at}", codec::obfuscate(token))
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("request")
}

pub fn post_json(uri: &str, cookie: Option<&str>, body: &serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

pub fn location(response: &Response<Body>) -> Option<&str> {
    response.headers().get(header::LOCATION).and_then(|v| v.to_str().ok())
}

/// Every `Set-Cookie` header, as `name=value` prefixes plus attributes.
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_owned)
        .collect()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}
