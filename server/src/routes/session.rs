//! Session routes: log in and out through the gateway so the edge cookies
//! stay in step with the API session.
//!
//! ERROR HANDLING
//! ==============
//! API errors keep their status (5xx and transport failures become 502) and
//! come back as a `{status, message}` envelope. A 401/419 from an
//! authenticated call also clears the cookies; a failed login does not, since
//! a wrong password says nothing about an existing session.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use session::{ApiEnvelope, ApiError, AuthenticatedUser, Credentials};

use crate::cookies;
use crate::state::AppState;

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
    /// Decoded `redirect` parameter of the login page.
    #[serde(default)]
    redirect: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: AuthenticatedUser,
    /// Safe post-login destination.
    pub redirect: String,
    pub expires_at: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub expires_at: i64,
}

#[derive(Deserialize)]
pub struct AccessQuery {
    path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessResponse {
    pub path: String,
    pub granted: bool,
    /// Where a denied user should go instead.
    pub redirect: Option<String>,
}

// =============================================================================
// ERRORS
// =============================================================================

fn api_error_status(err: &ApiError) -> StatusCode {
    match err {
        ApiError::Rejected { status } | ApiError::Status { status, .. } => match StatusCode::from_u16(*status) {
            Ok(code) if !code.is_server_error() => code,
            _ => StatusCode::BAD_GATEWAY,
        },
        ApiError::Transport(_) | ApiError::Decode(_) => StatusCode::BAD_GATEWAY,
    }
}

fn api_error_response(err: ApiError) -> Response {
    let status = api_error_status(&err);
    if status == StatusCode::BAD_GATEWAY {
        tracing::error!(error = %err, "auth api call failed");
    } else {
        tracing::debug!(error = %err, %status, "auth api refused");
    }
    let body = ApiEnvelope::<()> { status: status.as_u16(), message: err.to_string(), data: None };
    (status, Json(body)).into_response()
}

/// Error response for a call made with the session; rejections clear it.
fn session_error_response(jar: CookieJar, secure: bool, err: ApiError) -> Response {
    if matches!(err, ApiError::Rejected { .. }) {
        return (cookies::clear_session(jar, secure), api_error_response(err)).into_response();
    }
    api_error_response(err)
}

fn unauthenticated(jar: CookieJar, secure: bool) -> Response {
    (cookies::clear_session(jar, secure), StatusCode::UNAUTHORIZED).into_response()
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `POST /api/session/login`: log in, set both cookies, return the user and
/// where to go next.
pub async fn login(State(state): State<AppState>, jar: CookieJar, Json(body): Json<LoginRequest>) -> Response {
    let credentials = Credentials { email: body.email, password: body.password };
    let grant = match state.api.login(&credentials).await {
        Ok(grant) => grant,
        Err(err) => return api_error_response(err),
    };
    let user = match grant.user.clone() {
        Some(user) => user,
        None => match state.api.current_user(&grant.token).await {
            Ok(user) => user,
            Err(err) => return api_error_response(err),
        },
    };

    let redirect = state.config.auth.routes.safe_redirect_target(body.redirect.as_deref());
    tracing::info!(user_id = %user.id, %redirect, "login");
    let jar = cookies::set_session(jar, &grant, state.config.cookie_secure, state.now_ms());
    (jar, Json(LoginResponse { user, redirect, expires_at: grant.expires_at })).into_response()
}

/// `POST /api/session/logout`: end the API session (best effort) and clear
/// the cookies.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    if let Some(token) = cookies::token(&jar, state.now_ms()) {
        if let Err(err) = state.api.logout(&token).await {
            tracing::warn!(error = %err, "api logout failed, clearing cookies anyway");
        }
    }
    (cookies::clear_session(jar, state.config.cookie_secure), StatusCode::NO_CONTENT).into_response()
}

/// `POST /api/session/refresh`: exchange the token for a fresh one.
pub async fn refresh(State(state): State<AppState>, jar: CookieJar) -> Response {
    let secure = state.config.cookie_secure;
    let Some(token) = cookies::token(&jar, state.now_ms()) else {
        return unauthenticated(jar, secure);
    };
    match state.api.refresh(&token).await {
        Ok(grant) => {
            let jar = cookies::set_session(jar, &grant, secure, state.now_ms());
            (jar, Json(RefreshResponse { expires_at: grant.expires_at })).into_response()
        }
        Err(err) => session_error_response(jar, secure, err),
    }
}

/// `GET /api/session/me`: the current user, straight from the API.
pub async fn me(State(state): State<AppState>, jar: CookieJar) -> Response {
    let secure = state.config.cookie_secure;
    let Some(token) = cookies::token(&jar, state.now_ms()) else {
        return unauthenticated(jar, secure);
    };
    match state.api.current_user(&token).await {
        Ok(user) => Json(user).into_response(),
        Err(err) => session_error_response(jar, secure, err),
    }
}

/// `GET /api/session/access?path=`: whether the current user may open `path`.
pub async fn access(State(state): State<AppState>, jar: CookieJar, Query(query): Query<AccessQuery>) -> Response {
    let secure = state.config.cookie_secure;
    let Some(token) = cookies::token(&jar, state.now_ms()) else {
        return unauthenticated(jar, secure);
    };
    let user = match state.api.current_user(&token).await {
        Ok(user) => user,
        Err(err) => return session_error_response(jar, secure, err),
    };
    let redirect = state.config.auth.permission_redirect(&query.path, &user.permissions);
    Json(AccessResponse { granted: redirect.is_none(), path: query.path, redirect }).into_response()
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
