//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Session endpoints and the health check are served here; everything else
//! is proxied upstream. The edge guard wraps all of it, so a protected page
//! is redirected before the proxy ever sees the request.

pub mod proxy;
pub mod session;

use axum::Router;
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::middleware::edge_guard;
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/session/login", post(session::login))
        .route("/api/session/logout", post(session::logout))
        .route("/api/session/refresh", post(session::refresh))
        .route("/api/session/me", get(session::me))
        .route("/api/session/access", get(session::access))
        .route("/healthz", get(healthz))
        .fallback(proxy::forward)
        .layer(from_fn_with_state(state.clone(), edge_guard))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
