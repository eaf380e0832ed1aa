//! Edge guard: the first, cookie-only redirect decision.
//!
//! SYSTEM CONTEXT
//! ==============
//! Runs before every request reaches a handler or the upstream proxy. It sees
//! only the cookie pair, so it checks presence and expiry and nothing else;
//! the app re-validates against the API once it loads. Protected paths
//! without a valid pair go to the login form with a `redirect` back, and
//! the login form with a valid pair goes to the landing path.
//!
//! An expired pair is cleared on whatever response goes out.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use session::{RouteDecision, SessionCheck};

use crate::cookies;
use crate::state::AppState;

pub async fn edge_guard(State(state): State<AppState>, jar: CookieJar, request: Request, next: Next) -> Response {
    let path_and_query = request
        .uri()
        .path_and_query()
        .map_or_else(|| request.uri().path().to_owned(), |pq| pq.as_str().to_owned());
    let check = cookies::check(&jar, state.now_ms());

    let response = match state.config.auth.routes.decide(&path_and_query, check.is_valid()) {
        RouteDecision::Allow => next.run(request).await,
        RouteDecision::Redirect(target) => {
            tracing::debug!(path = %path_and_query, to = %target, ?check, "edge redirect");
            Redirect::temporary(&target).into_response()
        }
    };

    if check == SessionCheck::Expired {
        tracing::debug!("clearing expired session cookies");
        return (cookies::clear_session(CookieJar::new(), state.config.cookie_secure), response).into_response();
    }
    response
}

#[cfg(test)]
#[path = "middleware_test.rs"]
mod tests;
