//! Reverse proxy to the upstream site for everything the gateway does not
//! serve itself. Requests only get here after the edge guard let them through.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::state::AppState;

const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Connection-scoped headers, plus length headers the HTTP stacks recompute.
const STRIPPED_HEADERS: &[&str] = &[
    "connection",
    "content-length",
    "host",
    "keep-alive",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

fn strip_headers(headers: &mut HeaderMap) {
    for name in STRIPPED_HEADERS {
        headers.remove(*name);
    }
}

pub async fn forward(State(state): State<AppState>, request: Request) -> Response {
    let Some(upstream) = state.config.upstream_url.as_deref() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let (parts, body) = request.into_parts();
    let path_and_query = parts.uri.path_and_query().map_or("/", |pq| pq.as_str());
    let url = format!("{upstream}{path_and_query}");
    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(error = %err, "proxy request body rejected");
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };
    let mut headers = parts.headers;
    strip_headers(&mut headers);

    let upstream_response = match state
        .http
        .request(parts.method, &url)
        .headers(headers)
        .body(body)
        .send()
        .await
    {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(error = %err, %url, "upstream request failed");
            return StatusCode::BAD_GATEWAY.into_response();
        }
    };

    let status = upstream_response.status();
    let mut headers = upstream_response.headers().clone();
    strip_headers(&mut headers);
    match upstream_response.bytes().await {
        Ok(bytes) => (status, headers, Body::from(bytes)).into_response(),
        Err(err) => {
            tracing::error!(error = %err, %url, "upstream body read failed");
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}

#[cfg(test)]
#[path = "proxy_test.rs"]
mod tests;
