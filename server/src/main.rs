mod config;
mod cookies;
mod middleware;
mod routes;
mod state;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use client::net::api::HttpAuthApi;

#[tokio::main]
async fn main() {
    let dotenv = dotenvy::dotenv();
    tracing_subscriber::fmt::init();
    if let Err(e) = dotenv {
        tracing::debug!(error = %e, "no .env loaded");
    }

    let config = config::GatewayConfig::from_env().expect("invalid gateway configuration");
    let port = config.port;

    let api = HttpAuthApi::new(&config.api_base_url).expect("auth api client init failed");
    let state = state::AppState::new(config, Arc::new(api)).expect("proxy client init failed");

    tracing::info!(
        api = %state.config.api_base_url,
        upstream = state.config.upstream_url.as_deref().unwrap_or("-"),
        secure_cookies = state.config.cookie_secure,
        "gateway configured"
    );

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "edge gateway listening");
    axum::serve(listener, app).await.expect("server failed");
}
