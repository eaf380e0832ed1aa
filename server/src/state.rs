//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers and the edge guard via the
//! `State` extractor. Everything in it is immutable after startup and cheap
//! to clone.

use std::sync::Arc;
use std::time::Duration;

use session::{AuthApi, Clock, SystemClock};

use crate::config::GatewayConfig;

const PROXY_TIMEOUT_SECS: u64 = 30;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub api: Arc<dyn AuthApi>,
    pub clock: Arc<dyn Clock>,
    /// Client for proxying to the upstream site.
    pub http: reqwest::Client,
}

impl AppState {
    /// # Errors
    ///
    /// Returns the reqwest error if the proxy client cannot be built.
    pub fn new(config: GatewayConfig, api: Arc<dyn AuthApi>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(PROXY_TIMEOUT_SECS))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { config: Arc::new(config), api, clock: Arc::new(SystemClock), http })
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }
}
