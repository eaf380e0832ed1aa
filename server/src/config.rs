//! Gateway configuration parsed from environment variables.

use client::config::{env_bool, env_parse, env_string};
use client::state::auth::AuthConfig;

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    Missing(&'static str),

    #[error(transparent)]
    Auth(#[from] client::config::ConfigError),
}

#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub port: u16,
    /// Root of the external auth API, without a trailing slash.
    pub api_base_url: String,
    /// Site the gateway proxies to once a request passes the guard.
    pub upstream_url: Option<String>,
    pub cookie_secure: bool,
    pub auth: AuthConfig,
}

impl GatewayConfig {
    /// Build the gateway config from environment variables.
    ///
    /// Required:
    /// - `API_BASE_URL`
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `UPSTREAM_URL`: no proxying when absent
    /// - `COOKIE_SECURE`: defaults to whether `API_BASE_URL` is https
    /// - everything `AuthConfig::from_env` reads
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `API_BASE_URL` is missing or the auth
    /// settings are malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_base_url = env_string("API_BASE_URL")
            .ok_or(ConfigError::Missing("API_BASE_URL"))?
            .trim_end_matches('/')
            .to_owned();
        let upstream_url = env_string("UPSTREAM_URL").map(|url| url.trim_end_matches('/').to_owned());
        let cookie_secure = cookie_secure(env_bool("COOKIE_SECURE"), &api_base_url);

        Ok(Self {
            port: env_parse("PORT", DEFAULT_PORT),
            api_base_url,
            upstream_url,
            cookie_secure,
            auth: AuthConfig::from_env()?,
        })
    }
}

/// An explicit setting wins; otherwise cookies are secure when the API is
/// served over https.
pub(crate) fn cookie_secure(explicit: Option<bool>, api_base_url: &str) -> bool {
    explicit.unwrap_or_else(|| api_base_url.starts_with("https://"))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
