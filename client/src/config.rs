//! Auth configuration parsed from environment variables.
//!
//! Both the in-app controller and the edge gateway read these, so the login
//! path, landing path and protected prefixes cannot disagree between them.
//!
//! Optional:
//! - `LOGIN_PATH`: default `/admin/login`
//! - `LANDING_PATH`: default `/admin/overview`
//! - `PROTECTED_PREFIXES`: comma-separated, default the admin sections
//! - `PERMISSION_FALLBACK_PATH`: default `/admin/overview`
//! - `PERMISSION_MAP_FILE`: YAML permission tree, default none
//! - `AUTH_CONFIRM_TIMEOUT_MS`: default 3000
//! - `LOGOUT_REDIRECT_DELAY_MS`: default 500

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use session::routes::{DEFAULT_LANDING_PATH, DEFAULT_LOGIN_PATH, DEFAULT_PROTECTED_PREFIXES};
use session::{PermissionMap, RouteTable};

use crate::net::interceptor::DEFAULT_REDIRECT_DELAY;
use crate::state::auth::{AuthConfig, DEFAULT_CONFIRM_TIMEOUT, DEFAULT_FALLBACK_PATH};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must start with '/': {value}")]
    NotAPath { key: &'static str, value: String },

    #[error("failed to read permission map {path}: {source}")]
    PermissionMapRead { path: PathBuf, source: std::io::Error },

    #[error("failed to parse permission map {path}: {source}")]
    PermissionMapParse { path: PathBuf, source: serde_yaml::Error },
}

// =============================================================================
// ENV HELPERS
// =============================================================================

/// Trimmed, non-empty value of `key`.
#[must_use]
pub fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|raw| raw.trim().to_owned())
        .filter(|value| !value.is_empty())
}

#[must_use]
pub fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

/// Parsed value of `key`, or `default` when unset or malformed.
#[must_use]
pub fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn env_path(key: &'static str, default: &str) -> Result<String, ConfigError> {
    match env_string(key) {
        None => Ok(default.to_owned()),
        Some(value) if value.starts_with('/') => Ok(value),
        Some(value) => Err(ConfigError::NotAPath { key, value }),
    }
}

/// Split a comma-separated prefix list, dropping blanks.
#[must_use]
pub fn parse_prefix_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|prefix| !prefix.is_empty())
        .map(str::to_owned)
        .collect()
}

// =============================================================================
// LOADERS
// =============================================================================

/// Load a YAML permission tree.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read or parsed.
pub fn load_permission_map(path: &Path) -> Result<PermissionMap, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::PermissionMapRead { path: path.to_owned(), source })?;
    serde_yaml::from_str(&raw).map_err(|source| ConfigError::PermissionMapParse { path: path.to_owned(), source })
}

/// Route table from `LOGIN_PATH`, `LANDING_PATH` and `PROTECTED_PREFIXES`.
///
/// # Errors
///
/// Returns [`ConfigError::NotAPath`] for a login or landing path that is not
/// absolute, or a prefix list with a relative entry.
pub fn route_table_from_env() -> Result<RouteTable, ConfigError> {
    let login = env_path("LOGIN_PATH", DEFAULT_LOGIN_PATH)?;
    let landing = env_path("LANDING_PATH", DEFAULT_LANDING_PATH)?;
    let prefixes = match env_string("PROTECTED_PREFIXES") {
        Some(raw) => parse_prefix_list(&raw),
        None => DEFAULT_PROTECTED_PREFIXES.iter().map(|p| (*p).to_owned()).collect(),
    };
    if let Some(bad) = prefixes.iter().find(|p| !p.starts_with('/')) {
        return Err(ConfigError::NotAPath { key: "PROTECTED_PREFIXES", value: bad.clone() });
    }
    Ok(RouteTable::new(&login, &landing, prefixes.iter().map(String::as_str)))
}

/// Delay between a 401/419 and the redirect to the login form.
#[must_use]
pub fn redirect_delay_from_env() -> Duration {
    Duration::from_millis(env_parse(
        "LOGOUT_REDIRECT_DELAY_MS",
        u64::try_from(DEFAULT_REDIRECT_DELAY.as_millis()).unwrap_or(u64::MAX),
    ))
}

impl AuthConfig {
    /// Build the auth config from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for malformed paths or an unreadable
    /// permission map.
    pub fn from_env() -> Result<Self, ConfigError> {
        let routes = route_table_from_env()?;
        let permissions = match env_string("PERMISSION_MAP_FILE") {
            Some(path) => load_permission_map(Path::new(&path))?,
            None => PermissionMap::default(),
        };
        let confirm_timeout = Duration::from_millis(env_parse(
            "AUTH_CONFIRM_TIMEOUT_MS",
            u64::try_from(DEFAULT_CONFIRM_TIMEOUT.as_millis()).unwrap_or(u64::MAX),
        ));
        tracing::debug!(
            login = routes.login_path(),
            prefixes = routes.protected_prefixes().len(),
            rules = permissions.len(),
            "auth config loaded"
        );

        Ok(Self {
            routes,
            permissions,
            fallback_path: env_path("PERMISSION_FALLBACK_PATH", DEFAULT_FALLBACK_PATH)?,
            confirm_timeout,
            ..Self::default()
        })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
