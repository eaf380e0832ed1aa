//! Backoff and token-expiry arithmetic.
//!
//! Pure functions only; the async retry loop lives with the HTTP client.

use std::time::Duration;

use crate::validate::is_session_rejection;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(250);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(5);
/// Refresh a token once it is this close to expiring.
pub const DEFAULT_REFRESH_WINDOW: Duration = Duration::from_secs(5 * 60);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self { max_attempts: 1, ..Self::default() }
    }

    /// Delay before retry number `attempt` (0-based): `base * 2^attempt`,
    /// capped at `max_delay`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    /// Whether a failed attempt (0-based) should be retried.
    ///
    /// `status` is `None` for transport failures. Session rejections and other
    /// client errors are final; 408, 429 and 5xx are retried.
    #[must_use]
    pub fn should_retry(&self, attempt: u32, status: Option<u16>) -> bool {
        if attempt.saturating_add(1) >= self.max_attempts {
            return false;
        }
        match status {
            None => true,
            Some(status) if is_session_rejection(status) => false,
            Some(408 | 429) => true,
            Some(status) => (500..600).contains(&status),
        }
    }
}

/// Time left before `expires_at`, or `None` once it has passed.
#[must_use]
pub fn time_until_expiry(expires_at_ms: i64, now_ms: i64) -> Option<Duration> {
    let remaining = expires_at_ms.checked_sub(now_ms)?;
    u64::try_from(remaining)
        .map_or(None, |ms| (ms > 0).then(|| Duration::from_millis(ms)))
}

/// Whether the token expires within `window` (or already has).
#[must_use]
pub fn expires_within(expires_at_ms: i64, now_ms: i64, window: Duration) -> bool {
    time_until_expiry(expires_at_ms, now_ms).is_none_or(|left| left <= window)
}

/// Whether a still-valid token is close enough to expiry to refresh.
#[must_use]
pub fn should_refresh(expires_at_ms: i64, now_ms: i64, window: Duration) -> bool {
    time_until_expiry(expires_at_ms, now_ms).is_some_and(|left| left <= window)
}

#[cfg(test)]
#[path = "retry_test.rs"]
mod tests;
