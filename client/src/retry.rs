//! Async retry loop over `session::retry::RetryPolicy`.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use session::{ApiError, RetryPolicy};

/// Run `op` until it succeeds, fails permanently, or runs out of attempts.
///
/// Decode failures are never retried: the server answered, just not in a
/// shape we understand.
///
/// # Errors
///
/// Returns the last error from `op`.
pub async fn retry_with_backoff<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if is_retryable(&policy, attempt, &err) => {
                let delay = jittered(policy.delay_for(attempt));
                tracing::warn!(attempt, ?delay, error = %err, "api call failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

fn is_retryable(policy: &RetryPolicy, attempt: u32, err: &ApiError) -> bool {
    match err {
        ApiError::Decode(_) => false,
        _ => policy.should_retry(attempt, err.status()),
    }
}

/// Add up to 25% random spread so simultaneous clients do not retry in step.
fn jittered(delay: Duration) -> Duration {
    let spread = u64::try_from(delay.as_millis() / 4).unwrap_or(u64::MAX);
    if spread == 0 {
        return delay;
    }
    delay + Duration::from_millis(rand::rng().random_range(0..=spread))
}

#[cfg(test)]
#[path = "retry_test.rs"]
mod tests;
