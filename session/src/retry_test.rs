use super::*;

const NOW: i64 = 1_700_000_000_000;

#[test]
fn delay_doubles_per_attempt() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.delay_for(0), Duration::from_millis(250));
    assert_eq!(policy.delay_for(1), Duration::from_millis(500));
    assert_eq!(policy.delay_for(2), Duration::from_millis(1_000));
}

#[test]
fn delay_is_capped() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.delay_for(10), DEFAULT_MAX_DELAY);
    assert_eq!(policy.delay_for(u32::MAX), DEFAULT_MAX_DELAY);
}

#[test]
fn transport_and_server_errors_retry_until_attempts_run_out() {
    let policy = RetryPolicy::default();
    assert!(policy.should_retry(0, None));
    assert!(policy.should_retry(1, Some(503)));
    assert!(!policy.should_retry(2, Some(503)), "third attempt is the last");
}

#[test]
fn client_errors_and_rejections_never_retry() {
    let policy = RetryPolicy::default();
    for status in [400, 401, 403, 404, 419, 422] {
        assert!(!policy.should_retry(0, Some(status)), "{status}");
    }
}

#[test]
fn throttling_and_timeouts_retry() {
    let policy = RetryPolicy::default();
    assert!(policy.should_retry(0, Some(429)));
    assert!(policy.should_retry(0, Some(408)));
}

#[test]
fn none_policy_never_retries() {
    assert!(!RetryPolicy::none().should_retry(0, None));
}

#[test]
fn time_until_expiry_is_none_once_passed() {
    assert_eq!(time_until_expiry(NOW + 1_500, NOW), Some(Duration::from_millis(1_500)));
    assert_eq!(time_until_expiry(NOW, NOW), None);
    assert_eq!(time_until_expiry(NOW - 1, NOW), None);
    assert_eq!(time_until_expiry(i64::MIN, i64::MAX), None);
}

#[test]
fn expires_within_includes_expired_tokens() {
    let window = Duration::from_secs(60);
    assert!(expires_within(NOW - 10, NOW, window));
    assert!(expires_within(NOW + 60_000, NOW, window));
    assert!(!expires_within(NOW + 60_001, NOW, window));
}

#[test]
fn should_refresh_only_inside_window_and_before_expiry() {
    let window = Duration::from_secs(60);
    assert!(should_refresh(NOW + 30_000, NOW, window));
    assert!(!should_refresh(NOW + 120_000, NOW, window));
    assert!(!should_refresh(NOW - 1, NOW, window), "expired tokens cannot be refreshed");
}
