//! Session cookies.
//!
//! The edge reads the same two keys the app keeps in storage: the obfuscated
//! token under `access-token` and the expiry (epoch milliseconds) under
//! `token-expires-at`. Both are set and cleared together.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use session::validate::{EXPIRES_AT_KEY, SessionCheck, TOKEN_KEY, check_session};
use session::{SessionGrant, codec};
use time::Duration;

fn build(name: &'static str, value: String, secure: bool, max_age: Duration) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(max_age)
        .build()
}

/// Add both session cookies for `grant`, living until it expires.
#[must_use]
pub fn set_session(jar: CookieJar, grant: &SessionGrant, secure: bool, now_ms: i64) -> CookieJar {
    let max_age = Duration::milliseconds(grant.expires_at.saturating_sub(now_ms).max(0));
    jar.add(build(TOKEN_KEY, codec::obfuscate(&grant.token), secure, max_age))
        .add(build(EXPIRES_AT_KEY, grant.expires_at.to_string(), secure, max_age))
}

/// Expire both session cookies.
#[must_use]
pub fn clear_session(jar: CookieJar, secure: bool) -> CookieJar {
    jar.add(build(TOKEN_KEY, String::new(), secure, Duration::ZERO))
        .add(build(EXPIRES_AT_KEY, String::new(), secure, Duration::ZERO))
}

/// Presence and expiry check; the token itself is not verified here.
#[must_use]
pub fn check(jar: &CookieJar, now_ms: i64) -> SessionCheck {
    check_session(
        jar.get(TOKEN_KEY).map(Cookie::value),
        jar.get(EXPIRES_AT_KEY).map(Cookie::value),
        now_ms,
    )
}

/// The decoded token, if the cookie pair is valid and the token decodes.
#[must_use]
pub fn token(jar: &CookieJar, now_ms: i64) -> Option<String> {
    if !check(jar, now_ms).is_valid() {
        return None;
    }
    let encoded = jar.get(TOKEN_KEY)?.value();
    match codec::reveal(encoded) {
        Ok(token) => Some(token),
        Err(err) => {
            tracing::warn!(error = %err, "undecodable session cookie");
            None
        }
    }
}

#[cfg(test)]
#[path = "cookies_test.rs"]
mod tests;
