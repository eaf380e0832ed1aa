use axum::http::StatusCode;
use tower::ServiceExt;

use crate::routes::app;
use crate::test_support::{HOUR_MS, NOW, get, location, session_cookie, set_cookies, state};

#[tokio::test]
async fn protected_path_without_cookies_redirects_to_login() {
    let response = app(state()).oneshot(get("/admin/overview", None)).await.expect("response");
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/admin/login?redirect=%2Fadmin%2Foverview"));
}

#[tokio::test]
async fn query_string_survives_the_round_trip() {
    let response = app(state()).oneshot(get("/admin/roles?page=2", None)).await.expect("response");
    assert_eq!(location(&response), Some("/admin/login?redirect=%2Fadmin%2Froles%3Fpage%3D2"));
}

#[tokio::test]
async fn login_form_with_valid_cookies_redirects_to_landing() {
    let cookie = session_cookie("good", NOW + HOUR_MS);
    let response = app(state()).oneshot(get("/admin/login", Some(&cookie))).await.expect("response");
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/admin/overview"));
}

#[tokio::test]
async fn valid_cookies_pass_through_to_the_site() {
    let cookie = session_cookie("good", NOW + HOUR_MS);
    let response = app(state()).oneshot(get("/admin/overview", Some(&cookie))).await.expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND, "no upstream configured");
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn expired_cookies_redirect_and_are_cleared() {
    let cookie = session_cookie("good", NOW);
    let response = app(state()).oneshot(get("/admin/users/4", Some(&cookie))).await.expect("response");
    assert_eq!(location(&response), Some("/admin/login?redirect=%2Fadmin%2Fusers%2F4"));

    let cleared = set_cookies(&response);
    assert_eq!(cleared.len(), 2);
    assert!(cleared.iter().any(|c| c.starts_with("access-token=;")));
    assert!(cleared.iter().any(|c| c.starts_with("token-expires-at=;")));
}

#[tokio::test]
async fn token_without_expiry_counts_as_no_session() {
    let cookie = format!("access-token={}", session::codec::obfuscate("good"));
    let response = app(state()).oneshot(get("/admin/blogs", Some(&cookie))).await.expect("response");
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn public_and_unknown_paths_are_not_guarded() {
    for path in ["/", "/about", "/admin/reports", "/healthz"] {
        let response = app(state()).oneshot(get(path, None)).await.expect("response");
        assert_ne!(response.status(), StatusCode::TEMPORARY_REDIRECT, "{path}");
    }
    let response = app(state()).oneshot(get("/healthz", None)).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_form_without_session_renders() {
    let response = app(state()).oneshot(get("/admin/login?redirect=%2Fadmin%2Froles", None)).await.expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND, "served by the upstream site");
}
