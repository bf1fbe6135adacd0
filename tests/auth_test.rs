//! Auth flow integration tests.
//!
//! Covers: protected routes rejecting anonymous requests, login with good
//! and bad credentials, the session cookie granting access, the identity
//! upsert surfacing through /api/auth/user, and logout ending the session.

mod common;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::json;
use std::sync::LazyLock;
use tower::ServiceExt;

use common::*;
use tradelog::adapters::web::build_router;
use tradelog::ports::config_port::ConfigPort;

const TEST_USERNAME: &str = "trader";
const TEST_PASSWORD: &str = "open-sesame-123";

static TEST_PASSWORD_HASH: LazyLock<String> = LazyLock::new(|| {
    use argon2::{Algorithm, Argon2, Params, PasswordHasher, Version, password_hash::SaltString};
    let salt = SaltString::from_b64("dGVzdHNhbHR0ZXN0c2FsdA").unwrap();
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default());
    argon2
        .hash_password(TEST_PASSWORD.as_bytes(), &salt)
        .unwrap()
        .to_string()
});

struct AuthTestConfig;

impl ConfigPort for AuthTestConfig {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        match (section, key) {
            ("auth", "username") => Some(TEST_USERNAME.to_string()),
            ("auth", "password_hash") => Some(TEST_PASSWORD_HASH.clone()),
            ("auth", "email") => Some("trader@example.com".to_string()),
            ("auth", "display_name") => Some("Test Trader".to_string()),
            ("auth", "session_secret") => Some("ab".repeat(64)),
            _ => None,
        }
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        match (section, key) {
            ("auth", "session_lifetime") => 86_400,
            _ => default,
        }
    }
}

fn create_auth_app() -> Router {
    build_router(test_state(), &AuthTestConfig).unwrap()
}

fn login_request(username: &str, password: &str) -> Request<Body> {
    json_request(
        "POST",
        "/api/auth/login",
        &json!({"username": username, "password": password}),
    )
}

fn extract_cookies(response: &axum::http::Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .collect()
}

fn build_cookie_header(set_cookies: &[String]) -> String {
    set_cookies
        .iter()
        .map(|sc| sc.split(';').next().unwrap_or("").to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

async fn login(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(login_request(TEST_USERNAME, TEST_PASSWORD))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    build_cookie_header(&extract_cookies(&response))
}

fn with_cookie(mut request: Request<Body>, cookie: &str) -> Request<Body> {
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    request
}

mod auth_tests {
    use super::*;

    #[tokio::test]
    async fn anonymous_request_to_protected_route_is_401() {
        let app = create_auth_app();

        let response = app.oneshot(get_request("/api/trades")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn anonymous_auth_user_is_401() {
        let app = create_auth_app();

        let response = app.oneshot(get_request("/api/auth/user")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_401() {
        let app = create_auth_app();

        let response = app
            .oneshot(login_request(TEST_USERNAME, "wrong-password"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = body_json(response).await;
        assert_eq!(body["message"], "invalid credentials");
    }

    #[tokio::test]
    async fn login_with_unknown_user_is_401() {
        let app = create_auth_app();

        let response = app
            .oneshot(login_request("stranger", TEST_PASSWORD))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_returns_identity_record() {
        let app = create_auth_app();

        let response = app
            .oneshot(login_request(TEST_USERNAME, TEST_PASSWORD))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["id"], TEST_USERNAME);
        assert_eq!(body["email"], "trader@example.com");
        assert_eq!(body["name"], "Test Trader");
    }

    #[tokio::test]
    async fn session_cookie_grants_access_to_journal() {
        let app = create_auth_app();
        let cookie = login(&app).await;

        let response = app
            .oneshot(with_cookie(get_request("/api/trades"), &cookie))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn auth_user_reads_upserted_record() {
        let app = create_auth_app();
        let cookie = login(&app).await;

        let response = app
            .oneshot(with_cookie(get_request("/api/auth/user"), &cookie))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["id"], TEST_USERNAME);
        assert_eq!(body["email"], "trader@example.com");
    }

    #[tokio::test]
    async fn logout_ends_the_session() {
        let app = create_auth_app();
        let cookie = login(&app).await;

        let response = app
            .clone()
            .oneshot(with_cookie(
                json_request("POST", "/api/auth/logout", &json!({})),
                &cookie,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(with_cookie(get_request("/api/trades"), &cookie))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn authenticated_crud_roundtrip() {
        let app = create_auth_app();
        let cookie = login(&app).await;

        let response = app
            .clone()
            .oneshot(with_cookie(
                json_request(
                    "POST",
                    "/api/trades",
                    &trade_payload("EUR/USD", Some("1.1050"), "2024-03-01T09:30:00Z"),
                ),
                &cookie,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let id = body_json(response).await["id"].as_i64().unwrap();

        let response = app
            .oneshot(with_cookie(
                get_request(&format!("/api/trades/{id}")),
                &cookie,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["pnl"], "5.00");
    }
}
