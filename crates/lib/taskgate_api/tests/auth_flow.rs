//! End-to-end auth flows against the router with an in-memory store.

mod common;

use axum::http::{Method, StatusCode, header};
use common::{PASSWORD, TestApp, bare_request, into_json, json_request, refresh_cookie, reset_secret, set_cookie_header};
use serde_json::json;

#[tokio::test]
async fn ping_reports_running() {
    let app = TestApp::new();
    let (status, body) = into_json(app.send(bare_request(Method::GET, "/api/ping", None)).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "response": "pong", "serverStatus": "running" }));
}

#[tokio::test]
async fn register_then_duplicate_is_conflict() {
    let app = TestApp::new();
    let body = json!({
        "firstName": "Ada",
        "lastName": "Lovelace",
        "email": "ada@example.com",
        "password": PASSWORD,
    });
    let (status, created) = app.post_json("/api/auth/register", body).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["success"], true);
    assert_eq!(created["user"]["email"], "ada@example.com");
    assert!(created["user"].get("passwordHash").is_none());

    let (status, err) = app
        .post_json(
            "/api/auth/register",
            json!({
                "firstName": "Ada",
                "lastName": "Lovelace",
                "email": "  ADA@example.com ",
                "password": PASSWORD,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"], "conflict");
}

#[tokio::test]
async fn register_rejects_missing_fields_and_weak_password() {
    let app = TestApp::new();
    let (status, err) = app
        .post_json(
            "/api/auth/register",
            json!({ "lastName": "L", "email": "a@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["message"], "First name is required");

    let (status, err) = app
        .post_json(
            "/api/auth/register",
            json!({ "firstName": "A", "lastName": "L", "email": "a@example.com", "password": "password" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "validation_error");
}

#[tokio::test]
async fn login_failures_are_uniform() {
    let app = TestApp::new();
    app.signup("grace@example.com").await;

    let (s1, wrong_pw) = app
        .post_json(
            "/api/auth/login",
            json!({ "email": "grace@example.com", "password": "Wr0ng$pass" }),
        )
        .await;
    let (s2, unknown) = app
        .post_json(
            "/api/auth/login",
            json!({ "email": "nobody@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(s1, StatusCode::UNAUTHORIZED);
    assert_eq!(s2, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pw, unknown);
    assert_eq!(wrong_pw["error"], "invalid_credentials");
}

#[tokio::test]
async fn login_sets_http_only_refresh_cookie() {
    let app = TestApp::new();
    app.signup("alan@example.com").await;
    let resp = app
        .send(json_request(
            Method::POST,
            "/api/auth/login",
            json!({ "email": "alan@example.com", "password": PASSWORD }),
            None,
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = set_cookie_header(&resp).expect("set-cookie");
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=None"));
    assert!(cookie.contains("Path=/api/auth"));
    let (_, body) = into_json(resp).await;
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["expiresIn"], 900);
    assert!(!body.to_string().contains("refreshToken"));
}

#[tokio::test]
async fn refresh_rotates_cookie() {
    let app = TestApp::new();
    let (_, cookie) = app.signup("rot@example.com").await;

    let req = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/auth/refresh-token")
        .header(header::COOKIE, &cookie)
        .body(axum::body::Body::empty())
        .unwrap();
    let resp = app.send(req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let rotated = refresh_cookie(&resp).expect("rotated cookie");
    assert_ne!(rotated, cookie);
    let (_, body) = into_json(resp).await;
    let access = body["token"].as_str().unwrap().to_string();

    let (status, me) =
        into_json(app.send(bare_request(Method::GET, "/api/auth/me", Some(&access))).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user"]["email"], "rot@example.com");
}

#[tokio::test]
async fn refresh_without_cookie_asks_for_logout() {
    let app = TestApp::new();
    let resp = app
        .send(bare_request(Method::POST, "/api/auth/refresh-token", None))
        .await;
    assert!(set_cookie_header(&resp).is_none());
    let (status, body) = into_json(resp).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "no_refresh_token");
    assert_eq!(body["shouldLogout"], true);
}

#[tokio::test]
async fn refresh_with_access_token_is_rejected_and_cleared() {
    let app = TestApp::new();
    let (access, _) = app.signup("mix@example.com").await;

    let req = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/auth/refresh-token")
        .header(header::COOKIE, format!("refreshToken={access}"))
        .body(axum::body::Body::empty())
        .unwrap();
    let resp = app.send(req).await;
    let cleared = set_cookie_header(&resp).expect("cleared cookie");
    assert!(cleared.contains("Max-Age=0"));
    let (status, body) = into_json(resp).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_refresh_token");
    assert_eq!(body["shouldLogout"], true);
}

#[tokio::test]
async fn logout_clears_cookie() {
    let app = TestApp::new();
    let resp = app
        .send(bare_request(Method::POST, "/api/auth/logout", None))
        .await;
    let cleared = set_cookie_header(&resp).expect("cleared cookie");
    assert!(cleared.starts_with("refreshToken=;"));
    let (status, body) = into_json(resp).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn gate_distinguishes_missing_and_invalid_tokens() {
    let app = TestApp::new();
    let (_, refresh) = app.signup("gate@example.com").await;

    let (status, body) =
        into_json(app.send(bare_request(Method::GET, "/api/auth/me", None)).await).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "no_token");

    let (status, body) = into_json(
        app.send(bare_request(Method::GET, "/api/auth/me", Some("not-a-jwt")))
            .await,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");

    // A refresh token is not an access token.
    let refresh_value = refresh.trim_start_matches("refreshToken=");
    let (status, body) = into_json(
        app.send(bare_request(Method::GET, "/api/auth/me", Some(refresh_value)))
            .await,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");
}

#[tokio::test]
async fn password_reset_round_trip_is_single_use() {
    let app = TestApp::new();
    app.signup("reset@example.com").await;

    let (status, body) = app
        .post_json(
            "/api/auth/forgot-password",
            json!({ "email": "Reset@Example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Email sent");
    assert_eq!(app.store.reset_token_count(), 1);

    let sent = app.outbox.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "reset@example.com");
    assert!(sent[0].html.contains("http://localhost:3000/auth/set-new-password?token="));
    let secret = reset_secret(&sent[0].html);
    assert_eq!(secret.len(), 64);

    let new_password = "N3w$ecretPass";
    let (status, _) = app
        .post_json(
            "/api/auth/set-new-password",
            json!({ "token": secret, "password": new_password }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.store.reset_token_count(), 0);

    app.login("reset@example.com", new_password).await;
    let (status, _) = app
        .post_json(
            "/api/auth/login",
            json!({ "email": "reset@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .post_json(
            "/api/auth/set-new-password",
            json!({ "token": secret, "password": "An0ther$Pass" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_token");
}

#[tokio::test]
async fn reset_with_weak_password_keeps_token() {
    let app = TestApp::new();
    app.signup("weak@example.com").await;
    app.post_json("/api/auth/forgot-password", json!({ "email": "weak@example.com" }))
        .await;
    let secret = reset_secret(&app.outbox.sent()[0].html);

    let (status, body) = app
        .post_json(
            "/api/auth/set-new-password",
            json!({ "token": secret, "password": "short" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(app.store.reset_token_count(), 1);
}

#[tokio::test]
async fn forgot_password_for_unknown_address_looks_the_same() {
    let app = TestApp::new();
    let (status, body) = app
        .post_json(
            "/api/auth/forgot-password",
            json!({ "email": "ghost@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Email sent");
    assert!(app.outbox.sent().is_empty());
    assert_eq!(app.store.reset_token_count(), 0);
}

#[tokio::test]
async fn forgot_password_normalizes_the_address() {
    let app = TestApp::new();
    app.signup("case@example.com").await;
    let (status, _) = app
        .post_json(
            "/api/auth/forgot-password",
            json!({ "email": "  CASE@Example.com " }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.outbox.sent().len(), 1);
    assert_eq!(app.outbox.sent()[0].to, "case@example.com");

    let (status, body) = app
        .post_json("/api/auth/forgot-password", json!({ "email": "not-an-address" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Please enter a valid email address");
}

#[tokio::test]
async fn forgot_password_survives_mail_failure() {
    let app = TestApp::with_mailer(taskgate_core::notify::OutboxMailer::failing());
    app.signup("bounce@example.com").await;
    let (status, _) = app
        .post_json(
            "/api/auth/forgot-password",
            json!({ "email": "bounce@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.store.reset_token_count(), 1);
}

#[tokio::test]
async fn google_login_creates_once_then_logs_in() {
    let app = TestApp::new();
    let identity = json!({
        "federatedId": "google-123",
        "email": "fed@example.com",
        "firstName": "Fed",
        "lastName": "User",
    });

    let resp = app
        .send(json_request(Method::POST, "/api/auth/google", identity.clone(), None))
        .await;
    assert!(refresh_cookie(&resp).is_some());
    let (status, first) = into_json(resp).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["user"]["federated"], true);

    let (status, second) = app.post_json("/api/auth/google", identity).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["user"]["id"], second["user"]["id"]);
}

#[tokio::test]
async fn google_login_links_existing_password_account() {
    let app = TestApp::new();
    app.signup("both@example.com").await;

    let (status, body) = app
        .post_json(
            "/api/auth/google",
            json!({ "federatedId": "google-456", "email": "both@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["federated"], true);

    // The password still works after linking.
    app.login("both@example.com", PASSWORD).await;
}
