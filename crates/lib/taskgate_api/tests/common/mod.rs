//! Shared harness: router over an in-memory store and a capturing mailer.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode, header};
use serde_json::{Value, json};
use taskgate_api::{AppState, config::ApiConfig};
use taskgate_core::notify::OutboxMailer;
use taskgate_core::store::MemoryStore;
use tower::ServiceExt;

pub const PASSWORD: &str = "Sup3r$ecret";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub outbox: Arc<OutboxMailer>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_mailer(OutboxMailer::new())
    }

    pub fn with_mailer(mailer: OutboxMailer) -> Self {
        let store = Arc::new(MemoryStore::new());
        let outbox = Arc::new(mailer);
        let state = AppState::new(ApiConfig::for_tests(), store.clone(), outbox.clone())
            .expect("app state");
        Self {
            router: taskgate_api::router(state),
            store,
            outbox,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(req).await.expect("request")
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let resp = self.send(json_request(Method::POST, uri, body, None)).await;
        into_json(resp).await
    }

    /// Registers `email` and logs in, returning `(access token, refresh cookie)`.
    pub async fn signup(&self, email: &str) -> (String, String) {
        let (status, _) = self
            .post_json(
                "/api/auth/register",
                json!({
                    "firstName": "Ada",
                    "lastName": "Lovelace",
                    "email": email,
                    "password": PASSWORD,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        self.login(email, PASSWORD).await
    }

    pub async fn login(&self, email: &str, password: &str) -> (String, String) {
        let resp = self
            .send(json_request(
                Method::POST,
                "/api/auth/login",
                json!({ "email": email, "password": password }),
                None,
            ))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let cookie = refresh_cookie(&resp).expect("refresh cookie on login");
        let (_, body) = into_json(resp).await;
        (body["token"].as_str().expect("token").to_string(), cookie)
    }
}

pub fn json_request(method: Method, uri: &str, body: Value, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

/// A request with a literal body and an optional content type.
pub fn raw_request(
    method: Method,
    uri: &str,
    content_type: Option<&str>,
    body: &str,
    bearer: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

pub fn bare_request(method: Method, uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("request")
}

pub async fn into_json(resp: Response<Body>) -> (StatusCode, Value) {
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("parse JSON")
    };
    (status, json)
}

/// The full `Set-Cookie` header for the refresh token, if any.
pub fn set_cookie_header(resp: &Response<Body>) -> Option<String> {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("refreshToken="))
        .map(str::to_string)
}

/// Just the `refreshToken=<value>` pair, ready for a `Cookie` header.
pub fn refresh_cookie(resp: &Response<Body>) -> Option<String> {
    set_cookie_header(resp).and_then(|v| v.split(';').next().map(str::to_string))
}

/// Pull the reset secret out of a reset mail body.
pub fn reset_secret(html: &str) -> String {
    let start = html.find("token=").expect("token in link") + "token=".len();
    html[start..]
        .chars()
        .take_while(char::is_ascii_alphanumeric)
        .collect()
}
