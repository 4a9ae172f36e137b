//! Task list endpoints: paging, ownership and status updates.

mod common;

use axum::http::{Method, StatusCode};
use common::{TestApp, bare_request, into_json, json_request};
use serde_json::{Value, json};

async fn create(app: &TestApp, token: &str, name: &str) -> (StatusCode, Value) {
    into_json(
        app.send(json_request(
            Method::POST,
            "/api/tasks",
            json!({ "name": name }),
            Some(token),
        ))
        .await,
    )
    .await
}

#[tokio::test]
async fn tasks_require_authentication() {
    let app = TestApp::new();
    let (status, body) =
        into_json(app.send(bare_request(Method::GET, "/api/tasks", None)).await).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "no_token");
}

#[tokio::test]
async fn create_and_list_with_default_paging() {
    let app = TestApp::new();
    let (token, _) = app.signup("tasks@example.com").await;

    for i in 0..7 {
        let (status, body) = create(&app, &token, &format!("task {i}")).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["task"]["status"], false);
    }

    let (status, page) =
        into_json(app.send(bare_request(Method::GET, "/api/tasks", Some(&token))).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["page"], 1);
    assert_eq!(page["limit"], 5);
    assert_eq!(page["total"], 7);
    assert_eq!(page["pages"], 2);
    assert_eq!(page["tasks"].as_array().map(Vec::len), Some(5));
    assert_eq!(page["tasks"][0]["name"], "task 0");

    let (_, second) = into_json(
        app.send(bare_request(Method::GET, "/api/tasks?page=2&limit=5", Some(&token)))
            .await,
    )
    .await;
    assert_eq!(second["tasks"].as_array().map(Vec::len), Some(2));
    assert_eq!(second["tasks"][1]["name"], "task 6");
}

#[tokio::test]
async fn blank_task_name_is_rejected() {
    let app = TestApp::new();
    let (token, _) = app.signup("blank@example.com").await;
    let (status, body) = create(&app, &token, "   ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Task name is required");
}

#[tokio::test]
async fn update_and_delete_own_task() {
    let app = TestApp::new();
    let (token, _) = app.signup("owner@example.com").await;
    let (_, created) = create(&app, &token, "write report").await;
    let id = created["task"]["id"].as_str().unwrap().to_string();

    let (status, updated) = into_json(
        app.send(json_request(
            Method::PATCH,
            &format!("/api/tasks/{id}"),
            json!({ "status": true }),
            Some(&token),
        ))
        .await,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["task"]["status"], true);

    let (status, _) = into_json(
        app.send(bare_request(Method::DELETE, &format!("/api/tasks/{id}"), Some(&token)))
            .await,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = into_json(
        app.send(bare_request(Method::DELETE, &format!("/api/tasks/{id}"), Some(&token)))
            .await,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn tasks_are_private_to_their_owner() {
    let app = TestApp::new();
    let (alice, _) = app.signup("alice@example.com").await;
    let (bob, _) = app.signup("bob@example.com").await;
    let (_, created) = create(&app, &alice, "alice only").await;
    let id = created["task"]["id"].as_str().unwrap().to_string();

    let (_, bobs) =
        into_json(app.send(bare_request(Method::GET, "/api/tasks", Some(&bob))).await).await;
    assert_eq!(bobs["total"], 0);

    let (status, _) = into_json(
        app.send(json_request(
            Method::PATCH,
            &format!("/api/tasks/{id}"),
            json!({ "status": true }),
            Some(&bob),
        ))
        .await,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = into_json(
        app.send(bare_request(Method::DELETE, &format!("/api/tasks/{id}"), Some(&bob)))
            .await,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, alices) =
        into_json(app.send(bare_request(Method::GET, "/api/tasks", Some(&alice))).await).await;
    assert_eq!(alices["total"], 1);
    assert_eq!(alices["tasks"][0]["status"], false);
}
