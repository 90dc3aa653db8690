use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use userhub::{
    config::ServiceConfig,
    repositories::{ConfirmationCodeRepository, SqliteConfirmationCodeRepository},
    test_utils::test_helpers::{self, RecordingPublisher},
    AppState,
};

async fn test_app() -> (Router, sqlx::SqlitePool, Arc<RecordingPublisher>) {
    let pool = test_helpers::create_test_db().await.unwrap();
    let publisher = Arc::new(RecordingPublisher::new());
    let (state, _worker) = AppState::build(pool.clone(), &ServiceConfig::default(), publisher.clone());
    (userhub::app(state), pool, publisher)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let (app, _, _) = test_app().await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_returns_created_user_without_hash() {
    let (app, _, publisher) = test_app().await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/users/register",
            json!({"email": "web@example.com", "password": "password123", "first_name": "Web"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["email"], "web@example.com");
    assert_eq!(body["first_name"], "Web");
    assert_eq!(body["profile_status"], "PENDING");
    assert_eq!(body["email_verified"], false);
    assert!(body.get("password_hash").is_none());
    assert_eq!(publisher.events().len(), 1);
}

#[tokio::test]
async fn test_register_validation_and_conflict() {
    let (app, _, _) = test_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/users/register",
            json!({"email": "bad", "password": "password123"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_request");

    let register = json!({"email": "twice@example.com", "password": "password123"});
    let response = app
        .clone()
        .oneshot(json_request("POST", "/users/register", register.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(json_request("POST", "/users/register", register))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_verify_endpoint() {
    let (app, pool, _) = test_app().await;
    let user_id = test_helpers::insert_test_user(&pool, "v@example.com", "password123", false)
        .await
        .unwrap();
    test_helpers::insert_test_code(&pool, user_id, "GOOD", Utc::now() + Duration::hours(1))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get("/users/verify?code=GOOD"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"verified": true}));

    let response = app.clone().oneshot(get("/users/verify?code=BAD")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"verified": false}));

    let response = app
        .oneshot(get(&format!("/users/{}", user_id)))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["email_verified"], true);
}

#[tokio::test]
async fn test_get_unknown_user() {
    let (app, _, _) = test_app().await;

    let response = app.oneshot(get("/users/404")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "user_not_found");
}

#[tokio::test]
async fn test_renew_is_accepted_and_runs_in_background() {
    let (app, pool, publisher) = test_app().await;
    let user_id = test_helpers::insert_test_user(&pool, "r@example.com", "password123", false)
        .await
        .unwrap();
    test_helpers::insert_test_code(&pool, user_id, "STALE", Utc::now() - Duration::hours(1))
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/users/{}/confirmation-code/renew", user_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(body_json(response).await, json!({"queued": true}));

    let codes = SqliteConfirmationCodeRepository::new(pool);
    let mut renewed = None;
    for _ in 0..100 {
        if let Some(code) = codes.find_by_user(user_id).await.unwrap() {
            if code.code != "STALE" && !publisher.events().is_empty() {
                renewed = Some(code);
                break;
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    assert!(renewed.is_some());
    assert_eq!(publisher.events().len(), 1);
}

#[tokio::test]
async fn test_renew_for_unknown_user_is_still_accepted() {
    let (app, _, publisher) = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users/999/confirmation-code/renew")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(publisher.events().is_empty());
}
