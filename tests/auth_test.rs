use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use fileserver::config::AppConfig;
use fileserver::infrastructure::database;
use fileserver::services::storage::{BlobStore, LocalDiskStorage};
use fileserver::{AppState, create_app};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tower::ServiceExt;

async fn test_app() -> (Router, tempfile::TempDir) {
    let opts = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(opts)
        .await
        .unwrap();
    database::run_migrations(&pool).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let storage: Arc<dyn BlobStore> = Arc::new(LocalDiskStorage::new(dir.path()));

    let state = AppState::new(pool, storage, AppConfig::development());
    (create_app(state), dir)
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn register_login_me_flow() {
    let (app, _dir) = test_app().await;

    let (status, user) = post_json(
        &app,
        "/register",
        json!({"username": "alice", "email": "alice@example.com", "password": "password123"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["username"], "alice");
    assert!(user.get("password_hash").is_none());

    let (status, login) = post_json(
        &app,
        "/login",
        json!({"username": "alice", "password": "password123"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = login["token"].as_str().unwrap();
    assert_eq!(login["user"]["email"], "alice@example.com");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/me")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let me: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(me["username"], "alice");
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let (app, _dir) = test_app().await;

    let payload = json!({"username": "alice", "email": "alice@example.com", "password": "password123"});
    let (status, _) = post_json(&app, "/register", payload.clone()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = post_json(&app, "/register", payload).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Same email under a different username is also taken.
    let (status, _) = post_json(
        &app,
        "/register",
        json!({"username": "alice2", "email": "alice@example.com", "password": "password123"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn register_validates_input() {
    let (app, _dir) = test_app().await;

    let (status, _) = post_json(
        &app,
        "/register",
        json!({"username": "al", "email": "alice@example.com", "password": "password123"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(
        &app,
        "/register",
        json!({"username": "alice", "email": "not-an-email", "password": "password123"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(
        &app,
        "/register",
        json!({"username": "alice", "email": "alice@example.com", "password": "short"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let (app, _dir) = test_app().await;

    post_json(
        &app,
        "/register",
        json!({"username": "alice", "email": "alice@example.com", "password": "password123"}),
    )
    .await;

    let (status, _) = post_json(
        &app,
        "/login",
        json!({"username": "alice", "password": "wrong-password"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = post_json(
        &app,
        "/login",
        json!({"username": "nobody", "password": "password123"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_require_token() {
    let (app, _dir) = test_app().await;

    for uri in ["/me", "/files", "/dashboard", "/users?search=al"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "uri: {}", uri);
    }

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/me")
                .header("Authorization", "Bearer not-a-real-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_search_excludes_caller_and_validates_term() {
    let (app, _dir) = test_app().await;

    post_json(
        &app,
        "/register",
        json!({"username": "alice", "email": "alice@example.com", "password": "password123"}),
    )
    .await;
    post_json(
        &app,
        "/register",
        json!({"username": "alicia", "email": "alicia@example.com", "password": "password123"}),
    )
    .await;
    let (_, login) = post_json(
        &app,
        "/login",
        json!({"username": "alice", "password": "password123"}),
    )
    .await;
    let token = login["token"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/users?search=ali")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let users: Value = serde_json::from_slice(&bytes).unwrap();
    let usernames: Vec<&str> = users
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert_eq!(usernames, vec!["alicia"]);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/users?search=a")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
