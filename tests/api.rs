use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use floatchat_accounts::{
    App, config::Config, database::User, routes::app_router, storage::MemoryStore,
};
use serde_json::{Value, json};
use tower::ServiceExt;

fn router() -> Router {
    let app = App::with_storage(Config::default(), Arc::new(MemoryStore::new()));
    app_router(app.state())
}

async fn call(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn create_then_fetch_by_id_and_email() {
    let router = router();

    let (status, created) = call(
        &router,
        Method::POST,
        "/api/users",
        Some(json!({ "email": "a@x.com", "name": "A" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let created: User = serde_json::from_value(created).unwrap();
    assert!(!created.id.is_empty());

    let (status, fetched) = call(&router, Method::GET, &format!("/api/users/{}", created.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "A");

    let (status, found) = call(
        &router,
        Method::POST,
        "/api/users/search",
        Some(json!({ "email": "a@x.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["id"], created.id.as_str());

    let (_, all) = call(&router, Method::GET, "/api/users", None).await;
    assert_eq!(all.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn search_for_unknown_email_returns_null() {
    let router = router();
    let (status, found) = call(
        &router,
        Method::POST,
        "/api/users/search",
        Some(json!({ "email": "nobody@x.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(found.is_null());
}

#[tokio::test]
async fn duplicate_email_conflicts_with_error_body() {
    let router = router();
    let body = json!({ "email": "a@x.com", "name": "A" });
    call(&router, Method::POST, "/api/users", Some(body)).await;

    let (status, error) = call(
        &router,
        Method::POST,
        "/api/users",
        Some(json!({ "email": "a@x.com", "name": "B" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(error["error"].as_str().unwrap().contains("already exists"));
}

#[tokio::test]
async fn missing_user_is_404_and_delete_is_tolerant() {
    let router = router();

    let (status, error) = call(&router, Method::GET, "/api/users/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(error["error"].is_string());

    let (status, _) = call(
        &router,
        Method::PUT,
        "/api/users/nope",
        Some(json!({ "name": "X" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&router, Method::DELETE, "/api/users/nope", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn put_merges_fields() {
    let router = router();
    let (_, created) = call(
        &router,
        Method::POST,
        "/api/users",
        Some(json!({ "email": "a@x.com", "name": "A" })),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();
    let uri = format!("/api/users/{}", id);

    call(&router, Method::PUT, &uri, Some(json!({ "phone": "555" }))).await;
    let (status, updated) = call(
        &router,
        Method::PUT,
        &uri,
        Some(json!({ "accountType": "Premium" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], id.as_str());
    assert_eq!(updated["phone"], "555");
    assert_eq!(updated["accountType"], "Premium");
    assert_eq!(updated["name"], "A");
}

#[tokio::test]
async fn blank_email_is_rejected() {
    let router = router();
    let (status, error) = call(
        &router,
        Method::POST,
        "/api/users",
        Some(json!({ "email": "  ", "name": "A" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"], "Email is required");
}
