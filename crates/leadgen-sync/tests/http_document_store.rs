//! Integration tests for `HttpDocumentStore` using wiremock HTTP mocks.

use leadgen_sync::{DocumentStore, HttpDocumentStore, SyncError, UserDocument};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_store(base_url: &str, token: Option<&str>) -> HttpDocumentStore {
    HttpDocumentStore::new(base_url, token.map(str::to_string), 30)
        .expect("store construction should not fail")
}

#[tokio::test]
async fn fetch_returns_document_object() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/user-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "leads": [],
            "plan": "pro"
        })))
        .mount(&server)
        .await;

    let store = test_store(&server.uri(), None);
    let doc = store
        .fetch("user-1")
        .await
        .expect("fetch should succeed")
        .expect("document should exist");

    assert_eq!(doc["plan"], "pro");
    assert!(doc["leads"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn fetch_not_found_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/new-user"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = test_store(&server.uri(), None);
    assert!(store.fetch("new-user").await.unwrap().is_none());
}

#[tokio::test]
async fn fetch_server_error_is_unexpected_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/user-1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = test_store(&server.uri(), None);
    let err = store.fetch("user-1").await.unwrap_err();
    assert!(
        matches!(err, SyncError::UnexpectedStatus { status: 500, .. }),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn merge_patches_partial_document_with_bearer_token() {
    let server = MockServer::start().await;

    let body = serde_json::json!({ "leads": [{ "id": "lead-1", "name": "Acme" }] });

    Mock::given(method("PATCH"))
        .and(path("/api/users/user-1"))
        .and(header("authorization", "Bearer secret-token"))
        .and(body_json(&body))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let store = test_store(&format!("{}/api/", server.uri()), Some("secret-token"));
    let serde_json::Value::Object(fields) = body else {
        unreachable!("literal is an object");
    };
    let fields: UserDocument = fields;
    store
        .merge("user-1", fields)
        .await
        .expect("merge should succeed");
}

#[tokio::test]
async fn merge_rejection_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/users/user-1"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let store = test_store(&server.uri(), None);
    let err = store
        .merge("user-1", UserDocument::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::UnexpectedStatus { status: 403, .. }));
}
