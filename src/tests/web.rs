use crate::auth::ApiAuth;
use crate::search::SearchService;
use crate::tests::support::{history_backend, seeded_store, FailingProvider, ScriptedProvider, OWNER};
use crate::web::{router, AppState};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app(provider: Option<Box<dyn crate::completion::CompletionProvider>>) -> (Router, tempfile::TempDir) {
    let (store, tmp) = seeded_store();
    let history = history_backend(&tmp);
    let search = Arc::new(SearchService::new(provider, store.clone(), history.clone()));

    let state = AppState {
        search,
        store,
        history,
        auth: ApiAuth::new(None),
    };
    (router(state), tmp)
}

fn post_json(uri: &str, user_id: u64, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-user-id", user_id.to_string())
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_search_envelope_and_counts() {
    let provider = ScriptedProvider::new("[3, 1]");
    let (app, _tmp) = app(Some(Box::new(provider)));

    let response = app
        .oneshot(post_json("/api/search", OWNER, json!({ "query": "dev" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!("Success"));
    assert_eq!(body["counts"], json!({ "links": 2, "pins": 0, "collections": 1, "tags": 2 }));
    assert_eq!(body["data"]["links"][0]["id"], json!(3));
    assert_eq!(body["data"]["links"][1]["id"], json!(1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_search_no_matches_still_succeeds() {
    let provider = ScriptedProvider::new("[]");
    let (app, _tmp) = app(Some(Box::new(provider)));

    let response = app
        .oneshot(post_json("/api/search", OWNER, json!({ "query": "nothing" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!("No matching bookmarks found."));
    assert_eq!(body["data"]["links"], json!([]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_search_unconfigured_is_503() {
    let (app, _tmp) = app(None);

    let response = app
        .oneshot(post_json("/api/search", OWNER, json!({ "query": "dev" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["data"], Value::Null);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_search_provider_failure_is_500() {
    let (app, _tmp) = app(Some(Box::new(FailingProvider)));

    let response = app
        .oneshot(post_json("/api/search", OWNER, json!({ "query": "dev" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!("AI search failed. Please try again."));
    assert_eq!(body["data"], Value::Null);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_search_blank_query_is_400() {
    let provider = ScriptedProvider::new("[1]");
    let (app, _tmp) = app(Some(Box::new(provider)));

    let response = app
        .oneshot(post_json("/api/search", OWNER, json!({ "query": "   " })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_missing_user_header_is_400() {
    let provider = ScriptedProvider::new("[1]");
    let (app, _tmp) = app(Some(Box::new(provider)));

    let request = Request::builder()
        .method("POST")
        .uri("/api/search")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "query": "dev" }).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_bearer_token_enforced() {
    let (store, tmp) = seeded_store();
    let history = history_backend(&tmp);
    let search = Arc::new(SearchService::new(None, store.clone(), history.clone()));
    let app = router(AppState {
        search,
        store,
        history,
        auth: ApiAuth::new(Some("hunter2".to_string())),
    });

    let mut request = post_json("/api/search-history", OWNER, json!({ "query": "dev" }));
    request
        .headers_mut()
        .insert("authorization", "Bearer wrong".parse().unwrap());
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let mut request = post_json("/api/search-history", OWNER, json!({ "query": "dev" }));
    request
        .headers_mut()
        .insert("authorization", "Bearer hunter2".parse().unwrap());
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_history_roundtrip() {
    let (app, _tmp) = app(None);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/search-history",
            OWNER,
            json!({ "query": "rust tooling" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let entry = json_body(response).await;
    let id = entry["id"].as_u64().unwrap();

    let request = Request::builder()
        .uri("/api/search-history")
        .header("x-user-id", OWNER.to_string())
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let list = json_body(response).await;
    assert_eq!(list[0]["query"], json!("rust tooling"));

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/search-history/{id}"))
        .header("x-user-id", OWNER.to_string())
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // deleting again is a 404
    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/search-history/{id}"))
        .header("x-user-id", OWNER.to_string())
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_history_add_blank_query_is_400() {
    let (app, _tmp) = app(None);

    let response = app
        .oneshot(post_json(
            "/api/search-history",
            OWNER,
            json!({ "query": "  " }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_link_create_and_pin() {
    let (app, _tmp) = app(None);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/links",
            OWNER,
            json!({ "name": "Canva", "url": "https://canva.com", "tags": ["design"] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let link = json_body(response).await;
    let id = link["id"].as_u64().unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/links/{id}/pin"),
            OWNER,
            json!({ "pinned": true }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // pinning an invisible link 404s
    let response = app
        .oneshot(post_json(
            "/api/links/999/pin",
            OWNER,
            json!({ "pinned": true }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
