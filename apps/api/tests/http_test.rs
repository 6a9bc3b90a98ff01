//! Integration tests for the HTTP surface
//!
//! Drives the full application router with `tower::ServiceExt::oneshot`:
//! the GraphQL endpoint, the playground toggle and the health checks.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use common::Graph;
use tower::ServiceExt;

async fn body_json(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn graphql(query: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/graphql")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({ "query": query }).to_string(),
        ))
        .unwrap()
}

// ========== GraphQL ==========

#[tokio::test]
async fn test_graphql_endpoint_executes_queries() {
    let graph = Graph::seed().await;

    let response = graph
        .router(false)
        .oneshot(graphql("{ memberTypes { id postsLimitPerMonth } }"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json.get("errors").is_none(), "{json}");
    assert_eq!(json["data"]["memberTypes"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_graphql_depth_violation_over_http() {
    let graph = Graph::seed().await;
    let query = "{ users { posts { author { posts { author { posts { author { id } } } } } } } }";

    let response = graph.router(false).oneshot(graphql(query)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["errors"][0]["extensions"]["code"], "DEPTH_LIMIT_EXCEEDED");
    assert!(json["data"].is_null());
    assert!(graph.store.calls().is_empty());
}

#[tokio::test]
async fn test_requests_do_not_share_loader_caches() {
    let graph = Graph::seed().await;
    let router = graph.router(false);
    let query = format!("{{ user(id: \"{}\") {{ name }} }}", graph.bob.id);

    let first = body_json(router.clone().oneshot(graphql(&query)).await.unwrap()).await;
    assert_eq!(first["data"]["user"]["name"], "Bob");

    router
        .clone()
        .oneshot(graphql(&format!(
            "mutation {{ changeUser(id: \"{}\", dto: {{ name: \"Robert\" }}) {{ name }} }}",
            graph.bob.id
        )))
        .await
        .unwrap();

    let second = body_json(router.oneshot(graphql(&query)).await.unwrap()).await;
    assert_eq!(second["data"]["user"]["name"], "Robert");
}

#[tokio::test]
async fn test_playground_toggle() {
    let graph = Graph::seed().await;

    let disabled = graph
        .router(false)
        .oneshot(get("/graphql/playground"))
        .await
        .unwrap();
    assert_eq!(disabled.status(), StatusCode::NOT_FOUND);

    let enabled = graph
        .router(true)
        .oneshot(get("/graphql/playground"))
        .await
        .unwrap();
    assert_eq!(enabled.status(), StatusCode::OK);
}

// ========== Health ==========

#[tokio::test]
async fn test_simple_health_check() {
    let graph = Graph::seed().await;

    let response = graph.router(false).oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn test_liveness() {
    let graph = Graph::seed().await;

    let response = graph
        .router(false)
        .oneshot(get("/health/live"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.contains("application/json"));

    let json = body_json(response).await;
    assert_eq!(json["status"], "alive");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_readiness_follows_store() {
    let graph = Graph::seed().await;
    let router = graph.router(false);

    let ready = router.clone().oneshot(get("/health/ready")).await.unwrap();
    assert_eq!(ready.status(), StatusCode::OK);
    assert_eq!(body_json(ready).await["status"], "ready");

    graph.store.set_unavailable(true);
    let down = router.oneshot(get("/health/ready")).await.unwrap();
    assert_eq!(down.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(down).await["code"], "STORE_UNAVAILABLE");
}

#[tokio::test]
async fn test_nonexistent_route_returns_404() {
    let graph = Graph::seed().await;

    let response = graph
        .router(false)
        .oneshot(get("/nonexistent"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
