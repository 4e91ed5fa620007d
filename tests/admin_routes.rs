mod support;

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
    response::Response,
};
use folio::infra::http::{build_admin_router, build_router};
use http_body_util::BodyExt;
use serde_json::Value;
use support::{StubContent, posts, states};
use tower::ServiceExt;

async fn send(router: Router, method: Method, uri: &str) -> Response {
    router
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router responds")
}

async fn json_body(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collects")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn stats_reflect_public_traffic_and_clear_empties_the_cache() {
    let api = Arc::new(StubContent::new(posts(3), Vec::new()));
    let (http, admin) = states(api.clone());
    let public = build_router(http);
    let admin = build_admin_router(admin);

    send(public.clone(), Method::GET, "/blog").await;
    send(public.clone(), Method::GET, "/blog").await;

    let response = send(admin.clone(), Method::GET, "/_cache/stats").await;
    assert_eq!(response.status(), StatusCode::OK);
    let stats = json_body(response).await;
    assert!(stats["total"].as_u64().unwrap_or_default() >= 2);
    assert!(stats["hits"].as_u64().unwrap_or_default() >= 1);
    assert_eq!(stats["ttl_seconds"], 43_200);
    assert!(
        stats["entries"]
            .as_array()
            .expect("entry list")
            .iter()
            .any(|entry| entry["key"].as_str().is_some_and(|key| key.starts_with("posts:")))
    );

    let response = send(admin.clone(), Method::POST, "/_cache/clear").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let stats = json_body(send(admin, Method::GET, "/_cache/stats").await).await;
    assert_eq!(stats["total"], 0);

    let calls_before = api.browse_count();
    send(public, Method::GET, "/blog").await;
    assert!(api.browse_count() > calls_before);
}

#[tokio::test]
async fn sweep_reports_evictions() {
    let (_, admin) = states(Arc::new(StubContent::new(posts(1), Vec::new())));

    let response = send(build_admin_router(admin), Method::POST, "/_cache/sweep").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["evicted"], 0);
}

#[tokio::test]
async fn admin_listener_answers_health_checks() {
    let (_, admin) = states(Arc::new(StubContent::unreachable()));

    let response = send(build_admin_router(admin), Method::GET, "/_health").await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn clear_requires_post() {
    let (_, admin) = states(Arc::new(StubContent::new(posts(1), Vec::new())));

    let response = send(build_admin_router(admin), Method::GET, "/_cache/clear").await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
