mod support;

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use folio::infra::http::build_router;
use http_body_util::BodyExt;
use support::{StubContent, posts, states, tag};
use tower::ServiceExt;

fn router(api: StubContent) -> Router {
    let (http, _) = states(Arc::new(api));
    build_router(http)
}

fn healthy() -> StubContent {
    StubContent::new(posts(5), vec![tag("Kafka", 5), tag("Go", 0)])
}

async fn get(router: Router, uri: &str) -> Response {
    router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
        .await
        .expect("router responds")
}

async fn body_text(response: Response) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collects")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

fn header_value<'a>(response: &'a Response, name: header::HeaderName) -> Option<&'a str> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
}

#[tokio::test]
async fn home_renders_profile_and_recent_posts() {
    let response = get(router(healthy()), "/").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_value(&response, header::CACHE_CONTROL),
        Some("public, s-maxage=1800, stale-while-revalidate=3600")
    );
    let body = body_text(response).await;
    assert!(body.contains("Alex"));
    assert!(body.contains("/blog/post-0"));
    assert!(body.contains("application/ld+json"));
}

#[tokio::test]
async fn home_still_renders_when_cms_is_down() {
    let response = get(router(StubContent::unreachable()), "/").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Alex"));
    assert!(!body.contains("/blog/post-0"));
}

#[tokio::test]
async fn blog_index_lists_posts_with_listing_cache_header() {
    let response = get(router(healthy()), "/blog").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_value(&response, header::CACHE_CONTROL),
        Some("public, s-maxage=1800, stale-while-revalidate=3600")
    );
    let body = body_text(response).await;
    for index in 0..5 {
        assert!(body.contains(&format!("/blog/post-{index}")), "post-{index} listed");
    }
    assert!(body.contains("<meta name=\"robots\" content=\"index, follow\">"));
}

#[tokio::test]
async fn filtered_listing_is_not_indexed() {
    let response = get(router(healthy()), "/blog?tag=kafka").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("noindex, follow"));
    assert!(body.contains("/blog/post-3"));
}

#[tokio::test]
async fn invalid_page_parameter_falls_back_to_first_page() {
    let response = get(router(healthy()), "/blog?page=banana").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("/blog/post-0"));
}

#[tokio::test]
async fn blog_index_is_unavailable_when_cms_is_down() {
    let response = get(router(StubContent::unreachable()), "/blog").await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(response.headers().get(header::CACHE_CONTROL).is_none());
    assert!(body_text(response).await.contains("Unable to load blog posts"));
}

#[tokio::test]
async fn post_detail_renders_article() {
    let response = get(router(healthy()), "/blog/post-1").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_value(&response, header::CACHE_CONTROL),
        Some("public, s-maxage=86400, stale-while-revalidate=604800")
    );
    let body = body_text(response).await;
    assert!(body.contains("<strong>everywhere</strong>"));
    assert!(body.contains("BlogPosting"));
    assert!(body.contains("https://folio.test/blog/post-1"));
}

#[tokio::test]
async fn unknown_post_is_not_found() {
    let response = get(router(healthy()), "/blog/does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("noindex, nofollow"));
}

#[tokio::test]
async fn post_lookup_failure_is_distinct_from_not_found() {
    let response = get(router(StubContent::unreachable()), "/blog/post-1").await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let response = get(router(healthy()), "/projects/nope").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sitemap_lists_pages_posts_and_tags() {
    let response = get(router(healthy()), "/sitemap.xml").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_value(&response, header::CONTENT_TYPE),
        Some("application/xml; charset=utf-8")
    );
    assert_eq!(
        header_value(&response, header::CACHE_CONTROL),
        Some("public, s-maxage=3600, stale-while-revalidate")
    );
    let body = body_text(response).await;
    assert!(body.contains("<loc>https://folio.test</loc>"));
    assert!(body.contains("<loc>https://folio.test/blog/post-4</loc>"));
    assert!(body.contains("/blog?tag=kafka"));
    assert!(!body.contains("/blog?tag=go"), "empty tags are skipped");
}

#[tokio::test]
async fn sitemap_falls_back_when_cms_is_down() {
    let response = get(router(StubContent::unreachable()), "/sitemap.xml").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_value(&response, header::CACHE_CONTROL),
        Some("public, max-age=300")
    );
    assert_eq!(body_text(response).await.matches("<url>").count(), 2);
}

#[tokio::test]
async fn blog_sitemap_only_covers_blog_urls() {
    let response = get(router(healthy()), "/blog/sitemap.xml").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(!body.contains("<loc>https://folio.test</loc>"));
    assert!(body.contains("<loc>https://folio.test/blog</loc>"));
}

#[tokio::test]
async fn rss_feed_carries_items() {
    let response = get(router(healthy()), "/rss.xml").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_value(&response, header::CONTENT_TYPE),
        Some("application/rss+xml; charset=utf-8")
    );
    let body = body_text(response).await;
    assert_eq!(body.matches("<item>").count(), 5);
    assert!(body.contains("https://folio.test/rss.xml"));
}

#[tokio::test]
async fn rss_feed_is_empty_but_valid_when_cms_is_down() {
    let response = get(router(StubContent::unreachable()), "/rss.xml").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_value(&response, header::CACHE_CONTROL),
        Some("public, max-age=300")
    );
    let body = body_text(response).await;
    assert!(body.contains("<channel>"));
    assert_eq!(body.matches("<item>").count(), 0);
}

#[tokio::test]
async fn robots_points_at_sitemaps() {
    let response = get(router(healthy()), "/robots.txt").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_value(&response, header::CONTENT_TYPE),
        Some("text/plain; charset=utf-8")
    );
    let body = body_text(response).await;
    assert!(body.contains("Sitemap: https://folio.test/sitemap.xml"));
    assert!(body.contains("Sitemap: https://folio.test/blog/sitemap.xml"));
}

#[tokio::test]
async fn health_does_not_touch_the_cms() {
    let api = Arc::new(StubContent::unreachable());
    let (http, _) = states(api.clone());

    let response = get(build_router(http), "/_health").await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(api.browse_count(), 0);
}

#[tokio::test]
async fn repeated_listing_is_served_from_cache() {
    let api = Arc::new(healthy());
    let (http, _) = states(api.clone());
    let router = build_router(http);

    get(router.clone(), "/blog?tag=kafka").await;
    let after_first = api.browse_count();
    get(router, "/blog?tag=kafka").await;

    assert!(after_first > 0);
    assert_eq!(api.browse_count(), after_first);
}

#[tokio::test]
async fn responses_carry_a_generated_request_id() {
    let request_id = header::HeaderName::from_static("x-request-id");
    let response = get(router(StubContent::unreachable()), "/blog").await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let id = header_value(&response, request_id).expect("request id header");
    assert!(uuid::Uuid::parse_str(id).is_ok());
}

#[tokio::test]
async fn forwarded_request_id_is_echoed() {
    let response = router(healthy())
        .oneshot(
            Request::builder()
                .uri("/robots.txt")
                .header("x-request-id", "edge-42")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_value(&response, header::HeaderName::from_static("x-request-id")),
        Some("edge-42")
    );
}
