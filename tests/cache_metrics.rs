mod support;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use folio::application::content::{ContentService, PostQuery};
use folio::cache::{CacheConfig, FetchCache};
use folio::config::GhostSettings;
use folio::infra::ghost::GhostClient;
use httpmock::prelude::*;
use metrics_util::debugging::DebuggingRecorder;
use support::{StubContent, cached_content, posts};
use url::Url;

#[tokio::test]
async fn cache_and_upstream_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    // hit, miss, entries gauge and eviction
    let cache = Arc::new(FetchCache::new(CacheConfig {
        ttl: Duration::from_millis(1),
        ..CacheConfig::default()
    }));
    let content = cached_content(Arc::new(StubContent::new(posts(2), Vec::new())), cache.clone());
    content.list_posts(&PostQuery::default()).await.expect("miss");
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(cache.sweep(), 1);

    let long_lived = Arc::new(FetchCache::new(CacheConfig::default()));
    let content = cached_content(Arc::new(StubContent::new(posts(2), Vec::new())), long_lived);
    content.list_posts(&PostQuery::default()).await.expect("miss");
    content.list_posts(&PostQuery::default()).await.expect("hit");

    // upstream latency and error counters
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/ghost/api/content/posts/");
            then.status(502);
        })
        .await;
    let ghost = GhostClient::new(&GhostSettings {
        api_url: Url::parse(&server.base_url()).expect("mock server url"),
        content_api_key: "metrics".to_string(),
        api_version: "v5.0".to_string(),
        request_timeout: Duration::from_secs(5),
    })
    .expect("client builds");
    let upstream = ContentService::new(Arc::new(ghost));
    assert!(upstream.list_posts(&PostQuery::default()).await.is_err());

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "folio_fetch_cache_hit_total",
        "folio_fetch_cache_miss_total",
        "folio_fetch_cache_evict_total",
        "folio_fetch_cache_entries",
        "folio_ghost_request_ms",
        "folio_ghost_request_error_total",
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
