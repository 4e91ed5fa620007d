use std::sync::Once;

use metrics::{Unit, describe_counter, describe_gauge, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

/// Register descriptions for every metric the crate emits. Idempotent.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "folio_fetch_cache_hit_total",
            Unit::Count,
            "Content fetches served from a fresh cache entry."
        );
        describe_counter!(
            "folio_fetch_cache_miss_total",
            Unit::Count,
            "Content fetches that went upstream."
        );
        describe_counter!(
            "folio_fetch_cache_coalesced_total",
            Unit::Count,
            "Content fetches that waited on a concurrent identical fetch."
        );
        describe_counter!(
            "folio_fetch_cache_evict_total",
            Unit::Count,
            "Expired cache entries removed by the sweeper."
        );
        describe_gauge!(
            "folio_fetch_cache_entries",
            Unit::Count,
            "Current number of stored cache entries."
        );
        describe_histogram!(
            "folio_ghost_request_ms",
            Unit::Milliseconds,
            "Ghost Content API request latency in milliseconds."
        );
        describe_counter!(
            "folio_ghost_request_error_total",
            Unit::Count,
            "Ghost Content API requests that failed."
        );
    });
}
