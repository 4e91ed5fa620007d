//! Cache configuration.
//!
//! Controls the memoizing fetch cache in front of the content API via the `[cache]`
//! section of `folio.toml`.

use std::time::Duration;

const DEFAULT_TTL_SECS: u64 = 12 * 60 * 60;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60 * 60;
const DEFAULT_STATS_LOG_INTERVAL_SECS: u64 = 5 * 60;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Memoize content fetches. When disabled every call goes upstream.
    pub enabled: bool,
    /// Maximum age at which an entry is still served.
    pub ttl: Duration,
    /// Cadence of the background sweep that evicts expired entries.
    pub sweep_interval: Duration,
    /// Coalesce concurrent misses for the same key into one upstream call.
    pub single_flight: bool,
    /// Cadence of the periodic stats log line; `None` disables it.
    pub stats_log_interval: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            single_flight: true,
            stats_log_interval: Some(Duration::from_secs(DEFAULT_STATS_LOG_INTERVAL_SECS)),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            ttl: settings.ttl,
            sweep_interval: settings.sweep_interval,
            single_flight: settings.single_flight,
            stats_log_interval: settings.stats_log_interval,
        }
    }
}
