//! Folio fetch cache
//!
//! An in-process, time-boxed memoization layer in front of the content API.
//!
//! - Entries are keyed by operation name plus canonical JSON of the call arguments.
//! - An entry is served only while younger than the TTL; failures are never stored.
//! - Concurrent misses for one key may share a single upstream call (single-flight).
//! - A background sweeper evicts expired entries and periodically logs stats.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! ttl_seconds = 43200
//! sweep_interval_seconds = 3600
//! single_flight = true
//! stats_log_interval_seconds = 300
//! ```

mod config;
mod keys;
mod store;
mod sweeper;

pub use config::CacheConfig;
pub use keys::CacheKey;
pub use store::{CacheStats, EntryStats, FetchCache};
pub use sweeper::SweeperHandle;
