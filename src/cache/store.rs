//! Memoizing fetch cache.
//!
//! Entries are replaced wholesale on refresh and are only served while younger than the
//! configured TTL. Failed fetches are never stored. Concurrent misses for one key can be
//! coalesced: the first caller becomes the leader and every caller that arrives while its
//! fetch is in flight receives the leader's outcome, success or failure, without calling
//! upstream itself.

use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use metrics::{counter, gauge};
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::config::CacheConfig;
use super::keys::CacheKey;

const METRIC_HIT: &str = "folio_fetch_cache_hit_total";
const METRIC_MISS: &str = "folio_fetch_cache_miss_total";
const METRIC_COALESCED: &str = "folio_fetch_cache_coalesced_total";
const METRIC_EVICT: &str = "folio_fetch_cache_evict_total";
const METRIC_ENTRIES: &str = "folio_fetch_cache_entries";

type Payload = Arc<dyn Any + Send + Sync>;

/// Outcome slot of an in-flight fetch. Holds `Result<T, E>` once the leader finishes.
type FlightSender = watch::Sender<Option<Payload>>;
type FlightReceiver = watch::Receiver<Option<Payload>>;

enum Role {
    Leader,
    Follower(FlightReceiver),
}

/// Releases the leader's flight slot. Dropped without publishing (leader cancelled), the
/// sender goes away and followers fall back to fetching on their own.
struct FlightGuard<'a> {
    flights: &'a DashMap<CacheKey, FlightSender>,
    key: &'a CacheKey,
    published: bool,
}

impl FlightGuard<'_> {
    fn publish(mut self, payload: Payload) {
        self.published = true;
        if let Some((_, sender)) = self.flights.remove(self.key) {
            sender.send_replace(Some(payload));
        }
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if !self.published {
            self.flights.remove(self.key);
        }
    }
}

#[derive(Clone)]
struct CacheEntry {
    payload: Payload,
    refreshed_at: Instant,
}

pub struct FetchCache {
    config: CacheConfig,
    entries: DashMap<CacheKey, CacheEntry>,
    flights: DashMap<CacheKey, FlightSender>,
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub total: usize,
    pub fresh: usize,
    pub stale: usize,
    pub hits: u64,
    pub misses: u64,
    pub coalesced: u64,
    pub ttl_seconds: u64,
    pub entries: Vec<EntryStats>,
}

impl CacheStats {
    /// Share of stored entries still inside the TTL, in percent.
    pub fn fresh_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.fresh as f64 * 100.0 / self.total as f64
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryStats {
    pub key: String,
    pub age_seconds: u64,
    pub fresh: bool,
}

impl FetchCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: DashMap::new(),
            flights: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            coalesced: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serve `operation(args)` from the cache, or run `fetch` and store its success.
    ///
    /// Arguments that cannot be turned into a key bypass the cache.
    pub async fn memoize<A, T, E, F, Fut>(
        &self,
        operation: &'static str,
        args: &A,
        fetch: F,
    ) -> Result<T, E>
    where
        A: Serialize + ?Sized,
        T: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match CacheKey::derive(operation, args) {
            Ok(key) => self.get_or_fetch(&key, fetch).await,
            Err(err) => {
                warn!(
                    target = "folio::cache",
                    operation,
                    error = %err,
                    "arguments could not be keyed, bypassing cache"
                );
                fetch().await
            }
        }
    }

    /// Like [`Self::memoize`] for lookups that may find nothing. Absence is not stored.
    pub async fn memoize_present<A, T, E, F, Fut>(
        &self,
        operation: &'static str,
        args: &A,
        fetch: F,
    ) -> Result<Option<T>, E>
    where
        A: Serialize + ?Sized,
        T: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        match CacheKey::derive(operation, args) {
            Ok(key) => self.resolve(&key, fetch, Option::is_some).await,
            Err(err) => {
                warn!(
                    target = "folio::cache",
                    operation,
                    error = %err,
                    "arguments could not be keyed, bypassing cache"
                );
                fetch().await
            }
        }
    }

    pub async fn get_or_fetch<T, E, F, Fut>(&self, key: &CacheKey, fetch: F) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.resolve(key, fetch, |_| true).await
    }

    async fn resolve<T, E, F, Fut>(
        &self,
        key: &CacheKey,
        fetch: F,
        admit: fn(&T) -> bool,
    ) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.config.enabled {
            return fetch().await;
        }

        if let Some(value) = self.lookup::<T>(key) {
            self.record(&self.hits, METRIC_HIT, key);
            return Ok(value);
        }

        if !self.config.single_flight {
            self.record(&self.misses, METRIC_MISS, key);
            return self.fill(key, fetch, admit).await;
        }

        let role = match self.flights.entry(key.clone()) {
            Entry::Occupied(flight) => Role::Follower(flight.get().subscribe()),
            Entry::Vacant(slot) => {
                slot.insert(watch::channel(None).0);
                Role::Leader
            }
        };

        match role {
            Role::Leader => self.lead(key, fetch, admit).await,
            Role::Follower(outcome) => match follow::<T, E>(outcome).await {
                Some(result) => {
                    self.record(&self.coalesced, METRIC_COALESCED, key);
                    result
                }
                None => {
                    self.record(&self.misses, METRIC_MISS, key);
                    self.fill(key, fetch, admit).await
                }
            },
        }
    }

    async fn lead<T, E, F, Fut>(
        &self,
        key: &CacheKey,
        fetch: F,
        admit: fn(&T) -> bool,
    ) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let flight = FlightGuard {
            flights: &self.flights,
            key,
            published: false,
        };

        // The previous leader may have filled the entry between our lookup and the claim.
        let result = match self.lookup::<T>(key) {
            Some(value) => {
                self.record(&self.hits, METRIC_HIT, key);
                Ok(value)
            }
            None => {
                self.record(&self.misses, METRIC_MISS, key);
                self.fill(key, fetch, admit).await
            }
        };

        flight.publish(Arc::new(result.clone()));
        result
    }

    fn lookup<T: Clone + 'static>(&self, key: &CacheKey) -> Option<T> {
        let entry = self.entries.get(key)?;
        if entry.refreshed_at.elapsed() >= self.config.ttl {
            return None;
        }
        entry.payload.downcast_ref::<T>().cloned()
    }

    async fn fill<T, E, F, Fut>(&self, key: &CacheKey, fetch: F, admit: fn(&T) -> bool) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let value = fetch().await?;
        if admit(&value) {
            let entry = CacheEntry {
                payload: Arc::new(value.clone()),
                refreshed_at: Instant::now(),
            };
            self.entries.insert(key.clone(), entry);
            gauge!(METRIC_ENTRIES).set(self.entries.len() as f64);
            debug!(target = "folio::cache", key = %key, "entry refreshed");
        }
        Ok(value)
    }

    fn record(&self, tally: &AtomicU64, metric: &'static str, key: &CacheKey) {
        tally.fetch_add(1, Ordering::Relaxed);
        counter!(metric, "op" => key.operation().to_string()).increment(1);
    }

    /// Drop every entry. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut removed = 0usize;
        self.entries.retain(|_, _| {
            removed += 1;
            false
        });
        gauge!(METRIC_ENTRIES).set(self.entries.len() as f64);
        info!(target = "folio::cache", removed, "cache cleared");
        removed
    }

    /// Evict every entry at or past the TTL. Returns how many were evicted.
    pub fn sweep(&self) -> usize {
        let ttl = self.config.ttl;
        let mut evicted = 0usize;
        self.entries.retain(|key, entry| {
            let keep = entry.refreshed_at.elapsed() < ttl;
            if !keep {
                evicted += 1;
                counter!(METRIC_EVICT, "op" => key.operation().to_string()).increment(1);
            }
            keep
        });
        gauge!(METRIC_ENTRIES).set(self.entries.len() as f64);

        if evicted > 0 {
            info!(
                target = "folio::cache",
                evicted,
                remaining = self.entries.len(),
                "expired entries swept"
            );
        }
        evicted
    }

    pub fn stats(&self) -> CacheStats {
        let ttl = self.config.ttl;
        let mut entries: Vec<EntryStats> = self
            .entries
            .iter()
            .map(|item| {
                let age = item.value().refreshed_at.elapsed();
                EntryStats {
                    key: item.key().to_string(),
                    age_seconds: age.as_secs(),
                    fresh: age < ttl,
                }
            })
            .collect();
        entries.sort_by(|left, right| left.key.cmp(&right.key));

        let fresh = entries.iter().filter(|entry| entry.fresh).count();
        CacheStats {
            total: entries.len(),
            fresh,
            stale: entries.len() - fresh,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            ttl_seconds: ttl.as_secs(),
            entries,
        }
    }
}

/// Wait for the leader's outcome. `None` when the leader went away without publishing.
async fn follow<T, E>(mut outcome: FlightReceiver) -> Option<Result<T, E>>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    let payload = outcome.wait_for(Option::is_some).await.ok()?.clone()?;
    payload.downcast_ref::<Result<T, E>>().cloned()
}
