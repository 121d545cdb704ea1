//! Result caching for expensive lookups.
//!
//! The cache fronts hub resolution, candidate route sets and driver
//! aggregate stats, each with its own freshness window. Correctness never
//! depends on it: entries are immutable once written and expire by TTL,
//! and an unavailable backend simply turns every read into a miss and
//! every write into a no-op. There is no invalidation protocol: hub and
//! route data change slowly, and seat availability is re-checked at
//! booking time by another service.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use moka::future::Cache as MokaCache;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::telemetry::MetricsSink;

/// Key/value store with per-entry TTL, as seen by the engine.
///
/// Implementations are infallible by contract: a backend failure must
/// surface as a miss (`get`) or a dropped write (`set`), never as an
/// error. Caching is a latency optimization only.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<Bytes>;
    async fn set(&self, key: &str, value: Bytes, ttl: Duration);
}

/// A stored value with its expiry deadline.
///
/// The deadline travels with the entry so a single backing cache can
/// serve all TTL classes; moka's own TTL is only a housekeeping bound.
#[derive(Clone)]
struct StoredEntry {
    deadline: Instant,
    payload: Bytes,
}

/// Configuration for the in-process cache store.
#[derive(Debug, Clone)]
pub struct MokaStoreConfig {
    /// Maximum number of entries.
    pub max_capacity: u64,
    /// Upper bound on entry lifetime, regardless of per-entry TTL.
    pub max_ttl: Duration,
}

impl Default for MokaStoreConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            max_ttl: Duration::from_secs(600),
        }
    }
}

/// In-process cache store backed by moka.
#[derive(Clone)]
pub struct MokaStore {
    entries: MokaCache<String, StoredEntry>,
}

impl MokaStore {
    pub fn new(config: &MokaStoreConfig) -> Self {
        let entries = MokaCache::builder()
            .time_to_live(config.max_ttl)
            .max_capacity(config.max_capacity)
            .build();
        Self { entries }
    }

    /// Number of live entries (for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }
}

#[async_trait]
impl CacheStore for MokaStore {
    async fn get(&self, key: &str) -> Option<Bytes> {
        let entry = self.entries.get(key).await?;
        if Instant::now() >= entry.deadline {
            self.entries.invalidate(key).await;
            return None;
        }
        Some(entry.payload)
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) {
        let entry = StoredEntry {
            deadline: Instant::now() + ttl,
            payload: value,
        };
        self.entries.insert(key.to_string(), entry).await;
    }
}

/// Store that caches nothing. Stands in for a disabled or unreachable
/// backend; the engine must behave identically (if slower) with it.
#[derive(Debug, Default, Clone)]
pub struct NoopStore;

#[async_trait]
impl CacheStore for NoopStore {
    async fn get(&self, _key: &str) -> Option<Bytes> {
        None
    }

    async fn set(&self, _key: &str, _value: Bytes, _ttl: Duration) {}
}

/// Derive a deterministic cache key from a prefix and query parameters.
///
/// Parameters are sorted by name and canonically joined before hashing,
/// so the same logical query always produces the same key regardless of
/// argument order at the call site.
pub fn cache_key(prefix: &str, params: &[(&str, String)]) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));

    let mut canonical = String::new();
    for (name, value) in sorted {
        canonical.push_str(name);
        canonical.push('=');
        canonical.push_str(value);
        canonical.push('\x1f');
    }

    format!("{prefix}:{:016x}", seahash::hash(canonical.as_bytes()))
}

/// Typed cache facade over a [`CacheStore`].
///
/// Serializes values as JSON and reports hit/miss counts per named
/// cache. Serialization problems degrade to miss/no-op with a debug log,
/// in keeping with the never-an-error contract.
#[derive(Clone)]
pub struct ResultCache {
    store: Arc<dyn CacheStore>,
    metrics: Arc<dyn MetricsSink>,
}

impl ResultCache {
    pub fn new(store: Arc<dyn CacheStore>, metrics: Arc<dyn MetricsSink>) -> Self {
        Self { store, metrics }
    }

    /// Look up and deserialize a cached value.
    pub async fn get_json<T: DeserializeOwned>(&self, name: &'static str, key: &str) -> Option<T> {
        let Some(bytes) = self.store.get(key).await else {
            self.metrics.cache_miss(name);
            return None;
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                self.metrics.cache_hit(name);
                Some(value)
            }
            Err(e) => {
                debug!(cache = name, error = %e, "discarding undecodable cache entry");
                self.metrics.cache_miss(name);
                None
            }
        }
    }

    /// Serialize and store a value under the given TTL.
    pub async fn put_json<T: Serialize>(
        &self,
        name: &'static str,
        key: &str,
        value: &T,
        ttl: Duration,
    ) {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.store.set(key, Bytes::from(bytes), ttl).await,
            Err(e) => debug!(cache = name, error = %e, "failed to serialize cache entry"),
        }
    }
}
