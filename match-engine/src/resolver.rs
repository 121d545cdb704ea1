//! Hub resolution: raw coordinates to nearby active hubs.
//!
//! The store's proximity filter is approximate, so resolution is two
//! explicit stages: the store narrows by bounding circle, then the
//! resolver re-checks every candidate by exact haversine distance,
//! drops inactive hubs, and orders deterministically by (distance, id).
//! Results are cached under quantized coordinates so float jitter in
//! request coordinates still hits the cache.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{ResultCache, cache_key};
use crate::domain::Hub;
use crate::geo::{self, Point};
use crate::stores::{HubStore, StoreError, retry_once_transient};

/// Resolves raw coordinates to compatible hubs.
pub struct HubResolver {
    store: Arc<dyn HubStore>,
    cache: ResultCache,
    cache_ttl: Duration,
    retry_backoff: Duration,
}

impl HubResolver {
    pub fn new(
        store: Arc<dyn HubStore>,
        cache: ResultCache,
        cache_ttl: Duration,
        retry_backoff: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            cache_ttl,
            retry_backoff,
        }
    }

    /// The closest active hub within `radius_m`, or `None` when the
    /// area has no coverage at that radius.
    ///
    /// Ties on distance break by hub id, so resolution is deterministic
    /// for a fixed hub inventory.
    pub async fn nearest(&self, point: Point, radius_m: f64) -> Result<Option<Hub>, StoreError> {
        Ok(self
            .within_radius(point, radius_m, 1)
            .await?
            .into_iter()
            .next())
    }

    /// Active hubs within `radius_m`, ordered by ascending exact
    /// distance (ties by id), truncated to `limit`.
    pub async fn within_radius(
        &self,
        point: Point,
        radius_m: f64,
        limit: usize,
    ) -> Result<Vec<Hub>, StoreError> {
        if !(radius_m > 0.0) {
            return Err(StoreError::InvalidQuery("radius must be positive"));
        }
        if limit == 0 {
            return Ok(Vec::new());
        }

        let (qlat, qlon) = point.quantize();
        let key = cache_key(
            "hub-near",
            &[
                ("qlat", qlat.to_string()),
                ("qlon", qlon.to_string()),
                ("radius_m", (radius_m.round() as i64).to_string()),
                ("limit", limit.to_string()),
            ],
        );

        if let Some(hubs) = self.cache.get_json::<Vec<Hub>>("hub_resolution", &key).await {
            return Ok(hubs);
        }

        let raw = retry_once_transient("hub proximity query", self.retry_backoff, || {
            self.store.hubs_near(point, radius_m)
        })
        .await?;

        // Exact re-check: the store filter is bounding-box first.
        let mut verified: Vec<(f64, Hub)> = raw
            .into_iter()
            .filter(|h| h.active)
            .map(|h| (geo::distance_meters(point, h.location), h))
            .filter(|(d, _)| *d <= radius_m)
            .collect();

        verified.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)));
        verified.truncate(limit);

        let hubs: Vec<Hub> = verified.into_iter().map(|(_, h)| h).collect();
        self.cache
            .put_json("hub_resolution", &key, &hubs, self.cache_ttl)
            .await;

        Ok(hubs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MokaStore, MokaStoreConfig, NoopStore};
    use crate::domain::HubId;
    use crate::stores::mock::InMemoryHubStore;
    use crate::telemetry::NullSink;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn hub(id: &str, lat: f64, lon: f64, active: bool) -> Hub {
        Hub {
            id: HubId::parse(id).unwrap(),
            name: id.to_string(),
            location: Point::new(lat, lon).unwrap(),
            area: "test".to_string(),
            active,
        }
    }

    fn point(lat: f64, lon: f64) -> Point {
        Point::new(lat, lon).unwrap()
    }

    /// Wrapper that counts store round-trips.
    struct CountingStore<S> {
        inner: S,
        calls: AtomicU32,
    }

    #[async_trait]
    impl<S: HubStore> HubStore for CountingStore<S> {
        async fn hubs_near(&self, p: Point, r: f64) -> Result<Vec<Hub>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.hubs_near(p, r).await
        }

        async fn hub_by_id(&self, id: &HubId) -> Result<Option<Hub>, StoreError> {
            self.inner.hub_by_id(id).await
        }

        async fn active_hubs(&self) -> Result<Vec<Hub>, StoreError> {
            self.inner.active_hubs().await
        }
    }

    /// Store that always fails with a non-transient error.
    struct BrokenStore;

    #[async_trait]
    impl HubStore for BrokenStore {
        async fn hubs_near(&self, _p: Point, _r: f64) -> Result<Vec<Hub>, StoreError> {
            Err(StoreError::Unauthorized)
        }

        async fn hub_by_id(&self, _id: &HubId) -> Result<Option<Hub>, StoreError> {
            Err(StoreError::Unauthorized)
        }

        async fn active_hubs(&self) -> Result<Vec<Hub>, StoreError> {
            Err(StoreError::Unauthorized)
        }
    }

    fn moka_cache() -> ResultCache {
        ResultCache::new(
            Arc::new(MokaStore::new(&MokaStoreConfig::default())),
            Arc::new(NullSink),
        )
    }

    fn resolver(store: Arc<dyn HubStore>, cache: ResultCache) -> HubResolver {
        HubResolver::new(store, cache, Duration::from_secs(300), Duration::ZERO)
    }

    #[tokio::test]
    async fn nearest_picks_closest_active() {
        let store = Arc::new(InMemoryHubStore::new(vec![
            hub("far", 6.5400, 3.3792, true),
            hub("near", 6.5260, 3.3792, true),
            hub("nearest-but-inactive", 6.5250, 3.3792, false),
        ]));
        let r = resolver(store, moka_cache());

        let found = r.nearest(point(6.5244, 3.3792), 3_000.0).await.unwrap();
        assert_eq!(found.unwrap().id, HubId::parse("near").unwrap());
    }

    #[tokio::test]
    async fn nearest_tie_breaks_by_id() {
        // Two hubs the same distance north and south of the query point.
        let store = Arc::new(InMemoryHubStore::new(vec![
            hub("hub-b", 6.5344, 3.3792, true),
            hub("hub-a", 6.5144, 3.3792, true),
        ]));
        let r = resolver(store, moka_cache());

        let found = r.nearest(point(6.5244, 3.3792), 3_000.0).await.unwrap();
        assert_eq!(found.unwrap().id, HubId::parse("hub-a").unwrap());
    }

    #[tokio::test]
    async fn exact_recheck_drops_bounding_box_corners() {
        // Inside the store's bounding box but outside the circle.
        let store = Arc::new(InMemoryHubStore::new(vec![hub(
            "corner",
            6.5244 + 0.0089,
            3.3792 + 0.0089,
            true,
        )]));
        let r = resolver(store, moka_cache());

        let found = r.nearest(point(6.5244, 3.3792), 1_000.0).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn within_radius_is_ordered_and_limited() {
        let store = Arc::new(InMemoryHubStore::new(vec![
            hub("c", 6.5400, 3.3792, true),
            hub("a", 6.5260, 3.3792, true),
            hub("b", 6.5320, 3.3792, true),
        ]));
        let r = resolver(store, moka_cache());

        let all = r.within_radius(point(6.5244, 3.3792), 3_000.0, 10).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let two = r.within_radius(point(6.5244, 3.3792), 3_000.0, 2).await.unwrap();
        assert_eq!(two.len(), 2);
        assert_eq!(two[0].id.as_str(), "a");
    }

    #[tokio::test]
    async fn second_resolution_hits_cache() {
        let store = Arc::new(CountingStore {
            inner: InMemoryHubStore::new(vec![hub("a", 6.5260, 3.3792, true)]),
            calls: AtomicU32::new(0),
        });
        let r = resolver(store.clone(), moka_cache());

        let p = point(6.5244, 3.3792);
        assert!(r.nearest(p, 3_000.0).await.unwrap().is_some());
        // Slight jitter inside the quantization cell still hits.
        let jittered = point(6.52441, 3.37919);
        assert!(r.nearest(jittered, 3_000.0).await.unwrap().is_some());

        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_radius_is_a_different_key() {
        let store = Arc::new(CountingStore {
            inner: InMemoryHubStore::new(vec![hub("a", 6.5260, 3.3792, true)]),
            calls: AtomicU32::new(0),
        });
        let r = resolver(store.clone(), moka_cache());

        let p = point(6.5244, 3.3792);
        r.nearest(p, 3_000.0).await.unwrap();
        r.nearest(p, 6_000.0).await.unwrap();

        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cache_disabled_still_resolves() {
        let store = Arc::new(InMemoryHubStore::new(vec![hub("a", 6.5260, 3.3792, true)]));
        let cache = ResultCache::new(Arc::new(NoopStore), Arc::new(NullSink));
        let r = resolver(store, cache);

        let found = r.nearest(point(6.5244, 3.3792), 3_000.0).await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let r = resolver(Arc::new(BrokenStore), moka_cache());
        let result = r.nearest(point(6.5244, 3.3792), 3_000.0).await;
        assert!(matches!(result, Err(StoreError::Unauthorized)));
    }

    #[tokio::test]
    async fn invalid_radius_rejected_without_store_access() {
        let store = Arc::new(CountingStore {
            inner: InMemoryHubStore::new(vec![]),
            calls: AtomicU32::new(0),
        });
        let r = resolver(store.clone(), moka_cache());

        assert!(r.nearest(point(6.5244, 3.3792), 0.0).await.is_err());
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }
}
