//! Inbound station query contract.
//!
//! [`StationService`] is what the HTTP layer calls. Reads go through a
//! [`ResponseCache`] and fall back to the store plus the query engine on a
//! miss; writes go straight to the store, and a successful replace also
//! refreshes that station's cache entry. Storage failures propagate to the
//! caller unchanged.

use std::sync::Arc;

use tracing::debug;

use crate::cache::{CacheConfig, ResponseCache};
use crate::domain::Station;
use crate::query::{StationPage, StationQuery, StationSummary, run_query, summarize};
use crate::store::{StationStore, StoreError};

/// Cache key for the network summary.
const SUMMARY_KEY: &str = "summary";

/// Cached query front end over a [`StationStore`].
pub struct StationService<S> {
    store: Arc<S>,
    pages: ResponseCache<Arc<StationPage>>,
    summaries: ResponseCache<Arc<StationSummary>>,
    stations: ResponseCache<Arc<Station>>,
}

impl<S: StationStore> StationService<S> {
    /// Create a service over `store` with caches built from `cache_config`.
    pub fn new(store: Arc<S>, cache_config: &CacheConfig) -> Self {
        Self {
            store,
            pages: ResponseCache::new(cache_config),
            summaries: ResponseCache::new(cache_config),
            stations: ResponseCache::new(cache_config),
        }
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Filter, sort and page the station list.
    ///
    /// Paging input is normalized against the backend's page size cap; the
    /// returned page reports the values actually used.
    pub async fn list_stations(&self, query: &StationQuery) -> Result<Arc<StationPage>, StoreError> {
        let normalized = query.normalize(self.store.max_page_size());
        let key = normalized.cache_key();

        self.pages
            .get_or_try_compute(key, async {
                let snapshot = self.store.get_all().await?;
                Ok(Arc::new(run_query(snapshot, &normalized)))
            })
            .await
    }

    /// Look up one station. Absent stations are not cached.
    pub async fn get_station(&self, number: u32) -> Result<Option<Arc<Station>>, StoreError> {
        let key = format!("station:{number}");
        if let Some(hit) = self.stations.get(&key).await {
            debug!(number, "station cache hit");
            return Ok(Some(hit));
        }

        let Some(station) = self.store.get_by_number(number).await? else {
            return Ok(None);
        };
        let station = Arc::new(station);
        self.stations.insert(key, station.clone()).await;
        Ok(Some(station))
    }

    /// Network-wide totals over the full, unfiltered collection.
    pub async fn get_summary(&self) -> Result<Arc<StationSummary>, StoreError> {
        self.summaries
            .get_or_try_compute(SUMMARY_KEY.to_string(), async {
                let snapshot = self.store.get_all().await?;
                Ok(Arc::new(summarize(&snapshot)))
            })
            .await
    }

    /// Add a new station.
    ///
    /// Rejects records with more available bikes than stands, and numbers
    /// that are already taken.
    pub async fn create_station(&self, mut station: Station) -> Result<Station, StoreError> {
        station.normalize();
        station.validate()?;
        self.store.create(station).await
    }

    /// Replace station `number` with `station`, keeping its number and
    /// contract name. Returns `Ok(None)` if there is no such station.
    ///
    /// The replaced station is written into the single-station cache, so a
    /// following [`get_station`](Self::get_station) sees it. Cached list
    /// pages and the summary still age out on their TTL.
    pub async fn replace_station(
        &self,
        number: u32,
        station: Station,
    ) -> Result<Option<Station>, StoreError> {
        station.validate()?;
        let Some(updated) = self.store.update(number, station).await? else {
            return Ok(None);
        };
        self.stations
            .insert(format!("station:{number}"), Arc::new(updated.clone()))
            .await;
        Ok(Some(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Availability;
    use crate::store::InMemoryStationStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn make_station(number: u32, name: &str, bikes: u32, stands: u32, status: &str) -> Station {
        let mut s = Station::new(number, "dublin", name);
        s.available_bikes = bikes;
        s.bike_stands = stands;
        s.status = status.into();
        s
    }

    fn seed() -> Vec<Station> {
        vec![
            make_station(1, "ALPHA STATION", 5, 10, "OPEN"),
            make_station(2, "BETA STATION", 0, 15, "CLOSED"),
            make_station(3, "GAMMA STATION", 8, 20, "OPEN"),
            make_station(4, "DELTA STATION", 3, 5, "OPEN"),
        ]
    }

    fn service() -> StationService<InMemoryStationStore> {
        let store = Arc::new(InMemoryStationStore::new(seed()));
        StationService::new(store, &CacheConfig::default())
    }

    /// Store wrapper counting snapshot reads, optionally failing them.
    struct CountingStore {
        inner: InMemoryStationStore,
        scans: AtomicUsize,
        fail: bool,
    }

    impl CountingStore {
        fn new(fail: bool) -> Self {
            Self {
                inner: InMemoryStationStore::new(seed()),
                scans: AtomicUsize::new(0),
                fail,
            }
        }
    }

    impl StationStore for CountingStore {
        async fn get_all(&self) -> Result<Vec<Station>, StoreError> {
            self.scans.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(StoreError::Timeout(Duration::from_secs(10)));
            }
            self.inner.get_all().await
        }

        async fn get_by_number(&self, number: u32) -> Result<Option<Station>, StoreError> {
            self.inner.get_by_number(number).await
        }

        async fn create(&self, station: Station) -> Result<Station, StoreError> {
            self.inner.create(station).await
        }

        async fn update(&self, number: u32, station: Station) -> Result<Option<Station>, StoreError> {
            self.inner.update(number, station).await
        }

        fn max_page_size(&self) -> usize {
            100
        }
    }

    #[tokio::test]
    async fn list_stations_seed_scenario() {
        let service = service();
        let query = StationQuery {
            sort: Some("availableBikes".into()),
            dir: Some("desc".into()),
            page: Some(1),
            page_size: Some(2),
            ..Default::default()
        };

        let page = service.list_stations(&query).await.unwrap();
        let numbers: Vec<u32> = page.items.iter().map(|s| s.number).collect();
        assert_eq!(numbers, vec![3, 1]);
        assert_eq!(page.total_count, 4);

        let page = service
            .list_stations(&StationQuery {
                page: Some(2),
                ..query
            })
            .await
            .unwrap();
        let numbers: Vec<u32> = page.items.iter().map(|s| s.number).collect();
        assert_eq!(numbers, vec![4, 2]);
    }

    #[tokio::test]
    async fn summary_seed_scenario() {
        let summary = service().get_summary().await.unwrap();
        assert_eq!(summary.total_stations, 4);
        assert_eq!(summary.total_bike_stands, 50);
        assert_eq!(summary.total_available_bikes, 16);
        assert_eq!(summary.open_stations, 3);
        assert_eq!(summary.closed_stations, 1);
    }

    #[tokio::test]
    async fn page_size_is_capped_by_backend() {
        let service = StationService::new(Arc::new(CountingStore::new(false)), &CacheConfig::default());
        let page = service
            .list_stations(&StationQuery {
                page_size: Some(150),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.page_size, 50);
    }

    #[tokio::test]
    async fn repeated_queries_hit_the_cache() {
        let store = Arc::new(CountingStore::new(false));
        let service = StationService::new(store.clone(), &CacheConfig::default());

        let query = StationQuery::default();
        service.list_stations(&query).await.unwrap();
        service.list_stations(&query).await.unwrap();
        assert_eq!(store.scans.load(Ordering::SeqCst), 1);

        let other = StationQuery {
            status: Some("OPEN".into()),
            ..Default::default()
        };
        service.list_stations(&other).await.unwrap();
        assert_eq!(store.scans.load(Ordering::SeqCst), 2);

        service.get_summary().await.unwrap();
        service.get_summary().await.unwrap();
        assert_eq!(store.scans.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn cached_pages_stay_stale_until_ttl() {
        let store = Arc::new(InMemoryStationStore::new(seed()));
        let service = StationService::new(store.clone(), &CacheConfig::default());

        let before = service.list_stations(&StationQuery::default()).await.unwrap();

        store
            .mutate_all(|_| Availability {
                bike_stands: 40,
                available_bikes: 40,
                last_update: 1,
            })
            .await;

        let after = service.list_stations(&StationQuery::default()).await.unwrap();
        assert_eq!(before, after);

        let summary = summarize(&store.get_all().await.unwrap());
        assert_eq!(summary.total_available_bikes, 160);
    }

    #[tokio::test]
    async fn expired_pages_are_recomputed() {
        let store = Arc::new(InMemoryStationStore::new(seed()));
        let config = CacheConfig::default().with_ttl(Duration::from_millis(50));
        let service = StationService::new(store.clone(), &config);

        service.get_summary().await.unwrap();
        store
            .mutate_all(|_| Availability {
                bike_stands: 40,
                available_bikes: 0,
                last_update: 1,
            })
            .await;
        tokio::time::sleep(Duration::from_millis(120)).await;

        let summary = service.get_summary().await.unwrap();
        assert_eq!(summary.total_available_bikes, 0);
        assert_eq!(summary.total_bike_stands, 160);
    }

    #[tokio::test]
    async fn store_failures_propagate() {
        let service = StationService::new(Arc::new(CountingStore::new(true)), &CacheConfig::default());

        let result = service.list_stations(&StationQuery::default()).await;
        assert!(matches!(result, Err(StoreError::Timeout(_))));

        let result = service.get_summary().await;
        assert!(matches!(result, Err(StoreError::Timeout(_))));
    }

    #[tokio::test]
    async fn get_station_hit_and_miss() {
        let service = service();

        let s = service.get_station(3).await.unwrap().unwrap();
        assert_eq!(s.name, "GAMMA STATION");

        assert!(service.get_station(99).await.unwrap().is_none());

        // A miss is not cached, so a later create becomes visible at once.
        service
            .create_station(make_station(99, "LATE STATION", 1, 2, "OPEN"))
            .await
            .unwrap();
        assert!(service.get_station(99).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn create_rejects_duplicates() {
        let service = service();
        let result = service
            .create_station(make_station(1, "IMPOSTOR", 0, 0, "OPEN"))
            .await;
        assert!(matches!(result, Err(StoreError::DuplicateKey(1))));

        let original = service.store().get_by_number(1).await.unwrap().unwrap();
        assert_eq!(original.name, "ALPHA STATION");
    }

    #[tokio::test]
    async fn create_rejects_more_bikes_than_stands() {
        let service = service();
        let result = service
            .create_station(make_station(10, "OVERFULL", 12, 10, "OPEN"))
            .await;
        assert!(matches!(result, Err(StoreError::Invalid(_))));
        assert!(service.store().get_by_number(10).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_recomputes_free_stands() {
        let service = service();
        let mut incoming = make_station(10, "FRESH", 4, 10, "OPEN");
        incoming.available_bike_stands = 99;

        let created = service.create_station(incoming).await.unwrap();
        assert_eq!(created.available_bike_stands, 6);
    }

    #[tokio::test]
    async fn replace_preserves_identity() {
        let service = service();
        let mut incoming = make_station(500, "BETA REOPENED", 6, 15, "OPEN");
        incoming.contract_name = "lyon".into();

        let updated = service.replace_station(2, incoming).await.unwrap().unwrap();
        assert_eq!(updated.number, 2);
        assert_eq!(updated.contract_name, "dublin");
        assert_eq!(updated.name, "BETA REOPENED");
        assert_eq!(updated.available_bike_stands, 9);
        assert!(updated.is_open());
    }

    #[tokio::test]
    async fn replace_refreshes_cached_station() {
        let service = service();
        let before = service.get_station(2).await.unwrap().unwrap();
        assert_eq!(before.name, "BETA STATION");

        service
            .replace_station(2, make_station(2, "BETA RENAMED", 1, 15, "OPEN"))
            .await
            .unwrap()
            .unwrap();

        let after = service.get_station(2).await.unwrap().unwrap();
        assert_eq!(after.name, "BETA RENAMED");
        assert_eq!(after.available_bikes, 1);
        assert_eq!(after.available_bike_stands, 14);
    }

    #[tokio::test]
    async fn replace_missing_and_invalid() {
        let service = service();

        let missing = service
            .replace_station(77, make_station(77, "X", 0, 1, "OPEN"))
            .await
            .unwrap();
        assert!(missing.is_none());

        let invalid = service
            .replace_station(1, make_station(1, "X", 5, 1, "OPEN"))
            .await;
        assert!(matches!(invalid, Err(StoreError::Invalid(_))));
        let untouched = service.store().get_by_number(1).await.unwrap().unwrap();
        assert_eq!(untouched.name, "ALPHA STATION");
    }
}
