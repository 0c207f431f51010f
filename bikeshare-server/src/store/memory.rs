//! In-process station store.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::domain::{Availability, Station};

use super::StationStore;
use super::error::StoreError;

/// Largest page size served from the in-process store.
pub const MEMORY_MAX_PAGE_SIZE: usize = 200;

/// Stations in insertion order plus a number → position index.
#[derive(Default)]
struct Collection {
    stations: Vec<Station>,
    index: HashMap<u32, usize>,
}

impl Collection {
    fn get(&self, number: u32) -> Option<&Station> {
        self.index.get(&number).map(|&i| &self.stations[i])
    }

    fn get_mut(&mut self, number: u32) -> Option<&mut Station> {
        self.index.get(&number).map(|&i| &mut self.stations[i])
    }

    /// Append a station, returning `false` if its number is already taken.
    fn push(&mut self, station: Station) -> bool {
        if self.index.contains_key(&station.number) {
            return false;
        }
        self.index.insert(station.number, self.stations.len());
        self.stations.push(station);
        true
    }
}

/// Thread-safe in-process station collection.
///
/// Every read and write goes through one `RwLock`, so readers never see a
/// station with half of its availability fields rewritten. Cloning the store
/// shares the same collection.
#[derive(Clone, Default)]
pub struct InMemoryStationStore {
    inner: Arc<RwLock<Collection>>,
}

impl InMemoryStationStore {
    /// Create a store seeded with `stations`.
    ///
    /// Records are normalized on the way in. Records with more available
    /// bikes than stands, and later records reusing an earlier number, are
    /// dropped.
    pub fn new(stations: Vec<Station>) -> Self {
        let mut collection = Collection::default();
        for mut station in stations {
            station.normalize();
            let number = station.number;
            if let Err(e) = station.validate() {
                warn!(number, error = %e, "dropping invalid station from seed data");
                continue;
            }
            if !collection.push(station) {
                warn!(number, "dropping duplicate station from seed data");
            }
        }

        Self {
            inner: Arc::new(RwLock::new(collection)),
        }
    }

    /// Number of stations in the store.
    pub async fn len(&self) -> usize {
        self.inner.read().await.stations.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.stations.is_empty()
    }

    /// Rewrite the availability of every station under one write lock.
    ///
    /// `f` sees each station as it currently is and returns its new
    /// availability; identity and descriptive fields cannot be touched.
    /// Returns the number of stations rewritten.
    pub async fn mutate_all<F>(&self, mut f: F) -> usize
    where
        F: FnMut(&Station) -> Availability,
    {
        let mut guard = self.inner.write().await;
        for station in guard.stations.iter_mut() {
            let availability = f(station);
            station.set_availability(availability);
        }
        guard.stations.len()
    }
}

impl StationStore for InMemoryStationStore {
    async fn get_all(&self) -> Result<Vec<Station>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard.stations.clone())
    }

    async fn get_by_number(&self, number: u32) -> Result<Option<Station>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard.get(number).cloned())
    }

    async fn create(&self, mut station: Station) -> Result<Station, StoreError> {
        station.normalize();
        let mut guard = self.inner.write().await;
        if guard.get(station.number).is_some() {
            return Err(StoreError::DuplicateKey(station.number));
        }
        guard.push(station.clone());
        debug!(number = station.number, "created station");
        Ok(station)
    }

    async fn update(&self, number: u32, station: Station) -> Result<Option<Station>, StoreError> {
        let mut guard = self.inner.write().await;
        let Some(existing) = guard.get_mut(number) else {
            return Ok(None);
        };
        existing.replace_with(station);
        debug!(number, "replaced station");
        Ok(Some(existing.clone()))
    }

    fn max_page_size(&self) -> usize {
        MEMORY_MAX_PAGE_SIZE
    }
}
