//! Station store backed by a remote document store.
//!
//! Stations are documents partitioned by contract name with the station
//! number as id. Each logical operation gets one deadline shared by all of
//! its round trips, and fails with [`StoreError::Timeout`] once that
//! deadline passes. Nothing is retried here: callers decide whether a
//! timeout is worth another attempt.

mod client;

pub use client::{DocumentClient, DocumentList, DocumentStoreConfig, StationDocument};

use tracing::{debug, warn};

use crate::domain::Station;

use super::StationStore;
use super::error::StoreError;

/// [`StationStore`] over a [`DocumentClient`].
#[derive(Debug, Clone)]
pub struct RemoteStationStore {
    client: DocumentClient,
    max_page_size: usize,
}

impl RemoteStationStore {
    /// Create a store for the container described by `config`.
    pub fn new(config: &DocumentStoreConfig) -> Result<Self, StoreError> {
        Ok(Self {
            client: DocumentClient::new(config)?,
            max_page_size: config.max_page_size,
        })
    }
}

impl StationStore for RemoteStationStore {
    async fn get_all(&self) -> Result<Vec<Station>, StoreError> {
        let deadline = self.client.deadline();
        let stations = self
            .client
            .scan(deadline)
            .await
            .inspect_err(|e| warn!(error = %e, "document store scan failed"))?;
        debug!(count = stations.len(), "scanned station documents");
        Ok(stations)
    }

    async fn get_by_number(&self, number: u32) -> Result<Option<Station>, StoreError> {
        let deadline = self.client.deadline();
        self.client
            .query_by_number(number, deadline)
            .await
            .inspect_err(|e| warn!(number, error = %e, "document store lookup failed"))
    }

    async fn create(&self, mut station: Station) -> Result<Station, StoreError> {
        station.normalize();
        let deadline = self.client.deadline();

        // Document ids are only unique per partition; numbers are unique store-wide.
        let result: Result<Station, StoreError> = async {
            if self
                .client
                .query_by_number(station.number, deadline)
                .await?
                .is_some()
            {
                return Err(StoreError::DuplicateKey(station.number));
            }
            self.client.create(&station, deadline).await
        }
        .await;

        match &result {
            Ok(_) => debug!(number = station.number, "created station document"),
            Err(StoreError::DuplicateKey(_)) => {}
            Err(e) => warn!(number = station.number, error = %e, "document store create failed"),
        }
        result
    }

    async fn update(&self, number: u32, station: Station) -> Result<Option<Station>, StoreError> {
        let deadline = self.client.deadline();

        let result: Result<Option<Station>, StoreError> = async {
            let Some(mut existing) = self.client.query_by_number(number, deadline).await? else {
                return Ok(None);
            };
            existing.replace_with(station);
            self.client.replace(&existing, deadline).await
        }
        .await;

        if let Err(e) = &result {
            warn!(number, error = %e, "document store replace failed");
        }
        result
    }

    fn max_page_size(&self) -> usize {
        self.max_page_size
    }
}
