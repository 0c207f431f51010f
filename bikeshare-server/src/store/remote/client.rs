//! Document store HTTP client.
//!
//! Speaks a small JSON REST protocol shaped like a document database:
//! documents live under `{base}/dbs/{database}/colls/{container}/docs`, are
//! addressed by string id, and are partitioned by a key sent in the
//! `x-partition-key` header.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::domain::Station;
use crate::store::StoreError;

/// Default base URL for a local document store emulator.
const DEFAULT_BASE_URL: &str = "http://localhost:8081";

/// Default database name.
const DEFAULT_DATABASE: &str = "DublinBikesDb";

/// Default container name.
const DEFAULT_CONTAINER: &str = "stations";

/// Default deadline for one logical store operation.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default cap on page size for queries served from the document store.
const DEFAULT_MAX_PAGE_SIZE: usize = 100;

/// Header carrying the partition key of the addressed document.
const PARTITION_KEY_HEADER: &str = "x-partition-key";

/// A station as stored in the document store: the record plus its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationDocument {
    pub id: String,
    #[serde(flatten)]
    pub station: Station,
}

impl From<Station> for StationDocument {
    fn from(station: Station) -> Self {
        Self {
            id: station.document_id(),
            station,
        }
    }
}

/// Wrapper for query and scan responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentList {
    #[serde(rename = "Documents")]
    pub documents: Vec<StationDocument>,
}

/// Configuration for the document store client.
#[derive(Debug, Clone)]
pub struct DocumentStoreConfig {
    /// Base URL of the document store
    pub base_url: String,
    /// Database holding the station container
    pub database: String,
    /// Container holding station documents
    pub container: String,
    /// Optional key sent in the `x-apikey` header
    pub api_key: Option<String>,
    /// Deadline for each logical store operation
    pub timeout: Duration,
    /// Largest page size served from this backend
    pub max_page_size: usize,
}

impl DocumentStoreConfig {
    /// Create a config pointing at `base_url` with default names and limits.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the database and container names.
    pub fn with_collection(
        mut self,
        database: impl Into<String>,
        container: impl Into<String>,
    ) -> Self {
        self.database = database.into();
        self.container = container.into();
        self
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the per-operation deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the page size cap.
    pub fn with_max_page_size(mut self, n: usize) -> Self {
        self.max_page_size = n;
        self
    }
}

impl Default for DocumentStoreConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            container: DEFAULT_CONTAINER.to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

/// Client for the station container of a document store.
///
/// Every method takes an absolute deadline. A call still in flight when the
/// deadline passes is dropped and reported as [`StoreError::Timeout`]; no
/// call is retried.
#[derive(Debug, Clone)]
pub struct DocumentClient {
    http: reqwest::Client,
    docs_url: String,
    timeout: Duration,
}

impl DocumentClient {
    /// Create a new document store client.
    pub fn new(config: &DocumentStoreConfig) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();

        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(key).map_err(|_| StoreError::Api {
                status: 0,
                message: "Invalid API key format".to_string(),
            })?;
            headers.insert(HeaderName::from_static("x-apikey"), value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(StoreError::Http)?;

        let docs_url = format!(
            "{}/dbs/{}/colls/{}/docs",
            config.base_url.trim_end_matches('/'),
            config.database,
            config.container
        );

        Ok(Self {
            http,
            docs_url,
            timeout: config.timeout,
        })
    }

    /// Deadline for an operation starting now.
    pub fn deadline(&self) -> Instant {
        Instant::now() + self.timeout
    }

    /// Fetch every station document.
    pub async fn scan(&self, deadline: Instant) -> Result<Vec<Station>, StoreError> {
        let request = self.http.get(&self.docs_url);
        let list: DocumentList = self.fetch_json(request, deadline).await?;
        Ok(list.documents.into_iter().map(|d| d.station).collect())
    }

    /// Fetch the station with the given number, across all partitions.
    pub async fn query_by_number(
        &self,
        number: u32,
        deadline: Instant,
    ) -> Result<Option<Station>, StoreError> {
        let request = self
            .http
            .get(&self.docs_url)
            .query(&[("number", number.to_string())]);
        let list: DocumentList = self.fetch_json(request, deadline).await?;
        Ok(list
            .documents
            .into_iter()
            .map(|d| d.station)
            .find(|s| s.number == number))
    }

    /// Create a station document in the station's partition.
    pub async fn create(&self, station: &Station, deadline: Instant) -> Result<Station, StoreError> {
        let document = StationDocument::from(station.clone());
        let request = self
            .http
            .post(&self.docs_url)
            .header(PARTITION_KEY_HEADER, &station.contract_name)
            .json(&document);

        let response = self.send(request, deadline).await?;
        if response.status() == StatusCode::CONFLICT {
            return Err(StoreError::DuplicateKey(station.number));
        }
        let created: StationDocument = self.read_json(response, deadline).await?;
        Ok(created.station)
    }

    /// Replace an existing station document.
    ///
    /// Returns `Ok(None)` if the document store has no such document.
    pub async fn replace(
        &self,
        station: &Station,
        deadline: Instant,
    ) -> Result<Option<Station>, StoreError> {
        let document = StationDocument::from(station.clone());
        let url = format!("{}/{}", self.docs_url, document.id);
        let request = self
            .http
            .put(&url)
            .header(PARTITION_KEY_HEADER, &station.contract_name)
            .json(&document);

        let response = self.send(request, deadline).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let replaced: StationDocument = self.read_json(response, deadline).await?;
        Ok(Some(replaced.station))
    }

    async fn fetch_json<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
        deadline: Instant,
    ) -> Result<T, StoreError> {
        let response = self.send(request, deadline).await?;
        self.read_json(response, deadline).await
    }

    /// Send a request, giving up at `deadline`.
    async fn send(&self, request: RequestBuilder, deadline: Instant) -> Result<Response, StoreError> {
        match tokio::time::timeout_at(deadline, request.send()).await {
            Err(_) => Err(StoreError::Timeout(self.timeout)),
            Ok(Err(e)) => Err(self.transport_error(e)),
            Ok(Ok(response)) => Ok(response),
        }
    }

    /// Check the status and decode the body, giving up at `deadline`.
    async fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        response: Response,
        deadline: Instant,
    ) -> Result<T, StoreError> {
        let status = response.status();

        let body = match tokio::time::timeout_at(deadline, response.text()).await {
            Err(_) => return Err(StoreError::Timeout(self.timeout)),
            Ok(Err(e)) => return Err(self.transport_error(e)),
            Ok(Ok(body)) => body,
        };

        if !status.is_success() {
            return Err(StoreError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        serde_json::from_str(&body).map_err(|e| StoreError::Json {
            message: format!("{e} (body: {})", body.chars().take(500).collect::<String>()),
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> StoreError {
        if err.is_timeout() {
            StoreError::Timeout(self.timeout)
        } else {
            StoreError::Http(err)
        }
    }
}
