//! Station storage.
//!
//! [`StationStore`] is the one contract both backends implement:
//!
//! - [`InMemoryStationStore`] owns the collection in process behind an async
//!   reader/writer lock and is the only backend the live mutator writes to.
//! - [`RemoteStationStore`] talks to a document store over HTTP, fetching the
//!   collection per call and bounding every call with a deadline.
//!
//! Callers only ever receive cloned records; nothing hands out a reference
//! into the underlying collection.

mod error;
mod memory;
mod remote;

pub use error::StoreError;
pub use memory::{InMemoryStationStore, MEMORY_MAX_PAGE_SIZE};
pub use remote::{
    DocumentClient, DocumentList, DocumentStoreConfig, RemoteStationStore, StationDocument,
};

use crate::domain::Station;

/// Capability set shared by every station backend.
///
/// Implementations must be thread-safe; the returned futures are `Send` so
/// they can be awaited from request handlers on any worker thread.
pub trait StationStore: Send + Sync {
    /// Point-in-time snapshot of every station, in insertion order.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Station>, StoreError>> + Send;

    /// Look up one station by number.
    fn get_by_number(
        &self,
        number: u32,
    ) -> impl Future<Output = Result<Option<Station>, StoreError>> + Send;

    /// Insert a new station. Fails with [`StoreError::DuplicateKey`] if the
    /// number is taken, leaving the existing record untouched.
    fn create(&self, station: Station) -> impl Future<Output = Result<Station, StoreError>> + Send;

    /// Replace every non-identity field of station `number`.
    ///
    /// Returns `Ok(None)` when no such station exists.
    fn update(
        &self,
        number: u32,
        station: Station,
    ) -> impl Future<Output = Result<Option<Station>, StoreError>> + Send;

    /// Largest page size this backend serves in one query.
    fn max_page_size(&self) -> usize;
}
