//! Station store error types.

use std::time::Duration;

use crate::domain::InvalidStation;

/// Errors from a [`StationStore`](super::StationStore).
///
/// A missing station is not an error: lookups return `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A station with this number already exists
    #[error("station {0} already exists")]
    DuplicateKey(u32),

    /// The submitted record breaks an availability invariant
    #[error(transparent)]
    Invalid(#[from] InvalidStation),

    /// The document store did not answer before the deadline
    #[error("document store call timed out after {0:?}")]
    Timeout(Duration),

    /// HTTP request failed before a response arrived
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    /// Document store returned an unexpected status
    #[error("document store error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse a document store response
    #[error("JSON parse error: {message}")]
    Json { message: String },
}

impl StoreError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, StoreError::Timeout(_))
    }
}
