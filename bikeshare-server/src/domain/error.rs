//! Domain error types.
//!
//! Validation failures for client-submitted station records. These are
//! distinct from storage errors.

/// A station whose availability numbers are inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "invalid station {number}: {available_bikes} available bikes exceed {bike_stands} bike stands"
)]
pub struct InvalidStation {
    pub number: u32,
    pub available_bikes: u32,
    pub bike_stands: u32,
}
