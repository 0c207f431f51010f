//! Domain types for the bike-share station server.
//!
//! A [`Station`] is the unit every other layer stores, queries and mutates.
//! Derived values (occupancy, free stands) are computed here so the stores
//! and the query engine agree on them.

mod error;
mod station;

pub use error::InvalidStation;
pub use station::{Availability, DEFAULT_CONTRACT, Position, Station, now_millis};
