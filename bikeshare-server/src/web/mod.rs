//! Web layer for the bike-share station server.
//!
//! Provides the station query API over HTTP.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
