//! Application state for the web layer.

use std::sync::Arc;

use crate::service::StationService;
use crate::store::StationStore;

/// Shared application state.
pub struct AppState<S> {
    /// Cached station queries over the configured backend
    pub stations: Arc<StationService<S>>,
}

impl<S: StationStore> AppState<S> {
    /// Create a new app state.
    pub fn new(stations: StationService<S>) -> Self {
        Self {
            stations: Arc::new(stations),
        }
    }
}

// Manual impl: `S` itself need not be `Clone`.
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            stations: Arc::clone(&self.stations),
        }
    }
}
