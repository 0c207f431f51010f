//! Station query engine.
//!
//! Pure functions over a snapshot taken from a
//! [`StationStore`](crate::store::StationStore): filtering, stable sorting,
//! paging and network-wide summaries. Nothing here knows which backend the
//! snapshot came from.

mod engine;
mod params;
mod summary;

pub use engine::{StationPage, run_query, sort_stations};
pub use params::{
    DEFAULT_PAGE_SIZE, NormalizedQuery, SortDirection, SortKey, StationFilter, StationQuery,
};
pub use summary::{StationSummary, summarize};
