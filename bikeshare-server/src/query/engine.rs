//! Filter, sort and paginate a station snapshot.

use serde::Serialize;

use crate::domain::Station;

use super::params::{NormalizedQuery, SortDirection, SortKey};

/// One page of a filtered, sorted station list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationPage {
    pub page: usize,
    pub page_size: usize,
    /// Number of stations matching the filters, before paging.
    pub total_count: usize,
    pub items: Vec<Station>,
}

impl StationPage {
    /// Number of pages needed to show every matching station.
    pub fn page_count(&self) -> usize {
        self.total_count.div_ceil(self.page_size.max(1))
    }
}

/// Run `query` against a snapshot.
///
/// Sorting is stable: stations that tie on the sort key keep their snapshot
/// order in both directions, so the same query over the same snapshot always
/// yields the same page.
pub fn run_query(snapshot: Vec<Station>, query: &NormalizedQuery) -> StationPage {
    let mut matched: Vec<Station> = snapshot
        .into_iter()
        .filter(|s| query.filter.matches(s))
        .collect();

    sort_stations(&mut matched, query.sort, query.dir);

    let total_count = matched.len();
    let start = query.page.saturating_sub(1).saturating_mul(query.page_size);
    let items = matched
        .into_iter()
        .skip(start)
        .take(query.page_size)
        .collect();

    StationPage {
        page: query.page,
        page_size: query.page_size,
        total_count,
        items,
    }
}

/// Stable sort of `stations` by `key` in direction `dir`.
pub fn sort_stations(stations: &mut [Station], key: SortKey, dir: SortDirection) {
    stations.sort_by(|a, b| {
        let ord = key.compare(a, b);
        match dir {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}
