//! Aggregate counts over a station snapshot.

use serde::Serialize;

use crate::domain::Station;

/// Network-wide totals, always recomputed from a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationSummary {
    pub total_stations: u64,
    pub total_bike_stands: u64,
    pub total_available_bikes: u64,
    pub total_available_stands: u64,
    pub open_stations: u64,
    pub closed_stations: u64,
}

/// Summarize every station in `stations`.
pub fn summarize(stations: &[Station]) -> StationSummary {
    stations
        .iter()
        .fold(StationSummary::default(), |mut acc, s| {
            acc.total_stations += 1;
            acc.total_bike_stands += u64::from(s.bike_stands);
            acc.total_available_bikes += u64::from(s.available_bikes);
            acc.total_available_stands += u64::from(s.available_bike_stands);
            if s.is_open() {
                acc.open_stations += 1;
            } else if s.is_closed() {
                acc.closed_stations += 1;
            }
            acc
        })
}
