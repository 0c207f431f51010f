//! Data transfer objects for web requests and responses.

use chrono::{DateTime, SecondsFormat};
use chrono_tz::Europe::Dublin;
use serde::{Deserialize, Serialize};

use crate::domain::{Position, Station, now_millis};
use crate::query::{StationPage, StationQuery};

/// Query string for the station list.
///
/// Every field arrives as text and is parsed leniently: a value that does
/// not parse is treated as absent, so bad paging input falls back to the
/// defaults instead of failing the request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListStationsParams {
    /// Case-insensitive contract name match
    pub contract_name: Option<String>,

    /// Case-insensitive status match
    pub status: Option<String>,

    /// Minimum number of available bikes
    pub min_bikes: Option<String>,

    /// Substring of the name or address
    pub q: Option<String>,

    /// Sort key (defaults to name)
    pub sort: Option<String>,

    /// `asc` or `desc`
    pub dir: Option<String>,

    /// 1-based page number
    pub page: Option<String>,

    /// Items per page
    pub page_size: Option<String>,
}

impl ListStationsParams {
    pub fn into_query(self) -> StationQuery {
        StationQuery {
            contract_name: self.contract_name,
            status: self.status,
            min_bikes: parse_int(self.min_bikes.as_deref()),
            q: self.q,
            sort: self.sort,
            dir: self.dir,
            page: parse_int(self.page.as_deref()),
            page_size: parse_int(self.page_size.as_deref()),
        }
    }
}

fn parse_int(s: Option<&str>) -> Option<i64> {
    s.and_then(|s| s.trim().parse().ok())
}

/// A station in responses: the stored record plus derived fields.
#[derive(Debug, Serialize)]
pub struct StationResult {
    /// Document id (the station number as a string)
    pub id: String,

    #[serde(flatten)]
    pub station: Station,

    /// Fraction of stands holding a bike
    pub occupancy: f64,

    /// `last_update` as an RFC 3339 UTC timestamp
    pub last_update_utc: Option<String>,

    /// `last_update` in Irish local time, with its offset
    pub last_update_local: Option<String>,
}

impl StationResult {
    pub fn from_station(station: &Station) -> Self {
        let updated = DateTime::from_timestamp_millis(station.last_update);
        Self {
            id: station.document_id(),
            occupancy: station.occupancy(),
            last_update_utc: updated.map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true)),
            last_update_local: updated
                .map(|t| t.with_timezone(&Dublin).to_rfc3339_opts(SecondsFormat::Millis, false)),
            station: station.clone(),
        }
    }
}

/// One page of the station list.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedStationsResponse {
    pub page: usize,
    pub page_size: usize,
    pub total_count: usize,
    pub items: Vec<StationResult>,
}

impl PagedStationsResponse {
    pub fn from_page(page: &StationPage) -> Self {
        Self {
            page: page.page,
            page_size: page.page_size,
            total_count: page.total_count,
            items: page.items.iter().map(StationResult::from_station).collect(),
        }
    }
}

/// Body of a create or replace request.
///
/// Derived fields (`available_bike_stands`, `occupancy`, `id`) are ignored
/// if present; the number in the path wins over `number` on replace.
#[derive(Debug, Deserialize)]
pub struct StationInput {
    pub number: Option<u32>,
    #[serde(default)]
    pub contract_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub banking: bool,
    #[serde(default)]
    pub bonus: bool,
    #[serde(default)]
    pub bike_stands: u32,
    #[serde(default)]
    pub available_bikes: u32,
    #[serde(default)]
    pub status: String,
    /// Defaults to now
    pub last_update: Option<i64>,
}

impl StationInput {
    /// Build a station numbered `number`.
    pub fn into_station(self, number: u32) -> Station {
        let mut station = Station::new(number, self.contract_name, self.name);
        station.address = self.address;
        station.position = self.position;
        station.banking = self.banking;
        station.bonus = self.bonus;
        station.bike_stands = self.bike_stands;
        station.available_bikes = self.available_bikes;
        station.status = self.status;
        station.last_update = self.last_update.unwrap_or_else(now_millis);
        station.normalize();
        station
    }
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}
