//! Query parameters and their normalization.
//!
//! Bad paging or sort input is never an error: out-of-range pages and page
//! sizes fall back to safe defaults and unknown sort keys fall back to
//! sorting by name.

use std::cmp::Ordering;

use crate::domain::Station;

/// Page size used when the requested one is missing or out of range.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Key a station list is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortKey {
    #[default]
    Name,
    AvailableBikes,
    AvailableBikeStands,
    Occupancy,
    Number,
}

impl SortKey {
    /// Parse a sort key, ignoring case and underscores.
    ///
    /// Anything unrecognized sorts by name.
    pub fn parse(s: Option<&str>) -> Self {
        let Some(s) = s else {
            return SortKey::Name;
        };
        let folded: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_')
            .flat_map(char::to_lowercase)
            .collect();

        match folded.as_str() {
            "availablebikes" => SortKey::AvailableBikes,
            "availablebikestands" => SortKey::AvailableBikeStands,
            "occupancy" => SortKey::Occupancy,
            "number" => SortKey::Number,
            _ => SortKey::Name,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::AvailableBikes => "availableBikes",
            SortKey::AvailableBikeStands => "availableBikeStands",
            SortKey::Occupancy => "occupancy",
            SortKey::Number => "number",
        }
    }

    /// Ascending comparison of two stations on this key.
    ///
    /// Names compare ignoring case; names equal up to case fall back to
    /// byte order.
    pub fn compare(&self, a: &Station, b: &Station) -> Ordering {
        match self {
            SortKey::Name => a
                .name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name)),
            SortKey::AvailableBikes => a.available_bikes.cmp(&b.available_bikes),
            SortKey::AvailableBikeStands => a.available_bike_stands.cmp(&b.available_bike_stands),
            SortKey::Occupancy => a.occupancy().total_cmp(&b.occupancy()),
            SortKey::Number => a.number.cmp(&b.number),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// `desc` in any case is descending; everything else is ascending.
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some(s) if s.trim().eq_ignore_ascii_case("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Station list parameters as received from a client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StationQuery {
    pub contract_name: Option<String>,
    pub status: Option<String>,
    pub min_bikes: Option<i64>,
    pub q: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl StationQuery {
    /// Resolve defaults and clamp paging for a backend serving at most
    /// `max_page_size` items per page.
    pub fn normalize(&self, max_page_size: usize) -> NormalizedQuery {
        let page = match self.page {
            Some(p) if p >= 1 => usize::try_from(p).unwrap_or(usize::MAX),
            _ => 1,
        };

        let page_size = match self.page_size {
            Some(n) if n >= 1 && (n as u64) <= max_page_size as u64 => n as usize,
            _ => DEFAULT_PAGE_SIZE.min(max_page_size.max(1)),
        };

        NormalizedQuery {
            filter: StationFilter::new(self.status.as_deref(), self.min_bikes, self.q.as_deref())
                .with_contract_name(self.contract_name.as_deref()),
            sort: SortKey::parse(self.sort.as_deref()),
            dir: SortDirection::parse(self.dir.as_deref()),
            page,
            page_size,
        }
    }
}

/// Filters applied before sorting, all combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StationFilter {
    /// Lowercased contract name to match exactly.
    contract_name: Option<String>,
    /// Lowercased status to match exactly.
    status: Option<String>,
    min_bikes: Option<i64>,
    /// Lowercased substring to find in name or address.
    q: Option<String>,
}

impl StationFilter {
    /// Build a filter; blank strings mean "no filter".
    pub fn new(status: Option<&str>, min_bikes: Option<i64>, q: Option<&str>) -> Self {
        Self {
            contract_name: None,
            status: fold(status),
            min_bikes,
            q: fold(q),
        }
    }

    /// Also require a case-insensitive contract name match.
    pub fn with_contract_name(mut self, contract_name: Option<&str>) -> Self {
        self.contract_name = fold(contract_name);
        self
    }

    pub fn matches(&self, station: &Station) -> bool {
        if let Some(contract) = &self.contract_name
            && station.contract_name.to_lowercase() != *contract
        {
            return false;
        }

        if let Some(status) = &self.status
            && station.status.to_lowercase() != *status
        {
            return false;
        }

        if let Some(min) = self.min_bikes
            && i64::from(station.available_bikes) < min
        {
            return false;
        }

        if let Some(q) = &self.q
            && !station.name.to_lowercase().contains(q.as_str())
            && !station.address.to_lowercase().contains(q.as_str())
        {
            return false;
        }

        true
    }
}

/// Trim and lowercase a filter value; blank means no filter.
fn fold(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

/// Fully resolved query: what the engine actually runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedQuery {
    pub filter: StationFilter,
    pub sort: SortKey,
    pub dir: SortDirection,
    /// 1-based page number.
    pub page: usize,
    pub page_size: usize,
}

impl NormalizedQuery {
    /// Deterministic cache key: equal queries give equal keys.
    ///
    /// Strings are `Debug`-quoted so a search term can never impersonate
    /// another field.
    pub fn cache_key(&self) -> String {
        format!(
            "stations:{:?}",
            (
                &self.filter.contract_name,
                &self.filter.status,
                self.filter.min_bikes,
                &self.filter.q,
                self.sort.as_str(),
                self.dir.as_str(),
                self.page,
                self.page_size,
            )
        )
    }
}
