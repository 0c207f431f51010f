//! Station records.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::error::InvalidStation;

/// Contract name used when a record arrives without one.
pub const DEFAULT_CONTRACT: &str = "dublin";

/// Geographic position of a station.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

/// One bike-share dock: identity, location and current availability.
///
/// `number` and `contract_name` identify the record and are never changed by
/// [`Station::replace_with`]. `available_bike_stands` is maintained by the
/// write paths and always equals `bike_stands - available_bikes`.
///
/// # Examples
///
/// ```
/// use bikeshare_server::domain::Station;
///
/// let mut station = Station::new(42, "dublin", "CHARLEMONT PLACE");
/// station.bike_stands = 40;
/// station.available_bikes = 10;
/// station.normalize();
///
/// assert_eq!(station.available_bike_stands, 30);
/// assert_eq!(station.occupancy(), 0.25);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub number: u32,
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
    pub available_bike_stands: u32,
    #[serde(default)]
    pub available_bikes: u32,
    #[serde(default)]
    pub status: String,
    /// Milliseconds since the Unix epoch, UTC.
    #[serde(default)]
    pub last_update: i64,
}

/// The availability fields the live feed rewrites on every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Availability {
    pub bike_stands: u32,
    pub available_bikes: u32,
    pub last_update: i64,
}

impl Station {
    /// Create an empty open station with the given identity and name.
    pub fn new(number: u32, contract_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            number,
            contract_name: contract_name.into(),
            name: name.into(),
            address: String::new(),
            position: Position::default(),
            banking: false,
            bonus: false,
            bike_stands: 0,
            available_bike_stands: 0,
            available_bikes: 0,
            status: "OPEN".to_string(),
            last_update: 0,
        }
    }

    /// Fraction of stands holding a bike; `0.0` for a station with no stands.
    pub fn occupancy(&self) -> f64 {
        if self.bike_stands == 0 {
            0.0
        } else {
            f64::from(self.available_bikes) / f64::from(self.bike_stands)
        }
    }

    pub fn is_open(&self) -> bool {
        self.status.eq_ignore_ascii_case("OPEN")
    }

    pub fn is_closed(&self) -> bool {
        self.status.eq_ignore_ascii_case("CLOSED")
    }

    /// Document id used by the remote store.
    pub fn document_id(&self) -> String {
        self.number.to_string()
    }

    /// Recompute derived fields and fill in a missing contract name.
    pub fn normalize(&mut self) {
        if self.contract_name.trim().is_empty() {
            self.contract_name = DEFAULT_CONTRACT.to_string();
        }
        self.available_bike_stands = self.bike_stands.saturating_sub(self.available_bikes);
    }

    /// Check the `available_bikes <= bike_stands` invariant.
    pub fn validate(&self) -> Result<(), InvalidStation> {
        if self.available_bikes > self.bike_stands {
            return Err(InvalidStation {
                number: self.number,
                available_bikes: self.available_bikes,
                bike_stands: self.bike_stands,
            });
        }
        Ok(())
    }

    /// Overwrite the availability fields and recompute free stands.
    pub fn set_availability(&mut self, availability: Availability) {
        self.bike_stands = availability.bike_stands;
        self.available_bikes = availability.available_bikes.min(availability.bike_stands);
        self.available_bike_stands = self.bike_stands - self.available_bikes;
        self.last_update = availability.last_update;
    }

    /// Full replace of every non-identity field with the values in `other`.
    pub fn replace_with(&mut self, other: Station) {
        self.name = other.name;
        self.address = other.address;
        self.position = other.position;
        self.banking = other.banking;
        self.bonus = other.bonus;
        self.bike_stands = other.bike_stands;
        self.available_bikes = other.available_bikes;
        self.status = other.status;
        self.last_update = other.last_update;
        self.normalize();
    }
}

/// Current UTC time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
