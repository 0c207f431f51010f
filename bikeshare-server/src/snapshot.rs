//! Loading the persisted station snapshot.
//!
//! The snapshot is a JSON array of station objects. Field names are matched
//! ignoring case and underscores, so `bike_stands`, `bikeStands` and
//! `BikeStands` all land in the same field.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::info;

use crate::domain::{Position, Station};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read and parse the snapshot file at `path`.
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<Vec<Station>, SnapshotError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let stations = parse_snapshot(&json)?;
    info!(path = %path.display(), count = stations.len(), "loaded station snapshot");
    Ok(stations)
}

/// Parse snapshot JSON into normalized stations, in file order.
pub fn parse_snapshot(json: &str) -> Result<Vec<Station>, SnapshotError> {
    let value: Value = serde_json::from_str(json)?;
    let records: Vec<SnapshotRecord> = serde_json::from_value(fold_keys(value))?;
    Ok(records.into_iter().map(Station::from).collect())
}

/// Lowercase every object key and drop its underscores, recursively.
fn fold_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (fold_key(&k), fold_keys(v)))
                .collect::<Map<_, _>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(fold_keys).collect()),
        other => other,
    }
}

fn fold_key(key: &str) -> String {
    key.chars()
        .filter(|&c| c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// A snapshot record after key folding.
#[derive(Debug, Deserialize)]
struct SnapshotRecord {
    number: u32,
    #[serde(default, rename = "contractname")]
    contract_name: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    position: Position,
    #[serde(default)]
    banking: bool,
    #[serde(default)]
    bonus: bool,
    #[serde(default, rename = "bikestands")]
    bike_stands: u32,
    #[serde(default, rename = "availablebikes")]
    available_bikes: u32,
    #[serde(default)]
    status: String,
    #[serde(default, rename = "lastupdate")]
    last_update: i64,
}

impl From<SnapshotRecord> for Station {
    fn from(r: SnapshotRecord) -> Self {
        let mut station = Station {
            number: r.number,
            contract_name: r.contract_name,
            name: r.name,
            address: r.address,
            position: r.position,
            banking: r.banking,
            bonus: r.bonus,
            bike_stands: r.bike_stands,
            available_bike_stands: 0,
            available_bikes: r.available_bikes,
            status: r.status,
            last_update: r.last_update,
        };
        station.normalize();
        station
    }
}
