//! Pushing a snapshot into a station store.

use tracing::{info, warn};

use crate::domain::Station;
use crate::store::{StationStore, StoreError};

/// Outcome of an import run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportReport {
    pub created: usize,
    pub replaced: usize,
    /// Records dropped for having more available bikes than stands.
    pub skipped: usize,
}

impl ImportReport {
    pub fn total(&self) -> usize {
        self.created + self.replaced
    }
}

/// Upsert every record into `store`: replace it if its number exists,
/// otherwise create it. Invalid records are skipped.
///
/// Stops at the first storage failure; records before it stay written.
pub async fn import_stations<S: StationStore>(
    store: &S,
    stations: Vec<Station>,
) -> Result<ImportReport, StoreError> {
    let mut report = ImportReport::default();

    for mut station in stations {
        station.normalize();
        let number = station.number;

        if let Err(e) = station.validate() {
            warn!(number, error = %e, "skipping invalid station");
            report.skipped += 1;
            continue;
        }

        let outcome = match store.update(number, station.clone()).await {
            Ok(Some(_)) => Ok(false),
            Ok(None) => store.create(station).await.map(|_| true),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(true) => report.created += 1,
            Ok(false) => report.replaced += 1,
            Err(e) => {
                warn!(number, error = %e, "station import failed");
                return Err(e);
            }
        }
    }

    info!(
        created = report.created,
        replaced = report.replaced,
        skipped = report.skipped,
        "imported stations"
    );
    Ok(report)
}
