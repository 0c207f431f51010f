//! Background feed that simulates live availability changes.
//!
//! Every tick rewrites the availability of every station in the in-process
//! store under one write lock. The loop runs until its cancellation token
//! fires; there is no other way to stop it.

use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::domain::{Availability, now_millis};
use crate::store::InMemoryStationStore;

/// Configuration for the live mutator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutatorConfig {
    /// Delay between ticks.
    pub interval: Duration,

    /// Smallest stand count a tick can assign.
    pub min_stands: u32,

    /// Largest stand count a tick can assign (inclusive).
    pub max_stands: u32,
}

impl MutatorConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the inclusive stand count range. A reversed range is swapped.
    pub fn with_stand_range(mut self, min: u32, max: u32) -> Self {
        self.min_stands = min.min(max);
        self.max_stands = min.max(max);
        self
    }
}

impl Default for MutatorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15),
            min_stands: 10,
            max_stands: 40,
        }
    }
}

/// Draw a fresh availability: stands in `min_stands..=max_stands`, bikes in
/// `0..=stands`.
pub fn random_availability<R: Rng + ?Sized>(
    rng: &mut R,
    min_stands: u32,
    max_stands: u32,
    last_update: i64,
) -> Availability {
    let bike_stands = rng.gen_range(min_stands.min(max_stands)..=max_stands.max(min_stands));
    let available_bikes = rng.gen_range(0..=bike_stands);
    Availability {
        bike_stands,
        available_bikes,
        last_update,
    }
}

/// Periodically randomizes the availability of every station in a store.
pub struct LiveMutator {
    store: InMemoryStationStore,
    config: MutatorConfig,
}

impl LiveMutator {
    pub fn new(store: InMemoryStationStore, config: MutatorConfig) -> Self {
        Self { store, config }
    }

    /// Apply one round of updates. Returns the number of stations touched.
    ///
    /// Every station rewritten in a tick carries the same `last_update`.
    pub async fn tick(&self) -> usize {
        let now = now_millis();
        let (min, max) = (self.config.min_stands, self.config.max_stands);
        self.store
            .mutate_all(|_| random_availability(&mut rand::thread_rng(), min, max, now))
            .await
    }

    /// Tick schedule: the first tick is immediate, and a late tick pushes
    /// the next one a full interval past it instead of bursting to catch up.
    fn ticker(&self) -> Interval {
        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    }

    /// Run until `cancel` fires. The first tick happens immediately.
    pub async fn run(self, cancel: CancellationToken) {
        let mut interval = self.ticker();
        info!(interval = ?self.config.interval, "live mutator started");

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    let touched = self.tick().await;
                    debug!(touched, "applied live availability update");
                }
            }
        }

        info!("live mutator stopped");
    }

    /// Run on a new task.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Station;
    use crate::store::StationStore;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn seed_store() -> InMemoryStationStore {
        let stations = (1..=20)
            .map(|n| {
                let mut s = Station::new(n, "dublin", format!("STATION {n}"));
                s.bike_stands = 20;
                s.available_bikes = 10;
                s.address = format!("{n} MAIN STREET");
                s
            })
            .collect();
        InMemoryStationStore::new(stations)
    }

    #[test]
    fn default_config() {
        let config = MutatorConfig::default();
        assert_eq!(config.interval, Duration::from_secs(15));
        assert_eq!(config.min_stands, 10);
        assert_eq!(config.max_stands, 40);
    }

    #[test]
    fn reversed_stand_range_is_swapped() {
        let config = MutatorConfig::default().with_stand_range(30, 5);
        assert_eq!((config.min_stands, config.max_stands), (5, 30));
    }

    #[test]
    fn degenerate_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = random_availability(&mut rng, 12, 12, 99);
        assert_eq!(a.bike_stands, 12);
        assert!(a.available_bikes <= 12);
        assert_eq!(a.last_update, 99);
    }

    #[tokio::test]
    async fn tick_keeps_invariants_and_identity() {
        let store = seed_store();
        let before = store.get_all().await.unwrap();
        let mutator = LiveMutator::new(store.clone(), MutatorConfig::default());

        assert_eq!(mutator.tick().await, 20);

        let after = store.get_all().await.unwrap();
        let stamp = after[0].last_update;
        assert!(stamp > 0);
        for (old, new) in before.iter().zip(&after) {
            assert_eq!(old.number, new.number);
            assert_eq!(old.name, new.name);
            assert_eq!(old.address, new.address);
            assert_eq!(old.contract_name, new.contract_name);
            assert!((10..=40).contains(&new.bike_stands));
            assert!(new.available_bikes <= new.bike_stands);
            assert_eq!(new.available_bike_stands, new.bike_stands - new.available_bikes);
            assert_eq!(new.last_update, stamp);
        }
    }

    #[tokio::test]
    async fn late_ticks_are_delayed_not_burst() {
        let config = MutatorConfig::default().with_interval(Duration::from_millis(20));
        let mutator = LiveMutator::new(seed_store(), config);
        let mut interval = mutator.ticker();
        assert_eq!(interval.missed_tick_behavior(), MissedTickBehavior::Delay);

        interval.tick().await;
        // Miss several periods, as a tick stuck behind the write lock would.
        tokio::time::sleep(Duration::from_millis(90)).await;
        interval.tick().await;

        let start = tokio::time::Instant::now();
        interval.tick().await;
        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    #[tokio::test]
    async fn tick_on_empty_store() {
        let mutator = LiveMutator::new(InMemoryStationStore::default(), MutatorConfig::default());
        assert_eq!(mutator.tick().await, 0);
    }

    #[tokio::test]
    async fn run_stops_on_cancel() {
        let store = seed_store();
        let config = MutatorConfig::default().with_interval(Duration::from_millis(10));
        let cancel = CancellationToken::new();
        let handle = LiveMutator::new(store.clone(), config).spawn(cancel.clone());

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("mutator did not stop")
            .unwrap();

        let stations = store.get_all().await.unwrap();
        assert!(stations.iter().all(|s| s.last_update > 0));
    }

    #[tokio::test]
    async fn cancelled_before_start_does_nothing() {
        let store = seed_store();
        let cancel = CancellationToken::new();
        cancel.cancel();

        LiveMutator::new(store.clone(), MutatorConfig::default())
            .run(cancel)
            .await;

        let stations = store.get_all().await.unwrap();
        assert!(stations.iter().all(|s| s.last_update == 0));
    }

    proptest! {
        #[test]
        fn availability_within_bounds(seed in any::<u64>(), min in 0u32..50, span in 0u32..50) {
            let mut rng = StdRng::seed_from_u64(seed);
            let max = min + span;
            let a = random_availability(&mut rng, min, max, 1);
            prop_assert!(a.bike_stands >= min && a.bike_stands <= max);
            prop_assert!(a.available_bikes <= a.bike_stands);
        }
    }
}
