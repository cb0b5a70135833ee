//! Simulation engine — ledger, snapshot cache, and the scan cycle.

pub mod cycle;
pub mod ledger;
pub mod snapshot;

pub use cycle::{CycleReport, EntryRules, SimulationEngine};
pub use ledger::{LedgerLimits, OpenOutcome, SessionStats, TradeLedger};
pub use snapshot::SnapshotCache;

use chrono::{DateTime, Utc};
use std::sync::atomic::AtomicU64;
use tokio::sync::RwLock;

/// State shared between the simulation cycle (writer) and the status
/// reporter (reader). The cycle holds both write locks for the whole
/// mutation phase of a tick, so a status query observes either the
/// pre-cycle or the post-cycle state, never one in between.
pub struct SharedState {
    pub ledger: RwLock<TradeLedger>,
    pub snapshot: RwLock<SnapshotCache>,
    /// Completed cycles since startup.
    pub cycles: AtomicU64,
    pub started_at: DateTime<Utc>,
}

impl SharedState {
    pub fn new(ledger: TradeLedger) -> Self {
        Self {
            ledger: RwLock::new(ledger),
            snapshot: RwLock::new(SnapshotCache::new()),
            cycles: AtomicU64::new(0),
            started_at: Utc::now(),
        }
    }
}
