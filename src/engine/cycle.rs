//! Simulation cycle — one fetch→evaluate→open pass per scan tick.
//!
//! The cycle asks the market feed for a snapshot, replaces the cache
//! wholesale, closes triggered positions, then attempts new opens on the
//! highest-volume pairs. A feed failure (or an empty snapshot) skips the
//! tick entirely: no exits, no entries, previous snapshot retained.
//!
//! Cycles never overlap: the driver loop awaits `run_cycle` before the
//! next tick can fire, and missed ticks are skipped, so no re-entrancy
//! guard beyond the loop itself is needed.

use chrono::{DateTime, Utc};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{debug, info};

use crate::feed::{FeedError, MarketFeed};
use crate::strategy::SizingPolicy;

use super::ledger::OpenOutcome;
use super::SharedState;

// ---------------------------------------------------------------------------
// Entry rules
// ---------------------------------------------------------------------------

/// Which snapshot pairs are considered for new positions each tick.
#[derive(Debug, Clone, Copy)]
pub struct EntryRules {
    /// Consider at most this many pairs, taken in descending 24h-volume
    /// order.
    pub top_pairs_per_scan: usize,
    /// Optional liquidity floor applied before ranking. `None` disables
    /// pre-filtering.
    pub min_liquidity_usd: Option<f64>,
}

impl Default for EntryRules {
    fn default() -> Self {
        Self {
            top_pairs_per_scan: 10,
            min_liquidity_usd: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Cycle report
// ---------------------------------------------------------------------------

/// Summary of one completed scan tick.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle_number: u64,
    pub pairs_in_snapshot: usize,
    pub candidates_considered: usize,
    pub positions_closed: usize,
    pub positions_opened: usize,
    pub skipped_capacity: usize,
    pub skipped_duplicate: usize,
    pub skipped_below_minimum: usize,
    pub balance_after: f64,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Orchestrates the scan cycle over shared ledger/snapshot state.
pub struct SimulationEngine {
    feed: Box<dyn MarketFeed>,
    policy: SizingPolicy,
    rules: EntryRules,
    state: Arc<SharedState>,
}

impl SimulationEngine {
    pub fn new(
        feed: Box<dyn MarketFeed>,
        policy: SizingPolicy,
        rules: EntryRules,
        state: Arc<SharedState>,
    ) -> Self {
        Self {
            feed,
            policy,
            rules,
            state,
        }
    }

    /// The shared state this engine mutates (for wiring up the dashboard).
    pub fn state(&self) -> Arc<SharedState> {
        Arc::clone(&self.state)
    }

    /// Run one full cycle. On `Err` the tick was skipped and no state
    /// changed; the caller logs and waits for the next tick.
    pub async fn run_cycle(&self) -> Result<CycleReport, FeedError> {
        // The fetch is the only suspension point; no locks are held here.
        let pairs = self.feed.fetch_snapshot().await?;
        if pairs.is_empty() {
            return Err(FeedError::Empty);
        }

        let now = Utc::now();
        let pairs_in_snapshot = pairs.len();
        debug!(count = pairs_in_snapshot, "Snapshot fetched");

        // Mutation phase: both write locks for the rest of the tick, so
        // readers see a consistent pre- or post-cycle view.
        let mut snapshot = self.state.snapshot.write().await;
        let mut ledger = self.state.ledger.write().await;

        snapshot.replace(pairs, now);

        // Exits first: capacity freed here is available to opens below.
        let closed = ledger.evaluate_and_close(snapshot.by_id(), now);

        let mut candidates = snapshot.pairs_by_volume();
        if let Some(min_liq) = self.rules.min_liquidity_usd {
            candidates.retain(|p| p.liquidity_usd >= min_liq);
        }
        candidates.truncate(self.rules.top_pairs_per_scan);

        let mut opened = 0usize;
        let mut skipped_capacity = 0usize;
        let mut skipped_duplicate = 0usize;
        let mut skipped_below_minimum = 0usize;

        for pair in &candidates {
            match ledger.open_position(pair, &self.policy, now) {
                OpenOutcome::Opened(_) => opened += 1,
                OpenOutcome::CapacityFull => skipped_capacity += 1,
                OpenOutcome::AlreadyHeld => skipped_duplicate += 1,
                OpenOutcome::BelowMinimum => skipped_below_minimum += 1,
            }
        }

        let cycle_number = self.state.cycles.fetch_add(1, Ordering::SeqCst) + 1;

        let report = CycleReport {
            cycle_number,
            pairs_in_snapshot,
            candidates_considered: candidates.len(),
            positions_closed: closed.len(),
            positions_opened: opened,
            skipped_capacity,
            skipped_duplicate,
            skipped_below_minimum,
            balance_after: ledger.balance(),
            timestamp: now,
        };

        info!(
            cycle = report.cycle_number,
            pairs = report.pairs_in_snapshot,
            closed = report.positions_closed,
            opened = report.positions_opened,
            open_now = ledger.open_count(),
            balance = format!("${:.2}", report.balance_after),
            "Cycle complete"
        );

        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
