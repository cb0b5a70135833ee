//! Dashboard API route handlers.
//!
//! All endpoints are read-only and return JSON built from point-in-time
//! copies of the shared state — never live references into the ledger.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::engine::SharedState;
use crate::types::{ClosedTrade, Pair, Position};

pub type AppState = Arc<SharedState>;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub balance: f64,
    pub peak_balance: f64,
    pub total_pnl: f64,
    pub open_positions: usize,
    pub closed_trades: usize,
    pub trades_opened: u64,
    pub trades_won: u64,
    pub trades_lost: u64,
    pub win_rate: f64,
    pub cycles: u64,
    pub last_scan: Option<DateTime<Utc>>,
    pub uptime_secs: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PositionView {
    pub pair_id: String,
    pub name: String,
    pub symbol: String,
    pub tier: String,
    pub entry_price: f64,
    pub amount_usd: f64,
    pub take_profit: f64,
    pub stop_loss: f64,
    pub opened_at: DateTime<Utc>,
    /// Mark price from the latest snapshot, if the pair is still listed.
    pub current_price: Option<f64>,
    pub unrealized_pnl: Option<f64>,
}

impl PositionView {
    fn from_position(position: &Position, mark: Option<&Pair>) -> Self {
        Self {
            pair_id: position.pair_id.clone(),
            name: position.name.clone(),
            symbol: position.symbol.clone(),
            tier: position.tier.to_string(),
            entry_price: position.entry_price,
            amount_usd: position.amount_usd,
            take_profit: position.take_profit,
            stop_loss: position.stop_loss,
            opened_at: position.opened_at,
            current_price: mark.map(|p| p.price_usd),
            unrealized_pnl: mark.map(|p| position.unrealized_pnl(p.price_usd)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TradeView {
    pub pair_id: String,
    pub symbol: String,
    pub tier: String,
    pub entry_price: f64,
    pub exit_price: f64,
    pub amount_usd: f64,
    pub profit_usd: f64,
    pub return_pct: f64,
    pub opened_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
}

impl From<&ClosedTrade> for TradeView {
    fn from(trade: &ClosedTrade) -> Self {
        Self {
            pair_id: trade.position.pair_id.clone(),
            symbol: trade.position.symbol.clone(),
            tier: trade.position.tier.to_string(),
            entry_price: trade.position.entry_price,
            exit_price: trade.exit_price,
            amount_usd: trade.position.amount_usd,
            profit_usd: trade.profit_usd,
            return_pct: trade.return_pct(),
            opened_at: trade.position.opened_at,
            closed_at: trade.closed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PairView {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub price_usd: f64,
    pub liquidity_usd: f64,
    pub volume_24h_usd: f64,
    pub tier: String,
}

impl From<&Pair> for PairView {
    fn from(pair: &Pair) -> Self {
        Self {
            id: pair.id.clone(),
            name: pair.name.clone(),
            symbol: pair.symbol.clone(),
            price_usd: pair.price_usd,
            liquidity_usd: pair.liquidity_usd,
            volume_24h_usd: pair.volume_24h_usd,
            tier: pair.tier.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotResponse {
    pub fetched_at: Option<DateTime<Utc>>,
    pub pair_count: usize,
    pub pairs: Vec<PairView>,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    // Hold both read guards together: the cycle takes both write locks
    // in the same order, so this view is pre- or post-cycle, not mixed.
    let snapshot = state.snapshot.read().await;
    let ledger = state.ledger.read().await;
    let last_scan = snapshot.fetched_at();
    let stats = ledger.stats();
    let resolved = stats.trades_won + stats.trades_lost;
    let win_rate = if resolved > 0 {
        stats.trades_won as f64 / resolved as f64
    } else {
        0.0
    };

    Json(StatusResponse {
        balance: ledger.balance(),
        peak_balance: stats.peak_balance,
        total_pnl: stats.total_pnl,
        open_positions: ledger.open_count(),
        closed_trades: ledger.closed_count(),
        trades_opened: stats.trades_opened,
        trades_won: stats.trades_won,
        trades_lost: stats.trades_lost,
        win_rate,
        cycles: state.cycles.load(Ordering::SeqCst),
        last_scan,
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
    })
}

/// GET /api/positions
pub async fn get_positions(State(state): State<AppState>) -> Json<Vec<PositionView>> {
    let snapshot = state.snapshot.read().await;
    let ledger = state.ledger.read().await;
    let views = ledger
        .open_positions()
        .iter()
        .map(|p| PositionView::from_position(p, snapshot.get(&p.pair_id)))
        .collect();
    Json(views)
}

/// GET /api/trades — closed history, most recent first.
pub async fn get_trades(State(state): State<AppState>) -> Json<Vec<TradeView>> {
    let ledger = state.ledger.read().await;
    Json(ledger.closed_trades().iter().map(TradeView::from).collect())
}

/// GET /api/snapshot — the latest market snapshot, highest volume first.
pub async fn get_snapshot(State(state): State<AppState>) -> Json<SnapshotResponse> {
    let snapshot = state.snapshot.read().await;
    let pairs: Vec<PairView> = snapshot.pairs_by_volume().iter().map(PairView::from).collect();
    Json(SnapshotResponse {
        fetched_at: snapshot.fetched_at(),
        pair_count: pairs.len(),
        pairs,
    })
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
