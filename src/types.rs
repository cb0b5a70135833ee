//! Shared types for the MIRAGE simulator.
//!
//! These types form the data model used across all modules: market pairs
//! from the feed, open positions with their exit thresholds, and closed
//! trades in the ledger history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Risk tier
// ---------------------------------------------------------------------------

/// Coarse risk bucket for a token pair, derived from its liquidity and
/// 24-hour volume. Ordering from riskiest to safest:
/// `Aggressive < Cautious < Safe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    Aggressive,
    Cautious,
    Safe,
}

impl RiskTier {
    /// All tiers, riskiest first (useful for iteration).
    pub const ALL: &'static [RiskTier] =
        &[RiskTier::Aggressive, RiskTier::Cautious, RiskTier::Safe];
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskTier::Aggressive => write!(f, "AGGRESSIVE"),
            RiskTier::Cautious => write!(f, "CAUTIOUS"),
            RiskTier::Safe => write!(f, "SAFE"),
        }
    }
}

// ---------------------------------------------------------------------------
// Pair
// ---------------------------------------------------------------------------

/// Validation failures when constructing a [`Pair`] from feed data.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PairError {
    #[error("pair has no usable identifier")]
    MissingIdentifier,
    #[error("pair price must be positive, got {0}")]
    NonPositivePrice(String),
    #[error("pair liquidity must be non-negative, got {0}")]
    NegativeLiquidity(String),
    #[error("pair volume must be non-negative, got {0}")]
    NegativeVolume(String),
}

/// A tradable token pair as seen in one market snapshot.
///
/// Pairs are created fresh on every scan and superseded wholesale by the
/// next snapshot; they are never mutated. Positions refer to pairs only
/// by `id`, never by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pair {
    /// Stable identifier, derived from the exchange pair address or URL.
    pub id: String,
    pub name: String,
    pub symbol: String,
    /// Current price in USD. Strictly positive.
    pub price_usd: f64,
    /// Pooled liquidity in USD. Non-negative.
    pub liquidity_usd: f64,
    /// Rolling 24-hour volume in USD. Non-negative.
    pub volume_24h_usd: f64,
    /// Risk tier derived from liquidity and volume at snapshot time.
    pub tier: RiskTier,
}

impl Pair {
    /// Build a validated pair. `tier` is derived by the risk classifier
    /// from the same liquidity/volume figures passed here.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        symbol: impl Into<String>,
        price_usd: f64,
        liquidity_usd: f64,
        volume_24h_usd: f64,
        tier: RiskTier,
    ) -> Result<Self, PairError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(PairError::MissingIdentifier);
        }
        if !(price_usd.is_finite() && price_usd > 0.0) {
            return Err(PairError::NonPositivePrice(price_usd.to_string()));
        }
        if !(liquidity_usd.is_finite() && liquidity_usd >= 0.0) {
            return Err(PairError::NegativeLiquidity(liquidity_usd.to_string()));
        }
        if !(volume_24h_usd.is_finite() && volume_24h_usd >= 0.0) {
            return Err(PairError::NegativeVolume(volume_24h_usd.to_string()));
        }
        Ok(Self {
            id,
            name: name.into(),
            symbol: symbol.into(),
            price_usd,
            liquidity_usd,
            volume_24h_usd,
            tier,
        })
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) @ ${} | liq ${:.0} | vol24h ${:.0} | {}",
            self.name, self.symbol, self.price_usd, self.liquidity_usd, self.volume_24h_usd, self.tier,
        )
    }
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// An open simulated trade.
///
/// The committed amount was debited from the ledger balance when the
/// position was opened and is re-credited (scaled by the exit/entry
/// price ratio) exactly once at close. A pair id appears at most once
/// among open positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: Uuid,
    pub pair_id: String,
    /// Display name/symbol captured at entry; the live pair is replaced
    /// every scan and may disappear entirely.
    pub name: String,
    pub symbol: String,
    pub tier: RiskTier,
    pub entry_price: f64,
    /// USD committed, already debited from the balance.
    pub amount_usd: f64,
    pub take_profit: f64,
    pub stop_loss: f64,
    pub opened_at: DateTime<Utc>,
}

impl Position {
    /// Whether `price` crosses either exit threshold.
    pub fn should_close(&self, price: f64) -> bool {
        price >= self.take_profit || price <= self.stop_loss
    }

    /// Unrealized P&L at the given mark price.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.amount_usd * (price / self.entry_price) - self.amount_usd
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] ${:.2} @ {} (tp {} / sl {})",
            self.symbol, self.tier, self.amount_usd, self.entry_price, self.take_profit, self.stop_loss,
        )
    }
}

// ---------------------------------------------------------------------------
// Closed trade
// ---------------------------------------------------------------------------

/// A finished trade: the position snapshot plus its exit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub position: Position,
    pub exit_price: f64,
    /// Realized profit in USD, signed.
    pub profit_usd: f64,
    pub closed_at: DateTime<Utc>,
}

impl ClosedTrade {
    pub fn is_win(&self) -> bool {
        self.profit_usd > 0.0
    }

    /// Return on the committed amount as a fraction (0.05 = +5%).
    pub fn return_pct(&self) -> f64 {
        if self.position.amount_usd > 0.0 {
            self.profit_usd / self.position.amount_usd
        } else {
            0.0
        }
    }
}

impl fmt::Display for ClosedTrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.profit_usd >= 0.0 { "+" } else { "" };
        write!(
            f,
            "{} entry {} exit {} → {sign}{:.2} USD ({sign}{:.1}%)",
            self.position.symbol,
            self.position.entry_price,
            self.exit_price,
            self.profit_usd,
            self.return_pct() * 100.0,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_position(entry: f64, amount: f64) -> Position {
        Position {
            id: Uuid::new_v4(),
            pair_id: "pair-1".to_string(),
            name: "Test Token".to_string(),
            symbol: "TST".to_string(),
            tier: RiskTier::Aggressive,
            entry_price: entry,
            amount_usd: amount,
            take_profit: entry * 1.05,
            stop_loss: entry * 0.90,
            opened_at: Utc::now(),
        }
    }

    // -- RiskTier --

    #[test]
    fn test_tier_display() {
        assert_eq!(format!("{}", RiskTier::Aggressive), "AGGRESSIVE");
        assert_eq!(format!("{}", RiskTier::Cautious), "CAUTIOUS");
        assert_eq!(format!("{}", RiskTier::Safe), "SAFE");
    }

    #[test]
    fn test_tier_ordering_riskiest_first() {
        assert!(RiskTier::Aggressive < RiskTier::Cautious);
        assert!(RiskTier::Cautious < RiskTier::Safe);
        assert_eq!(RiskTier::ALL.len(), 3);
        assert_eq!(RiskTier::ALL[0], RiskTier::Aggressive);
    }

    #[test]
    fn test_tier_serialization_roundtrip() {
        for tier in RiskTier::ALL {
            let json = serde_json::to_string(tier).unwrap();
            let parsed: RiskTier = serde_json::from_str(&json).unwrap();
            assert_eq!(*tier, parsed);
        }
    }

    // -- Pair --

    #[test]
    fn test_pair_new_valid() {
        let pair = Pair::new("addr", "Token", "TKN", 0.5, 1000.0, 2000.0, RiskTier::Aggressive);
        assert!(pair.is_ok());
        let pair = pair.unwrap();
        assert_eq!(pair.id, "addr");
        assert_eq!(pair.tier, RiskTier::Aggressive);
    }

    #[test]
    fn test_pair_new_rejects_empty_id() {
        let err = Pair::new("  ", "Token", "TKN", 0.5, 0.0, 0.0, RiskTier::Safe).unwrap_err();
        assert_eq!(err, PairError::MissingIdentifier);
    }

    #[test]
    fn test_pair_new_rejects_non_positive_price() {
        assert!(Pair::new("a", "T", "T", 0.0, 0.0, 0.0, RiskTier::Safe).is_err());
        assert!(Pair::new("a", "T", "T", -1.0, 0.0, 0.0, RiskTier::Safe).is_err());
        assert!(Pair::new("a", "T", "T", f64::NAN, 0.0, 0.0, RiskTier::Safe).is_err());
    }

    #[test]
    fn test_pair_new_rejects_negative_liquidity_and_volume() {
        assert!(matches!(
            Pair::new("a", "T", "T", 1.0, -5.0, 0.0, RiskTier::Safe),
            Err(PairError::NegativeLiquidity(_))
        ));
        assert!(matches!(
            Pair::new("a", "T", "T", 1.0, 0.0, -5.0, RiskTier::Safe),
            Err(PairError::NegativeVolume(_))
        ));
    }

    #[test]
    fn test_pair_zero_liquidity_and_volume_allowed() {
        assert!(Pair::new("a", "T", "T", 1.0, 0.0, 0.0, RiskTier::Aggressive).is_ok());
    }

    #[test]
    fn test_pair_serialization_roundtrip() {
        let pair =
            Pair::new("addr", "Token", "TKN", 0.000012, 12_000.0, 3_000.0, RiskTier::Aggressive)
                .unwrap();
        let json = serde_json::to_string(&pair).unwrap();
        let parsed: Pair = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, "addr");
        assert!((parsed.price_usd - 0.000012).abs() < 1e-15);
    }

    // -- Position --

    #[test]
    fn test_position_should_close_on_take_profit() {
        let pos = sample_position(100.0, 10.0); // tp 105, sl 90
        assert!(pos.should_close(105.0));
        assert!(pos.should_close(110.0));
        assert!(!pos.should_close(104.99));
    }

    #[test]
    fn test_position_should_close_on_stop_loss() {
        let pos = sample_position(100.0, 10.0);
        assert!(pos.should_close(90.0));
        assert!(pos.should_close(50.0));
        assert!(!pos.should_close(90.01));
    }

    #[test]
    fn test_position_unrealized_pnl() {
        let pos = sample_position(100.0, 10.0);
        assert!((pos.unrealized_pnl(110.0) - 1.0).abs() < 1e-10);
        assert!((pos.unrealized_pnl(90.0) - (-1.0)).abs() < 1e-10);
        assert_eq!(pos.unrealized_pnl(100.0), 0.0);
    }

    #[test]
    fn test_position_serialization_roundtrip() {
        let pos = sample_position(0.000012, 2.5);
        let json = serde_json::to_string(&pos).unwrap();
        let parsed: Position = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.pair_id, "pair-1");
        assert_eq!(parsed.id, pos.id);
    }

    // -- ClosedTrade --

    #[test]
    fn test_closed_trade_win_and_return() {
        let trade = ClosedTrade {
            position: sample_position(100.0, 10.0),
            exit_price: 105.0,
            profit_usd: 0.5,
            closed_at: Utc::now(),
        };
        assert!(trade.is_win());
        assert!((trade.return_pct() - 0.05).abs() < 1e-10);
    }

    #[test]
    fn test_closed_trade_loss() {
        let trade = ClosedTrade {
            position: sample_position(100.0, 10.0),
            exit_price: 90.0,
            profit_usd: -1.0,
            closed_at: Utc::now(),
        };
        assert!(!trade.is_win());
        assert!((trade.return_pct() - (-0.10)).abs() < 1e-10);
    }

    #[test]
    fn test_closed_trade_display_contains_sign() {
        let trade = ClosedTrade {
            position: sample_position(100.0, 10.0),
            exit_price: 105.0,
            profit_usd: 0.5,
            closed_at: Utc::now(),
        };
        let display = format!("{trade}");
        assert!(display.contains("TST"));
        assert!(display.contains("+0.50"));
    }
}
