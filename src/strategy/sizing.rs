//! Position sizing and exit-target policy.
//!
//! For each risk tier: the fraction of the balance committed per trade
//! and the take-profit/stop-loss bands around the entry price. The
//! exact percentages are policy, tunable from `config.toml`; the shape
//! is not — riskier tiers always commit a smaller fraction.

use serde::Deserialize;

use crate::types::RiskTier;

// ---------------------------------------------------------------------------
// Per-tier policy
// ---------------------------------------------------------------------------

/// Sizing and exit bands for one risk tier.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct TierPolicy {
    /// Fraction of the current balance committed per position, in (0, 1].
    pub fraction: f64,
    /// Take-profit distance above entry (0.05 = +5%).
    pub take_profit_pct: f64,
    /// Stop-loss distance below entry (0.10 = −10%), in (0, 1).
    pub stop_loss_pct: f64,
}

impl Default for TierPolicy {
    fn default() -> Self {
        // Serde needs a default; the per-tier defaults live on SizingPolicy.
        Self {
            fraction: 0.10,
            take_profit_pct: 0.10,
            stop_loss_pct: 0.10,
        }
    }
}

impl TierPolicy {
    fn is_valid(&self) -> bool {
        self.fraction > 0.0
            && self.fraction <= 1.0
            && self.take_profit_pct > 0.0
            && self.stop_loss_pct > 0.0
            && self.stop_loss_pct < 1.0
    }
}

// ---------------------------------------------------------------------------
// Policy across all tiers
// ---------------------------------------------------------------------------

/// The full sizing policy, one [`TierPolicy`] per tier.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SizingPolicy {
    pub aggressive: TierPolicy,
    pub cautious: TierPolicy,
    pub safe: TierPolicy,
}

impl Default for SizingPolicy {
    fn default() -> Self {
        Self {
            aggressive: TierPolicy {
                fraction: 0.05,
                take_profit_pct: 0.05,
                stop_loss_pct: 0.10,
            },
            cautious: TierPolicy {
                fraction: 0.10,
                take_profit_pct: 0.10,
                stop_loss_pct: 0.12,
            },
            safe: TierPolicy {
                fraction: 0.20,
                take_profit_pct: 0.15,
                stop_loss_pct: 0.15,
            },
        }
    }
}

impl SizingPolicy {
    /// Policy for a given tier.
    pub fn for_tier(&self, tier: RiskTier) -> &TierPolicy {
        match tier {
            RiskTier::Aggressive => &self.aggressive,
            RiskTier::Cautious => &self.cautious,
            RiskTier::Safe => &self.safe,
        }
    }

    /// Fraction of the balance committed per position for this tier.
    pub fn position_fraction(&self, tier: RiskTier) -> f64 {
        self.for_tier(tier).fraction
    }

    /// Exit thresholds for a position entered at `entry_price`.
    /// Returns `(take_profit, stop_loss)` with
    /// `take_profit > entry_price > stop_loss`.
    pub fn targets(&self, tier: RiskTier, entry_price: f64) -> (f64, f64) {
        let policy = self.for_tier(tier);
        (
            entry_price * (1.0 + policy.take_profit_pct),
            entry_price * (1.0 - policy.stop_loss_pct),
        )
    }

    /// Reject malformed policies at startup: every tier needs a fraction
    /// in (0, 1], a positive take-profit, and a stop-loss in (0, 1);
    /// riskier tiers must not commit a larger fraction than safer ones.
    pub fn validate(&self) -> Result<(), String> {
        for (name, policy) in [
            ("aggressive", &self.aggressive),
            ("cautious", &self.cautious),
            ("safe", &self.safe),
        ] {
            if !policy.is_valid() {
                return Err(format!(
                    "invalid {name} policy: fraction={} take_profit_pct={} stop_loss_pct={}",
                    policy.fraction, policy.take_profit_pct, policy.stop_loss_pct,
                ));
            }
        }
        if self.aggressive.fraction > self.cautious.fraction
            || self.cautious.fraction > self.safe.fraction
        {
            return Err("position fractions must not decrease from aggressive to safe".to_string());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
