//! Risk classifier.
//!
//! Maps a pair's liquidity and 24-hour volume into a [`RiskTier`].
//! Pure and deterministic; no side effects, no failure modes.

use crate::types::RiskTier;

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Below this liquidity a pair is always AGGRESSIVE.
const MIN_LIQUIDITY_USD: f64 = 20_000.0;

/// Below this 24h volume a pair is always AGGRESSIVE.
const MIN_VOLUME_USD: f64 = 5_000.0;

/// At or above this liquidity (with volume satisfied) a pair is SAFE.
const SAFE_LIQUIDITY_USD: f64 = 100_000.0;

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Classify a pair by its liquidity and 24h volume.
///
/// Thresholds are inclusive on the safer side: exactly $20k liquidity
/// and $5k volume is CAUTIOUS, exactly $100k liquidity is SAFE.
pub fn classify(liquidity_usd: f64, volume_24h_usd: f64) -> RiskTier {
    if liquidity_usd < MIN_LIQUIDITY_USD || volume_24h_usd < MIN_VOLUME_USD {
        RiskTier::Aggressive
    } else if liquidity_usd < SAFE_LIQUIDITY_USD {
        RiskTier::Cautious
    } else {
        RiskTier::Safe
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
