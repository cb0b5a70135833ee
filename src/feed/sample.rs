//! Fixed sample-set feed.
//!
//! Serves a deterministic pair list under the same contract as the live
//! feed. Useful for offline runs and demos where DexScreener is
//! unreachable or rate-limited.

use async_trait::async_trait;

use super::{FeedError, MarketFeed};
use crate::strategy::risk;
use crate::types::Pair;

const FEED_NAME: &str = "sample";

/// A feed backed by a fixed in-memory pair set.
pub struct SampleFeed {
    pairs: Vec<Pair>,
}

impl SampleFeed {
    /// The default sample set: one pair per risk tier plus a thin
    /// just-listed pair, with plausible Solana-style figures.
    pub fn new() -> Self {
        let make = |id: &str, name: &str, symbol: &str, price: f64, liq: f64, vol: f64| {
            Pair::new(id, name, symbol, price, liq, vol, risk::classify(liq, vol))
                .expect("sample pairs are statically valid")
        };

        Self {
            pairs: vec![
                make("sample-sol-usdc", "Wrapped SOL", "SOL", 152.43, 2_400_000.0, 910_000.0),
                make("sample-mid-cap", "Mid Cap", "MID", 0.0843, 64_000.0, 22_500.0),
                make("sample-meme", "Meme Token", "MEME", 0.000012, 12_000.0, 3_000.0),
                make("sample-fresh", "Fresh Listing", "FRSH", 0.0021, 4_500.0, 18_000.0),
            ],
        }
    }

    /// A feed serving an explicit pair set.
    pub fn with_pairs(pairs: Vec<Pair>) -> Self {
        Self { pairs }
    }
}

impl Default for SampleFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketFeed for SampleFeed {
    async fn fetch_snapshot(&self) -> Result<Vec<Pair>, FeedError> {
        if self.pairs.is_empty() {
            return Err(FeedError::Empty);
        }
        Ok(self.pairs.clone())
    }

    fn name(&self) -> &'static str {
        FEED_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
