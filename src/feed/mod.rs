//! Market feed integrations.
//!
//! Defines the `MarketFeed` trait the simulation cycle consumes and
//! provides implementations for:
//! - DexScreener — live DEX pair data over HTTP
//! - Sample — a fixed in-memory pair set for offline runs

pub mod dexscreener;
pub mod sample;

use async_trait::async_trait;

use crate::types::Pair;

/// Failures a feed can surface. Both are recovered by skipping the
/// current cycle; neither is fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// Network, timeout, or parse failure — the feed is unreachable.
    #[error("market feed unavailable: {0}")]
    Unavailable(String),

    /// The feed answered but had no usable pairs.
    #[error("market feed returned no usable pairs")]
    Empty,
}

/// Abstraction over sources of market snapshots.
///
/// Implementors return a fresh, validated pair list on demand. Entries
/// that fail validation (non-positive price, missing identifier) are
/// dropped, not surfaced as errors; an entirely unusable response is
/// [`FeedError::Empty`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketFeed: Send + Sync {
    /// Fetch the current snapshot of tradable pairs.
    async fn fetch_snapshot(&self) -> Result<Vec<Pair>, FeedError>;

    /// Feed name for logging and identification.
    fn name(&self) -> &'static str;
}
