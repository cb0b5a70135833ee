//! DexScreener market feed.
//!
//! Fetches the latest token-pair listings for one chain from the public
//! DexScreener API and converts them into validated [`Pair`]s.
//!
//! API docs: https://docs.dexscreener.com/api/reference
//! Base URL: https://api.dexscreener.com/latest/dex/pairs/{chain}
//! Auth: none required; rate limit ~300 requests/minute.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{FeedError, MarketFeed};
use crate::strategy::risk;
use crate::types::Pair;

const FEED_NAME: &str = "dexscreener";

// ---------------------------------------------------------------------------
// API response types (DexScreener JSON → Rust)
// ---------------------------------------------------------------------------

/// Top-level response from `/latest/dex/pairs/{chain}`.
#[derive(Debug, Deserialize)]
struct DexResponse {
    #[serde(default)]
    pairs: Option<Vec<DexPair>>,
}

/// One pair entry. Only the fields the simulator needs are deserialized.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DexPair {
    #[serde(default)]
    pair_address: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    base_token: Option<DexToken>,
    /// Price comes back as a decimal string, not a number.
    #[serde(default)]
    price_usd: Option<String>,
    #[serde(default)]
    liquidity: Option<DexLiquidity>,
    #[serde(default)]
    volume: Option<DexVolume>,
}

#[derive(Debug, Deserialize)]
struct DexToken {
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DexLiquidity {
    #[serde(default)]
    usd: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DexVolume {
    #[serde(default)]
    h24: Option<f64>,
}

impl DexPair {
    /// Derive the pair identifier: first non-empty of pair address,
    /// listing URL, base-token address.
    fn identifier(&self) -> Option<String> {
        [
            self.pair_address.as_deref(),
            self.url.as_deref(),
            self.base_token.as_ref().and_then(|t| t.address.as_deref()),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(String::from)
    }

    /// Convert to a validated [`Pair`], or `None` if the entry is unusable.
    fn into_pair(self) -> Option<Pair> {
        let id = self.identifier()?;
        let price: f64 = self.price_usd.as_deref()?.trim().parse().ok()?;
        let liquidity = self.liquidity.as_ref().and_then(|l| l.usd).unwrap_or(0.0);
        let volume = self.volume.as_ref().and_then(|v| v.h24).unwrap_or(0.0);
        let (name, symbol) = match &self.base_token {
            Some(token) => (
                token.name.clone().unwrap_or_else(|| id.clone()),
                token.symbol.clone().unwrap_or_default(),
            ),
            None => (id.clone(), String::new()),
        };

        let tier = risk::classify(liquidity, volume);
        match Pair::new(id, name, symbol, price, liquidity, volume, tier) {
            Ok(pair) => Some(pair),
            Err(e) => {
                debug!(error = %e, "Dropping unusable feed entry");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// DexScreener feed client.
pub struct DexScreenerFeed {
    http: Client,
    endpoint: String,
}

impl DexScreenerFeed {
    /// Create a new feed client with a bounded request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent("MIRAGE/0.1.0 (paper-trading-simulator)")
            .build()
            .context("Failed to build HTTP client for DexScreener")?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    /// Convert a raw API response into validated pairs, dropping
    /// entries with no identifier or a non-positive price.
    fn convert(response: DexResponse) -> Vec<Pair> {
        let raw = response.pairs.unwrap_or_default();
        let total = raw.len();
        let pairs: Vec<Pair> = raw.into_iter().filter_map(DexPair::into_pair).collect();
        if pairs.len() < total {
            debug!(
                usable = pairs.len(),
                dropped = total - pairs.len(),
                "Some feed entries were unusable"
            );
        }
        pairs
    }
}

#[async_trait]
impl MarketFeed for DexScreenerFeed {
    async fn fetch_snapshot(&self) -> Result<Vec<Pair>, FeedError> {
        debug!(url = %self.endpoint, "Fetching DexScreener snapshot");

        let resp = self
            .http
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| FeedError::Unavailable(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            warn!(%status, "DexScreener returned an error status");
            return Err(FeedError::Unavailable(format!("HTTP {status}")));
        }

        let body: DexResponse = resp
            .json()
            .await
            .map_err(|e| FeedError::Unavailable(format!("parse failure: {e}")))?;

        let pairs = Self::convert(body);
        if pairs.is_empty() {
            return Err(FeedError::Empty);
        }
        Ok(pairs)
    }

    fn name(&self) -> &'static str {
        FEED_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
