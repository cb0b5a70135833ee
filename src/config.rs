//! Configuration loading from TOML.
//!
//! Reads `config.toml` into strongly-typed structs with serde defaults
//! for everything except the `[agent]` section. Startup validation
//! rejects missing or non-positive required fields — invalid
//! configuration is the only unrecoverable condition in the simulator.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::time::Duration;

use crate::engine::{EntryRules, LedgerLimits};
use crate::strategy::SizingPolicy;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub agent: AgentConfig,
    #[serde(default)]
    pub trading: TradingConfig,
    #[serde(default)]
    pub strategy: SizingPolicy,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    pub name: String,
    /// Seconds between scan ticks.
    pub scan_interval_secs: u64,
    /// Virtual starting balance in USD.
    pub starting_balance: f64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TradingConfig {
    /// Maximum concurrently open positions.
    pub max_open_positions: usize,
    /// Entry scan considers at most this many pairs per tick,
    /// highest 24h volume first.
    pub top_pairs_per_scan: usize,
    /// Smallest viable position size in USD.
    pub min_position_usd: f64,
    /// Closed trades retained, most-recent-first.
    pub history_capacity: usize,
    /// Optional liquidity floor applied before ranking candidates.
    pub min_liquidity_usd: Option<f64>,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            max_open_positions: 5,
            top_pairs_per_scan: 10,
            min_position_usd: 1.0,
            history_capacity: 50,
            min_liquidity_usd: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FeedConfig {
    /// "dexscreener" for the live API, "sample" for the fixed set.
    pub source: String,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            source: "dexscreener".to_string(),
            endpoint: "https://api.dexscreener.com/latest/dex/pairs/solana".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 8080,
        }
    }
}

impl AppConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the simulator cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.agent.name.trim().is_empty() {
            bail!("agent.name must not be empty");
        }
        if self.agent.scan_interval_secs == 0 {
            bail!("agent.scan_interval_secs must be positive");
        }
        if !(self.agent.starting_balance.is_finite() && self.agent.starting_balance > 0.0) {
            bail!("agent.starting_balance must be positive");
        }
        if self.trading.max_open_positions == 0 {
            bail!("trading.max_open_positions must be positive");
        }
        if self.trading.top_pairs_per_scan == 0 {
            bail!("trading.top_pairs_per_scan must be positive");
        }
        if !(self.trading.min_position_usd.is_finite() && self.trading.min_position_usd > 0.0) {
            bail!("trading.min_position_usd must be positive");
        }
        if self.trading.history_capacity == 0 {
            bail!("trading.history_capacity must be positive");
        }
        match self.feed.source.as_str() {
            "dexscreener" | "sample" => {}
            other => bail!("feed.source must be \"dexscreener\" or \"sample\", got \"{other}\""),
        }
        if self.feed.timeout_secs == 0 {
            bail!("feed.timeout_secs must be positive");
        }
        self.strategy
            .validate()
            .map_err(|e| anyhow::anyhow!("strategy: {e}"))?;
        Ok(())
    }

    // -- Derived views ---------------------------------------------------

    pub fn ledger_limits(&self) -> LedgerLimits {
        LedgerLimits {
            max_open_positions: self.trading.max_open_positions,
            history_capacity: self.trading.history_capacity,
            min_position_usd: self.trading.min_position_usd,
        }
    }

    pub fn entry_rules(&self) -> EntryRules {
        EntryRules {
            top_pairs_per_scan: self.trading.top_pairs_per_scan,
            min_liquidity_usd: self.trading.min_liquidity_usd,
        }
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.agent.scan_interval_secs)
    }

    pub fn feed_timeout(&self) -> Duration {
        Duration::from_secs(self.feed.timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
