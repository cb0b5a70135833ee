//! MIRAGE — paper-trading simulator for live DEX token pairs.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! wires up the market feed, ledger, and dashboard, then drives the
//! scan cycle on a fixed interval with graceful shutdown.

use anyhow::Result;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use mirage::config::AppConfig;
use mirage::dashboard;
use mirage::engine::{SharedState, SimulationEngine, TradeLedger};
use mirage::feed::dexscreener::DexScreenerFeed;
use mirage::feed::sample::SampleFeed;
use mirage::feed::MarketFeed;

const BANNER: &str = r#"
 __  __ ___ ____      _    ____ _____
|  \/  |_ _|  _ \    / \  / ___| ____|
| |\/| || || |_) |  / _ \| |  _|  _|
| |  | || ||  _ <  / ___ \ |_| | |___
|_|  |_|___|_| \_\/_/   \_\____|_____|

  Paper trading against live DEX markets — no real funds
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Invalid configuration is the only fatal startup condition.
    let cfg = AppConfig::load("config.toml")?;

    init_logging();

    println!("{BANNER}");
    info!(
        agent_name = %cfg.agent.name,
        scan_interval_secs = cfg.agent.scan_interval_secs,
        starting_balance = cfg.agent.starting_balance,
        max_open_positions = cfg.trading.max_open_positions,
        feed = %cfg.feed.source,
        "MIRAGE starting up"
    );

    // -- Wire up components ----------------------------------------------

    let feed: Box<dyn MarketFeed> = match cfg.feed.source.as_str() {
        "sample" => {
            info!("Using fixed sample feed (offline mode)");
            Box::new(SampleFeed::new())
        }
        _ => Box::new(DexScreenerFeed::new(cfg.feed.endpoint.clone(), cfg.feed_timeout())?),
    };

    let ledger = TradeLedger::new(cfg.agent.starting_balance, cfg.ledger_limits());
    let state = Arc::new(SharedState::new(ledger));

    if cfg.dashboard.enabled {
        dashboard::spawn_dashboard(Arc::clone(&state), cfg.dashboard.port)?;
    }

    let engine = SimulationEngine::new(feed, cfg.strategy.clone(), cfg.entry_rules(), state);

    // -- Main loop -------------------------------------------------------

    // One cycle at a time: the loop awaits the full cycle before the
    // next tick can fire, and ticks missed while a fetch is in flight
    // are skipped rather than queued.
    let mut interval = tokio::time::interval(cfg.scan_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        interval_secs = cfg.agent.scan_interval_secs,
        "Entering scan loop. Press Ctrl+C to stop."
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match engine.run_cycle().await {
                    Ok(report) => {
                        if report.positions_opened > 0 || report.positions_closed > 0 {
                            info!(
                                cycle = report.cycle_number,
                                opened = report.positions_opened,
                                closed = report.positions_closed,
                                skipped_capacity = report.skipped_capacity,
                                skipped_duplicate = report.skipped_duplicate,
                                skipped_below_min = report.skipped_below_minimum,
                                balance = format!("${:.2}", report.balance_after),
                                "Trades this tick"
                            );
                        }
                    }
                    Err(e) => {
                        // Never fatal: the tick is skipped and state is
                        // untouched until the feed recovers.
                        warn!(error = %e, "Scan skipped");
                    }
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    let final_state = engine.state();
    let ledger = final_state.ledger.read().await;
    let stats = ledger.stats();
    info!(
        balance = format!("${:.2}", ledger.balance()),
        total_pnl = format!("${:+.2}", stats.total_pnl),
        trades = stats.trades_opened,
        open_left = ledger.open_count(),
        "MIRAGE shut down cleanly."
    );

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mirage=info"));

    if std::env::var("MIRAGE_LOG_JSON").is_ok() {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
