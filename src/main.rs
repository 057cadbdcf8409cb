use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

use pulse_grid::core::config::RunMode;
use pulse_grid::core::{Jitter, RandomJitter, Trader};
use pulse_grid::engine::{spawn_fill_consumer, spawn_pulser};
use pulse_grid::exchanges::{PaperTrader, RestTrader};
use pulse_grid::feeds::{fill_channel, RandomWalkFeed, TradePoller};
use pulse_grid::{Config, GridEngine, OrderExecutor};

/// Config path: first argument, then GRID_CONFIG, then ./config.toml
fn config_path() -> PathBuf {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var("GRID_CONFIG").ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

fn jitter(seed: Option<u64>) -> Box<dyn Jitter> {
    match seed {
        Some(seed) => Box::new(RandomJitter::seeded(seed)),
        None => Box::new(RandomJitter::from_entropy()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let path = config_path();
    let config = if path.exists() {
        Config::load(&path).with_context(|| format!("loading {}", path.display()))?
    } else {
        Config::default()
    };

    // RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.app.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_level(true)
        .init();

    if !path.exists() {
        tracing::warn!("{} not found, running with built-in defaults", path.display());
    }

    let symbol = config.symbol();
    tracing::info!("🦀 Pulse Grid starting ({:?} mode, {})", config.app.mode, symbol);

    let (fill_tx, fill_rx) = fill_channel();

    let trader: Arc<dyn Trader> = match config.app.mode {
        RunMode::Paper => {
            let paper = Arc::new(PaperTrader::new());
            RandomWalkFeed::new(
                paper.clone(),
                config.grid.init_price,
                config.grid.delta,
                config.paper.walk_max_ticks,
                Duration::from_millis(config.paper.walk_interval_ms),
                jitter(config.engine.seed.map(|s| s.wrapping_add(1))),
            )
            .spawn(fill_tx);
            paper
        }
        RunMode::Live => {
            let api_key = config
                .api_key()
                .context("live mode needs venue.api_key or HFT_API_KEY")?;
            let rest = Arc::new(RestTrader::new(
                &config.venue.base_url,
                &api_key,
                Duration::from_millis(config.venue.request_timeout_ms),
            )?);
            TradePoller::new(
                rest.clone(),
                symbol.clone(),
                Duration::from_millis(config.venue.trade_poll_ms),
            )
            .spawn(fill_tx);
            rest
        }
    };

    let executor = OrderExecutor::new(trader, symbol, config.engine.cancel_retry());
    tracing::info!("Connected to: {}", executor.venue());

    let engine = Arc::new(
        GridEngine::new(executor, jitter(config.engine.seed))
            .with_iterations_per_level(config.engine.reconcile_iterations_per_level),
    );

    engine.reset(&config.grid).await?;
    let report = engine.reconcile().await?;
    tracing::info!(?report, "✅ grid quoted");

    let consumer = spawn_fill_consumer(engine.clone(), fill_rx);
    let pulser = spawn_pulser(engine.clone(), config.engine.pulse_interval());

    tokio::signal::ctrl_c().await?;
    tracing::info!("🛑 Shutting down...");

    pulser.abort();
    consumer.abort();

    Ok(())
}
