//! Pulse hub service entry point.

use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, Utc};
use clap::Parser;
use pulse_hub::{
    load_config, resolve_config_path, HeuristicPredictor, HubConfig, MemoryStore, SignalHub,
    SignalStore,
};
use pulse_types::PriceBar;
use rand::Rng;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "pulse-hub", about = "Real-time quantitative signal hub")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: Option<String>,

    /// Seed the in-memory store with synthetic price history so the
    /// heuristic predictor has data to work with.
    #[arg(long, default_value_t = true)]
    seed_demo_bars: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pulse_hub=debug".into()),
        )
        .init();

    let args = Args::parse();
    let config_path = args
        .config
        .unwrap_or_else(|| resolve_config_path("PULSE_HUB_CONFIG_PATH", "configs/hub.toml"));
    let config = load_config(&config_path).context("failed to load hub configuration")?;

    info!(
        "starting pulse hub: {} watch-listed symbols, {}s generation interval",
        config.watchlist.len(),
        config.generation_interval_secs
    );

    let store: Arc<dyn SignalStore> = Arc::new(MemoryStore::new());
    if args.seed_demo_bars {
        seed_demo_bars(&config, store.as_ref()).await?;
    }

    let predictor = Arc::new(HeuristicPredictor::new(
        Arc::clone(&store),
        config.bar_timeframe,
    ));
    let hub = Arc::new(SignalHub::new(config, store, predictor));

    let addr = hub.start().await.context("hub failed to start")?;
    info!("pulse hub running on {addr}; press Ctrl+C to stop");

    signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    info!("shutting down");
    hub.stop().await;

    Ok(())
}

/// Random-walk daily bars per watch-listed symbol, enough to warm up the
/// heuristic predictor's indicators.
async fn seed_demo_bars(config: &HubConfig, store: &dyn SignalStore) -> Result<()> {
    let mut rng = rand::thread_rng();
    let start = Utc::now() - ChronoDuration::days(90);

    for symbol in &config.watchlist {
        let mut close = 50.0 + rng.gen::<f64>() * 400.0;
        let bars: Vec<PriceBar> = (0..90)
            .map(|i| {
                let drift = (rng.gen::<f64>() - 0.48) * 0.02;
                close *= 1.0 + drift;
                let spread = close * (0.002 + rng.gen::<f64>() * 0.008);
                PriceBar {
                    timestamp: start + ChronoDuration::days(i),
                    open: close - drift * close,
                    high: close + spread,
                    low: close - spread,
                    close,
                    volume: 500_000.0 + rng.gen::<f64>() * 2_000_000.0,
                    timeframe: config.bar_timeframe,
                }
            })
            .collect();
        store
            .insert_price_bars(symbol, bars)
            .await
            .context("failed to seed demo bars")?;
    }

    info!("seeded demo bars for {} symbols", config.watchlist.len());
    Ok(())
}
