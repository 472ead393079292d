//! PADDOCK — Horse-race ticket P&L simulator
//!
//! Entry point. Loads configuration, initialises structured logging,
//! loads the payout table (cache or source), evaluates the configured
//! orders and reports P&L.

use anyhow::{Context, Result};
use tracing::info;

use paddock::backtest;
use paddock::config::{self, AppConfig};
use paddock::engine::evaluator::BetEvaluator;
use paddock::engine::loader::PayoutLoader;
use paddock::source;

const DEFAULT_CONFIG: &str = "config.toml";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path =
        AppConfig::resolve_env("PADDOCK_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG.to_string());
    let cfg = AppConfig::load(&config_path)?;

    init_logging();

    let no_cache = AppConfig::resolve_env(config::NO_CACHE_ENV).is_ok();
    info!(
        config = %config_path,
        source = ?cfg.source.kind,
        cache_enabled = cfg.cache.enabled,
        no_cache,
        "PADDOCK starting up"
    );

    // -- Payout table ----------------------------------------------------

    let source = source::open(&cfg.source).context("Failed to open payout source")?;
    let mut loader = PayoutLoader::new(source).with_options(cfg.load_options(no_cache));
    if let Some(cache) = cfg.file_cache() {
        loader = loader.with_cache(Box::new(cache));
    }

    let loaded = loader.load().await.context("Failed to load payout table")?;
    info!(
        origin = ?loaded.origin,
        races = loaded.table.race_count(),
        records = loaded.table.len(),
        "Payout table ready"
    );

    // -- Simulation ------------------------------------------------------

    let orders = backtest::load_orders(&cfg.simulation.orders_file)?;
    let evaluator = BetEvaluator::new(loaded.table);
    let outcome = backtest::run(&evaluator, &orders)?;

    if let Some(path) = &cfg.simulation.results_file {
        backtest::save_results(&outcome.results, path)?;
    }

    println!("{}", outcome.report);
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("paddock=info"));

    let json_logging = std::env::var("PADDOCK_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
