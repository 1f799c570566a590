//! PnL Engine Binary
//!
//! Replays one configured strategy against a tick file and prints the final
//! snapshot as JSON.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin pnl-engine -- config.yaml
//! ```
//!
//! # Environment Variables
//!
//! - `PNL_ENGINE_CONFIG`: config path when no argument is given (default: config.yaml)
//! - `RUST_LOG`: log filter, overrides `observability.logging.level`

use anyhow::Context;
use pnl_engine::config::load_config;
use pnl_engine::runner::{self, Schedule};
use pnl_engine::telemetry::init_tracing;
use pnl_engine::{InMemoryTickSource, Strategy};

/// Default config file.
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("PNL_ENGINE_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = load_config(Some(config_path.as_str()))
        .with_context(|| format!("loading config from {config_path}"))?;

    if let Err(e) = init_tracing(&config.observability.logging) {
        eprintln!("tracing already initialized: {e}");
    }

    tracing::info!(
        config = %config_path,
        strategy = %config.strategy.name,
        legs = config.legs.len(),
        "Starting PnL engine"
    );

    let source = InMemoryTickSource::from_json_file(&config.replay.ticks_path)
        .context("loading tick data")?;
    let schedule = Schedule::from_config(&config).context("building schedule")?;

    let mut strategy = Strategy::new(
        config.strategy.to_params(config.replay.record_history),
        source,
    );
    runner::open_legs(&mut strategy, &config.legs).context("opening legs")?;

    let summary = runner::run(&mut strategy, &schedule);

    let json = serde_json::to_string_pretty(&summary).context("serializing summary")?;
    println!("{json}");
    Ok(())
}
