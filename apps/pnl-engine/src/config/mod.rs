//! Configuration module for the PnL engine.
//!
//! Provides configuration loading, validation, and environment variable
//! interpolation for a strategy replay.
//!
//! # Usage
//!
//! ```rust,ignore
//! use pnl_engine::config::{Config, load_config};
//!
//! // Load from default path (config.yaml)
//! let config = load_config(None)?;
//!
//! // Access configuration values
//! println!("target: {}", config.strategy.target);
//! ```

mod observability;
mod replay;
mod strategy;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use observability::{LogFormat, LoggingConfig, ObservabilityConfig};
pub use replay::ReplayConfig;
pub use strategy::{LegConfig, StrategyConfig, TrackingToggle};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Strategy parameters.
    pub strategy: StrategyConfig,
    /// Legs opened before replay.
    pub legs: Vec<LegConfig>,
    /// Tick input.
    pub replay: ReplayConfig,
    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to "config.yaml".
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or("config.yaml");

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is compile-time constant; expect() is safe here
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map_or("", |m| m.as_str());
        match std::env::var(&cap[1]) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.to_string(),
        }
    })
    .into_owned()
}

/// Validate configuration values.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let strategy = &config.strategy;

    if strategy.name.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "strategy.name must not be empty".to_string(),
        ));
    }

    if strategy.stop_loss >= strategy.target {
        return Err(ConfigError::ValidationError(format!(
            "strategy.stop_loss ({}) must be below strategy.target ({})",
            strategy.stop_loss, strategy.target
        )));
    }

    if config.legs.is_empty() {
        return Err(ConfigError::ValidationError(
            "at least one leg is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for (i, leg) in config.legs.iter().enumerate() {
        if leg.quantity == 0 {
            return Err(ConfigError::ValidationError(format!(
                "legs[{i}].quantity must be non-zero"
            )));
        }

        let contract = leg
            .contract_id()
            .map_err(|e| ConfigError::ValidationError(format!("legs[{i}].contract: {e}")))?;

        if !seen.insert(contract.clone()) {
            return Err(ConfigError::ValidationError(format!(
                "legs[{i}].contract duplicates {contract}"
            )));
        }
    }

    if config.replay.ticks_path.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "replay.ticks_path must not be empty".to_string(),
        ));
    }

    Ok(())
}
