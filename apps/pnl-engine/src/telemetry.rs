//! Tracing setup.
//!
//! # Configuration
//!
//! - `RUST_LOG`: filter directives; when set it overrides `observability.logging.level`
//!
//! # Usage
//!
//! ```rust,ignore
//! use pnl_engine::telemetry::init_tracing;
//!
//! init_tracing(&config.observability.logging)?;
//! ```

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Error returned when a global subscriber is already installed.
pub type TracingInitError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Build the filter: `RUST_LOG` first, then the configured level, then `info`.
#[must_use]
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global `fmt` subscriber.
///
/// # Errors
///
/// Fails if a global subscriber has already been set.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), TracingInitError> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_target(config.with_target);

    match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_level_falls_back() {
        let config = LoggingConfig {
            level: "not a [valid directive".to_string(),
            ..LoggingConfig::default()
        };
        // Must not panic regardless of RUST_LOG
        let _filter = env_filter(&config);
    }

    #[test]
    fn second_init_is_an_error() {
        let config = LoggingConfig::default();
        let _ = init_tracing(&config);
        assert!(init_tracing(&config).is_err());
    }
}
