// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements,
        clippy::indexing_slicing
    )
)]

//! PnL Engine - tick-driven intraday position and PnL simulation.
//!
//! Replays historical ticks against a multi-leg option/future strategy,
//! keeping per-leg live PnL, a realized accumulator and an auto square-off
//! rule on target/stop-loss.
//!
//! # Modules
//!
//! - `domain`: contracts, positions, tracking registry, PnL arithmetic
//! - `tick_source`: the `TickSource` trait and the in-memory implementation
//! - `strategy`: the strategy controller and its lifecycle
//! - `runner`: scheduled replay (tracking start times, square-off time)
//! - `config`: YAML configuration with env interpolation
//! - `telemetry`: tracing subscriber setup
//! - `error`: error types and stable error codes

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Modules
// =============================================================================

/// Configuration loading and validation.
pub mod config;

/// Contracts, positions, tracking and PnL arithmetic.
pub mod domain;

/// Error types.
pub mod error;

/// Scheduled replay driver.
pub mod runner;

/// Strategy controller.
pub mod strategy;

/// Tracing setup.
pub mod telemetry;

/// Market data interface.
pub mod tick_source;

// =============================================================================
// Re-exports
// =============================================================================

pub use domain::{
    ContractId, ContractParseError, InstrumentKind, OptionRight, PnlBreakdown, Position,
    PositionDirection, TrackingState,
};
pub use error::{ErrorCode, SimulationError};
pub use runner::{RunSummary, Schedule};
pub use strategy::{
    ExitBasis, ExitReason, PnlHistory, PnlPoint, Strategy, StrategyParams, StrategySnapshot,
    StrategyState, TickAdvance, TickOutcome,
};
pub use tick_source::{EntryPricePolicy, InMemoryTickSource, Tick, TickSource, TickSourceError};
