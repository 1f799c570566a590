//! Strategy lifecycle and exit rules.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle state. Transitions only `Active -> Terminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyState {
    /// Replaying ticks.
    #[default]
    Active,
    /// All positions squared off.
    Terminated,
}

impl StrategyState {
    /// Check if this is the terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated)
    }
}

/// Why the strategy was squared off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    /// PnL reached the target.
    Target,
    /// PnL fell to the stop loss.
    StopLoss,
    /// Explicit `terminate_and_square_off` call.
    Manual,
    /// Configured square-off time reached.
    Scheduled,
}

/// Which PnL figure the target and stop loss are compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitBasis {
    /// Realized plus live PnL of tracked legs.
    #[default]
    Total,
    /// Live PnL of tracked legs only.
    Live,
}

/// Target/stop-loss thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitRule {
    /// Profit ceiling; exit when PnL >= target.
    pub target: Decimal,
    /// Loss floor (normally negative); exit when PnL <= stop_loss.
    pub stop_loss: Decimal,
    /// Figure compared against the thresholds.
    pub basis: ExitBasis,
}

impl ExitRule {
    /// Evaluate the rule against a PnL figure. Target wins if both hold.
    #[must_use]
    pub fn evaluate(&self, pnl: Decimal) -> Option<ExitReason> {
        if pnl >= self.target {
            Some(ExitReason::Target)
        } else if pnl <= self.stop_loss {
            Some(ExitReason::StopLoss)
        } else {
            None
        }
    }
}
