//! Strategy construction parameters.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::lifecycle::{ExitBasis, ExitRule};
use crate::tick_source::EntryPricePolicy;

/// Parameters a strategy is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyParams {
    /// Strategy name.
    pub name: String,
    /// Auto square-off thresholds.
    pub exit_rule: ExitRule,
    /// How leg entry prices are looked up.
    pub entry_price_policy: EntryPricePolicy,
    /// Record a PnL point per tick.
    pub record_history: bool,
}

impl StrategyParams {
    /// Create parameters with default basis, entry policy and history on.
    #[must_use]
    pub fn new(name: impl Into<String>, target: Decimal, stop_loss: Decimal) -> Self {
        Self {
            name: name.into(),
            exit_rule: ExitRule {
                target,
                stop_loss,
                basis: ExitBasis::default(),
            },
            entry_price_policy: EntryPricePolicy::default(),
            record_history: true,
        }
    }

    /// Set the exit basis.
    #[must_use]
    pub const fn with_exit_basis(mut self, basis: ExitBasis) -> Self {
        self.exit_rule.basis = basis;
        self
    }

    /// Set the entry price policy.
    #[must_use]
    pub const fn with_entry_price_policy(mut self, policy: EntryPricePolicy) -> Self {
        self.entry_price_policy = policy;
        self
    }

    /// Enable or disable per-tick history.
    #[must_use]
    pub const fn with_history(mut self, record: bool) -> Self {
        self.record_history = record;
        self
    }
}
