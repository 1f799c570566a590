//! PnL arithmetic.
//!
//! All functions are pure. Short legs carry a negative quantity, so a single
//! signed formula covers both directions: a short gains when price falls.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::position::Position;
use super::tracking::TrackingRegistry;

/// Unrealized PnL of a quantity bought/sold at `entry` and marked at `last`.
#[must_use]
pub fn live_pnl(entry: Decimal, last: Decimal, quantity: i64) -> Decimal {
    (last - entry) * Decimal::from(quantity)
}

/// Sum of live PnL over open positions that are currently tracked.
pub fn live_total<'a>(
    positions: impl IntoIterator<Item = &'a Position>,
    tracking: &TrackingRegistry,
) -> Decimal {
    positions
        .into_iter()
        .filter(|p| p.is_open() && tracking.is_tracked(p.contract()))
        .map(Position::live_pnl)
        .sum()
}

/// Sum of live PnL over every open position, tracked or not.
///
/// This is what square-off would realize at current prices.
pub fn mark_to_market<'a>(positions: impl IntoIterator<Item = &'a Position>) -> Decimal {
    positions
        .into_iter()
        .filter(|p| p.is_open())
        .map(Position::live_pnl)
        .sum()
}

/// Point-in-time PnL breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PnlBreakdown {
    /// Live PnL of tracked open legs.
    pub live: Decimal,
    /// Realized PnL booked so far.
    pub realized: Decimal,
    /// `realized + live`.
    pub total: Decimal,
}

impl PnlBreakdown {
    /// Build a breakdown, deriving the total.
    #[must_use]
    pub fn new(live: Decimal, realized: Decimal) -> Self {
        Self {
            live,
            realized,
            total: realized + live,
        }
    }
}
