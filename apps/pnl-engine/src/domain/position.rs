//! Position held by a single strategy leg.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::contract::ContractId;
use super::pnl;

/// Position direction, derived from the sign of the quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionDirection {
    /// Bought.
    Long,
    /// Sold.
    Short,
}

/// One subscribed leg.
///
/// Quantity and entry price are fixed at open. `last_price` is the only field
/// that moves while the position is open; once closed, the position keeps the
/// price it was squared off at and its realized PnL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    contract: ContractId,
    /// Signed quantity (positive = long, negative = short, never zero).
    quantity: i64,
    entry_price: Decimal,
    /// Timestamp of the tick the entry was priced from.
    entry_at: NaiveDateTime,
    last_price: Decimal,
    open: bool,
    /// Set exactly once, at close.
    realized_pnl: Option<Decimal>,
}

impl Position {
    /// Open a position. Callers reject zero quantities before getting here.
    #[must_use]
    pub(crate) const fn open(
        contract: ContractId,
        quantity: i64,
        entry_price: Decimal,
        entry_at: NaiveDateTime,
    ) -> Self {
        Self {
            contract,
            quantity,
            entry_price,
            entry_at,
            last_price: entry_price,
            open: true,
            realized_pnl: None,
        }
    }

    /// Get the contract.
    #[must_use]
    pub const fn contract(&self) -> &ContractId {
        &self.contract
    }

    /// Get the signed quantity.
    #[must_use]
    pub const fn quantity(&self) -> i64 {
        self.quantity
    }

    /// Get the entry price.
    #[must_use]
    pub const fn entry_price(&self) -> Decimal {
        self.entry_price
    }

    /// Get the timestamp the entry price was observed at.
    #[must_use]
    pub const fn entry_at(&self) -> NaiveDateTime {
        self.entry_at
    }

    /// Get the last observed price (the entry price until the first tick).
    #[must_use]
    pub const fn last_price(&self) -> Decimal {
        self.last_price
    }

    /// Check if the position is still open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    /// Realized PnL booked at close, `None` while open.
    #[must_use]
    pub const fn realized_pnl(&self) -> Option<Decimal> {
        self.realized_pnl
    }

    /// Get position direction.
    #[must_use]
    pub const fn direction(&self) -> PositionDirection {
        if self.quantity > 0 {
            PositionDirection::Long
        } else {
            PositionDirection::Short
        }
    }

    /// Unrealized PnL at the last observed price; zero once closed.
    #[must_use]
    pub fn live_pnl(&self) -> Decimal {
        if !self.open {
            return Decimal::ZERO;
        }
        pnl::live_pnl(self.entry_price, self.last_price, self.quantity)
    }

    /// Record a new price. Returns false (and ignores the price) when closed.
    pub(crate) fn update_last_price(&mut self, price: Decimal) -> bool {
        if !self.open {
            return false;
        }
        self.last_price = price;
        true
    }

    /// Close at the last observed price and return the PnL to realize.
    ///
    /// Returns zero if already closed, so repeated closes book nothing.
    pub(crate) fn close(&mut self) -> Decimal {
        if !self.open {
            return Decimal::ZERO;
        }
        let realized = self.live_pnl();
        self.open = false;
        self.realized_pnl = Some(realized);
        realized
    }
}
