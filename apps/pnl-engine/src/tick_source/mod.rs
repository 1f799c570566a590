//! Tick source interface.
//!
//! The strategy controller only ever asks two questions of market data:
//! the price to enter a leg at, and the next tick strictly after a given
//! time. Sources are pre-loaded and randomly indexable, so both lookups are
//! synchronous and never retried.

mod in_memory;

use std::fmt;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ContractId;

pub use in_memory::{InMemoryTickSource, TickLoadError};

/// One (timestamp, last traded price) observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    /// Exchange timestamp.
    pub at: NaiveDateTime,
    /// Last traded price.
    pub price: Decimal,
}

impl Tick {
    /// Create a tick.
    #[must_use]
    pub const fn new(at: NaiveDateTime, price: Decimal) -> Self {
        Self { at, price }
    }
}

/// Which tick prices a leg opened at a given timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryPricePolicy {
    /// Latest tick at or before the entry timestamp.
    #[default]
    AtOrBefore,
    /// Earliest tick at or after the entry timestamp.
    AtOrAfter,
}

impl fmt::Display for EntryPricePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AtOrBefore => write!(f, "at_or_before"),
            Self::AtOrAfter => write!(f, "at_or_after"),
        }
    }
}

/// Lookup failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TickSourceError {
    /// Source has no series for the contract.
    #[error("No tick data for contract {contract}")]
    NoData {
        /// Requested contract.
        contract: ContractId,
    },

    /// Series exists but has no tick matching the entry policy.
    #[error("No tick for {contract} {policy} {at}")]
    NoEntryTick {
        /// Requested contract.
        contract: ContractId,
        /// Entry timestamp.
        at: NaiveDateTime,
        /// Policy used.
        policy: EntryPricePolicy,
    },
}

/// Market data consumed by the strategy controller.
pub trait TickSource {
    /// Tick used to price a leg entered at `at`.
    fn entry_tick(
        &self,
        contract: &ContractId,
        at: NaiveDateTime,
        policy: EntryPricePolicy,
    ) -> Result<Tick, TickSourceError>;

    /// First tick strictly after `after`, or `None` when the series is exhausted.
    fn next_tick_after(&self, contract: &ContractId, after: NaiveDateTime) -> Option<Tick>;

    /// Name of this source, for logs.
    fn name(&self) -> &str;
}

impl<T: TickSource + ?Sized> TickSource for &T {
    fn entry_tick(
        &self,
        contract: &ContractId,
        at: NaiveDateTime,
        policy: EntryPricePolicy,
    ) -> Result<Tick, TickSourceError> {
        (**self).entry_tick(contract, at, policy)
    }

    fn next_tick_after(&self, contract: &ContractId, after: NaiveDateTime) -> Option<Tick> {
        (**self).next_tick_after(contract, after)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
