//! Error types for the PnL engine.
//!
//! Every failure is local and recoverable: an operation that returns an
//! error leaves positions, tracking and the realized accumulator untouched.
//!
//! | Code | Raised by |
//! |------|-----------|
//! | `INVALID_QUANTITY` | `open_leg` with a zero quantity |
//! | `DUPLICATE_LEG` | `open_leg` on a contract that is already open |
//! | `UNKNOWN_LEG` | any per-leg operation on a contract never opened |
//! | `NO_MORE_TICKS` | advancing after the tick source is exhausted (benign) |
//! | `ALREADY_TERMINATED` | mutating a terminated strategy (benign except for `open_leg`) |
//! | `ENTRY_PRICE_UNAVAILABLE` | no tick to price a leg at its entry timestamp |
//! | `INVALID_CONTRACT` | malformed contract code passed to `open_leg_by_code` |

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ContractId, ContractParseError};
use crate::tick_source::TickSourceError;

/// Stable error codes for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Zero quantity at leg open.
    InvalidQuantity,
    /// Contract already has an open position.
    DuplicateLeg,
    /// Contract was never opened.
    UnknownLeg,
    /// Tick source has nothing left to replay.
    NoMoreTicks,
    /// Strategy has already been squared off.
    AlreadyTerminated,
    /// Entry price lookup failed.
    EntryPriceUnavailable,
    /// Contract code could not be parsed.
    InvalidContract,
}

impl ErrorCode {
    /// Get the reason string.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidQuantity => "INVALID_QUANTITY",
            Self::DuplicateLeg => "DUPLICATE_LEG",
            Self::UnknownLeg => "UNKNOWN_LEG",
            Self::NoMoreTicks => "NO_MORE_TICKS",
            Self::AlreadyTerminated => "ALREADY_TERMINATED",
            Self::EntryPriceUnavailable => "ENTRY_PRICE_UNAVAILABLE",
            Self::InvalidContract => "INVALID_CONTRACT",
        }
    }

    /// Whether callers can treat this code as a no-op rather than a failure.
    #[must_use]
    pub const fn is_benign(&self) -> bool {
        matches!(self, Self::NoMoreTicks | Self::AlreadyTerminated)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// Errors raised by the strategy controller and its components.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimulationError {
    /// Leg opened with quantity zero.
    #[error("Invalid quantity 0 for leg {contract}")]
    InvalidQuantity {
        /// Contract the leg was opened on.
        contract: ContractId,
    },

    /// Leg opened on a contract that already has an open position.
    #[error("Leg already open: {contract}")]
    DuplicateLeg {
        /// Contract with the existing position.
        contract: ContractId,
    },

    /// Operation on a contract that was never opened.
    #[error("Unknown leg: {contract}")]
    UnknownLeg {
        /// Requested contract.
        contract: ContractId,
    },

    /// Tick source has no remaining ticks for any open leg.
    #[error("No more ticks to replay")]
    NoMoreTicks,

    /// Strategy is terminated.
    #[error("Strategy '{strategy}' is already terminated")]
    AlreadyTerminated {
        /// Strategy name.
        strategy: String,
    },

    /// Entry price lookup failed.
    #[error("Entry price unavailable: {0}")]
    EntryPrice(#[from] TickSourceError),

    /// Contract code could not be parsed.
    #[error(transparent)]
    InvalidContract(#[from] ContractParseError),
}

impl SimulationError {
    /// Get the error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidQuantity { .. } => ErrorCode::InvalidQuantity,
            Self::DuplicateLeg { .. } => ErrorCode::DuplicateLeg,
            Self::UnknownLeg { .. } => ErrorCode::UnknownLeg,
            Self::NoMoreTicks => ErrorCode::NoMoreTicks,
            Self::AlreadyTerminated { .. } => ErrorCode::AlreadyTerminated,
            Self::EntryPrice(_) => ErrorCode::EntryPriceUnavailable,
            Self::InvalidContract(_) => ErrorCode::InvalidContract,
        }
    }

    pub(crate) fn unknown_leg(contract: &ContractId) -> Self {
        Self::UnknownLeg {
            contract: contract.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_and_display() {
        let contract = ContractId::future("RELIANCE").unwrap();

        let err = SimulationError::InvalidQuantity {
            contract: contract.clone(),
        };
        assert_eq!(err.code(), ErrorCode::InvalidQuantity);
        assert_eq!(err.to_string(), "Invalid quantity 0 for leg RELIANCE");

        let err = SimulationError::unknown_leg(&contract);
        assert_eq!(err.code().reason(), "UNKNOWN_LEG");
        assert_eq!(err.to_string(), "Unknown leg: RELIANCE");

        let err = SimulationError::AlreadyTerminated {
            strategy: "TestStrat".to_string(),
        };
        assert_eq!(err.to_string(), "Strategy 'TestStrat' is already terminated");
    }

    #[test]
    fn benign_codes() {
        assert!(ErrorCode::NoMoreTicks.is_benign());
        assert!(ErrorCode::AlreadyTerminated.is_benign());
        assert!(!ErrorCode::UnknownLeg.is_benign());
        assert!(!ErrorCode::DuplicateLeg.is_benign());
    }

    #[test]
    fn error_code_serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::DuplicateLeg).unwrap();
        assert_eq!(json, "\"DUPLICATE_LEG\"");
    }
}
