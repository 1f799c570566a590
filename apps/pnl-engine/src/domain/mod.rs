//! Domain layer: contracts, positions, tracking and PnL arithmetic.
//!
//! Nothing here knows about ticks or clocks; the strategy controller owns
//! these values and drives them.

pub mod contract;
pub mod pnl;
pub mod position;
pub mod tracking;

pub use contract::{ContractId, ContractParseError, InstrumentKind, OptionRight};
pub use pnl::PnlBreakdown;
pub use position::{Position, PositionDirection};
pub use tracking::{TrackingRegistry, TrackingState};
