//! Strategy controller and lifecycle.
//!
//! A [`Strategy`] replays ticks from a [`crate::tick_source::TickSource`]
//! across all of its legs:
//!
//! ```ignore
//! let mut strategy = Strategy::new(StrategyParams::new("TestStrat", dec!(200), dec!(-200)), source);
//! let ce: ContractId = "RELIANCE28JAN212000CE".parse()?;
//! strategy.open_leg(ce.clone(), -3, entry_at)?;
//! strategy.start_tracking_leg(&ce)?;
//!
//! while strategy.is_active() {
//!     strategy.update_tick();
//! }
//! println!("{}", strategy.total_pnl());
//! ```

mod controller;
mod history;
mod lifecycle;
mod params;

pub use controller::{LegSnapshot, Strategy, StrategySnapshot, TickAdvance, TickOutcome};
pub use history::{PnlHistory, PnlPoint};
pub use lifecycle::{ExitBasis, ExitReason, ExitRule, StrategyState};
pub use params::StrategyParams;
