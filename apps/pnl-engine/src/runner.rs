//! Scheduled replay driver.
//!
//! Runs a strategy to completion the way an intraday session would: legs
//! join and leave live PnL at their configured times, and whatever is still
//! open at the square-off time is closed with [`ExitReason::Scheduled`].

use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{Config, LegConfig};
use crate::domain::{ContractId, ContractParseError, TrackingState};
use crate::error::SimulationError;
use crate::strategy::{ExitReason, PnlHistory, Strategy, StrategySnapshot, TickOutcome};
use crate::tick_source::TickSource;

/// A tracking change applied on the first tick at or after `at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingEvent {
    /// Leg to change.
    pub contract: ContractId,
    /// Intraday time.
    pub at: NaiveTime,
    /// State to switch to.
    pub state: TrackingState,
}

/// Intraday actions keyed on the simulation clock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    tracking: Vec<TrackingEvent>,
    square_off_at: Option<NaiveTime>,
}

impl Schedule {
    /// Empty schedule: run until the ticks or the exit rule end it.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `contract` on the first tick at or after `time`.
    #[must_use]
    pub fn start_tracking_at(self, contract: ContractId, time: NaiveTime) -> Self {
        self.tracking_at(contract, time, TrackingState::Tracked)
    }

    /// Stop tracking `contract` on the first tick at or after `time`.
    #[must_use]
    pub fn stop_tracking_at(self, contract: ContractId, time: NaiveTime) -> Self {
        self.tracking_at(contract, time, TrackingState::Untracked)
    }

    /// Add a tracking change. Changes at the same time apply in insertion order.
    #[must_use]
    pub fn tracking_at(
        mut self,
        contract: ContractId,
        at: NaiveTime,
        state: TrackingState,
    ) -> Self {
        self.tracking.push(TrackingEvent {
            contract,
            at,
            state,
        });
        self
    }

    /// Square off on the first tick at or after `time`.
    #[must_use]
    pub const fn square_off_at(mut self, time: NaiveTime) -> Self {
        self.square_off_at = Some(time);
        self
    }

    /// Tracking changes in time order.
    #[must_use]
    pub fn tracking_events(&self) -> Vec<TrackingEvent> {
        let mut events = self.tracking.clone();
        events.sort_by_key(|e| e.at);
        events
    }

    /// Build from `strategy.square_off_at` and each leg's tracking times.
    pub fn from_config(config: &Config) -> Result<Self, ContractParseError> {
        let mut schedule = Self {
            tracking: Vec::new(),
            square_off_at: config.strategy.square_off_at,
        };
        for leg in &config.legs {
            let changes = leg.tracking_changes();
            if changes.is_empty() {
                continue;
            }
            let contract = leg.contract_id()?;
            for (at, state) in changes {
                schedule = schedule.tracking_at(contract.clone(), at, state);
            }
        }
        Ok(schedule)
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Clock advances performed.
    pub ticks_processed: u64,
    /// State after the last tick.
    pub snapshot: StrategySnapshot,
    /// Highest recorded total PnL.
    pub peak_total: Option<Decimal>,
    /// Lowest recorded total PnL.
    pub trough_total: Option<Decimal>,
    /// Largest peak-to-trough fall in total PnL.
    pub max_drawdown: Decimal,
    /// Per-tick PnL, empty when history is disabled.
    pub history: PnlHistory,
}

/// Open every configured leg, tracking those marked `track` without a `track_from`.
///
/// # Errors
///
/// Stops at the first leg that fails to open or parse.
pub fn open_legs<S: TickSource>(
    strategy: &mut Strategy<S>,
    legs: &[LegConfig],
) -> Result<(), SimulationError> {
    for leg in legs {
        let contract = leg.contract_id()?;
        strategy.open_leg(contract.clone(), leg.quantity, leg.entry_at)?;
        if leg.tracked_at_open() {
            strategy.start_tracking_leg(&contract)?;
        }
    }
    Ok(())
}

/// Drive `update_tick` until the strategy is no longer active.
///
/// Tracking changes and the scheduled square-off are applied after the tick
/// that reaches their time, so the exit rule on that tick still sees the
/// previous tracking set. A run that exhausts its ticks leaves the strategy
/// active with its legs open.
pub fn run<S: TickSource>(strategy: &mut Strategy<S>, schedule: &Schedule) -> RunSummary {
    let events = schedule.tracking_events();
    let mut next_event = 0;

    let rule = strategy.params().exit_rule;
    info!(
        strategy = %strategy.name(),
        legs = strategy.positions().len(),
        target = %rule.target,
        stop_loss = %rule.stop_loss,
        tracking_changes = events.len(),
        square_off_at = ?schedule.square_off_at,
        "Replay started"
    );

    while strategy.is_active() {
        let TickOutcome::Advanced(advance) = strategy.update_tick() else {
            break;
        };
        if advance.exit.is_some() {
            break;
        }

        let now = advance.at.time();
        while let Some(event) = events.get(next_event).filter(|e| e.at <= now) {
            next_event += 1;
            let applied = match event.state {
                TrackingState::Tracked => strategy.start_tracking_leg(&event.contract),
                TrackingState::Untracked => strategy.stop_tracking_leg(&event.contract),
            };
            match applied {
                Ok(()) => debug!(
                    contract = %event.contract,
                    state = ?event.state,
                    at = %advance.at,
                    "Scheduled tracking change"
                ),
                Err(e) => warn!(
                    contract = %event.contract,
                    error = %e,
                    "Scheduled tracking skipped"
                ),
            }
        }

        if schedule.square_off_at.is_some_and(|cutoff| now >= cutoff) {
            strategy.square_off(ExitReason::Scheduled);
        }
    }

    let history = strategy.history().clone();
    let summary = RunSummary {
        ticks_processed: strategy.ticks_processed(),
        snapshot: strategy.snapshot(),
        peak_total: history.peak_total(),
        trough_total: history.trough_total(),
        max_drawdown: history.max_drawdown(),
        history,
    };

    info!(
        strategy = %summary.snapshot.name,
        ticks = summary.ticks_processed,
        state = ?summary.snapshot.state,
        exit_reason = ?summary.snapshot.exit_reason,
        total_pnl = %summary.snapshot.pnl.total,
        max_drawdown = %summary.max_drawdown,
        "Replay finished"
    );
    summary
}
