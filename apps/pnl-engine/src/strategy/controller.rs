//! Strategy controller.
//!
//! Owns the simulation clock, the positions, the tracking registry and the
//! lifecycle state. All mutation goes through `&mut self`; callers only get
//! read access to positions and aggregates.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::history::PnlHistory;
use super::lifecycle::{ExitBasis, ExitReason, StrategyState};
use super::params::StrategyParams;
use crate::domain::{
    ContractId, InstrumentKind, PnlBreakdown, Position, TrackingRegistry, TrackingState, pnl,
};
use crate::error::SimulationError;
use crate::tick_source::{Tick, TickSource};

/// Result of one successful clock advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickAdvance {
    /// New simulation time.
    pub at: NaiveDateTime,
    /// Number of legs whose price was updated.
    pub updated: usize,
    /// Set when this tick triggered an automatic square-off.
    pub exit: Option<ExitReason>,
}

/// Outcome of `update_tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickOutcome {
    /// Clock advanced.
    Advanced(TickAdvance),
    /// No open leg has ticks left; nothing changed.
    Exhausted,
    /// Strategy already terminated; nothing changed.
    Terminated,
}

impl TickOutcome {
    /// Get the advance, if the clock moved.
    #[must_use]
    pub const fn advance(&self) -> Option<&TickAdvance> {
        match self {
            Self::Advanced(advance) => Some(advance),
            Self::Exhausted | Self::Terminated => None,
        }
    }
}

/// Per-leg view for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegSnapshot {
    /// Contract.
    pub contract: ContractId,
    /// Signed quantity.
    pub quantity: i64,
    /// Entry price.
    pub entry_price: Decimal,
    /// Last observed price.
    pub last_price: Decimal,
    /// Whether the position is open.
    pub open: bool,
    /// Tracking state.
    pub tracking: TrackingState,
    /// Live PnL (zero once closed).
    pub live_pnl: Decimal,
    /// PnL booked at square-off.
    pub realized_pnl: Option<Decimal>,
}

/// Point-in-time view of a strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategySnapshot {
    /// Strategy name.
    pub name: String,
    /// Lifecycle state.
    pub state: StrategyState,
    /// Why it terminated, if it has.
    pub exit_reason: Option<ExitReason>,
    /// Simulation clock.
    pub current_tick_time: Option<NaiveDateTime>,
    /// Aggregate PnL.
    pub pnl: PnlBreakdown,
    /// Legs ordered by contract.
    pub legs: Vec<LegSnapshot>,
}

/// Tick-driven multi-leg strategy.
#[derive(Debug)]
pub struct Strategy<S> {
    params: StrategyParams,
    source: S,
    positions: BTreeMap<ContractId, Position>,
    tracking: TrackingRegistry,
    state: StrategyState,
    exit_reason: Option<ExitReason>,
    current_tick_time: Option<NaiveDateTime>,
    realized_pnl: Decimal,
    /// Prices from replayed ticks only; entry prices are not included.
    latest_ltp: HashMap<ContractId, Decimal>,
    history: PnlHistory,
    ticks_processed: u64,
}

impl<S: TickSource> Strategy<S> {
    /// Create an active strategy with no legs.
    pub fn new(params: StrategyParams, source: S) -> Self {
        info!(
            strategy = %params.name,
            target = %params.exit_rule.target,
            stop_loss = %params.exit_rule.stop_loss,
            basis = ?params.exit_rule.basis,
            source = %source.name(),
            "Strategy created"
        );
        Self {
            params,
            source,
            positions: BTreeMap::new(),
            tracking: TrackingRegistry::default(),
            state: StrategyState::Active,
            exit_reason: None,
            current_tick_time: None,
            realized_pnl: Decimal::ZERO,
            latest_ltp: HashMap::new(),
            history: PnlHistory::default(),
            ticks_processed: 0,
        }
    }

    // =========================================================================
    // Legs
    // =========================================================================

    /// Open a leg priced from the tick source at `entry_at`.
    ///
    /// The leg starts untracked.
    pub fn open_leg(
        &mut self,
        contract: ContractId,
        quantity: i64,
        entry_at: NaiveDateTime,
    ) -> Result<&Position, SimulationError> {
        if self.state.is_terminal() {
            return Err(self.terminated_error());
        }
        if quantity == 0 {
            return Err(SimulationError::InvalidQuantity { contract });
        }
        // One position per contract for the strategy's lifetime
        if self.positions.contains_key(&contract) {
            return Err(SimulationError::DuplicateLeg { contract });
        }

        let entry = self
            .source
            .entry_tick(&contract, entry_at, self.params.entry_price_policy)?;

        if self.source.next_tick_after(&contract, entry.at).is_none() {
            warn!(
                strategy = %self.params.name,
                contract = %contract,
                entry_at = %entry.at,
                "No ticks after entry; leg will never update"
            );
        }

        info!(
            strategy = %self.params.name,
            contract = %contract,
            quantity,
            entry_price = %entry.price,
            entry_at = %entry.at,
            "Leg opened"
        );

        self.tracking.register(contract.clone());
        let position = Position::open(contract.clone(), quantity, entry.price, entry.at);
        Ok(&*self.positions.entry(contract).or_insert(position))
    }

    /// Parse `code` as `kind` and open the leg.
    pub fn open_leg_by_code(
        &mut self,
        code: &str,
        kind: InstrumentKind,
        quantity: i64,
        entry_at: NaiveDateTime,
    ) -> Result<&Position, SimulationError> {
        let contract = ContractId::parse(code, kind)?;
        self.open_leg(contract, quantity, entry_at)
    }

    /// Include a leg in live PnL. Idempotent; a no-op after termination.
    pub fn start_tracking_leg(&mut self, contract: &ContractId) -> Result<(), SimulationError> {
        self.set_tracking(contract, TrackingState::Tracked)
    }

    /// Exclude a leg from live PnL. The position stays open. Idempotent.
    pub fn stop_tracking_leg(&mut self, contract: &ContractId) -> Result<(), SimulationError> {
        self.set_tracking(contract, TrackingState::Untracked)
    }

    fn set_tracking(
        &mut self,
        contract: &ContractId,
        state: TrackingState,
    ) -> Result<(), SimulationError> {
        if !self.tracking.contains(contract) {
            return Err(SimulationError::unknown_leg(contract));
        }
        if self.state.is_terminal() {
            debug!(
                strategy = %self.params.name,
                contract = %contract,
                ?state,
                "Ignoring tracking change after termination"
            );
            return Ok(());
        }

        let changed = match state {
            TrackingState::Tracked => self.tracking.track(contract.clone()),
            TrackingState::Untracked => self.tracking.untrack(contract.clone()),
        };
        if changed {
            debug!(
                strategy = %self.params.name,
                contract = %contract,
                ?state,
                live_pnl = %self.live_total_pnl(),
                "Tracking changed"
            );
        }
        Ok(())
    }

    /// Set the last price of an open leg. Closed legs keep their square-off price.
    pub(crate) fn update_last_price(
        &mut self,
        contract: &ContractId,
        price: Decimal,
    ) -> Result<(), SimulationError> {
        let position = self
            .positions
            .get_mut(contract)
            .ok_or_else(|| SimulationError::unknown_leg(contract))?;
        position.update_last_price(price);
        Ok(())
    }

    /// Close one leg at its last price and book the PnL. Closing twice books nothing.
    pub(crate) fn close_position(
        &mut self,
        contract: &ContractId,
    ) -> Result<Decimal, SimulationError> {
        let position = self
            .positions
            .get_mut(contract)
            .ok_or_else(|| SimulationError::unknown_leg(contract))?;
        let realized = position.close();
        self.realized_pnl += realized;
        Ok(realized)
    }

    // =========================================================================
    // Clock
    // =========================================================================

    /// Advance to the next timestamp across all open legs.
    ///
    /// Every leg ticking at that timestamp is updated before the exit rule is
    /// evaluated. Exhaustion and termination are no-ops.
    pub fn update_tick(&mut self) -> TickOutcome {
        if self.state.is_terminal() {
            debug!(strategy = %self.params.name, "update_tick after termination ignored");
            return TickOutcome::Terminated;
        }

        let pending = self.pending_ticks();
        let Some(at) = pending.iter().map(|(_, tick)| tick.at).min() else {
            debug!(strategy = %self.params.name, "Tick source exhausted");
            return TickOutcome::Exhausted;
        };

        let mut updated = 0;
        for (contract, tick) in pending.into_iter().filter(|(_, tick)| tick.at == at) {
            if let Some(position) = self.positions.get_mut(&contract) {
                position.update_last_price(tick.price);
                updated += 1;
            }
            self.latest_ltp.insert(contract, tick.price);
        }

        self.current_tick_time = Some(at);
        self.ticks_processed += 1;
        if self.params.record_history {
            let pnl = self.pnl();
            self.history.record(at, pnl);
        }

        debug!(
            strategy = %self.params.name,
            at = %at,
            updated,
            live_pnl = %self.live_total_pnl(),
            total_pnl = %self.total_pnl(),
            "Tick applied"
        );

        let exit = self.evaluate_exit();
        if let Some(reason) = exit {
            self.square_off(reason);
        }

        TickOutcome::Advanced(TickAdvance { at, updated, exit })
    }

    /// Like `update_tick`, but reports no-ops as `NoMoreTicks` / `AlreadyTerminated`.
    pub fn try_update_tick(&mut self) -> Result<TickAdvance, SimulationError> {
        match self.update_tick() {
            TickOutcome::Advanced(advance) => Ok(advance),
            TickOutcome::Exhausted => Err(SimulationError::NoMoreTicks),
            TickOutcome::Terminated => Err(self.terminated_error()),
        }
    }

    /// True while active and at least one open leg has a future tick.
    pub fn is_active(&self) -> bool {
        !self.state.is_terminal() && !self.pending_ticks().is_empty()
    }

    /// Next tick of every open leg that still has one.
    fn pending_ticks(&self) -> Vec<(ContractId, Tick)> {
        self.positions
            .values()
            .filter(|p| p.is_open())
            .filter_map(|p| {
                let cursor = self
                    .current_tick_time
                    .map_or(p.entry_at(), |now| now.max(p.entry_at()));
                self.source
                    .next_tick_after(p.contract(), cursor)
                    .map(|tick| (p.contract().clone(), tick))
            })
            .collect()
    }

    fn evaluate_exit(&self) -> Option<ExitReason> {
        let rule = &self.params.exit_rule;
        let pnl = match rule.basis {
            ExitBasis::Total => self.total_pnl(),
            ExitBasis::Live => self.live_total_pnl(),
        };
        rule.evaluate(pnl)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Square off every open leg and terminate. Idempotent.
    ///
    /// Returns false if the strategy was already terminated.
    pub fn terminate_and_square_off(&mut self) -> bool {
        self.square_off(ExitReason::Manual)
    }

    /// Square off with an explicit reason. Idempotent.
    pub fn square_off(&mut self, reason: ExitReason) -> bool {
        if self.state.is_terminal() {
            debug!(strategy = %self.params.name, ?reason, "Already squared off");
            return false;
        }

        let open: Vec<ContractId> = self
            .positions
            .values()
            .filter(|p| p.is_open())
            .map(|p| p.contract().clone())
            .collect();

        for contract in &open {
            // Every contract here came from `self.positions`
            if let Ok(realized) = self.close_position(contract) {
                debug!(
                    strategy = %self.params.name,
                    contract = %contract,
                    realized = %realized,
                    "Position closed"
                );
            }
        }

        self.tracking.untrack_all();
        self.state = StrategyState::Terminated;
        self.exit_reason = Some(reason);

        if self.params.record_history
            && let Some(at) = self.current_tick_time
        {
            let pnl = self.pnl();
            self.history.record(at, pnl);
        }

        info!(
            strategy = %self.params.name,
            ?reason,
            closed = open.len(),
            realized_pnl = %self.realized_pnl,
            at = ?self.current_tick_time,
            "Strategy squared off"
        );
        true
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Strategy name.
    pub fn name(&self) -> &str {
        &self.params.name
    }

    /// Construction parameters.
    pub const fn params(&self) -> &StrategyParams {
        &self.params
    }

    /// Lifecycle state.
    pub const fn state(&self) -> StrategyState {
        self.state
    }

    /// Why the strategy terminated.
    pub const fn exit_reason(&self) -> Option<ExitReason> {
        self.exit_reason
    }

    /// Simulation clock; `None` until the first tick.
    pub const fn current_tick_time(&self) -> Option<NaiveDateTime> {
        self.current_tick_time
    }

    /// Number of clock advances so far.
    pub const fn ticks_processed(&self) -> u64 {
        self.ticks_processed
    }

    /// All positions ever opened, keyed by contract.
    pub const fn positions(&self) -> &BTreeMap<ContractId, Position> {
        &self.positions
    }

    /// Get one position.
    pub fn position(&self, contract: &ContractId) -> Option<&Position> {
        self.positions.get(contract)
    }

    /// Tracking state of a leg.
    pub fn tracking_state(&self, contract: &ContractId) -> Option<TrackingState> {
        self.tracking.state(contract)
    }

    /// Tracked legs whose position is still open.
    pub fn active_legs(&self) -> BTreeSet<ContractId> {
        self.tracking
            .tracked()
            .filter(|c| self.positions.get(*c).is_some_and(Position::is_open))
            .cloned()
            .collect()
    }

    /// Live PnL over tracked open legs.
    pub fn live_total_pnl(&self) -> Decimal {
        pnl::live_total(self.positions.values(), &self.tracking)
    }

    /// Realized PnL booked so far.
    pub const fn realized_pnl(&self) -> Decimal {
        self.realized_pnl
    }

    /// `realized_pnl + live_total_pnl`.
    pub fn total_pnl(&self) -> Decimal {
        self.realized_pnl + self.live_total_pnl()
    }

    /// What `realized_pnl` would become if squared off now.
    pub fn mark_to_market(&self) -> Decimal {
        self.realized_pnl + pnl::mark_to_market(self.positions.values())
    }

    /// Live, realized and total PnL together.
    pub fn pnl(&self) -> PnlBreakdown {
        PnlBreakdown::new(self.live_total_pnl(), self.realized_pnl)
    }

    /// Last replayed price for a leg; `Ok(None)` before its first tick.
    pub fn get_latest_ltp(
        &self,
        contract: &ContractId,
    ) -> Result<Option<Decimal>, SimulationError> {
        if !self.positions.contains_key(contract) {
            return Err(SimulationError::unknown_leg(contract));
        }
        Ok(self.latest_ltp.get(contract).copied())
    }

    /// Per-tick PnL history.
    pub const fn history(&self) -> &PnlHistory {
        &self.history
    }

    /// Reporting view of the current state.
    pub fn snapshot(&self) -> StrategySnapshot {
        let legs = self
            .positions
            .values()
            .map(|p| LegSnapshot {
                contract: p.contract().clone(),
                quantity: p.quantity(),
                entry_price: p.entry_price(),
                last_price: p.last_price(),
                open: p.is_open(),
                tracking: self.tracking.state(p.contract()).unwrap_or_default(),
                live_pnl: p.live_pnl(),
                realized_pnl: p.realized_pnl(),
            })
            .collect();

        StrategySnapshot {
            name: self.params.name.clone(),
            state: self.state,
            exit_reason: self.exit_reason,
            current_tick_time: self.current_tick_time,
            pnl: self.pnl(),
            legs,
        }
    }

    fn terminated_error(&self) -> SimulationError {
        SimulationError::AlreadyTerminated {
            strategy: self.params.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tick_source::{EntryPricePolicy, InMemoryTickSource};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn ce() -> ContractId {
        "RELIANCE28JAN212000CE".parse().unwrap()
    }

    fn pe() -> ContractId {
        "RELIANCE28JAN212000PE".parse().unwrap()
    }

    fn source() -> InMemoryTickSource {
        InMemoryTickSource::new()
            .with_ticks(
                ce(),
                [
                    (at(9, 15, 0), dec!(100)),
                    (at(9, 15, 1), dec!(95)),
                    (at(9, 15, 3), dec!(90)),
                ],
            )
            .with_ticks(
                pe(),
                [
                    (at(9, 15, 0), dec!(50)),
                    (at(9, 15, 2), dec!(52)),
                    (at(9, 15, 3), dec!(55)),
                ],
            )
    }

    fn strategy(target: Decimal, stop_loss: Decimal) -> Strategy<InMemoryTickSource> {
        Strategy::new(StrategyParams::new("TestStrat", target, stop_loss), source())
    }

    fn opened() -> Strategy<InMemoryTickSource> {
        let mut s = strategy(dec!(200), dec!(-200));
        s.open_leg(ce(), -3, at(9, 15, 0)).unwrap();
        s.open_leg(pe(), 5, at(9, 15, 0)).unwrap();
        s
    }

    #[test]
    fn open_leg_prices_entry() {
        let s = opened();
        let position = s.position(&ce()).unwrap();
        assert_eq!(position.entry_price(), dec!(100));
        assert_eq!(position.last_price(), dec!(100));
        assert_eq!(position.quantity(), -3);
        assert_eq!(s.tracking_state(&ce()), Some(TrackingState::Untracked));
        assert!(s.active_legs().is_empty());
        assert_eq!(s.get_latest_ltp(&ce()), Ok(None));
        assert_eq!(s.current_tick_time(), None);
    }

    #[test]
    fn open_leg_rejects_zero_and_duplicates() {
        let mut s = opened();
        let err = s.open_leg(ContractId::future("RELIANCE").unwrap(), 0, at(9, 15, 0));
        assert_eq!(err.unwrap_err().code(), crate::ErrorCode::InvalidQuantity);

        let err = s.open_leg(ce(), 1, at(9, 15, 0)).unwrap_err();
        assert!(matches!(err, SimulationError::DuplicateLeg { .. }));
        assert_eq!(s.position(&ce()).unwrap().quantity(), -3);
    }

    #[test]
    fn open_leg_without_entry_tick() {
        let mut s = strategy(dec!(200), dec!(-200));
        let err = s.open_leg(ce(), 1, at(9, 0, 0)).unwrap_err();
        assert_eq!(err.code(), crate::ErrorCode::EntryPriceUnavailable);
        assert!(s.positions().is_empty());

        let err = s
            .open_leg(ContractId::future("TCS").unwrap(), 1, at(9, 15, 0))
            .unwrap_err();
        assert!(matches!(err, SimulationError::EntryPrice(_)));
    }

    #[test]
    fn open_leg_at_or_after_policy() {
        let params = StrategyParams::new("AfterStrat", dec!(200), dec!(-200))
            .with_entry_price_policy(EntryPricePolicy::AtOrAfter);
        let mut s = Strategy::new(params, source());
        let position = s.open_leg(ce(), 1, at(9, 0, 0)).unwrap();
        assert_eq!(position.entry_price(), dec!(100));
        assert_eq!(position.entry_at(), at(9, 15, 0));
    }

    #[test]
    fn open_leg_by_code() {
        let mut s = strategy(dec!(200), dec!(-200));
        s.open_leg_by_code("reliance28jan212000ce", InstrumentKind::Option, -3, at(9, 15, 0))
            .unwrap();
        assert!(s.position(&ce()).is_some());

        let err = s
            .open_leg_by_code("RELIANCE", InstrumentKind::Option, 1, at(9, 15, 0))
            .unwrap_err();
        assert_eq!(err.code(), crate::ErrorCode::InvalidContract);
    }

    #[test]
    fn ticks_advance_on_shared_clock() {
        let mut s = opened();
        s.start_tracking_leg(&ce()).unwrap();
        s.start_tracking_leg(&pe()).unwrap();

        let advance = s.try_update_tick().unwrap();
        assert_eq!(advance.at, at(9, 15, 1));
        assert_eq!(advance.updated, 1);
        assert_eq!(s.live_total_pnl(), dec!(15));
        assert_eq!(s.get_latest_ltp(&pe()), Ok(None));

        let advance = s.try_update_tick().unwrap();
        assert_eq!(advance.at, at(9, 15, 2));
        assert_eq!(s.live_total_pnl(), dec!(25));

        // Both legs tick at 09:15:03
        let advance = s.try_update_tick().unwrap();
        assert_eq!(advance.updated, 2);
        assert_eq!(s.live_total_pnl(), dec!(55.00));
        assert_eq!(s.total_pnl(), dec!(55.00));
        assert_eq!(s.realized_pnl(), Decimal::ZERO);

        assert!(!s.is_active());
        assert_eq!(s.update_tick(), TickOutcome::Exhausted);
        assert_eq!(s.try_update_tick(), Err(SimulationError::NoMoreTicks));
        assert_eq!(s.state(), StrategyState::Active);
        assert_eq!(s.ticks_processed(), 3);
        assert_eq!(s.history().len(), 3);
    }

    #[test]
    fn tracking_requires_known_leg() {
        let mut s = opened();
        let unknown = ContractId::future("TCS").unwrap();
        assert!(matches!(
            s.start_tracking_leg(&unknown),
            Err(SimulationError::UnknownLeg { .. })
        ));
        assert!(s.stop_tracking_leg(&unknown).is_err());
        assert!(s.get_latest_ltp(&unknown).is_err());
    }

    #[test]
    fn tracking_is_idempotent() {
        let mut s = opened();
        s.start_tracking_leg(&ce()).unwrap();
        s.start_tracking_leg(&ce()).unwrap();
        assert_eq!(s.active_legs().len(), 1);
        s.stop_tracking_leg(&ce()).unwrap();
        s.stop_tracking_leg(&ce()).unwrap();
        assert!(s.active_legs().is_empty());
        assert!(s.position(&ce()).unwrap().is_open());
    }

    #[test]
    fn update_last_price_and_close_position() {
        let mut s = opened();
        s.start_tracking_leg(&ce()).unwrap();

        s.update_last_price(&ce(), dec!(90)).unwrap();
        assert_eq!(s.live_total_pnl(), dec!(30));
        assert!(matches!(
            s.update_last_price(&ContractId::future("TCS").unwrap(), dec!(1)),
            Err(SimulationError::UnknownLeg { .. })
        ));

        assert_eq!(s.close_position(&ce()), Ok(dec!(30)));
        assert_eq!(s.close_position(&ce()), Ok(Decimal::ZERO));
        assert_eq!(s.realized_pnl(), dec!(30));

        // Closed leg ignores further prices
        s.update_last_price(&ce(), dec!(10)).unwrap();
        assert_eq!(s.position(&ce()).unwrap().last_price(), dec!(90));
        assert_eq!(s.live_total_pnl(), Decimal::ZERO);
        assert!(s.active_legs().is_empty());
    }

    #[test]
    fn closed_leg_cannot_be_reopened() {
        let mut s = opened();
        s.update_tick();
        assert_eq!(s.close_position(&ce()), Ok(dec!(15)));

        let err = s.open_leg(ce(), 2, at(9, 15, 1)).unwrap_err();
        assert_eq!(err.code(), crate::ErrorCode::DuplicateLeg);

        let position = s.position(&ce()).unwrap();
        assert!(!position.is_open());
        assert_eq!(position.quantity(), -3);
        assert_eq!(position.realized_pnl(), Some(dec!(15)));
        assert_eq!(s.realized_pnl(), dec!(15));
    }

    #[test]
    fn square_off_realizes_untracked_legs() {
        let mut s = opened();
        s.start_tracking_leg(&ce()).unwrap();
        s.update_tick();
        s.update_tick();

        // ce at 95 (+15), pe at 52 (+10, untracked)
        assert_eq!(s.total_pnl(), dec!(15));
        assert_eq!(s.mark_to_market(), dec!(25));

        assert!(s.terminate_and_square_off());
        assert_eq!(s.realized_pnl(), dec!(25));
        assert_eq!(s.total_pnl(), dec!(25));
        assert_eq!(s.live_total_pnl(), Decimal::ZERO);
        assert_eq!(s.exit_reason(), Some(ExitReason::Manual));
        assert_eq!(s.tracking_state(&ce()), Some(TrackingState::Untracked));

        assert!(!s.terminate_and_square_off());
        assert_eq!(s.realized_pnl(), dec!(25));
        assert_eq!(s.state(), StrategyState::Terminated);
    }

    #[test]
    fn terminated_strategy_ignores_mutation() {
        let mut s = opened();
        s.terminate_and_square_off();

        assert_eq!(s.update_tick(), TickOutcome::Terminated);
        assert!(matches!(
            s.try_update_tick(),
            Err(SimulationError::AlreadyTerminated { .. })
        ));
        assert!(s.start_tracking_leg(&ce()).is_ok());
        assert!(s.active_legs().is_empty());
        assert!(!s.is_active());

        let err = s
            .open_leg(ContractId::future("TCS").unwrap(), 1, at(9, 15, 0))
            .unwrap_err();
        assert_eq!(err.code(), crate::ErrorCode::AlreadyTerminated);
    }

    #[test]
    fn stop_loss_triggers_square_off() {
        let mut s = strategy(dec!(1000), dec!(-10));
        s.open_leg(ce(), 3, at(9, 15, 0)).unwrap();
        s.start_tracking_leg(&ce()).unwrap();

        let advance = s.try_update_tick().unwrap();
        assert_eq!(advance.exit, Some(ExitReason::StopLoss));
        assert_eq!(s.realized_pnl(), dec!(-15));
        assert_eq!(s.exit_reason(), Some(ExitReason::StopLoss));
        assert!(!s.is_active());
    }

    #[test]
    fn live_basis_ignores_realized() {
        let params = StrategyParams::new("LiveBasis", dec!(20), dec!(-1000))
            .with_exit_basis(ExitBasis::Live);
        let mut s = Strategy::new(params, source());
        s.open_leg(ce(), -3, at(9, 15, 0)).unwrap();
        s.start_tracking_leg(&ce()).unwrap();

        assert_eq!(s.try_update_tick().unwrap().exit, None);
        assert_eq!(s.try_update_tick().unwrap().exit, Some(ExitReason::Target));
        assert_eq!(s.realized_pnl(), dec!(30));
    }

    #[test]
    fn leg_opened_later_skips_earlier_ticks() {
        let mut s = strategy(dec!(200), dec!(-200));
        s.open_leg(ce(), 1, at(9, 15, 0)).unwrap();
        s.open_leg(pe(), 1, at(9, 15, 2)).unwrap();

        let advance = s.try_update_tick().unwrap();
        assert_eq!(advance.at, at(9, 15, 1));
        let advance = s.try_update_tick().unwrap();
        assert_eq!(advance.at, at(9, 15, 3));
        assert_eq!(advance.updated, 2);
    }

    #[test]
    fn snapshot_lists_legs() {
        let mut s = opened();
        s.start_tracking_leg(&pe()).unwrap();
        s.update_tick();

        let snapshot = s.snapshot();
        assert_eq!(snapshot.name, "TestStrat");
        assert_eq!(snapshot.state, StrategyState::Active);
        assert_eq!(snapshot.current_tick_time, Some(at(9, 15, 1)));
        assert_eq!(snapshot.legs.len(), 2);

        let ce_leg = snapshot.legs.iter().find(|l| l.contract == ce()).unwrap();
        assert_eq!(ce_leg.tracking, TrackingState::Untracked);
        assert_eq!(ce_leg.live_pnl, dec!(15));
        assert_eq!(snapshot.pnl.live, Decimal::ZERO);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["legs"][0]["contract"], "RELIANCE28JAN212000CE");
    }

    #[test]
    fn history_can_be_disabled() {
        let params = StrategyParams::new("NoHistory", dec!(200), dec!(-200)).with_history(false);
        let mut s = Strategy::new(params, source());
        s.open_leg(ce(), 1, at(9, 15, 0)).unwrap();
        s.update_tick();
        s.terminate_and_square_off();
        assert!(s.history().is_empty());
    }
}
