//! Strategy and leg configuration.

use chrono::{NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::observability::default_true;
use crate::domain::{ContractId, ContractParseError, InstrumentKind, TrackingState};
use crate::strategy::{ExitBasis, StrategyParams};
use crate::tick_source::EntryPricePolicy;

/// Strategy construction parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Strategy name.
    pub name: String,
    /// Square off when PnL >= target.
    pub target: Decimal,
    /// Square off when PnL <= stop_loss.
    pub stop_loss: Decimal,
    /// PnL figure compared against target/stop_loss: `total` or `live`.
    #[serde(default)]
    pub exit_basis: ExitBasis,
    /// Entry pricing: `at_or_before` or `at_or_after`.
    #[serde(default)]
    pub entry_price_policy: EntryPricePolicy,
    /// Intraday time at which everything is squared off.
    #[serde(default)]
    pub square_off_at: Option<NaiveTime>,
}

impl StrategyConfig {
    /// Build controller parameters.
    #[must_use]
    pub fn to_params(&self, record_history: bool) -> StrategyParams {
        StrategyParams::new(self.name.clone(), self.target, self.stop_loss)
            .with_exit_basis(self.exit_basis)
            .with_entry_price_policy(self.entry_price_policy)
            .with_history(record_history)
    }
}

/// One leg to open before replay starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegConfig {
    /// Contract code, e.g. `RELIANCE28JAN212000CE` or `RELIANCE`.
    pub contract: String,
    /// `option` (default) or `future`.
    #[serde(default)]
    pub kind: InstrumentKind,
    /// Signed quantity (negative = short).
    pub quantity: i64,
    /// Entry timestamp.
    pub entry_at: NaiveDateTime,
    /// Start tracking immediately.
    #[serde(default = "default_true")]
    pub track: bool,
    /// Start tracking once the clock reaches this time (implies `track: false` until then).
    #[serde(default)]
    pub track_from: Option<NaiveTime>,
    /// Stop tracking once the clock reaches this time.
    #[serde(default)]
    pub track_until: Option<NaiveTime>,
    /// Further tracking changes by time; the leg's initial state is `track`.
    #[serde(default)]
    pub tracking: Vec<TrackingToggle>,
}

/// Tracking change applied on the first tick at or after `at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingToggle {
    /// Intraday time.
    pub at: NaiveTime,
    /// `true` starts tracking, `false` stops it.
    pub track: bool,
}

impl LegConfig {
    /// Parse the contract code.
    pub fn contract_id(&self) -> Result<ContractId, ContractParseError> {
        ContractId::parse(&self.contract, self.kind)
    }

    /// Whether the leg is tracked right after it is opened.
    #[must_use]
    pub const fn tracked_at_open(&self) -> bool {
        self.track && self.track_from.is_none()
    }

    /// Timed tracking changes from `track_from`, `track_until` and `tracking`,
    /// in time order. Changes at the same time keep that order.
    #[must_use]
    pub fn tracking_changes(&self) -> Vec<(NaiveTime, TrackingState)> {
        let state = |track: bool| {
            if track {
                TrackingState::Tracked
            } else {
                TrackingState::Untracked
            }
        };

        let mut changes: Vec<_> = self
            .track_from
            .map(|at| (at, TrackingState::Tracked))
            .into_iter()
            .chain(self.track_until.map(|at| (at, TrackingState::Untracked)))
            .chain(self.tracking.iter().map(|t| (t.at, state(t.track))))
            .collect();
        changes.sort_by_key(|(at, _)| *at);
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_to_params() {
        let config = StrategyConfig {
            name: "TestStrat".to_string(),
            target: dec!(200),
            stop_loss: dec!(-200),
            exit_basis: ExitBasis::Live,
            entry_price_policy: EntryPricePolicy::AtOrAfter,
            square_off_at: None,
        };
        let params = config.to_params(false);
        assert_eq!(params.name, "TestStrat");
        assert_eq!(params.exit_rule.target, dec!(200));
        assert_eq!(params.exit_rule.stop_loss, dec!(-200));
        assert_eq!(params.exit_rule.basis, ExitBasis::Live);
        assert_eq!(params.entry_price_policy, EntryPricePolicy::AtOrAfter);
        assert!(!params.record_history);
    }

    #[test]
    fn test_leg_tracking_flags() {
        let mut leg = LegConfig {
            contract: "RELIANCE".to_string(),
            kind: InstrumentKind::Future,
            quantity: -5,
            entry_at: chrono::NaiveDate::from_ymd_opt(2021, 1, 1)
                .unwrap()
                .and_hms_opt(9, 15, 0)
                .unwrap(),
            track: true,
            track_from: None,
            track_until: None,
            tracking: Vec::new(),
        };
        assert!(leg.tracked_at_open());
        assert!(leg.tracking_changes().is_empty());
        assert_eq!(leg.contract_id().unwrap(), ContractId::future("RELIANCE").unwrap());

        leg.track_from = NaiveTime::from_hms_opt(12, 30, 30);
        assert!(!leg.tracked_at_open());

        leg.track_from = None;
        leg.track = false;
        assert!(!leg.tracked_at_open());
    }

    #[test]
    fn test_tracking_changes_in_time_order() {
        let time = |h, m, s| NaiveTime::from_hms_opt(h, m, s).unwrap();
        let leg = LegConfig {
            contract: "RELIANCE28JAN212000CE".to_string(),
            kind: InstrumentKind::Option,
            quantity: -3,
            entry_at: chrono::NaiveDate::from_ymd_opt(2021, 1, 1)
                .unwrap()
                .and_hms_opt(9, 15, 0)
                .unwrap(),
            track: false,
            track_from: Some(time(15, 27, 30)),
            track_until: Some(time(15, 29, 0)),
            tracking: vec![
                TrackingToggle {
                    at: time(15, 28, 30),
                    track: true,
                },
                TrackingToggle {
                    at: time(15, 28, 0),
                    track: false,
                },
            ],
        };

        assert_eq!(
            leg.tracking_changes(),
            vec![
                (time(15, 27, 30), TrackingState::Tracked),
                (time(15, 28, 0), TrackingState::Untracked),
                (time(15, 28, 30), TrackingState::Tracked),
                (time(15, 29, 0), TrackingState::Untracked),
            ]
        );
    }
}
