//! Per-tick PnL history.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::PnlBreakdown;

/// PnL at one simulation timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PnlPoint {
    /// Simulation time.
    pub at: NaiveDateTime,
    /// PnL breakdown after the tick was applied.
    #[serde(flatten)]
    pub pnl: PnlBreakdown,
}

/// Ordered PnL points.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PnlHistory {
    points: Vec<PnlPoint>,
}

impl PnlHistory {
    /// Append a point.
    pub fn record(&mut self, at: NaiveDateTime, pnl: PnlBreakdown) {
        self.points.push(PnlPoint { at, pnl });
    }

    /// All points, oldest first.
    #[must_use]
    pub fn points(&self) -> &[PnlPoint] {
        &self.points
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if no points were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Latest point.
    #[must_use]
    pub fn last(&self) -> Option<&PnlPoint> {
        self.points.last()
    }

    /// Highest total PnL seen.
    #[must_use]
    pub fn peak_total(&self) -> Option<Decimal> {
        self.points.iter().map(|p| p.pnl.total).max()
    }

    /// Lowest total PnL seen.
    #[must_use]
    pub fn trough_total(&self) -> Option<Decimal> {
        self.points.iter().map(|p| p.pnl.total).min()
    }

    /// Largest fall in total PnL from a running peak (zero if it never fell).
    #[must_use]
    pub fn max_drawdown(&self) -> Decimal {
        let mut peak: Option<Decimal> = None;
        let mut max_dd = Decimal::ZERO;
        for point in &self.points {
            let total = point.pnl.total;
            let running = peak.map_or(total, |p| p.max(total));
            peak = Some(running);
            max_dd = max_dd.max(running - total);
        }
        max_dd
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn at(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 1, 1)
            .unwrap()
            .and_hms_opt(9, minute, 0)
            .unwrap()
    }

    #[test]
    fn empty_history() {
        let history = PnlHistory::default();
        assert!(history.is_empty());
        assert_eq!(history.peak_total(), None);
        assert_eq!(history.max_drawdown(), Decimal::ZERO);
    }

    #[test]
    fn peak_trough_and_drawdown() {
        let mut history = PnlHistory::default();
        for (minute, total) in [(15, dec!(10)), (16, dec!(50)), (17, dec!(-20)), (18, dec!(30))] {
            history.record(at(minute), PnlBreakdown::new(total, Decimal::ZERO));
        }

        assert_eq!(history.len(), 4);
        assert_eq!(history.peak_total(), Some(dec!(50)));
        assert_eq!(history.trough_total(), Some(dec!(-20)));
        assert_eq!(history.max_drawdown(), dec!(70));
        assert_eq!(history.last().unwrap().at, at(18));
    }

    #[test]
    fn point_serializes_flat() {
        let mut history = PnlHistory::default();
        history.record(at(15), PnlBreakdown::new(dec!(5), dec!(1)));
        let json = serde_json::to_value(history.points()[0]).unwrap();
        assert_eq!(json["total"], "6");
        assert_eq!(json["at"], "2021-01-01T09:15:00");
    }
}
