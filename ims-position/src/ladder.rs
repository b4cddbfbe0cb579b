use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The projected quantity available by settlement date, maintained per `(book, security)` by the
/// Position Engine (§4.4). Each trade appends a rung at its settlement date; the ladder is the
/// running total as of each date, not a per-trade delta log.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SettlementLadder {
    rungs: BTreeMap<NaiveDate, Decimal>,
}

impl SettlementLadder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a quantity delta settling on `date`, recomputing every later rung's projected
    /// total so the ladder stays a running cumulative view.
    pub fn apply(&mut self, date: NaiveDate, delta: Decimal) {
        for (_, total) in self.rungs.range_mut(date..) {
            *total += delta;
        }

        let prior_total = self
            .rungs
            .range(..date)
            .next_back()
            .map(|(_, total)| *total)
            .unwrap_or(Decimal::ZERO);

        self.rungs.entry(date).or_insert(prior_total + delta);
    }

    /// The projected quantity as of `date` (the latest rung at or before `date`, or zero if the
    /// ladder has no rungs that early).
    pub fn projected_as_of(&self, date: NaiveDate) -> Decimal {
        self.rungs
            .range(..=date)
            .next_back()
            .map(|(_, total)| *total)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn rungs(&self) -> impl Iterator<Item = (NaiveDate, Decimal)> + '_ {
        self.rungs.iter().map(|(date, total)| (*date, *total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, day).unwrap()
    }

    #[test]
    fn later_rungs_carry_forward_earlier_deltas() {
        let mut ladder = SettlementLadder::new();
        ladder.apply(date(2), dec!(100));
        ladder.apply(date(5), dec!(-30));

        assert_eq!(ladder.projected_as_of(date(1)), Decimal::ZERO);
        assert_eq!(ladder.projected_as_of(date(3)), dec!(100));
        assert_eq!(ladder.projected_as_of(date(5)), dec!(70));
        assert_eq!(ladder.projected_as_of(date(10)), dec!(70));
    }

    #[test]
    fn inserting_an_earlier_rung_after_a_later_one_propagates_forward() {
        let mut ladder = SettlementLadder::new();
        ladder.apply(date(10), dec!(50));
        ladder.apply(date(2), dec!(20));

        assert_eq!(ladder.projected_as_of(date(2)), dec!(20));
        assert_eq!(ladder.projected_as_of(date(10)), dec!(70));
    }
}
