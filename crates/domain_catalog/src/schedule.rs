//! Billing schedules and the period resolver
//!
//! A billing schedule is an ordered list of dated periods. Each period has a
//! billing date and a set of billing ratios describing what fraction of the
//! period is charged when a product starts part way through it.
//!
//! # Resolution
//!
//! ```text
//!   start date ──┐
//!   ┌─────────┬──▼──────┬─────────┬─────────┐
//!   │ P1      │ P2      │ P3      │ P4      │
//!   └─────────┴─────────┴─────────┴─────────┘
//!     skipped   ratio n/d  1/1       1/1
//! ```
//!
//! Periods ending before the start date are skipped. The period containing
//! the start date is charged by the ratio covering that date; every later
//! period is charged in full.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{BillingRatioId, BillingScheduleId, BillingSchedulePeriodId, DateRange, Ratio};
use crate::error::CatalogError;

/// Fraction charged when a product starts inside `[start_date, end_date]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingRatio {
    pub id: BillingRatioId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub ratio: Ratio,
}

impl BillingRatio {
    /// Creates a billing ratio
    ///
    /// # Errors
    ///
    /// Fails when the denominator is zero, the fraction exceeds one, or the
    /// date range is inverted.
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        numerator: u32,
        denominator: u32,
    ) -> Result<Self, CatalogError> {
        DateRange::new(start_date, end_date)?;
        Ok(Self {
            id: BillingRatioId::new_v7(),
            start_date,
            end_date,
            ratio: Ratio::new(numerator, denominator)?,
        })
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

/// One billable interval of a schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingSchedulePeriod {
    pub id: BillingSchedulePeriodId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Date on which the period's bill is issued
    pub billing_date: NaiveDate,
    pub ratios: Vec<BillingRatio>,
}

impl BillingSchedulePeriod {
    /// Creates a period with no ratios
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Temporal` when `start_date` is after `end_date`
    pub fn new(
        name: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        billing_date: NaiveDate,
    ) -> Result<Self, CatalogError> {
        DateRange::new(start_date, end_date)?;
        Ok(Self {
            id: BillingSchedulePeriodId::new_v7(),
            name: name.into(),
            start_date,
            end_date,
            billing_date,
            ratios: Vec::new(),
        })
    }

    /// Attaches a ratio, checking it lies within the period
    pub fn with_ratio(mut self, ratio: BillingRatio) -> Result<Self, CatalogError> {
        if ratio.start_date < self.start_date || ratio.end_date > self.end_date {
            return Err(CatalogError::RatioOutsidePeriod {
                period_id: self.id,
                start: ratio.start_date,
                end: ratio.end_date,
            });
        }
        self.ratios.push(ratio);
        Ok(self)
    }

    pub fn range(&self) -> DateRange {
        DateRange {
            start: self.start_date,
            end: self.end_date,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.range().contains(date)
    }

    /// Returns the first ratio covering the date
    pub fn ratio_on(&self, date: NaiveDate) -> Option<&BillingRatio> {
        self.ratios.iter().find(|r| r.covers(date))
    }

    /// Returns the ratio charged for a product starting on `date`
    ///
    /// Starting on or before the period start charges the whole period.
    pub fn ratio_for_start(&self, date: NaiveDate) -> Result<Ratio, CatalogError> {
        if date <= self.start_date {
            return Ok(Ratio::FULL);
        }
        self.ratio_on(date)
            .map(|r| r.ratio)
            .ok_or(CatalogError::RatioNotFound {
                period_id: self.id,
                date,
            })
    }
}

/// A period paired with the ratio charged for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPeriod {
    pub period: BillingSchedulePeriod,
    pub ratio: Ratio,
    /// True when the ratio charges less than the full period
    pub prorated: bool,
}

impl ResolvedPeriod {
    fn full(period: &BillingSchedulePeriod) -> Self {
        Self {
            period: period.clone(),
            ratio: Ratio::FULL,
            prorated: false,
        }
    }
}

/// Ordered, non-overlapping billing periods
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingSchedule {
    pub id: BillingScheduleId,
    pub name: String,
    periods: Vec<BillingSchedulePeriod>,
    pub is_archived: bool,
}

impl BillingSchedule {
    /// Creates a schedule, ordering the periods by start date
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::OverlappingPeriods` when two periods share a day
    pub fn new(
        id: BillingScheduleId,
        name: impl Into<String>,
        mut periods: Vec<BillingSchedulePeriod>,
    ) -> Result<Self, CatalogError> {
        periods.sort_by_key(|p| p.start_date);
        for pair in periods.windows(2) {
            if pair[0].range().overlaps(&pair[1].range()) {
                return Err(CatalogError::OverlappingPeriods {
                    first: pair[0].id,
                    second: pair[1].id,
                });
            }
        }
        Ok(Self {
            id,
            name: name.into(),
            periods,
            is_archived: false,
        })
    }

    pub fn archived(mut self) -> Self {
        self.is_archived = true;
        self
    }

    pub fn periods(&self) -> &[BillingSchedulePeriod] {
        &self.periods
    }

    pub fn period(&self, id: &BillingSchedulePeriodId) -> Option<&BillingSchedulePeriod> {
        self.periods.iter().find(|p| &p.id == id)
    }

    /// Returns the last period of the schedule
    pub fn latest_period(&self) -> Option<&BillingSchedulePeriod> {
        self.periods.last()
    }

    /// Periods that end on or after `date`, in order
    pub fn periods_from(&self, date: NaiveDate) -> impl Iterator<Item = &BillingSchedulePeriod> {
        self.periods.iter().filter(move |p| p.end_date >= date)
    }

    /// Resolves the billable periods for a product starting on `start`
    ///
    /// # Arguments
    ///
    /// * `start` - The product start or effective date
    ///
    /// # Returns
    ///
    /// The periods ending on or after `start`, the first carrying the ratio
    /// covering `start` and every later one carrying 1/1.
    ///
    /// # Errors
    ///
    /// * `StartDateAfterSchedule` - no period ends on or after `start`
    /// * `RatioNotFound` - the first period has no ratio covering `start`
    pub fn resolve_periods(&self, start: NaiveDate) -> Result<Vec<ResolvedPeriod>, CatalogError> {
        let mut remaining = self.periods_from(start);
        let first = remaining.next().ok_or(CatalogError::StartDateAfterSchedule {
            schedule_id: self.id,
            date: start,
        })?;

        let ratio = first.ratio_for_start(start)?;
        let mut resolved = vec![ResolvedPeriod {
            period: first.clone(),
            ratio,
            prorated: !ratio.is_full(),
        }];
        resolved.extend(remaining.map(ResolvedPeriod::full));
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn monthly_schedule() -> BillingSchedule {
        let jan = BillingSchedulePeriod::new("Jan", date(2024, 1, 1), date(2024, 1, 31), date(2023, 12, 25))
            .unwrap()
            .with_ratio(BillingRatio::new(date(2024, 1, 1), date(2024, 1, 15), 1, 1).unwrap())
            .unwrap()
            .with_ratio(BillingRatio::new(date(2024, 1, 16), date(2024, 1, 31), 1, 2).unwrap())
            .unwrap();
        let feb = BillingSchedulePeriod::new("Feb", date(2024, 2, 1), date(2024, 2, 29), date(2024, 1, 25))
            .unwrap();
        let mar = BillingSchedulePeriod::new("Mar", date(2024, 3, 1), date(2024, 3, 31), date(2024, 2, 25))
            .unwrap();
        BillingSchedule::new(BillingScheduleId::new(), "Monthly", vec![mar, jan, feb]).unwrap()
    }

    #[test]
    fn test_periods_are_sorted() {
        let schedule = monthly_schedule();
        let names: Vec<_> = schedule.periods().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Jan", "Feb", "Mar"]);
        assert_eq!(schedule.latest_period().map(|p| p.name.as_str()), Some("Mar"));
    }

    #[test]
    fn test_resolve_from_period_start_is_full() {
        let resolved = monthly_schedule().resolve_periods(date(2024, 1, 1)).unwrap();
        assert_eq!(resolved.len(), 3);
        assert!(resolved.iter().all(|r| r.ratio.is_full() && !r.prorated));
    }

    #[test]
    fn test_resolve_mid_period_prorates_first_only() {
        let resolved = monthly_schedule().resolve_periods(date(2024, 1, 20)).unwrap();
        assert_eq!(resolved[0].ratio, Ratio::new(1, 2).unwrap());
        assert!(resolved[0].prorated);
        assert!(resolved[1..].iter().all(|r| r.ratio == Ratio::FULL));
    }

    #[test]
    fn test_resolve_skips_past_periods() {
        let resolved = monthly_schedule().resolve_periods(date(2024, 2, 1)).unwrap();
        let names: Vec<_> = resolved.iter().map(|r| r.period.name.as_str()).collect();
        assert_eq!(names, vec!["Feb", "Mar"]);
    }

    #[test]
    fn test_resolve_missing_ratio() {
        let err = monthly_schedule().resolve_periods(date(2024, 2, 10)).unwrap_err();
        assert!(matches!(err, CatalogError::RatioNotFound { .. }));
    }

    #[test]
    fn test_resolve_after_schedule() {
        let err = monthly_schedule().resolve_periods(date(2024, 4, 1)).unwrap_err();
        assert!(matches!(err, CatalogError::StartDateAfterSchedule { .. }));
    }

    #[test]
    fn test_overlapping_periods_rejected() {
        let a = BillingSchedulePeriod::new("A", date(2024, 1, 1), date(2024, 1, 31), date(2024, 1, 1)).unwrap();
        let b = BillingSchedulePeriod::new("B", date(2024, 1, 31), date(2024, 2, 28), date(2024, 2, 1)).unwrap();
        let err = BillingSchedule::new(BillingScheduleId::new(), "Bad", vec![a, b]).unwrap_err();
        assert!(matches!(err, CatalogError::OverlappingPeriods { .. }));
    }

    #[test]
    fn test_ratio_outside_period_rejected() {
        let period = BillingSchedulePeriod::new("A", date(2024, 1, 1), date(2024, 1, 31), date(2024, 1, 1)).unwrap();
        let ratio = BillingRatio::new(date(2024, 1, 20), date(2024, 2, 5), 1, 2).unwrap();
        assert!(matches!(
            period.with_ratio(ratio),
            Err(CatalogError::RatioOutsidePeriod { .. })
        ));
    }

    #[test]
    fn test_zero_denominator_rejected() {
        assert!(BillingRatio::new(date(2024, 1, 1), date(2024, 1, 2), 0, 0).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn schedule_of(lengths: &[i64]) -> BillingSchedule {
        let mut start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut periods = Vec::new();
        for (i, len) in lengths.iter().enumerate() {
            let end = start + Duration::days(*len - 1);
            let period = BillingSchedulePeriod::new(format!("P{i}"), start, end, start)
                .unwrap()
                .with_ratio(BillingRatio::new(start, end, 1, 2).unwrap())
                .unwrap();
            periods.push(period);
            start = end + Duration::days(1);
        }
        BillingSchedule::new(BillingScheduleId::new(), "Generated", periods).unwrap()
    }

    proptest! {
        #[test]
        fn resolved_periods_are_chronological(
            lengths in prop::collection::vec(1i64..60, 1..12),
            offset in 0i64..400,
        ) {
            let schedule = schedule_of(&lengths);
            let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset);

            if let Ok(resolved) = schedule.resolve_periods(start) {
                for pair in resolved.windows(2) {
                    prop_assert!(pair[0].period.end_date < pair[1].period.start_date);
                }
                for r in &resolved {
                    prop_assert!(r.ratio.denominator() > 0);
                }
                prop_assert_eq!(schedule.resolve_periods(start).unwrap(), resolved);
            }
        }
    }
}
