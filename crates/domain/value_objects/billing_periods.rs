use chrono::{Datelike, NaiveDate};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("period end {end} is before period start {start}")]
pub struct InvalidRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Query period truncated to whole calendar months.
///
/// Both bounds are stored as the first day of their month. Billing counts
/// every month the overlap window touches, inclusively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingPeriod {
    start: NaiveDate,
    end: NaiveDate,
}

impl BillingPeriod {
    /// Fails when `end` is before `start`. The check uses the dates as given,
    /// before truncation.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, InvalidRange> {
        if end < start {
            return Err(InvalidRange { start, end });
        }

        Ok(Self {
            start: first_of_month(start),
            end: first_of_month(end),
        })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn start_month_index(&self) -> i32 {
        month_index(self.start)
    }

    pub fn end_month_index(&self) -> i32 {
        month_index(self.end)
    }

    /// Same condition the store applies before summing.
    pub fn is_candidate(&self, start_date: NaiveDate, end_date: Option<NaiveDate>) -> bool {
        start_date <= self.end && end_date.is_none_or(|end_date| end_date >= self.start)
    }

    /// Months billed for a subscription active from `start_date` to
    /// `end_date` (open-ended when `None`). Zero for non-candidates.
    pub fn overlap_months(&self, start_date: NaiveDate, end_date: Option<NaiveDate>) -> i64 {
        if !self.is_candidate(start_date, end_date) {
            return 0;
        }

        let window_start = start_date.max(self.start);
        let window_end = end_date.unwrap_or(self.end).min(self.end);

        let months = i64::from(month_index(window_end)) - i64::from(month_index(window_start)) + 1;
        months.max(0)
    }

    pub fn cost(&self, price: i32, start_date: NaiveDate, end_date: Option<NaiveDate>) -> i64 {
        i64::from(price) * self.overlap_months(start_date, end_date)
    }
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Months since year zero. Differences between indexes give whole-month
/// distances regardless of the day of month.
pub fn month_index(date: NaiveDate) -> i32 {
    date.year() * 12 + date.month0() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn period(start: NaiveDate, end: NaiveDate) -> BillingPeriod {
        BillingPeriod::new(start, end).unwrap()
    }

    #[test]
    fn bounds_are_truncated_to_first_of_month() {
        let period = period(date(2025, 1, 31), date(2025, 3, 15));

        assert_eq!(period.start(), date(2025, 1, 1));
        assert_eq!(period.end(), date(2025, 3, 1));
    }

    #[test]
    fn end_before_start_is_invalid_range() {
        let err = BillingPeriod::new(date(2025, 6, 1), date(2025, 5, 31)).unwrap_err();

        assert_eq!(
            err,
            InvalidRange {
                start: date(2025, 6, 1),
                end: date(2025, 5, 31),
            }
        );
    }

    #[test]
    fn end_before_start_within_same_month_is_still_invalid() {
        assert!(BillingPeriod::new(date(2025, 6, 20), date(2025, 6, 10)).is_err());
    }

    #[test]
    fn single_day_period_is_valid() {
        let period = period(date(2025, 6, 10), date(2025, 6, 10));
        assert_eq!(period.start(), period.end());
    }

    #[test]
    fn short_subscription_inside_period_bills_one_month() {
        let period = period(date(2025, 1, 1), date(2025, 12, 1));

        assert_eq!(
            period.cost(100, date(2025, 3, 15), Some(date(2025, 3, 20))),
            100
        );
    }

    #[test]
    fn open_ended_subscription_is_clamped_to_period_end() {
        let period = period(date(2025, 1, 1), date(2025, 3, 1));

        assert_eq!(period.cost(50, date(2025, 1, 10), None), 150);
    }

    #[test]
    fn subscription_starting_before_period_is_clamped_to_period_start() {
        let period = period(date(2025, 4, 1), date(2025, 6, 1));

        assert_eq!(period.overlap_months(date(2024, 11, 5), None), 3);
        assert_eq!(
            period.overlap_months(date(2024, 11, 5), Some(date(2025, 5, 2))),
            2
        );
    }

    #[test]
    fn period_wholly_before_start_contributes_nothing() {
        let period = period(date(2025, 1, 1), date(2025, 2, 1));

        assert!(!period.is_candidate(date(2025, 3, 1), None));
        assert_eq!(period.cost(400, date(2025, 3, 1), None), 0);
    }

    #[test]
    fn period_wholly_after_end_contributes_nothing() {
        let period = period(date(2025, 5, 1), date(2025, 8, 1));

        assert!(!period.is_candidate(date(2025, 1, 1), Some(date(2025, 4, 30))));
        assert_eq!(period.cost(400, date(2025, 1, 1), Some(date(2025, 4, 30))), 0);
    }

    #[test]
    fn end_date_inside_first_month_of_period_is_a_candidate() {
        // participation uses calendar dates, the count uses months
        let period = period(date(2025, 5, 20), date(2025, 8, 1));

        assert!(period.is_candidate(date(2025, 1, 1), Some(date(2025, 5, 3))));
        assert_eq!(period.overlap_months(date(2025, 1, 1), Some(date(2025, 5, 3))), 1);
    }

    #[test]
    fn spans_across_years_count_every_month() {
        let period = period(date(2024, 11, 1), date(2025, 2, 1));

        assert_eq!(period.overlap_months(date(2024, 1, 1), None), 4);
    }

    #[test]
    fn inverted_interval_never_bills_negative_months() {
        let period = period(date(2025, 1, 1), date(2025, 12, 1));

        assert_eq!(
            period.overlap_months(date(2025, 5, 1), Some(date(2025, 3, 1))),
            0
        );
    }

    #[test]
    fn year_long_open_subscription() {
        let period = period(date(2025, 1, 1), date(2025, 6, 1));

        assert_eq!(period.cost(400, date(2025, 1, 1), None), 2400);
    }

    #[test]
    fn month_index_orders_like_dates() {
        assert_eq!(month_index(date(2025, 1, 31)) + 1, month_index(date(2025, 2, 1)));
        assert_eq!(month_index(date(2024, 12, 1)) + 1, month_index(date(2025, 1, 1)));
    }
}
