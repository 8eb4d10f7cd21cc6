//! Working-day arithmetic for pay periods.

use chrono::{Datelike, NaiveDate, Weekday};

/// Assumed working days in a full month for monthly pro-ration.
pub const MONTHLY_WORKING_DAYS: u32 = 22;

/// Inclusive count of Mon-Fri days between `start` and `end`.
pub fn weekday_count(start: NaiveDate, end: NaiveDate) -> u32 {
    if start > end {
        return 0;
    }
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .count() as u32
}

/// Days counted toward monthly pro-ration: a period spanning at least a full
/// working month pays the whole monthly salary, never more.
pub fn prorated_working_days(start: NaiveDate, end: NaiveDate) -> u32 {
    weekday_count(start, end).min(MONTHLY_WORKING_DAYS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_single_week() {
        // 2025-07-07 is a Monday
        assert_eq!(weekday_count(date(2025, 7, 7), date(2025, 7, 11)), 5);
        assert_eq!(weekday_count(date(2025, 7, 7), date(2025, 7, 13)), 5);
    }

    #[test]
    fn test_weekend_only_period() {
        // Saturday and Sunday
        assert_eq!(weekday_count(date(2025, 7, 12), date(2025, 7, 13)), 0);
    }

    #[test]
    fn test_single_day() {
        assert_eq!(weekday_count(date(2025, 7, 9), date(2025, 7, 9)), 1);
        assert_eq!(weekday_count(date(2025, 7, 12), date(2025, 7, 12)), 0);
    }

    #[test]
    fn test_inverted_range_is_empty() {
        assert_eq!(weekday_count(date(2025, 7, 10), date(2025, 7, 9)), 0);
    }

    #[test]
    fn test_full_month_caps_at_monthly_working_days() {
        // July 2025 has 23 weekdays
        assert_eq!(weekday_count(date(2025, 7, 1), date(2025, 7, 31)), 23);
        assert_eq!(
            prorated_working_days(date(2025, 7, 1), date(2025, 7, 31)),
            MONTHLY_WORKING_DAYS
        );
    }

    #[test]
    fn test_partial_month_not_capped() {
        // First half of July 2025: 1st..15th has 11 weekdays
        assert_eq!(prorated_working_days(date(2025, 7, 1), date(2025, 7, 15)), 11);
    }
}
