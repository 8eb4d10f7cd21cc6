use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Where an employee's salary sits relative to their grade band.
/// `PendingReview` is the only value not derivable from the numbers; a
/// mapping carries it until approval re-validates the band position.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BandStatus {
    WithinBand,
    BelowBand,
    AboveBand,
    PendingReview,
}

/// Pure band position: below when under the floor, above when over the
/// ceiling, within otherwise. Total over every (salary, min, max) including
/// min == max.
pub fn calculate_salary_status(salary: Decimal, min: Decimal, max: Decimal) -> BandStatus {
    if salary < min {
        BandStatus::BelowBand
    } else if salary > max {
        BandStatus::AboveBand
    } else {
        BandStatus::WithinBand
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct EmployeeGradeMapping {
    pub id: u64,
    pub employee_id: u64,
    pub grade_id: u64,
    pub step_id: u64,

    pub current_salary: Decimal,
    /// Band snapshot taken from the step at assignment time.
    pub band_min: Decimal,
    pub band_max: Decimal,

    #[schema(example = "within_band")]
    pub status: String,

    #[schema(value_type = String, format = "date")]
    pub effective_date: NaiveDate,
    #[schema(value_type = Option<String>, format = "date")]
    pub end_date: Option<NaiveDate>,

    pub approved_by: Option<u64>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

impl EmployeeGradeMapping {
    /// A mapping is current while its end date is unset or still ahead.
    pub fn is_current_on(&self, date: NaiveDate) -> bool {
        self.effective_date <= date && self.end_date.map_or(true, |end| end >= date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_below_band() {
        assert_eq!(
            calculate_salary_status(dec("900"), dec("1000"), dec("2000")),
            BandStatus::BelowBand
        );
    }

    #[test]
    fn test_above_band() {
        assert_eq!(
            calculate_salary_status(dec("2000.01"), dec("1000"), dec("2000")),
            BandStatus::AboveBand
        );
    }

    #[test]
    fn test_within_band_inclusive_bounds() {
        assert_eq!(
            calculate_salary_status(dec("1000"), dec("1000"), dec("2000")),
            BandStatus::WithinBand
        );
        assert_eq!(
            calculate_salary_status(dec("2000"), dec("1000"), dec("2000")),
            BandStatus::WithinBand
        );
    }

    #[test]
    fn test_point_band_min_equals_max() {
        assert_eq!(
            calculate_salary_status(dec("1500"), dec("1500"), dec("1500")),
            BandStatus::WithinBand
        );
        assert_eq!(
            calculate_salary_status(dec("1499.99"), dec("1500"), dec("1500")),
            BandStatus::BelowBand
        );
        assert_eq!(
            calculate_salary_status(dec("1500.01"), dec("1500"), dec("1500")),
            BandStatus::AboveBand
        );
    }

    #[test]
    fn test_is_current_on_day_granularity() {
        let mapping = EmployeeGradeMapping {
            id: 1,
            employee_id: 10,
            grade_id: 2,
            step_id: 3,
            current_salary: dec("30000"),
            band_min: dec("25000"),
            band_max: dec("35000"),
            status: "within_band".to_string(),
            effective_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end_date: Some(NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()),
            approved_by: Some(7),
            created_at: DateTime::<Utc>::MIN_UTC,
        };

        assert!(mapping.is_current_on(NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()));
        assert!(!mapping.is_current_on(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()));
        assert!(!mapping.is_current_on(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()));
    }
}
