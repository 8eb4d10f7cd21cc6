use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::error::AppError;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GradeStatus {
    Draft,
    Active,
    Superseded,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct SalaryGrade {
    pub id: u64,
    #[schema(example = "NUR-02")]
    pub code: String,
    pub name: String,
    pub department_id: Option<u64>,
    pub branch_id: Option<u64>,

    pub min_rate: Decimal,
    pub mid_rate: Decimal,
    pub max_rate: Decimal,

    #[schema(example = "active")]
    pub status: String,
    #[schema(value_type = String, format = "date")]
    pub effective_date: NaiveDate,
    #[schema(value_type = Option<String>, format = "date")]
    pub end_date: Option<NaiveDate>,

    pub created_by: u64,
    pub approved_by: Option<u64>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct SalaryStep {
    pub id: u64,
    pub grade_id: u64,
    pub step_number: i32,
    pub min_rate: Decimal,
    pub base_rate: Decimal,
    pub max_rate: Decimal,
}

/// A band only makes sense ordered; holds for grades and steps alike.
pub fn validate_band(min: Decimal, mid: Decimal, max: Decimal) -> Result<(), AppError> {
    if min > mid || mid > max {
        return Err(AppError::Validation(format!(
            "band values must satisfy min <= mid <= max, got {min} / {mid} / {max}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_ordered_band_is_valid() {
        assert!(validate_band(dec("100"), dec("150"), dec("200")).is_ok());
    }

    #[test]
    fn test_degenerate_band_is_valid() {
        // min == mid == max is a legal single-point band
        assert!(validate_band(dec("100"), dec("100"), dec("100")).is_ok());
    }

    #[test]
    fn test_unordered_band_is_rejected() {
        assert!(validate_band(dec("200"), dec("150"), dec("300")).is_err());
        assert!(validate_band(dec("100"), dec("250"), dec("200")).is_err());
    }
}
