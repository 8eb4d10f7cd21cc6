use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

/// Current trace layout version. Bump when the trace shape changes so old
/// blobs stay decodable by version-aware readers.
pub const TRACE_SCHEMA_VERSION: u32 = 1;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PayslipStatus {
    Active,
    Voided,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Payslip {
    pub id: u64,
    pub run_id: u64,
    pub employee_id: u64,
    pub branch_id: u64,

    #[schema(value_type = String, format = "date")]
    pub period_start: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub period_end: NaiveDate,

    pub basic_pay: Decimal,
    pub overtime_pay: Decimal,
    pub night_diff_pay: Decimal,
    pub allowances: Decimal,
    pub bonuses: Decimal,
    pub gross_pay: Decimal,

    pub social_insurance: Decimal,
    pub health_insurance: Decimal,
    pub housing_fund: Decimal,
    pub withholding_tax: Decimal,
    pub other_deductions: Decimal,
    pub total_deductions: Decimal,
    pub net_pay: Decimal,

    #[schema(example = "active")]
    pub status: String,

    /// Encoded [`ComputationTrace`]; decode with [`ComputationTrace::decode`].
    #[serde(skip_serializing)]
    pub detail: String,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

/// Everything that went into one payslip computation, kept alongside the
/// payslip so a figure can be reproduced long after rates or salaries moved.
/// Stored as a JSON column; encoded and decoded only at this boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputationTrace {
    pub schema_version: u32,
    pub trace_id: Uuid,

    pub pay_frequency: String,
    pub base_salary: Decimal,
    pub working_days: u32,
    pub hourly_rate: Decimal,

    pub regular_hours: Decimal,
    pub overtime_hours: Decimal,
    pub night_hours: Decimal,

    pub overtime_multiplier: Decimal,
    pub social_insurance_rate: Decimal,
    pub health_insurance_rate: Decimal,
    pub housing_fund_rate: Decimal,
    pub tax_table_version: String,
    pub taxable_income: Decimal,
}

impl ComputationTrace {
    pub fn encode(&self) -> Result<String, AppError> {
        serde_json::to_string(self)
            .map_err(|e| AppError::Transaction(format!("failed to encode computation trace: {e}")))
    }

    pub fn decode(raw: &str) -> Result<Self, AppError> {
        serde_json::from_str(raw)
            .map_err(|e| AppError::Transaction(format!("failed to decode computation trace: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn sample_trace() -> ComputationTrace {
        ComputationTrace {
            schema_version: TRACE_SCHEMA_VERSION,
            trace_id: Uuid::nil(),
            pay_frequency: "monthly".to_string(),
            base_salary: dec("30000"),
            working_days: 22,
            hourly_rate: dec("170.45"),
            regular_hours: dec("0"),
            overtime_hours: dec("0"),
            night_hours: dec("0"),
            overtime_multiplier: dec("1.25"),
            social_insurance_rate: dec("0.045"),
            health_insurance_rate: dec("0.02"),
            housing_fund_rate: dec("0.01"),
            tax_table_version: "train-2023".to_string(),
            taxable_income: dec("27750"),
        }
    }

    #[test]
    fn test_trace_round_trips_through_json() {
        let trace = sample_trace();
        let encoded = trace.encode().unwrap();
        let decoded = ComputationTrace::decode(&encoded).unwrap();
        assert_eq!(decoded, trace);
    }

    #[test]
    fn test_trace_carries_schema_version() {
        let encoded = sample_trace().encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value["schema_version"], TRACE_SCHEMA_VERSION);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(ComputationTrace::decode("not json").is_err());
    }
}
