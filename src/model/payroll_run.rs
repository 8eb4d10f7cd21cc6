use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Payroll run lifecycle. Strictly monotonic: a run only ever moves forward
/// through draft, processing, completed, approved, locked.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Draft,
    Processing,
    Completed,
    Approved,
    Locked,
}

impl RunStatus {
    /// The only legal successor of each state. No back-edges.
    pub fn next(self) -> Option<RunStatus> {
        match self {
            RunStatus::Draft => Some(RunStatus::Processing),
            RunStatus::Processing => Some(RunStatus::Completed),
            RunStatus::Completed => Some(RunStatus::Approved),
            RunStatus::Approved => Some(RunStatus::Locked),
            RunStatus::Locked => None,
        }
    }

    pub fn can_advance_to(self, target: RunStatus) -> bool {
        self.next() == Some(target)
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct PayrollRun {
    pub id: u64,
    pub branch_id: u64,

    #[schema(value_type = String, format = "date")]
    pub period_start: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub period_end: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub pay_date: NaiveDate,

    #[schema(example = "draft")]
    pub status: String,

    pub total_gross: Decimal,
    pub total_deductions: Decimal,
    pub total_net: Decimal,
    pub employee_count: i32,

    pub created_by: u64,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub processed_at: Option<DateTime<Utc>>,
    pub approved_by: Option<u64>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub approved_at: Option<DateTime<Utc>>,
    pub locked_by: Option<u64>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub locked_at: Option<DateTime<Utc>>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_chain_is_monotonic() {
        assert!(RunStatus::Draft.can_advance_to(RunStatus::Processing));
        assert!(RunStatus::Processing.can_advance_to(RunStatus::Completed));
        assert!(RunStatus::Completed.can_advance_to(RunStatus::Approved));
        assert!(RunStatus::Approved.can_advance_to(RunStatus::Locked));
    }

    #[test]
    fn test_no_back_edges_or_skips() {
        assert!(!RunStatus::Processing.can_advance_to(RunStatus::Draft));
        assert!(!RunStatus::Draft.can_advance_to(RunStatus::Completed));
        assert!(!RunStatus::Locked.can_advance_to(RunStatus::Draft));
        assert_eq!(RunStatus::Locked.next(), None);
    }

    #[test]
    fn test_status_text_round_trip() {
        assert_eq!(RunStatus::Processing.to_string(), "processing");
        assert_eq!("locked".parse::<RunStatus>().unwrap(), RunStatus::Locked);
    }
}
