use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::round2;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BatchAdjustmentType {
    Percentage,
    FixedAmount,
    GradeBased,
    PositionBased,
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Draft,
    Approved,
    Implemented,
}

impl BatchStatus {
    pub fn can_transition_to(self, target: BatchStatus) -> bool {
        matches!(
            (self, target),
            (BatchStatus::Draft, BatchStatus::Approved)
                | (BatchStatus::Approved, BatchStatus::Implemented)
        )
    }
}

/// Target dimensions of a batch workflow. An employee matching ANY dimension
/// is included (union, not intersection).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TargetSet {
    pub grade_ids: Vec<u64>,
    pub department_ids: Vec<u64>,
    pub position_ids: Vec<u64>,
}

impl TargetSet {
    pub fn is_empty(&self) -> bool {
        self.grade_ids.is_empty() && self.department_ids.is_empty() && self.position_ids.is_empty()
    }
}

/// The one adjustment function shared by grade revisions and batch
/// workflows. `step_base` is the base rate of the employee's mapped step,
/// needed only by the grade-based strategy.
pub fn proposed_salary(
    current: Decimal,
    adjustment_type: BatchAdjustmentType,
    value: Decimal,
    step_base: Option<Decimal>,
) -> Decimal {
    let raw = match adjustment_type {
        BatchAdjustmentType::Percentage | BatchAdjustmentType::PositionBased => {
            current * (Decimal::ONE + value / Decimal::ONE_HUNDRED)
        }
        BatchAdjustmentType::FixedAmount => current + value,
        // Raise to the step's base rate; never reduce anyone.
        BatchAdjustmentType::GradeBased => match step_base {
            Some(base) if base > current => base,
            _ => current,
        },
    };
    round2(raw)
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct PayAdjustmentWorkflow {
    pub id: u64,
    pub name: String,

    #[schema(example = "percentage")]
    pub adjustment_type: String,
    pub adjustment_value: Decimal,

    /// JSON arrays of ids; decode with [`PayAdjustmentWorkflow::targets`].
    #[serde(skip_serializing)]
    pub target_grade_ids: String,
    #[serde(skip_serializing)]
    pub target_department_ids: String,
    #[serde(skip_serializing)]
    pub target_position_ids: String,

    #[schema(example = "draft")]
    pub status: String,

    /// Point-in-time estimate; stale once source data moves. Re-invoke
    /// impact calculation to refresh before approval.
    pub total_impact: Option<Decimal>,
    pub affected_count: Option<i32>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub impact_computed_at: Option<DateTime<Utc>>,

    #[schema(value_type = String, format = "date")]
    pub effective_date: NaiveDate,
    pub created_by: u64,
    pub approved_by: Option<u64>,
    pub implemented_by: Option<u64>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

impl PayAdjustmentWorkflow {
    pub fn targets(&self) -> Result<TargetSet, AppError> {
        let decode = |raw: &str, field: &str| -> Result<Vec<u64>, AppError> {
            serde_json::from_str(raw).map_err(|e| {
                AppError::Transaction(format!("failed to decode workflow {field}: {e}"))
            })
        };
        Ok(TargetSet {
            grade_ids: decode(&self.target_grade_ids, "target_grade_ids")?,
            department_ids: decode(&self.target_department_ids, "target_department_ids")?,
            position_ids: decode(&self.target_position_ids, "target_position_ids")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct PayAdjustmentDetail {
    pub id: u64,
    pub workflow_id: u64,
    pub employee_id: u64,
    pub old_salary: Decimal,
    pub new_salary: Decimal,
    pub delta: Decimal,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_percentage_uplift_rounds_to_cents() {
        let new = proposed_salary(dec("30000"), BatchAdjustmentType::Percentage, dec("5"), None);
        assert_eq!(new, dec("31500.00"));

        let new = proposed_salary(
            dec("28333.33"),
            BatchAdjustmentType::Percentage,
            dec("3.75"),
            None,
        );
        // 28333.33 * 1.0375 = 29395.829875 -> 29395.83
        assert_eq!(new, dec("29395.83"));
    }

    #[test]
    fn test_fixed_amount() {
        let new = proposed_salary(
            dec("30000"),
            BatchAdjustmentType::FixedAmount,
            dec("1250.50"),
            None,
        );
        assert_eq!(new, dec("31250.50"));
    }

    #[test]
    fn test_grade_based_raises_to_step_base() {
        let new = proposed_salary(
            dec("28000"),
            BatchAdjustmentType::GradeBased,
            Decimal::ZERO,
            Some(dec("30000")),
        );
        assert_eq!(new, dec("30000.00"));
    }

    #[test]
    fn test_grade_based_never_reduces() {
        let new = proposed_salary(
            dec("32000"),
            BatchAdjustmentType::GradeBased,
            Decimal::ZERO,
            Some(dec("30000")),
        );
        assert_eq!(new, dec("32000.00"));

        // no mapped step: unchanged
        let new = proposed_salary(dec("32000"), BatchAdjustmentType::GradeBased, Decimal::ZERO, None);
        assert_eq!(new, dec("32000.00"));
    }

    #[test]
    fn test_position_based_behaves_as_percentage() {
        let new = proposed_salary(
            dec("40000"),
            BatchAdjustmentType::PositionBased,
            dec("2.5"),
            None,
        );
        assert_eq!(new, dec("41000.00"));
    }

    #[test]
    fn test_batch_status_chain() {
        assert!(BatchStatus::Draft.can_transition_to(BatchStatus::Approved));
        assert!(BatchStatus::Approved.can_transition_to(BatchStatus::Implemented));
        assert!(!BatchStatus::Draft.can_transition_to(BatchStatus::Implemented));
        assert!(!BatchStatus::Implemented.can_transition_to(BatchStatus::Draft));
    }

    #[test]
    fn test_target_set_emptiness() {
        assert!(TargetSet::default().is_empty());
        let targets = TargetSet {
            grade_ids: vec![1],
            ..TargetSet::default()
        };
        assert!(!targets.is_empty());
    }
}
