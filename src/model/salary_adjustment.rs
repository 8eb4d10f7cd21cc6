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
pub enum AdjustmentStatus {
    Draft,
    PendingReview,
    Approved,
    Rejected,
    Implemented,
}

/// Which actor column a transition writes. Transitions are validated against
/// this table; there is no free-form status update.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ActorColumn {
    ReviewedBy,
    ApprovedBy,
    ImplementedBy,
    RejectedBy,
}

impl ActorColumn {
    pub fn name(self) -> &'static str {
        match self {
            ActorColumn::ReviewedBy => "reviewed_by",
            ActorColumn::ApprovedBy => "approved_by",
            ActorColumn::ImplementedBy => "implemented_by",
            ActorColumn::RejectedBy => "rejected_by",
        }
    }
}

impl AdjustmentStatus {
    /// Linear draft -> pending_review -> approved -> implemented chain with
    /// rejection possible from any pre-implemented state. Returns the actor
    /// column the transition records, or an error for an illegal edge.
    pub fn transition_to(self, target: AdjustmentStatus) -> Result<ActorColumn, AppError> {
        use AdjustmentStatus::*;
        match (self, target) {
            (Draft, PendingReview) => Ok(ActorColumn::ReviewedBy),
            (PendingReview, Approved) => Ok(ActorColumn::ApprovedBy),
            (Approved, Implemented) => Ok(ActorColumn::ImplementedBy),
            (Draft | PendingReview | Approved, Rejected) => Ok(ActorColumn::RejectedBy),
            (from, to) => Err(AppError::Validation(format!(
                "salary adjustment cannot move from '{from}' to '{to}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct SalaryAdjustment {
    pub id: u64,
    pub employee_id: u64,
    pub grade_id: Option<u64>,
    pub step_id: Option<u64>,

    pub old_salary: Decimal,
    pub new_salary: Decimal,

    #[schema(example = "grade_revision")]
    pub reason: String,
    pub justification: String,
    pub is_correction: bool,

    #[schema(example = "pending_review")]
    pub status: String,
    #[schema(value_type = String, format = "date")]
    pub effective_date: NaiveDate,

    pub revision_id: Option<u64>,
    pub workflow_id: Option<u64>,

    pub initiated_by: u64,
    pub reviewed_by: Option<u64>,
    pub approved_by: Option<u64>,
    pub implemented_by: Option<u64>,
    pub rejected_by: Option<u64>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

/// A new salary equal to the old one is only meaningful as an explicit
/// correction record.
pub fn validate_salary_change(
    old_salary: Decimal,
    new_salary: Decimal,
    is_correction: bool,
) -> Result<(), AppError> {
    if new_salary < Decimal::ZERO {
        return Err(AppError::Validation(
            "new salary cannot be negative".to_string(),
        ));
    }
    if new_salary == old_salary && !is_correction {
        return Err(AppError::Validation(
            "new salary equals old salary; flag the record as a correction if intended"
                .to_string(),
        ));
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
    fn test_linear_chain_records_correct_actor() {
        use AdjustmentStatus::*;
        assert_eq!(
            Draft.transition_to(PendingReview).unwrap(),
            ActorColumn::ReviewedBy
        );
        assert_eq!(
            PendingReview.transition_to(Approved).unwrap(),
            ActorColumn::ApprovedBy
        );
        assert_eq!(
            Approved.transition_to(Implemented).unwrap(),
            ActorColumn::ImplementedBy
        );
    }

    #[test]
    fn test_rejection_from_pre_implemented_states() {
        use AdjustmentStatus::*;
        for from in [Draft, PendingReview, Approved] {
            assert_eq!(
                from.transition_to(Rejected).unwrap(),
                ActorColumn::RejectedBy
            );
        }
    }

    #[test]
    fn test_illegal_edges_refused() {
        use AdjustmentStatus::*;
        assert!(Draft.transition_to(Approved).is_err());
        assert!(Draft.transition_to(Implemented).is_err());
        assert!(PendingReview.transition_to(Implemented).is_err());
        assert!(Implemented.transition_to(Rejected).is_err());
        assert!(Rejected.transition_to(PendingReview).is_err());
        assert!(Approved.transition_to(Draft).is_err());
    }

    #[test]
    fn test_salary_change_must_differ_unless_correction() {
        assert!(validate_salary_change(dec("30000"), dec("31500"), false).is_ok());
        assert!(validate_salary_change(dec("30000"), dec("30000"), false).is_err());
        assert!(validate_salary_change(dec("30000"), dec("30000"), true).is_ok());
    }

    #[test]
    fn test_negative_salary_rejected() {
        assert!(validate_salary_change(dec("30000"), dec("-1"), false).is_err());
    }
}
