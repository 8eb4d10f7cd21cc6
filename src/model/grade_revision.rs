use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::grade::validate_band;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RevisionStatus {
    Draft,
    PendingReview,
    Approved,
    Implemented,
    Rejected,
}

impl RevisionStatus {
    /// One-directional review chain; `Rejected` reachable from any
    /// pre-implemented state. `Implemented` and `Rejected` are terminal.
    pub fn can_transition_to(self, target: RevisionStatus) -> bool {
        use RevisionStatus::*;
        match (self, target) {
            (Draft, PendingReview) => true,
            (PendingReview, Approved) => true,
            (Approved, Implemented) => true,
            (Draft | PendingReview | Approved, Rejected) => true,
            _ => false,
        }
    }
}

/// What a revision actually changes. Exactly one strategy per revision:
/// explicit replacement bands, or a uniform percentage uplift of every
/// step's base rate.
#[derive(Debug, Clone, PartialEq)]
pub enum RevisionChange {
    Band {
        min: Decimal,
        mid: Decimal,
        max: Decimal,
    },
    Percent(Decimal),
}

impl RevisionChange {
    pub fn from_fields(
        new_min: Option<Decimal>,
        new_mid: Option<Decimal>,
        new_max: Option<Decimal>,
        percent: Option<Decimal>,
    ) -> Result<Self, AppError> {
        let band = match (new_min, new_mid, new_max) {
            (Some(min), Some(mid), Some(max)) => Some((min, mid, max)),
            (None, None, None) => None,
            _ => {
                return Err(AppError::Validation(
                    "band revision requires all of min, mid and max".to_string(),
                ));
            }
        };

        match (band, percent) {
            (Some((min, mid, max)), None) => {
                validate_band(min, mid, max)?;
                Ok(RevisionChange::Band { min, mid, max })
            }
            (None, Some(pct)) => {
                if pct <= Decimal::from(-100) {
                    return Err(AppError::Validation(
                        "percentage uplift cannot be -100% or lower".to_string(),
                    ));
                }
                Ok(RevisionChange::Percent(pct))
            }
            (Some(_), Some(_)) => Err(AppError::Validation(
                "supply either band values or a percentage, not both".to_string(),
            )),
            (None, None) => Err(AppError::Validation(
                "supply either band values or a percentage".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct GradeRevision {
    pub id: u64,
    pub grade_id: u64,

    pub prev_min_rate: Decimal,
    pub prev_mid_rate: Decimal,
    pub prev_max_rate: Decimal,

    pub new_min_rate: Option<Decimal>,
    pub new_mid_rate: Option<Decimal>,
    pub new_max_rate: Option<Decimal>,
    pub percent: Option<Decimal>,

    pub reason: String,
    #[schema(example = "pending_review")]
    pub status: String,
    #[schema(value_type = String, format = "date")]
    pub effective_date: NaiveDate,

    pub created_by: u64,
    pub reviewed_by: Option<u64>,
    pub approved_by: Option<u64>,
    pub implemented_by: Option<u64>,
    pub rejected_by: Option<u64>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

impl GradeRevision {
    pub fn change(&self) -> Result<RevisionChange, AppError> {
        RevisionChange::from_fields(
            self.new_min_rate,
            self.new_mid_rate,
            self.new_max_rate,
            self.percent,
        )
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
    fn test_review_chain_forward_only() {
        use RevisionStatus::*;
        assert!(Draft.can_transition_to(PendingReview));
        assert!(PendingReview.can_transition_to(Approved));
        assert!(Approved.can_transition_to(Implemented));

        assert!(!PendingReview.can_transition_to(Draft));
        assert!(!Draft.can_transition_to(Approved));
        assert!(!Draft.can_transition_to(Implemented));
    }

    #[test]
    fn test_rejected_reachable_until_implemented() {
        use RevisionStatus::*;
        assert!(Draft.can_transition_to(Rejected));
        assert!(PendingReview.can_transition_to(Rejected));
        assert!(Approved.can_transition_to(Rejected));
        assert!(!Implemented.can_transition_to(Rejected));
    }

    #[test]
    fn test_terminal_states() {
        use RevisionStatus::*;
        for target in [Draft, PendingReview, Approved, Implemented, Rejected] {
            assert!(!Implemented.can_transition_to(target));
            assert!(!Rejected.can_transition_to(target));
        }
    }

    #[test]
    fn test_change_band_strategy() {
        let change = RevisionChange::from_fields(
            Some(dec("1000")),
            Some(dec("1500")),
            Some(dec("2000")),
            None,
        )
        .unwrap();
        assert_eq!(
            change,
            RevisionChange::Band {
                min: dec("1000"),
                mid: dec("1500"),
                max: dec("2000"),
            }
        );
    }

    #[test]
    fn test_change_percent_strategy() {
        let change = RevisionChange::from_fields(None, None, None, Some(dec("5"))).unwrap();
        assert_eq!(change, RevisionChange::Percent(dec("5")));
    }

    #[test]
    fn test_change_rejects_both_and_neither() {
        assert!(
            RevisionChange::from_fields(
                Some(dec("1")),
                Some(dec("2")),
                Some(dec("3")),
                Some(dec("5"))
            )
            .is_err()
        );
        assert!(RevisionChange::from_fields(None, None, None, None).is_err());
    }

    #[test]
    fn test_change_rejects_partial_band() {
        assert!(RevisionChange::from_fields(Some(dec("1")), None, Some(dec("3")), None).is_err());
    }

    #[test]
    fn test_change_rejects_unordered_band() {
        assert!(
            RevisionChange::from_fields(
                Some(dec("2000")),
                Some(dec("1500")),
                Some(dec("1000")),
                None
            )
            .is_err()
        );
    }
}
