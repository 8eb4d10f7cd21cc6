//! Grade revision workflow.
//!
//! Implementation is the most cascading operation in the system: one
//! transaction updates the grade (or uplifts its steps), inserts one
//! pending-review salary adjustment per currently-mapped employee, and marks
//! the revision implemented. Nothing commits unless all of it does.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::actor::Actor;
use crate::audit;
use crate::error::AppError;
use crate::model::grade_revision::{GradeRevision, RevisionChange, RevisionStatus};
use crate::model::parse_status;
use crate::model::round2;

pub struct NewRevision {
    pub grade_id: u64,
    pub new_min_rate: Option<Decimal>,
    pub new_mid_rate: Option<Decimal>,
    pub new_max_rate: Option<Decimal>,
    pub percent: Option<Decimal>,
    pub reason: String,
    pub effective_date: NaiveDate,
}

pub async fn create_revision(
    pool: &MySqlPool,
    actor: &Actor,
    req: NewRevision,
) -> Result<u64, AppError> {
    // fails fast on neither/both/partial band input
    RevisionChange::from_fields(
        req.new_min_rate,
        req.new_mid_rate,
        req.new_max_rate,
        req.percent,
    )?;

    let band = sqlx::query_as::<_, (Decimal, Decimal, Decimal)>(
        r#"SELECT min_rate, mid_rate, max_rate FROM salary_grades WHERE id = ?"#,
    )
    .bind(req.grade_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("salary grade", req.grade_id))?;

    let result = sqlx::query(
        r#"
        INSERT INTO grade_revisions
            (grade_id, prev_min_rate, prev_mid_rate, prev_max_rate,
             new_min_rate, new_mid_rate, new_max_rate, percent, reason,
             status, effective_date, created_by)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'draft', ?, ?)
        "#,
    )
    .bind(req.grade_id)
    .bind(band.0)
    .bind(band.1)
    .bind(band.2)
    .bind(req.new_min_rate)
    .bind(req.new_mid_rate)
    .bind(req.new_max_rate)
    .bind(req.percent)
    .bind(&req.reason)
    .bind(req.effective_date)
    .bind(actor.id)
    .execute(pool)
    .await?;

    let id = result.last_insert_id();
    audit::record(
        pool,
        None,
        None,
        "grade_revision_created",
        actor,
        serde_json::json!({ "revision_id": id, "grade_id": req.grade_id }),
    )
    .await;

    Ok(id)
}

/// Review transitions (submit / approve / reject). Implementation goes
/// through [`implement_revision`] only.
pub async fn set_status(
    pool: &MySqlPool,
    actor: &Actor,
    revision_id: u64,
    target: RevisionStatus,
) -> Result<(), AppError> {
    if target == RevisionStatus::Implemented {
        return Err(AppError::Validation(
            "use the implement operation to implement a revision".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let (status_raw,) = sqlx::query_as::<_, (String,)>(
        r#"SELECT status FROM grade_revisions WHERE id = ? FOR UPDATE"#,
    )
    .bind(revision_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("grade revision", revision_id))?;

    let current: RevisionStatus = parse_status("grade revision", &status_raw)?;
    if !current.can_transition_to(target) {
        return Err(AppError::invalid_state(
            "grade revision",
            revision_id,
            status_raw,
            format!("cannot move to '{target}'"),
        ));
    }

    let actor_column = match target {
        RevisionStatus::PendingReview => "reviewed_by",
        RevisionStatus::Approved => "approved_by",
        RevisionStatus::Rejected => "rejected_by",
        RevisionStatus::Draft | RevisionStatus::Implemented => unreachable!(),
    };

    let sql = format!(
        "UPDATE grade_revisions SET status = ?, {actor_column} = ? WHERE id = ?"
    );
    sqlx::query(&sql)
        .bind(target.to_string())
        .bind(actor.id)
        .bind(revision_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    audit::record(
        pool,
        None,
        None,
        "grade_revision_status_changed",
        actor,
        serde_json::json!({
            "revision_id": revision_id,
            "from": current.to_string(),
            "to": target.to_string(),
        }),
    )
    .await;

    Ok(())
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImplementOutcome {
    pub revision_id: u64,
    pub grade_id: u64,
    /// Pending-review salary adjustments generated for mapped employees.
    pub adjustments_created: u32,
}

pub async fn implement_revision(
    pool: &MySqlPool,
    actor: &Actor,
    revision_id: u64,
) -> Result<ImplementOutcome, AppError> {
    let mut tx = pool.begin().await?;

    let revision = sqlx::query_as::<_, GradeRevision>(
        r#"
        SELECT id, grade_id, prev_min_rate, prev_mid_rate, prev_max_rate,
               new_min_rate, new_mid_rate, new_max_rate, percent, reason,
               status, effective_date, created_by, reviewed_by, approved_by,
               implemented_by, rejected_by, created_at
        FROM grade_revisions
        WHERE id = ?
        FOR UPDATE
        "#,
    )
    .bind(revision_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("grade revision", revision_id))?;

    let current: RevisionStatus = parse_status("grade revision", &revision.status)?;
    if !current.can_transition_to(RevisionStatus::Implemented) {
        return Err(AppError::invalid_state(
            "grade revision",
            revision_id,
            revision.status,
            "only an approved revision can be implemented",
        ));
    }

    let change = revision.change()?;

    // Strategy one: replace the grade band outright.
    // Strategy two: uplift every step's base rate by the percentage.
    match &change {
        RevisionChange::Band { min, mid, max } => {
            sqlx::query(
                r#"UPDATE salary_grades SET min_rate = ?, mid_rate = ?, max_rate = ? WHERE id = ?"#,
            )
            .bind(min)
            .bind(mid)
            .bind(max)
            .bind(revision.grade_id)
            .execute(&mut *tx)
            .await?;
        }
        RevisionChange::Percent(pct) => {
            let steps = sqlx::query_as::<_, (u64, Decimal)>(
                r#"SELECT id, base_rate FROM salary_steps WHERE grade_id = ?"#,
            )
            .bind(revision.grade_id)
            .fetch_all(&mut *tx)
            .await?;

            for (step_id, base_rate) in steps {
                let uplifted =
                    round2(base_rate * (Decimal::ONE + pct / Decimal::ONE_HUNDRED));
                sqlx::query(r#"UPDATE salary_steps SET base_rate = ? WHERE id = ?"#)
                    .bind(uplifted)
                    .bind(step_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }
    }

    // Cascade: one pending-review adjustment per currently-mapped employee.
    let mappings = sqlx::query_as::<_, (u64, u64, Decimal)>(
        r#"
        SELECT employee_id, step_id, current_salary
        FROM employee_grade_mappings
        WHERE grade_id = ?
          AND (end_date IS NULL OR end_date >= CURDATE())
        "#,
    )
    .bind(revision.grade_id)
    .fetch_all(&mut *tx)
    .await?;

    let mut adjustments_created: u32 = 0;
    for (employee_id, step_id, current_salary) in mappings {
        let (new_salary, is_correction) = match &change {
            RevisionChange::Percent(pct) => (
                round2(current_salary * (Decimal::ONE + pct / Decimal::ONE_HUNDRED)),
                false,
            ),
            // Band-only revisions leave the salary for human follow-up; the
            // equal-salary draft is intentional, so it carries the
            // correction flag.
            RevisionChange::Band { .. } => (current_salary, true),
        };

        sqlx::query(
            r#"
            INSERT INTO salary_adjustments
                (employee_id, grade_id, step_id, old_salary, new_salary,
                 reason, justification, is_correction, status, effective_date,
                 revision_id, initiated_by)
            VALUES (?, ?, ?, ?, ?, 'grade_revision', ?, ?, 'pending_review', ?, ?, ?)
            "#,
        )
        .bind(employee_id)
        .bind(revision.grade_id)
        .bind(step_id)
        .bind(current_salary)
        .bind(new_salary)
        .bind(format!(
            "Generated by grade revision #{} ({})",
            revision.id, revision.reason
        ))
        .bind(is_correction)
        .bind(revision.effective_date)
        .bind(revision.id)
        .bind(actor.id)
        .execute(&mut *tx)
        .await?;

        adjustments_created += 1;
    }

    let updated = sqlx::query(
        r#"
        UPDATE grade_revisions
        SET status = 'implemented', implemented_by = ?
        WHERE id = ? AND status = 'approved'
        "#,
    )
    .bind(actor.id)
    .bind(revision_id)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(AppError::Transaction(format!(
            "grade revision {revision_id} changed concurrently"
        )));
    }

    tx.commit().await?;

    tracing::info!(
        revision_id,
        grade_id = revision.grade_id,
        adjustments_created,
        "grade revision implemented"
    );

    audit::record(
        pool,
        None,
        None,
        "grade_revision_implemented",
        actor,
        serde_json::json!({
            "revision_id": revision_id,
            "grade_id": revision.grade_id,
            "adjustments_created": adjustments_created,
        }),
    )
    .await;

    Ok(ImplementOutcome {
        revision_id,
        grade_id: revision.grade_id,
        adjustments_created,
    })
}
