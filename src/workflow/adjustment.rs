//! Salary adjustment state machine.
//!
//! One record per proposed change to one employee's salary, moving through
//! draft, pending review, approved, implemented, with rejection possible
//! until implementation. Each transition records exactly one actor in the
//! column the transition table dictates.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::MySqlPool;

use crate::actor::Actor;
use crate::audit;
use crate::error::AppError;
use crate::model::grade_mapping::calculate_salary_status;
use crate::model::parse_status;
use crate::model::salary_adjustment::{
    AdjustmentStatus, SalaryAdjustment, validate_salary_change,
};

pub struct NewAdjustment {
    pub employee_id: u64,
    pub new_salary: Decimal,
    pub reason: String,
    pub justification: String,
    pub is_correction: bool,
    pub effective_date: NaiveDate,
}

/// Manual creation: the old salary is read from the employee's current
/// mapping so the record always captures the change against the truth at
/// creation time.
pub async fn create_adjustment(
    pool: &MySqlPool,
    actor: &Actor,
    req: NewAdjustment,
) -> Result<u64, AppError> {
    let mapping = sqlx::query_as::<_, (u64, u64, Decimal)>(
        r#"
        SELECT grade_id, step_id, current_salary
        FROM employee_grade_mappings
        WHERE employee_id = ?
          AND (end_date IS NULL OR end_date >= CURDATE())
        ORDER BY effective_date DESC
        LIMIT 1
        "#,
    )
    .bind(req.employee_id)
    .fetch_optional(pool)
    .await?;

    let Some((grade_id, step_id, old_salary)) = mapping else {
        return Err(AppError::Validation(format!(
            "employee {} has no current grade mapping",
            req.employee_id
        )));
    };

    validate_salary_change(old_salary, req.new_salary, req.is_correction)?;

    let result = sqlx::query(
        r#"
        INSERT INTO salary_adjustments
            (employee_id, grade_id, step_id, old_salary, new_salary, reason,
             justification, is_correction, status, effective_date, initiated_by)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'draft', ?, ?)
        "#,
    )
    .bind(req.employee_id)
    .bind(grade_id)
    .bind(step_id)
    .bind(old_salary)
    .bind(req.new_salary)
    .bind(&req.reason)
    .bind(&req.justification)
    .bind(req.is_correction)
    .bind(req.effective_date)
    .bind(actor.id)
    .execute(pool)
    .await?;

    let id = result.last_insert_id();
    audit::record(
        pool,
        None,
        None,
        "salary_adjustment_created",
        actor,
        serde_json::json!({ "adjustment_id": id, "employee_id": req.employee_id }),
    )
    .await;

    Ok(id)
}

/// Advance an adjustment to `target`, recording the acting user in the
/// column the transition maps to. Implementing also applies the new salary
/// to the employee's current mapping in the same transaction.
pub async fn set_status(
    pool: &MySqlPool,
    actor: &Actor,
    adjustment_id: u64,
    target: AdjustmentStatus,
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let adjustment = sqlx::query_as::<_, SalaryAdjustment>(
        r#"
        SELECT id, employee_id, grade_id, step_id, old_salary, new_salary,
               reason, justification, is_correction, status, effective_date,
               revision_id, workflow_id, initiated_by, reviewed_by,
               approved_by, implemented_by, rejected_by, created_at
        FROM salary_adjustments
        WHERE id = ?
        FOR UPDATE
        "#,
    )
    .bind(adjustment_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("salary adjustment", adjustment_id))?;

    let current: AdjustmentStatus = parse_status("salary adjustment", &adjustment.status)?;
    let actor_column = current.transition_to(target)?;

    // actor_column names come from a fixed table, never from input
    let sql = format!(
        "UPDATE salary_adjustments SET status = ?, {} = ? WHERE id = ? AND status = ?",
        actor_column.name()
    );
    let updated = sqlx::query(&sql)
        .bind(target.to_string())
        .bind(actor.id)
        .bind(adjustment_id)
        .bind(current.to_string())
        .execute(&mut *tx)
        .await?;

    if updated.rows_affected() == 0 {
        return Err(AppError::invalid_state(
            "salary adjustment",
            adjustment_id,
            adjustment.status,
            "adjustment changed concurrently",
        ));
    }

    if target == AdjustmentStatus::Implemented {
        apply_to_mapping(&mut tx, &adjustment).await?;
    }

    tx.commit().await?;

    audit::record(
        pool,
        None,
        None,
        "salary_adjustment_status_changed",
        actor,
        serde_json::json!({
            "adjustment_id": adjustment_id,
            "from": current.to_string(),
            "to": target.to_string(),
        }),
    )
    .await;

    Ok(())
}

/// Write the adjusted salary into the employee's current mapping and
/// re-validate its band position against the stored snapshot.
async fn apply_to_mapping(
    tx: &mut sqlx::Transaction<'_, sqlx::MySql>,
    adjustment: &SalaryAdjustment,
) -> Result<(), AppError> {
    let mapping = sqlx::query_as::<_, (u64, Decimal, Decimal)>(
        r#"
        SELECT id, band_min, band_max
        FROM employee_grade_mappings
        WHERE employee_id = ?
          AND (end_date IS NULL OR end_date >= ?)
        ORDER BY effective_date DESC
        LIMIT 1
        FOR UPDATE
        "#,
    )
    .bind(adjustment.employee_id)
    .bind(adjustment.effective_date)
    .fetch_optional(&mut **tx)
    .await?;

    let Some((mapping_id, band_min, band_max)) = mapping else {
        return Err(AppError::Validation(format!(
            "employee {} has no current grade mapping to apply the adjustment to",
            adjustment.employee_id
        )));
    };

    let band = calculate_salary_status(adjustment.new_salary, band_min, band_max);

    sqlx::query(
        r#"UPDATE employee_grade_mappings SET current_salary = ?, status = ? WHERE id = ?"#,
    )
    .bind(adjustment.new_salary)
    .bind(band.to_string())
    .bind(mapping_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
