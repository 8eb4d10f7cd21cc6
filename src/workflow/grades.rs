//! Grade activation and employee grade mapping approval.
//!
//! Both operations are end-then-activate transactions: approving a new
//! version closes the prior one at day granularity, which is what keeps the
//! "one active version / one current mapping" invariants true.

use sqlx::MySqlPool;

use crate::actor::Actor;
use crate::audit;
use crate::error::AppError;
use crate::model::grade::{GradeStatus, SalaryGrade};
use crate::model::grade_mapping::{BandStatus, EmployeeGradeMapping, calculate_salary_status};
use crate::model::parse_status;

/// Draft -> Active. Any prior Active version of the same code and scope is
/// superseded, its end date set to the day before the new version takes
/// effect.
pub async fn approve_grade(pool: &MySqlPool, actor: &Actor, grade_id: u64) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let grade = sqlx::query_as::<_, SalaryGrade>(
        r#"
        SELECT id, code, name, department_id, branch_id, min_rate, mid_rate,
               max_rate, status, effective_date, end_date, created_by,
               approved_by, created_at
        FROM salary_grades
        WHERE id = ?
        FOR UPDATE
        "#,
    )
    .bind(grade_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("salary grade", grade_id))?;

    let status: GradeStatus = parse_status("salary grade", &grade.status)?;
    if status != GradeStatus::Draft {
        return Err(AppError::invalid_state(
            "salary grade",
            grade_id,
            grade.status,
            "only a draft grade can be approved",
        ));
    }

    sqlx::query(
        r#"
        UPDATE salary_grades
        SET status = 'superseded', end_date = DATE_SUB(?, INTERVAL 1 DAY)
        WHERE code = ?
          AND department_id <=> ?
          AND branch_id <=> ?
          AND status = 'active'
          AND id <> ?
        "#,
    )
    .bind(grade.effective_date)
    .bind(&grade.code)
    .bind(grade.department_id)
    .bind(grade.branch_id)
    .bind(grade_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(r#"UPDATE salary_grades SET status = 'active', approved_by = ? WHERE id = ?"#)
        .bind(actor.id)
        .bind(grade_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    audit::record(
        pool,
        None,
        None,
        "salary_grade_approved",
        actor,
        serde_json::json!({ "grade_id": grade_id, "code": grade.code }),
    )
    .await;

    Ok(())
}

/// Approve a pending mapping: close every other mapping the employee holds
/// whose end date is open or reaches past the new effective date, then
/// activate this one with its band position re-validated from the numbers.
pub async fn approve_mapping(
    pool: &MySqlPool,
    actor: &Actor,
    mapping_id: u64,
) -> Result<BandStatus, AppError> {
    let mut tx = pool.begin().await?;

    let mapping = sqlx::query_as::<_, EmployeeGradeMapping>(
        r#"
        SELECT id, employee_id, grade_id, step_id, current_salary, band_min,
               band_max, status, effective_date, end_date, approved_by, created_at
        FROM employee_grade_mappings
        WHERE id = ?
        FOR UPDATE
        "#,
    )
    .bind(mapping_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("grade mapping", mapping_id))?;

    let status: BandStatus = parse_status("grade mapping", &mapping.status)?;
    if status != BandStatus::PendingReview {
        return Err(AppError::invalid_state(
            "grade mapping",
            mapping_id,
            mapping.status,
            "only a pending mapping can be approved",
        ));
    }

    sqlx::query(
        r#"
        UPDATE employee_grade_mappings
        SET end_date = DATE_SUB(?, INTERVAL 1 DAY)
        WHERE employee_id = ?
          AND id <> ?
          AND (end_date IS NULL OR end_date >= ?)
        "#,
    )
    .bind(mapping.effective_date)
    .bind(mapping.employee_id)
    .bind(mapping_id)
    .bind(mapping.effective_date)
    .execute(&mut *tx)
    .await?;

    // Re-validated, not assumed: the stored snapshot decides the position.
    let band = calculate_salary_status(mapping.current_salary, mapping.band_min, mapping.band_max);

    sqlx::query(
        r#"UPDATE employee_grade_mappings SET status = ?, approved_by = ? WHERE id = ?"#,
    )
    .bind(band.to_string())
    .bind(actor.id)
    .bind(mapping_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    audit::record(
        pool,
        None,
        None,
        "grade_mapping_approved",
        actor,
        serde_json::json!({
            "mapping_id": mapping_id,
            "employee_id": mapping.employee_id,
            "band_status": band.to_string(),
        }),
    )
    .await;

    Ok(band)
}
