//! Pay adjustment batch workflow.
//!
//! A batch targets sets of grades, departments and positions; an employee
//! matching any one dimension is included. Impact is a persisted
//! point-in-time estimate; implementation materializes per-employee detail
//! rows (replacing any prior rows for the workflow) and generates the
//! pending-review salary adjustments.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{MySql, MySqlPool, QueryBuilder};
use utoipa::ToSchema;

use crate::actor::Actor;
use crate::audit;
use crate::error::AppError;
use crate::model::parse_status;
use crate::model::pay_adjustment::{
    BatchAdjustmentType, BatchStatus, PayAdjustmentWorkflow, TargetSet, proposed_salary,
};

#[derive(Debug, Clone)]
struct MatchedEmployee {
    employee_id: u64,
    current_salary: Decimal,
    step_base: Option<Decimal>,
}

/// Resolve the OR-combined target set against active employees and their
/// current mappings. Employees without any salary record cannot be adjusted
/// and are left out.
async fn matched_employees(
    tx: &mut sqlx::Transaction<'_, MySql>,
    targets: &TargetSet,
) -> Result<Vec<MatchedEmployee>, AppError> {
    let mut qb: QueryBuilder<MySql> = QueryBuilder::new(
        r#"
        SELECT e.id, COALESCE(m.current_salary, e.base_salary) AS current_salary,
               s.base_rate AS step_base
        FROM employees e
        LEFT JOIN employee_grade_mappings m
               ON m.employee_id = e.id
              AND m.effective_date <= CURDATE()
              AND (m.end_date IS NULL OR m.end_date >= CURDATE())
        LEFT JOIN salary_steps s ON s.id = m.step_id
        WHERE e.is_active = 1 AND ("#,
    );

    let mut first = true;
    let mut push_dimension = |qb: &mut QueryBuilder<MySql>, column: &str, ids: &[u64]| {
        if ids.is_empty() {
            return;
        }
        if !first {
            qb.push(" OR ");
        }
        first = false;
        qb.push(column).push(" IN (");
        let mut sep = qb.separated(", ");
        for id in ids {
            sep.push_bind(*id);
        }
        qb.push(")");
    };

    push_dimension(&mut qb, "m.grade_id", &targets.grade_ids);
    push_dimension(&mut qb, "e.department_id", &targets.department_ids);
    push_dimension(&mut qb, "e.position_id", &targets.position_ids);
    qb.push(") ORDER BY e.id");

    let rows = qb
        .build_query_as::<(u64, Option<Decimal>, Option<Decimal>)>()
        .fetch_all(&mut **tx)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(employee_id, salary, step_base)| {
            salary.map(|current_salary| MatchedEmployee {
                employee_id,
                current_salary,
                step_base,
            })
        })
        .collect())
}

fn parse_adjustment_type(raw: &str) -> Result<BatchAdjustmentType, AppError> {
    raw.parse::<BatchAdjustmentType>()
        .map_err(|_| AppError::Transaction(format!("unknown adjustment type '{raw}'")))
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImpactSummary {
    pub workflow_id: u64,
    pub total_impact: Decimal,
    pub affected_count: i32,
    #[schema(value_type = String, format = "date-time")]
    pub computed_at: DateTime<Utc>,
}

async fn load_workflow(
    tx: &mut sqlx::Transaction<'_, MySql>,
    workflow_id: u64,
) -> Result<PayAdjustmentWorkflow, AppError> {
    sqlx::query_as::<_, PayAdjustmentWorkflow>(
        r#"
        SELECT id, name, adjustment_type, adjustment_value, target_grade_ids,
               target_department_ids, target_position_ids, status,
               total_impact, affected_count, impact_computed_at,
               effective_date, created_by, approved_by, implemented_by, created_at
        FROM pay_adjustment_workflows
        WHERE id = ?
        FOR UPDATE
        "#,
    )
    .bind(workflow_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::not_found("pay adjustment workflow", workflow_id))
}

/// Dry-run the batch and persist the estimate on the workflow row. Callers
/// must re-invoke to refresh the snapshot if source data moved since.
pub async fn calculate_impact(
    pool: &MySqlPool,
    actor: &Actor,
    workflow_id: u64,
) -> Result<ImpactSummary, AppError> {
    let mut tx = pool.begin().await?;

    let workflow = load_workflow(&mut tx, workflow_id).await?;
    let status: BatchStatus = parse_status("pay adjustment workflow", &workflow.status)?;
    if status == BatchStatus::Implemented {
        return Err(AppError::invalid_state(
            "pay adjustment workflow",
            workflow_id,
            workflow.status,
            "an implemented workflow cannot be re-estimated",
        ));
    }

    let targets = workflow.targets()?;
    if targets.is_empty() {
        return Err(AppError::Validation(
            "workflow has no target grades, departments or positions".to_string(),
        ));
    }

    let adjustment_type = parse_adjustment_type(&workflow.adjustment_type)?;

    let matched = matched_employees(&mut tx, &targets).await?;

    let mut total_impact = Decimal::ZERO;
    for emp in &matched {
        let new_salary = proposed_salary(
            emp.current_salary,
            adjustment_type,
            workflow.adjustment_value,
            emp.step_base,
        );
        total_impact += new_salary - emp.current_salary;
    }
    let affected_count = matched.len() as i32;

    sqlx::query(
        r#"
        UPDATE pay_adjustment_workflows
        SET total_impact = ?, affected_count = ?, impact_computed_at = NOW()
        WHERE id = ?
        "#,
    )
    .bind(total_impact)
    .bind(affected_count)
    .bind(workflow_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    audit::record(
        pool,
        None,
        None,
        "pay_adjustment_impact_computed",
        actor,
        serde_json::json!({
            "workflow_id": workflow_id,
            "total_impact": total_impact,
            "affected_count": affected_count,
        }),
    )
    .await;

    Ok(ImpactSummary {
        workflow_id,
        total_impact,
        affected_count,
        computed_at: Utc::now(),
    })
}

/// Draft -> Approved. Requires a computed impact snapshot so nobody approves
/// a batch sight unseen.
pub async fn approve_workflow(
    pool: &MySqlPool,
    actor: &Actor,
    workflow_id: u64,
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let workflow = load_workflow(&mut tx, workflow_id).await?;
    let status: BatchStatus = parse_status("pay adjustment workflow", &workflow.status)?;
    if !status.can_transition_to(BatchStatus::Approved) {
        return Err(AppError::invalid_state(
            "pay adjustment workflow",
            workflow_id,
            workflow.status,
            "only a draft workflow can be approved",
        ));
    }
    if workflow.impact_computed_at.is_none() {
        return Err(AppError::Validation(
            "compute the impact estimate before approving".to_string(),
        ));
    }

    sqlx::query(
        r#"UPDATE pay_adjustment_workflows SET status = 'approved', approved_by = ? WHERE id = ?"#,
    )
    .bind(actor.id)
    .bind(workflow_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    audit::record(
        pool,
        None,
        None,
        "pay_adjustment_workflow_approved",
        actor,
        serde_json::json!({ "workflow_id": workflow_id }),
    )
    .await;

    Ok(())
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImplementSummary {
    pub workflow_id: u64,
    pub details_created: u32,
    pub adjustments_created: u32,
}

/// Approved -> Implemented: materialize one detail row per matched employee
/// (replacing any rows from a previous invocation) and generate the
/// per-employee pending-review salary adjustments.
pub async fn implement_workflow(
    pool: &MySqlPool,
    actor: &Actor,
    workflow_id: u64,
) -> Result<ImplementSummary, AppError> {
    let mut tx = pool.begin().await?;

    let workflow = load_workflow(&mut tx, workflow_id).await?;
    let status: BatchStatus = parse_status("pay adjustment workflow", &workflow.status)?;
    if !status.can_transition_to(BatchStatus::Implemented) {
        return Err(AppError::invalid_state(
            "pay adjustment workflow",
            workflow_id,
            workflow.status,
            "only an approved workflow can be implemented",
        ));
    }

    let targets = workflow.targets()?;
    let adjustment_type = parse_adjustment_type(&workflow.adjustment_type)?;
    let matched = matched_employees(&mut tx, &targets).await?;

    // Replace-on-conflict: repeated implementation attempts cannot leave
    // duplicate detail rows behind.
    sqlx::query(r#"DELETE FROM pay_adjustment_details WHERE workflow_id = ?"#)
        .bind(workflow_id)
        .execute(&mut *tx)
        .await?;

    let mut details_created: u32 = 0;
    let mut adjustments_created: u32 = 0;

    for emp in &matched {
        let new_salary = proposed_salary(
            emp.current_salary,
            adjustment_type,
            workflow.adjustment_value,
            emp.step_base,
        );
        let delta = new_salary - emp.current_salary;

        sqlx::query(
            r#"
            INSERT INTO pay_adjustment_details
                (workflow_id, employee_id, old_salary, new_salary, delta)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(workflow_id)
        .bind(emp.employee_id)
        .bind(emp.current_salary)
        .bind(new_salary)
        .bind(delta)
        .execute(&mut *tx)
        .await?;
        details_created += 1;

        // An unchanged salary needs no adjustment record.
        if delta != Decimal::ZERO {
            sqlx::query(
                r#"
                INSERT INTO salary_adjustments
                    (employee_id, old_salary, new_salary, reason, justification,
                     is_correction, status, effective_date, workflow_id, initiated_by)
                VALUES (?, ?, ?, 'batch_adjustment', ?, 0, 'pending_review', ?, ?, ?)
                "#,
            )
            .bind(emp.employee_id)
            .bind(emp.current_salary)
            .bind(new_salary)
            .bind(format!(
                "Generated by pay adjustment workflow #{} ({})",
                workflow.id, workflow.name
            ))
            .bind(workflow.effective_date)
            .bind(workflow.id)
            .bind(actor.id)
            .execute(&mut *tx)
            .await?;
            adjustments_created += 1;
        }
    }

    let updated = sqlx::query(
        r#"
        UPDATE pay_adjustment_workflows
        SET status = 'implemented', implemented_by = ?
        WHERE id = ? AND status = 'approved'
        "#,
    )
    .bind(actor.id)
    .bind(workflow_id)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(AppError::Transaction(format!(
            "pay adjustment workflow {workflow_id} changed concurrently"
        )));
    }

    tx.commit().await?;

    tracing::info!(
        workflow_id,
        details_created,
        adjustments_created,
        "pay adjustment workflow implemented"
    );

    audit::record(
        pool,
        None,
        None,
        "pay_adjustment_workflow_implemented",
        actor,
        serde_json::json!({
            "workflow_id": workflow_id,
            "details_created": details_created,
            "adjustments_created": adjustments_created,
        }),
    )
    .await;

    Ok(ImplementSummary {
        workflow_id,
        details_created,
        adjustments_created,
    })
}
