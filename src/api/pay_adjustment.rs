use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{MySql, MySqlPool, QueryBuilder};
use utoipa::{IntoParams, ToSchema};

use crate::actor::Actor;
use crate::audit;
use crate::error::AppError;
use crate::model::pay_adjustment::{
    BatchAdjustmentType, PayAdjustmentDetail, PayAdjustmentWorkflow, TargetSet,
};
use crate::workflow::batch::{self, ImpactSummary, ImplementSummary};

#[derive(Deserialize, ToSchema)]
pub struct CreateWorkflow {
    #[schema(example = "2026 nursing uplift")]
    pub name: String,
    #[schema(example = "percentage")]
    pub adjustment_type: BatchAdjustmentType,
    #[schema(value_type = f64, example = 4.0)]
    pub adjustment_value: Decimal,
    /// Employees matching ANY of the target dimensions are included.
    #[serde(default)]
    pub target_grade_ids: Vec<u64>,
    #[serde(default)]
    pub target_department_ids: Vec<u64>,
    #[serde(default)]
    pub target_position_ids: Vec<u64>,
    #[schema(example = "2026-04-01", value_type = String, format = "date")]
    pub effective_date: NaiveDate,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct WorkflowFilter {
    #[schema(example = "draft")]
    /// Filter by workflow status
    pub status: Option<String>,
    #[schema(example = 1)]
    pub page: Option<u64>,
    #[schema(example = 10)]
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct WorkflowListResponse {
    pub data: Vec<PayAdjustmentWorkflow>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[derive(Serialize, ToSchema)]
pub struct WorkflowDetailResponse {
    pub workflow: PayAdjustmentWorkflow,
    pub targets: TargetSet,
}

#[derive(Serialize, ToSchema)]
pub struct DetailRowsResponse {
    pub workflow_id: u64,
    pub data: Vec<PayAdjustmentDetail>,
}

const WORKFLOW_COLUMNS: &str = "id, name, adjustment_type, adjustment_value, target_grade_ids, \
     target_department_ids, target_position_ids, status, total_impact, \
     affected_count, impact_computed_at, effective_date, created_by, \
     approved_by, implemented_by, created_at";

#[utoipa::path(
    post,
    path = "/api/v1/pay-adjustments",
    request_body = CreateWorkflow,
    responses(
        (status = 201, description = "Workflow created as draft"),
        (status = 400, description = "No target dimension supplied")
    ),
    tag = "Pay Adjustment Workflows"
)]
pub async fn create_workflow(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateWorkflow>,
) -> actix_web::Result<HttpResponse> {
    actor.require_hr_or_admin()?;

    let targets = TargetSet {
        grade_ids: payload.target_grade_ids.clone(),
        department_ids: payload.target_department_ids.clone(),
        position_ids: payload.target_position_ids.clone(),
    };
    if targets.is_empty() {
        return Err(AppError::Validation(
            "supply at least one target grade, department or position".to_string(),
        )
        .into());
    }

    let encode = |ids: &[u64]| serde_json::to_string(ids).unwrap_or_else(|_| "[]".to_string());

    let result = sqlx::query(
        r#"
        INSERT INTO pay_adjustment_workflows
            (name, adjustment_type, adjustment_value, target_grade_ids,
             target_department_ids, target_position_ids, status,
             effective_date, created_by)
        VALUES (?, ?, ?, ?, ?, ?, 'draft', ?, ?)
        "#,
    )
    .bind(&payload.name)
    .bind(payload.adjustment_type.to_string())
    .bind(payload.adjustment_value)
    .bind(encode(&targets.grade_ids))
    .bind(encode(&targets.department_ids))
    .bind(encode(&targets.position_ids))
    .bind(payload.effective_date)
    .bind(actor.id)
    .execute(pool.get_ref())
    .await
    .map_err(AppError::from)?;

    let workflow_id = result.last_insert_id();

    audit::record(
        pool.get_ref(),
        None,
        None,
        "pay_adjustment_workflow_created",
        &actor,
        serde_json::json!({ "workflow_id": workflow_id, "name": &payload.name }),
    )
    .await;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Pay adjustment workflow created",
        "workflow_id": workflow_id
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/pay-adjustments/{workflow_id}/impact",
    params(("workflow_id" = u64, Path, description = "Workflow id")),
    responses(
        (status = 200, description = "Impact snapshot recomputed and persisted", body = ImpactSummary),
        (status = 400, description = "Workflow has no targets"),
        (status = 404),
        (status = 409, description = "Workflow already implemented")
    ),
    tag = "Pay Adjustment Workflows"
)]
pub async fn calculate_impact(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    actor.require_hr_or_admin()?;

    let summary = batch::calculate_impact(pool.get_ref(), &actor, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(summary))
}

#[utoipa::path(
    put,
    path = "/api/v1/pay-adjustments/{workflow_id}/approve",
    params(("workflow_id" = u64, Path, description = "Workflow to approve")),
    responses(
        (status = 200, description = "Workflow approved"),
        (status = 400, description = "Impact not computed yet"),
        (status = 404),
        (status = 409, description = "Workflow is not a draft")
    ),
    tag = "Pay Adjustment Workflows"
)]
pub async fn approve_workflow(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    actor.require_admin()?;

    batch::approve_workflow(pool.get_ref(), &actor, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Pay adjustment workflow approved"
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/pay-adjustments/{workflow_id}/implement",
    params(("workflow_id" = u64, Path, description = "Workflow to implement")),
    responses(
        (status = 200, description = "Details materialized and adjustments generated", body = ImplementSummary),
        (status = 404),
        (status = 409, description = "Workflow is not approved")
    ),
    tag = "Pay Adjustment Workflows"
)]
pub async fn implement_workflow(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    actor.require_admin()?;

    let summary = batch::implement_workflow(pool.get_ref(), &actor, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(summary))
}

#[utoipa::path(
    get,
    path = "/api/v1/pay-adjustments/{workflow_id}",
    params(("workflow_id" = u64, Path, description = "Workflow id")),
    responses(
        (status = 200, description = "Workflow with decoded target sets", body = WorkflowDetailResponse),
        (status = 404)
    ),
    tag = "Pay Adjustment Workflows"
)]
pub async fn get_workflow(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    actor.require_hr_or_admin()?;

    let workflow_id = path.into_inner();
    let workflow = sqlx::query_as::<_, PayAdjustmentWorkflow>(&format!(
        "SELECT {WORKFLOW_COLUMNS} FROM pay_adjustment_workflows WHERE id = ?"
    ))
    .bind(workflow_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(AppError::from)?
    .ok_or_else(|| AppError::not_found("pay adjustment workflow", workflow_id))?;

    let targets = workflow.targets()?;

    Ok(HttpResponse::Ok().json(WorkflowDetailResponse { workflow, targets }))
}

#[utoipa::path(
    get,
    path = "/api/v1/pay-adjustments/{workflow_id}/details",
    params(("workflow_id" = u64, Path, description = "Workflow id")),
    responses(
        (status = 200, description = "Materialized per-employee detail rows", body = DetailRowsResponse),
        (status = 404)
    ),
    tag = "Pay Adjustment Workflows"
)]
pub async fn list_details(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    actor.require_hr_or_admin()?;

    let workflow_id = path.into_inner();

    let exists =
        sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM pay_adjustment_workflows WHERE id = ?"#)
            .bind(workflow_id)
            .fetch_one(pool.get_ref())
            .await
            .map_err(AppError::from)?;
    if exists == 0 {
        return Err(AppError::not_found("pay adjustment workflow", workflow_id).into());
    }

    let data = sqlx::query_as::<_, PayAdjustmentDetail>(
        r#"
        SELECT id, workflow_id, employee_id, old_salary, new_salary, delta, created_at
        FROM pay_adjustment_details
        WHERE workflow_id = ?
        ORDER BY employee_id
        "#,
    )
    .bind(workflow_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(DetailRowsResponse { workflow_id, data }))
}

#[utoipa::path(
    get,
    path = "/api/v1/pay-adjustments",
    params(WorkflowFilter),
    responses(
        (status = 200, description = "Paginated workflow list", body = WorkflowListResponse)
    ),
    tag = "Pay Adjustment Workflows"
)]
pub async fn list_workflows(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    query: web::Query<WorkflowFilter>,
) -> actix_web::Result<HttpResponse> {
    actor.require_hr_or_admin()?;

    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut count_qb: QueryBuilder<MySql> =
        QueryBuilder::new("SELECT COUNT(*) FROM pay_adjustment_workflows WHERE 1=1");
    if let Some(status) = query.status.as_deref() {
        count_qb.push(" AND status = ").push_bind(status.to_owned());
    }
    let total: i64 = count_qb
        .build_query_scalar()
        .fetch_one(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    let mut data_qb: QueryBuilder<MySql> = QueryBuilder::new(format!(
        "SELECT {WORKFLOW_COLUMNS} FROM pay_adjustment_workflows WHERE 1=1"
    ));
    if let Some(status) = query.status.as_deref() {
        data_qb.push(" AND status = ").push_bind(status.to_owned());
    }
    data_qb.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    data_qb.push_bind(per_page as i64);
    data_qb.push(" OFFSET ");
    data_qb.push_bind(offset as i64);

    let data = data_qb
        .build_query_as::<PayAdjustmentWorkflow>()
        .fetch_all(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(WorkflowListResponse {
        data,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}
