use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{MySql, MySqlPool, QueryBuilder};
use utoipa::{IntoParams, ToSchema};

use crate::actor::Actor;
use crate::error::AppError;
use crate::model::salary_adjustment::{AdjustmentStatus, SalaryAdjustment};
use crate::workflow::adjustment::{self, NewAdjustment};

#[derive(Deserialize, ToSchema)]
pub struct CreateAdjustment {
    #[schema(example = 1001)]
    pub employee_id: u64,
    #[schema(value_type = f64, example = 31500.0)]
    pub new_salary: Decimal,
    #[schema(example = "merit_increase")]
    pub reason: String,
    #[schema(example = "Outstanding annual evaluation")]
    pub justification: String,
    /// Set when the new salary intentionally equals the old one.
    #[serde(default)]
    pub is_correction: bool,
    #[schema(example = "2026-03-01", value_type = String, format = "date")]
    pub effective_date: NaiveDate,
}

#[derive(Deserialize, ToSchema)]
pub struct AdjustmentStatusChange {
    /// Target status: pending_review, approved, rejected or implemented.
    #[schema(example = "approved")]
    pub status: AdjustmentStatus,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AdjustmentFilter {
    #[schema(example = 1001)]
    /// Filter by employee
    pub employee_id: Option<u64>,
    #[schema(example = "pending_review")]
    /// Filter by adjustment status
    pub status: Option<String>,
    /// Filter by originating grade revision
    pub revision_id: Option<u64>,
    /// Filter by originating batch workflow
    pub workflow_id: Option<u64>,
    #[schema(example = "2026-01-01", value_type = Option<String>, format = "date")]
    /// Adjustments effective on or after this date
    pub date_from: Option<NaiveDate>,
    #[schema(example = "2026-12-31", value_type = Option<String>, format = "date")]
    /// Adjustments effective on or before this date
    pub date_to: Option<NaiveDate>,
    #[schema(example = 1)]
    pub page: Option<u64>,
    #[schema(example = 10)]
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct AdjustmentListResponse {
    pub data: Vec<SalaryAdjustment>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

const ADJUSTMENT_COLUMNS: &str = "id, employee_id, grade_id, step_id, old_salary, new_salary, \
     reason, justification, is_correction, status, effective_date, \
     revision_id, workflow_id, initiated_by, reviewed_by, approved_by, \
     implemented_by, rejected_by, created_at";

fn push_adjustment_filters(qb: &mut QueryBuilder<MySql>, filter: &AdjustmentFilter) {
    if let Some(employee_id) = filter.employee_id {
        qb.push(" AND employee_id = ").push_bind(employee_id);
    }
    if let Some(status) = filter.status.as_deref() {
        qb.push(" AND status = ").push_bind(status.to_owned());
    }
    if let Some(revision_id) = filter.revision_id {
        qb.push(" AND revision_id = ").push_bind(revision_id);
    }
    if let Some(workflow_id) = filter.workflow_id {
        qb.push(" AND workflow_id = ").push_bind(workflow_id);
    }
    if let Some(from) = filter.date_from {
        qb.push(" AND effective_date >= ").push_bind(from);
    }
    if let Some(to) = filter.date_to {
        qb.push(" AND effective_date <= ").push_bind(to);
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/salary-adjustments",
    request_body = CreateAdjustment,
    responses(
        (status = 201, description = "Adjustment created as draft"),
        (status = 400, description = "No current mapping or salary unchanged without correction flag")
    ),
    tag = "Salary Adjustments"
)]
pub async fn create_adjustment(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateAdjustment>,
) -> actix_web::Result<HttpResponse> {
    actor.require_hr_or_admin()?;

    let payload = payload.into_inner();
    let adjustment_id = adjustment::create_adjustment(
        pool.get_ref(),
        &actor,
        NewAdjustment {
            employee_id: payload.employee_id,
            new_salary: payload.new_salary,
            reason: payload.reason,
            justification: payload.justification,
            is_correction: payload.is_correction,
            effective_date: payload.effective_date,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Salary adjustment created",
        "adjustment_id": adjustment_id
    })))
}

#[utoipa::path(
    put,
    path = "/api/v1/salary-adjustments/{adjustment_id}/status",
    request_body = AdjustmentStatusChange,
    params(("adjustment_id" = u64, Path, description = "Adjustment id")),
    responses(
        (status = 200, description = "Status changed; implementing also updates the mapping"),
        (status = 400, description = "Illegal transition"),
        (status = 404)
    ),
    tag = "Salary Adjustments"
)]
pub async fn change_status(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<AdjustmentStatusChange>,
) -> actix_web::Result<HttpResponse> {
    actor.require_hr_or_admin()?;

    adjustment::set_status(pool.get_ref(), &actor, path.into_inner(), payload.status).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Salary adjustment status changed",
        "status": payload.status.to_string()
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/salary-adjustments/{adjustment_id}",
    params(("adjustment_id" = u64, Path, description = "Adjustment id")),
    responses(
        (status = 200, body = SalaryAdjustment),
        (status = 404)
    ),
    tag = "Salary Adjustments"
)]
pub async fn get_adjustment(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    actor.require_hr_or_admin()?;

    let adjustment_id = path.into_inner();
    let adjustment = sqlx::query_as::<_, SalaryAdjustment>(&format!(
        "SELECT {ADJUSTMENT_COLUMNS} FROM salary_adjustments WHERE id = ?"
    ))
    .bind(adjustment_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(AppError::from)?;

    match adjustment {
        Some(a) => Ok(HttpResponse::Ok().json(a)),
        None => Err(AppError::not_found("salary adjustment", adjustment_id).into()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/salary-adjustments",
    params(AdjustmentFilter),
    responses(
        (status = 200, description = "Paginated adjustment list", body = AdjustmentListResponse)
    ),
    tag = "Salary Adjustments"
)]
pub async fn list_adjustments(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    query: web::Query<AdjustmentFilter>,
) -> actix_web::Result<HttpResponse> {
    actor.require_hr_or_admin()?;

    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM salary_adjustments WHERE 1=1");
    push_adjustment_filters(&mut count_qb, &query);
    let total: i64 = count_qb
        .build_query_scalar()
        .fetch_one(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    let mut data_qb = QueryBuilder::new(format!(
        "SELECT {ADJUSTMENT_COLUMNS} FROM salary_adjustments WHERE 1=1"
    ));
    push_adjustment_filters(&mut data_qb, &query);
    data_qb.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    data_qb.push_bind(per_page as i64);
    data_qb.push(" OFFSET ");
    data_qb.push_bind(offset as i64);

    let data = data_qb
        .build_query_as::<SalaryAdjustment>()
        .fetch_all(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(AdjustmentListResponse {
        data,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}
