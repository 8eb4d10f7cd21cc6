use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{MySql, MySqlPool, QueryBuilder};
use std::time::Duration;
use utoipa::{IntoParams, ToSchema};

use crate::actor::Actor;
use crate::config::Config;
use crate::error::AppError;
use crate::model::payroll_run::PayrollRun;
use crate::payroll::engine::{self, RunOutcome};
use crate::payroll::sources::DbSources;

#[derive(Deserialize, ToSchema)]
pub struct CreateRun {
    #[schema(example = 1)]
    pub branch_id: u64,

    #[schema(example = "2026-01-01", value_type = String, format = "date")]
    pub period_start: NaiveDate,

    #[schema(example = "2026-01-31", value_type = String, format = "date")]
    pub period_end: NaiveDate,

    #[schema(example = "2026-02-05", value_type = String, format = "date")]
    pub pay_date: NaiveDate,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct RunFilter {
    #[schema(example = 1)]
    /// Filter by branch
    pub branch_id: Option<u64>,
    #[schema(example = "completed")]
    /// Filter by run status
    pub status: Option<String>,
    #[schema(example = "2026-01-01", value_type = Option<String>, format = "date")]
    /// Runs whose period starts on or after this date
    pub date_from: Option<NaiveDate>,
    #[schema(example = "2026-12-31", value_type = Option<String>, format = "date")]
    /// Runs whose period ends on or before this date
    pub date_to: Option<NaiveDate>,
    #[schema(example = 1)]
    pub page: Option<u64>,
    #[schema(example = 10)]
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct RunListResponse {
    pub data: Vec<PayrollRun>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

const RUN_COLUMNS: &str = "id, branch_id, period_start, period_end, pay_date, status, \
     total_gross, total_deductions, total_net, employee_count, created_by, \
     processed_at, approved_by, approved_at, locked_by, locked_at, created_at";

fn push_run_filters(qb: &mut QueryBuilder<MySql>, filter: &RunFilter) {
    if let Some(branch_id) = filter.branch_id {
        qb.push(" AND branch_id = ").push_bind(branch_id);
    }
    if let Some(status) = filter.status.as_deref() {
        qb.push(" AND status = ").push_bind(status.to_owned());
    }
    if let Some(from) = filter.date_from {
        qb.push(" AND period_start >= ").push_bind(from);
    }
    if let Some(to) = filter.date_to {
        qb.push(" AND period_end <= ").push_bind(to);
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/payroll/runs",
    request_body = CreateRun,
    responses(
        (status = 201, description = "Payroll run created"),
        (status = 400, description = "Invalid or overlapping period"),
        (status = 401),
        (status = 403)
    ),
    tag = "Payroll Runs"
)]
pub async fn create_run(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateRun>,
) -> actix_web::Result<HttpResponse> {
    actor.require_admin()?;

    let run_id = engine::create_run(
        pool.get_ref(),
        &actor,
        payload.branch_id,
        payload.period_start,
        payload.period_end,
        payload.pay_date,
    )
    .await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Payroll run created",
        "run_id": run_id
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/payroll/runs/{run_id}/process",
    params(("run_id" = u64, Path, description = "Run to process")),
    responses(
        (status = 200, description = "Run processed", body = RunOutcome),
        (status = 404, description = "Run not found"),
        (status = 409, description = "Run is not in draft status")
    ),
    tag = "Payroll Runs"
)]
pub async fn process_run(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    actor.require_admin()?;

    let run_id = path.into_inner();
    let sources = DbSources::new(pool.get_ref().clone());

    // Dropping the future on timeout drops the open transaction, which
    // rolls the whole run back.
    let outcome = actix_web::rt::time::timeout(
        Duration::from_secs(config.process_run_timeout_secs),
        engine::process_run(pool.get_ref(), &sources, &actor, run_id),
    )
    .await
    .map_err(|_| {
        tracing::error!(run_id, "payroll run timed out");
        AppError::Transaction(format!(
            "payroll run {run_id} exceeded {}s and was rolled back",
            config.process_run_timeout_secs
        ))
    })??;

    Ok(HttpResponse::Ok().json(outcome))
}

#[utoipa::path(
    put,
    path = "/api/v1/payroll/runs/{run_id}/approve",
    params(("run_id" = u64, Path, description = "Run to approve")),
    responses(
        (status = 200, description = "Run approved"),
        (status = 404),
        (status = 409, description = "Run is not completed")
    ),
    tag = "Payroll Runs"
)]
pub async fn approve_run(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    actor.require_admin()?;

    engine::approve_run(pool.get_ref(), &actor, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Payroll run approved"
    })))
}

#[utoipa::path(
    put,
    path = "/api/v1/payroll/runs/{run_id}/lock",
    params(("run_id" = u64, Path, description = "Run to lock")),
    responses(
        (status = 200, description = "Run locked; payslips are now immutable"),
        (status = 404),
        (status = 409, description = "Run is not approved")
    ),
    tag = "Payroll Runs"
)]
pub async fn lock_run(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    actor.require_admin()?;

    engine::lock_run(pool.get_ref(), &actor, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Payroll run locked"
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/payroll/runs/{run_id}",
    params(("run_id" = u64, Path, description = "Run id")),
    responses(
        (status = 200, body = PayrollRun),
        (status = 404)
    ),
    tag = "Payroll Runs"
)]
pub async fn get_run(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    actor.require_hr_or_admin()?;

    let run_id = path.into_inner();
    let run = sqlx::query_as::<_, PayrollRun>(&format!(
        "SELECT {RUN_COLUMNS} FROM payroll_runs WHERE id = ?"
    ))
    .bind(run_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(AppError::from)?;

    match run {
        Some(run) => Ok(HttpResponse::Ok().json(run)),
        None => Err(AppError::not_found("payroll run", run_id).into()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/payroll/runs",
    params(RunFilter),
    responses(
        (status = 200, description = "Paginated run list", body = RunListResponse)
    ),
    tag = "Payroll Runs"
)]
pub async fn list_runs(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    query: web::Query<RunFilter>,
) -> actix_web::Result<HttpResponse> {
    actor.require_hr_or_admin()?;

    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM payroll_runs WHERE 1=1");
    push_run_filters(&mut count_qb, &query);
    let total: i64 = count_qb
        .build_query_scalar()
        .fetch_one(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    let mut data_qb =
        QueryBuilder::new(format!("SELECT {RUN_COLUMNS} FROM payroll_runs WHERE 1=1"));
    push_run_filters(&mut data_qb, &query);
    data_qb.push(" ORDER BY period_start DESC, id DESC LIMIT ");
    data_qb.push_bind(per_page as i64);
    data_qb.push(" OFFSET ");
    data_qb.push_bind(offset as i64);

    let data = data_qb
        .build_query_as::<PayrollRun>()
        .fetch_all(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(RunListResponse {
        data,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}
