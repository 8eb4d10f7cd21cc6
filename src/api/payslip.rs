use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use sqlx::{MySql, MySqlPool, QueryBuilder};
use utoipa::{IntoParams, ToSchema};

use crate::actor::Actor;
use crate::audit;
use crate::error::AppError;
use crate::model::payslip::{ComputationTrace, Payslip, PayslipStatus};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PayslipFilter {
    #[schema(example = 12)]
    /// Filter by payroll run
    pub run_id: Option<u64>,
    #[schema(example = 1001)]
    /// Filter by employee
    pub employee_id: Option<u64>,
    #[schema(example = 1)]
    /// Filter by branch
    pub branch_id: Option<u64>,
    #[schema(example = "active")]
    /// Filter by payslip status
    pub status: Option<String>,
    #[schema(example = 1)]
    pub page: Option<u64>,
    #[schema(example = 10)]
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct PayslipListResponse {
    pub data: Vec<Payslip>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[derive(Serialize, ToSchema)]
pub struct PayslipDetailResponse {
    pub payslip: Payslip,
    /// Decoded computation trace for audit and reproduction.
    #[schema(value_type = Object)]
    pub computation_trace: ComputationTrace,
}

const PAYSLIP_COLUMNS: &str = "id, run_id, employee_id, branch_id, period_start, period_end, \
     basic_pay, overtime_pay, night_diff_pay, allowances, bonuses, gross_pay, \
     social_insurance, health_insurance, housing_fund, withholding_tax, \
     other_deductions, total_deductions, net_pay, status, detail, created_at";

fn push_payslip_filters(qb: &mut QueryBuilder<MySql>, filter: &PayslipFilter) {
    if let Some(run_id) = filter.run_id {
        qb.push(" AND run_id = ").push_bind(run_id);
    }
    if let Some(employee_id) = filter.employee_id {
        qb.push(" AND employee_id = ").push_bind(employee_id);
    }
    if let Some(branch_id) = filter.branch_id {
        qb.push(" AND branch_id = ").push_bind(branch_id);
    }
    if let Some(status) = filter.status.as_deref() {
        qb.push(" AND status = ").push_bind(status.to_owned());
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/payslips",
    params(PayslipFilter),
    responses(
        (status = 200, description = "Paginated payslip list", body = PayslipListResponse)
    ),
    tag = "Payslips"
)]
pub async fn list_payslips(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    query: web::Query<PayslipFilter>,
) -> actix_web::Result<HttpResponse> {
    actor.require_hr_or_admin()?;

    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM payslips WHERE 1=1");
    push_payslip_filters(&mut count_qb, &query);
    let total: i64 = count_qb
        .build_query_scalar()
        .fetch_one(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    let mut data_qb = QueryBuilder::new(format!("SELECT {PAYSLIP_COLUMNS} FROM payslips WHERE 1=1"));
    push_payslip_filters(&mut data_qb, &query);
    data_qb.push(" ORDER BY id LIMIT ");
    data_qb.push_bind(per_page as i64);
    data_qb.push(" OFFSET ");
    data_qb.push_bind(offset as i64);

    let data = data_qb
        .build_query_as::<Payslip>()
        .fetch_all(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(PayslipListResponse {
        data,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/payslips/{payslip_id}",
    params(("payslip_id" = u64, Path, description = "Payslip id")),
    responses(
        (status = 200, description = "Payslip with decoded computation trace", body = PayslipDetailResponse),
        (status = 404)
    ),
    tag = "Payslips"
)]
pub async fn get_payslip(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    actor.require_hr_or_admin()?;

    let payslip_id = path.into_inner();
    let payslip = sqlx::query_as::<_, Payslip>(&format!(
        "SELECT {PAYSLIP_COLUMNS} FROM payslips WHERE id = ?"
    ))
    .bind(payslip_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(AppError::from)?
    .ok_or_else(|| AppError::not_found("payslip", payslip_id))?;

    let computation_trace = ComputationTrace::decode(&payslip.detail)?;

    Ok(HttpResponse::Ok().json(PayslipDetailResponse {
        payslip,
        computation_trace,
    }))
}

#[utoipa::path(
    put,
    path = "/api/v1/payslips/{payslip_id}/void",
    params(("payslip_id" = u64, Path, description = "Payslip to void")),
    responses(
        (status = 200, description = "Payslip voided"),
        (status = 404),
        (status = 409, description = "Payslip already voided")
    ),
    tag = "Payslips"
)]
pub async fn void_payslip(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    actor.require_admin()?;

    let payslip_id = path.into_inner();

    // The status flag is the one field that may still change after a run is
    // locked; the figures themselves stay frozen.
    let result = sqlx::query(r#"UPDATE payslips SET status = ? WHERE id = ? AND status = ?"#)
        .bind(PayslipStatus::Voided.to_string())
        .bind(payslip_id)
        .bind(PayslipStatus::Active.to_string())
        .execute(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    if result.rows_affected() == 0 {
        let exists = sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM payslips WHERE id = ?"#)
            .bind(payslip_id)
            .fetch_one(pool.get_ref())
            .await
            .map_err(AppError::from)?;

        return if exists == 0 {
            Err(AppError::not_found("payslip", payslip_id).into())
        } else {
            Err(AppError::invalid_state(
                "payslip",
                payslip_id,
                "voided",
                "payslip is already voided",
            )
            .into())
        };
    }

    audit::record(
        pool.get_ref(),
        None,
        Some(payslip_id),
        "payslip_voided",
        &actor,
        serde_json::json!({ "payslip_id": payslip_id }),
    )
    .await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Payslip voided"
    })))
}
