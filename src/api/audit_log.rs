use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use sqlx::{MySql, MySqlPool, QueryBuilder};
use utoipa::{IntoParams, ToSchema};

use crate::actor::Actor;
use crate::audit::AuditEntry;
use crate::error::AppError;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AuditFilter {
    #[schema(example = 12)]
    /// Entries for a payroll run
    pub run_id: Option<u64>,
    #[schema(example = 345)]
    /// Entries for a payslip
    pub payslip_id: Option<u64>,
    #[schema(example = "payroll_run_processed")]
    /// Filter by action
    pub action: Option<String>,
    #[schema(example = 7)]
    /// Filter by acting user
    pub actor_id: Option<u64>,
    #[schema(example = 1)]
    pub page: Option<u64>,
    #[schema(example = 10)]
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct AuditListResponse {
    pub data: Vec<AuditEntry>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

fn push_audit_filters(qb: &mut QueryBuilder<MySql>, filter: &AuditFilter) {
    if let Some(run_id) = filter.run_id {
        qb.push(" AND run_id = ").push_bind(run_id);
    }
    if let Some(payslip_id) = filter.payslip_id {
        qb.push(" AND payslip_id = ").push_bind(payslip_id);
    }
    if let Some(action) = filter.action.as_deref() {
        qb.push(" AND action = ").push_bind(action.to_owned());
    }
    if let Some(actor_id) = filter.actor_id {
        qb.push(" AND actor_id = ").push_bind(actor_id);
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/audit-log",
    params(AuditFilter),
    responses(
        (status = 200, description = "Paginated audit trail", body = AuditListResponse)
    ),
    tag = "Audit"
)]
pub async fn list_audit_entries(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    query: web::Query<AuditFilter>,
) -> actix_web::Result<HttpResponse> {
    actor.require_hr_or_admin()?;

    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM audit_log WHERE 1=1");
    push_audit_filters(&mut count_qb, &query);
    let total: i64 = count_qb
        .build_query_scalar()
        .fetch_one(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    let mut data_qb = QueryBuilder::new(
        "SELECT id, run_id, payslip_id, action, actor_id, actor_role, details, created_at \
         FROM audit_log WHERE 1=1",
    );
    push_audit_filters(&mut data_qb, &query);
    data_qb.push(" ORDER BY id DESC LIMIT ");
    data_qb.push_bind(per_page as i64);
    data_qb.push(" OFFSET ");
    data_qb.push_bind(offset as i64);

    let data = data_qb
        .build_query_as::<AuditEntry>()
        .fetch_all(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(AuditListResponse {
        data,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}
