use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{MySql, MySqlPool, QueryBuilder};
use utoipa::{IntoParams, ToSchema};

use crate::actor::Actor;
use crate::error::AppError;
use crate::model::grade_revision::{GradeRevision, RevisionStatus};
use crate::workflow::revision::{self, ImplementOutcome, NewRevision};

#[derive(Deserialize, ToSchema)]
pub struct CreateRevision {
    #[schema(example = 3)]
    pub grade_id: u64,
    /// New band floor; supply all three band values or none.
    #[schema(value_type = Option<f64>)]
    pub new_min_rate: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub new_mid_rate: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub new_max_rate: Option<Decimal>,
    /// Uniform uplift applied to every step's base rate, mutually exclusive
    /// with band values.
    #[schema(value_type = Option<f64>, example = 5.0)]
    pub percent: Option<Decimal>,
    #[schema(example = "Annual market alignment")]
    pub reason: String,
    #[schema(example = "2026-03-01", value_type = String, format = "date")]
    pub effective_date: NaiveDate,
}

#[derive(Deserialize, ToSchema)]
pub struct RevisionStatusChange {
    /// Target status: pending_review, approved or rejected.
    #[schema(example = "approved")]
    pub status: RevisionStatus,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct RevisionFilter {
    #[schema(example = 3)]
    /// Filter by grade
    pub grade_id: Option<u64>,
    #[schema(example = "pending_review")]
    /// Filter by revision status
    pub status: Option<String>,
    #[schema(example = 1)]
    pub page: Option<u64>,
    #[schema(example = 10)]
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct RevisionListResponse {
    pub data: Vec<GradeRevision>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

const REVISION_COLUMNS: &str = "id, grade_id, prev_min_rate, prev_mid_rate, prev_max_rate, \
     new_min_rate, new_mid_rate, new_max_rate, percent, reason, status, \
     effective_date, created_by, reviewed_by, approved_by, implemented_by, \
     rejected_by, created_at";

fn push_revision_filters(qb: &mut QueryBuilder<MySql>, filter: &RevisionFilter) {
    if let Some(grade_id) = filter.grade_id {
        qb.push(" AND grade_id = ").push_bind(grade_id);
    }
    if let Some(status) = filter.status.as_deref() {
        qb.push(" AND status = ").push_bind(status.to_owned());
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/grade-revisions",
    request_body = CreateRevision,
    responses(
        (status = 201, description = "Revision created as draft"),
        (status = 400, description = "Neither or both of band values and percentage supplied"),
        (status = 404, description = "Grade not found")
    ),
    tag = "Grade Revisions"
)]
pub async fn create_revision(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateRevision>,
) -> actix_web::Result<HttpResponse> {
    actor.require_hr_or_admin()?;

    let payload = payload.into_inner();
    let revision_id = revision::create_revision(
        pool.get_ref(),
        &actor,
        NewRevision {
            grade_id: payload.grade_id,
            new_min_rate: payload.new_min_rate,
            new_mid_rate: payload.new_mid_rate,
            new_max_rate: payload.new_max_rate,
            percent: payload.percent,
            reason: payload.reason,
            effective_date: payload.effective_date,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Grade revision created",
        "revision_id": revision_id
    })))
}

#[utoipa::path(
    put,
    path = "/api/v1/grade-revisions/{revision_id}/status",
    request_body = RevisionStatusChange,
    params(("revision_id" = u64, Path, description = "Revision id")),
    responses(
        (status = 200, description = "Status changed"),
        (status = 400, description = "Implemented must go through the implement operation"),
        (status = 404),
        (status = 409, description = "Illegal transition")
    ),
    tag = "Grade Revisions"
)]
pub async fn change_status(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<RevisionStatusChange>,
) -> actix_web::Result<HttpResponse> {
    actor.require_hr_or_admin()?;

    revision::set_status(pool.get_ref(), &actor, path.into_inner(), payload.status).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Grade revision status changed",
        "status": payload.status.to_string()
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/grade-revisions/{revision_id}/implement",
    params(("revision_id" = u64, Path, description = "Revision to implement")),
    responses(
        (status = 200, description = "Revision implemented; adjustment drafts cascaded", body = ImplementOutcome),
        (status = 404),
        (status = 409, description = "Revision is not approved")
    ),
    tag = "Grade Revisions"
)]
pub async fn implement_revision(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    actor.require_admin()?;

    let outcome = revision::implement_revision(pool.get_ref(), &actor, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(outcome))
}

#[utoipa::path(
    get,
    path = "/api/v1/grade-revisions/{revision_id}",
    params(("revision_id" = u64, Path, description = "Revision id")),
    responses(
        (status = 200, body = GradeRevision),
        (status = 404)
    ),
    tag = "Grade Revisions"
)]
pub async fn get_revision(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    actor.require_hr_or_admin()?;

    let revision_id = path.into_inner();
    let revision = sqlx::query_as::<_, GradeRevision>(&format!(
        "SELECT {REVISION_COLUMNS} FROM grade_revisions WHERE id = ?"
    ))
    .bind(revision_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(AppError::from)?;

    match revision {
        Some(r) => Ok(HttpResponse::Ok().json(r)),
        None => Err(AppError::not_found("grade revision", revision_id).into()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/grade-revisions",
    params(RevisionFilter),
    responses(
        (status = 200, description = "Paginated revision list", body = RevisionListResponse)
    ),
    tag = "Grade Revisions"
)]
pub async fn list_revisions(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    query: web::Query<RevisionFilter>,
) -> actix_web::Result<HttpResponse> {
    actor.require_hr_or_admin()?;

    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM grade_revisions WHERE 1=1");
    push_revision_filters(&mut count_qb, &query);
    let total: i64 = count_qb
        .build_query_scalar()
        .fetch_one(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    let mut data_qb = QueryBuilder::new(format!(
        "SELECT {REVISION_COLUMNS} FROM grade_revisions WHERE 1=1"
    ));
    push_revision_filters(&mut data_qb, &query);
    data_qb.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    data_qb.push_bind(per_page as i64);
    data_qb.push(" OFFSET ");
    data_qb.push_bind(offset as i64);

    let data = data_qb
        .build_query_as::<GradeRevision>()
        .fetch_all(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(RevisionListResponse {
        data,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}
