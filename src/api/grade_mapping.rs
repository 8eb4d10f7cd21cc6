use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{MySql, MySqlPool, QueryBuilder};
use utoipa::{IntoParams, ToSchema};

use crate::actor::Actor;
use crate::audit;
use crate::error::AppError;
use crate::model::grade_mapping::{BandStatus, EmployeeGradeMapping, calculate_salary_status};
use crate::workflow::grades;

#[derive(Deserialize, ToSchema)]
pub struct CreateMapping {
    #[schema(example = 1001)]
    pub employee_id: u64,
    #[schema(example = 3)]
    pub grade_id: u64,
    #[schema(example = 7)]
    pub step_id: u64,
    #[schema(value_type = f64, example = 30000.0)]
    pub current_salary: Decimal,
    #[schema(example = "2026-02-01", value_type = String, format = "date")]
    pub effective_date: NaiveDate,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct MappingFilter {
    #[schema(example = 1001)]
    /// Filter by employee
    pub employee_id: Option<u64>,
    #[schema(example = 3)]
    /// Filter by grade
    pub grade_id: Option<u64>,
    #[schema(example = "within_band")]
    /// Filter by band status
    pub status: Option<String>,
    /// Only mappings current today
    pub current_only: Option<bool>,
    #[schema(example = 1)]
    pub page: Option<u64>,
    #[schema(example = 10)]
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct MappingListResponse {
    pub data: Vec<EmployeeGradeMapping>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

const MAPPING_COLUMNS: &str = "id, employee_id, grade_id, step_id, current_salary, band_min, \
     band_max, status, effective_date, end_date, approved_by, created_at";

fn push_mapping_filters(qb: &mut QueryBuilder<MySql>, filter: &MappingFilter) {
    if let Some(employee_id) = filter.employee_id {
        qb.push(" AND employee_id = ").push_bind(employee_id);
    }
    if let Some(grade_id) = filter.grade_id {
        qb.push(" AND grade_id = ").push_bind(grade_id);
    }
    if let Some(status) = filter.status.as_deref() {
        qb.push(" AND status = ").push_bind(status.to_owned());
    }
    if filter.current_only.unwrap_or(false) {
        qb.push(" AND effective_date <= CURDATE() AND (end_date IS NULL OR end_date >= CURDATE())");
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/grade-mappings",
    request_body = CreateMapping,
    responses(
        (status = 201, description = "Mapping created pending review"),
        (status = 400, description = "Unknown step or step outside grade"),
        (status = 401),
        (status = 403)
    ),
    tag = "Grade Mappings"
)]
pub async fn create_mapping(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateMapping>,
) -> actix_web::Result<HttpResponse> {
    actor.require_hr_or_admin()?;

    // Band snapshot comes from the step at assignment time.
    let step = sqlx::query_as::<_, (u64, Decimal, Decimal)>(
        r#"SELECT grade_id, min_rate, max_rate FROM salary_steps WHERE id = ?"#,
    )
    .bind(payload.step_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(AppError::from)?;

    let Some((step_grade_id, band_min, band_max)) = step else {
        return Err(AppError::not_found("salary step", payload.step_id).into());
    };

    if step_grade_id != payload.grade_id {
        return Err(AppError::Validation(format!(
            "step {} does not belong to grade {}",
            payload.step_id, payload.grade_id
        ))
        .into());
    }

    let result = sqlx::query(
        r#"
        INSERT INTO employee_grade_mappings
            (employee_id, grade_id, step_id, current_salary, band_min,
             band_max, status, effective_date)
        VALUES (?, ?, ?, ?, ?, ?, 'pending_review', ?)
        "#,
    )
    .bind(payload.employee_id)
    .bind(payload.grade_id)
    .bind(payload.step_id)
    .bind(payload.current_salary)
    .bind(band_min)
    .bind(band_max)
    .bind(payload.effective_date)
    .execute(pool.get_ref())
    .await
    .map_err(AppError::from)?;

    let mapping_id = result.last_insert_id();

    audit::record(
        pool.get_ref(),
        None,
        None,
        "grade_mapping_created",
        &actor,
        serde_json::json!({
            "mapping_id": mapping_id,
            "employee_id": payload.employee_id,
            "band_status": calculate_salary_status(payload.current_salary, band_min, band_max)
                .to_string(),
        }),
    )
    .await;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Grade mapping created",
        "mapping_id": mapping_id,
        "status": BandStatus::PendingReview.to_string()
    })))
}

#[utoipa::path(
    put,
    path = "/api/v1/grade-mappings/{mapping_id}/approve",
    params(("mapping_id" = u64, Path, description = "Mapping to approve")),
    responses(
        (status = 200, description = "Mapping approved; prior mappings ended"),
        (status = 404),
        (status = 409, description = "Mapping is not pending review")
    ),
    tag = "Grade Mappings"
)]
pub async fn approve_mapping(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    actor.require_hr_or_admin()?;

    let band = grades::approve_mapping(pool.get_ref(), &actor, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Grade mapping approved",
        "band_status": band.to_string()
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/grade-mappings/{mapping_id}",
    params(("mapping_id" = u64, Path, description = "Mapping id")),
    responses(
        (status = 200, body = EmployeeGradeMapping),
        (status = 404)
    ),
    tag = "Grade Mappings"
)]
pub async fn get_mapping(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    actor.require_hr_or_admin()?;

    let mapping_id = path.into_inner();
    let mapping = sqlx::query_as::<_, EmployeeGradeMapping>(&format!(
        "SELECT {MAPPING_COLUMNS} FROM employee_grade_mappings WHERE id = ?"
    ))
    .bind(mapping_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(AppError::from)?;

    match mapping {
        Some(m) => Ok(HttpResponse::Ok().json(m)),
        None => Err(AppError::not_found("grade mapping", mapping_id).into()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/grade-mappings",
    params(MappingFilter),
    responses(
        (status = 200, description = "Paginated mapping list", body = MappingListResponse)
    ),
    tag = "Grade Mappings"
)]
pub async fn list_mappings(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    query: web::Query<MappingFilter>,
) -> actix_web::Result<HttpResponse> {
    actor.require_hr_or_admin()?;

    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM employee_grade_mappings WHERE 1=1");
    push_mapping_filters(&mut count_qb, &query);
    let total: i64 = count_qb
        .build_query_scalar()
        .fetch_one(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    let mut data_qb = QueryBuilder::new(format!(
        "SELECT {MAPPING_COLUMNS} FROM employee_grade_mappings WHERE 1=1"
    ));
    push_mapping_filters(&mut data_qb, &query);
    data_qb.push(" ORDER BY employee_id, effective_date DESC LIMIT ");
    data_qb.push_bind(per_page as i64);
    data_qb.push(" OFFSET ");
    data_qb.push_bind(offset as i64);

    let data = data_qb
        .build_query_as::<EmployeeGradeMapping>()
        .fetch_all(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(MappingListResponse {
        data,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}
