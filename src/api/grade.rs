use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{MySql, MySqlPool, QueryBuilder};
use utoipa::{IntoParams, ToSchema};

use crate::actor::Actor;
use crate::audit;
use crate::error::AppError;
use crate::model::grade::{GradeStatus, SalaryGrade, SalaryStep, validate_band};
use crate::model::parse_status;
use crate::workflow::grades;

#[derive(Deserialize, ToSchema)]
pub struct CreateStep {
    #[schema(example = 1)]
    pub step_number: i32,
    #[schema(value_type = f64, example = 25000.0)]
    pub min_rate: Decimal,
    #[schema(value_type = f64, example = 30000.0)]
    pub base_rate: Decimal,
    #[schema(value_type = f64, example = 35000.0)]
    pub max_rate: Decimal,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateGrade {
    #[schema(example = "NUR-02")]
    pub code: String,
    #[schema(example = "Staff Nurse II")]
    pub name: String,
    pub department_id: Option<u64>,
    pub branch_id: Option<u64>,
    #[schema(value_type = f64, example = 25000.0)]
    pub min_rate: Decimal,
    #[schema(value_type = f64, example = 30000.0)]
    pub mid_rate: Decimal,
    #[schema(value_type = f64, example = 35000.0)]
    pub max_rate: Decimal,
    #[schema(example = "2026-01-01", value_type = String, format = "date")]
    pub effective_date: NaiveDate,
    pub steps: Vec<CreateStep>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateGrade {
    pub name: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub min_rate: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub mid_rate: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub max_rate: Option<Decimal>,
    #[schema(value_type = Option<String>, format = "date")]
    pub effective_date: Option<NaiveDate>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct GradeFilter {
    #[schema(example = "NUR-02")]
    /// Filter by grade code
    pub code: Option<String>,
    #[schema(example = "active")]
    /// Filter by grade status
    pub status: Option<String>,
    /// Filter by department scope
    pub department_id: Option<u64>,
    /// Filter by branch scope
    pub branch_id: Option<u64>,
    #[schema(example = 1)]
    pub page: Option<u64>,
    #[schema(example = 10)]
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct GradeListResponse {
    pub data: Vec<SalaryGrade>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[derive(Serialize, ToSchema)]
pub struct GradeDetailResponse {
    pub grade: SalaryGrade,
    pub steps: Vec<SalaryStep>,
}

const GRADE_COLUMNS: &str = "id, code, name, department_id, branch_id, min_rate, mid_rate, \
     max_rate, status, effective_date, end_date, created_by, approved_by, created_at";

fn push_grade_filters(qb: &mut QueryBuilder<MySql>, filter: &GradeFilter) {
    if let Some(code) = filter.code.as_deref() {
        qb.push(" AND code = ").push_bind(code.to_owned());
    }
    if let Some(status) = filter.status.as_deref() {
        qb.push(" AND status = ").push_bind(status.to_owned());
    }
    if let Some(department_id) = filter.department_id {
        qb.push(" AND department_id = ").push_bind(department_id);
    }
    if let Some(branch_id) = filter.branch_id {
        qb.push(" AND branch_id = ").push_bind(branch_id);
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/grades",
    request_body = CreateGrade,
    responses(
        (status = 201, description = "Grade created as draft"),
        (status = 400, description = "Invalid band or steps"),
        (status = 401),
        (status = 403)
    ),
    tag = "Grades"
)]
pub async fn create_grade(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateGrade>,
) -> actix_web::Result<HttpResponse> {
    actor.require_hr_or_admin()?;

    validate_band(payload.min_rate, payload.mid_rate, payload.max_rate)?;

    if payload.steps.is_empty() {
        return Err(AppError::Validation("a grade needs at least one step".to_string()).into());
    }

    let mut numbers: Vec<i32> = payload.steps.iter().map(|s| s.step_number).collect();
    numbers.sort_unstable();
    numbers.dedup();
    if numbers.len() != payload.steps.len() {
        return Err(
            AppError::Validation("step numbers must be unique within a grade".to_string()).into(),
        );
    }

    for step in &payload.steps {
        validate_band(step.min_rate, step.base_rate, step.max_rate)?;
    }

    let mut tx = pool.begin().await.map_err(AppError::from)?;

    let result = sqlx::query(
        r#"
        INSERT INTO salary_grades
            (code, name, department_id, branch_id, min_rate, mid_rate,
             max_rate, status, effective_date, created_by)
        VALUES (?, ?, ?, ?, ?, ?, ?, 'draft', ?, ?)
        "#,
    )
    .bind(&payload.code)
    .bind(&payload.name)
    .bind(payload.department_id)
    .bind(payload.branch_id)
    .bind(payload.min_rate)
    .bind(payload.mid_rate)
    .bind(payload.max_rate)
    .bind(payload.effective_date)
    .bind(actor.id)
    .execute(&mut *tx)
    .await
    .map_err(AppError::from)?;

    let grade_id = result.last_insert_id();

    for step in &payload.steps {
        sqlx::query(
            r#"
            INSERT INTO salary_steps (grade_id, step_number, min_rate, base_rate, max_rate)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(grade_id)
        .bind(step.step_number)
        .bind(step.min_rate)
        .bind(step.base_rate)
        .bind(step.max_rate)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?;
    }

    tx.commit().await.map_err(AppError::from)?;

    audit::record(
        pool.get_ref(),
        None,
        None,
        "salary_grade_created",
        &actor,
        serde_json::json!({ "grade_id": grade_id, "code": &payload.code }),
    )
    .await;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Salary grade created",
        "grade_id": grade_id
    })))
}

#[utoipa::path(
    put,
    path = "/api/v1/grades/{grade_id}",
    request_body = UpdateGrade,
    params(("grade_id" = u64, Path, description = "Grade id")),
    responses(
        (status = 200, description = "Grade updated"),
        (status = 404),
        (status = 409, description = "Only draft grades can be edited")
    ),
    tag = "Grades"
)]
pub async fn update_grade(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateGrade>,
) -> actix_web::Result<HttpResponse> {
    actor.require_hr_or_admin()?;

    let grade_id = path.into_inner();
    let current = sqlx::query_as::<_, SalaryGrade>(&format!(
        "SELECT {GRADE_COLUMNS} FROM salary_grades WHERE id = ?"
    ))
    .bind(grade_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(AppError::from)?
    .ok_or_else(|| AppError::not_found("salary grade", grade_id))?;

    let status: GradeStatus = parse_status("salary grade", &current.status)?;
    if status != GradeStatus::Draft {
        return Err(AppError::invalid_state(
            "salary grade",
            grade_id,
            current.status,
            "only a draft grade can be edited",
        )
        .into());
    }

    let name = payload.name.clone().unwrap_or(current.name);
    let min_rate = payload.min_rate.unwrap_or(current.min_rate);
    let mid_rate = payload.mid_rate.unwrap_or(current.mid_rate);
    let max_rate = payload.max_rate.unwrap_or(current.max_rate);
    let effective_date = payload.effective_date.unwrap_or(current.effective_date);

    validate_band(min_rate, mid_rate, max_rate)?;

    sqlx::query(
        r#"
        UPDATE salary_grades
        SET name = ?, min_rate = ?, mid_rate = ?, max_rate = ?, effective_date = ?
        WHERE id = ?
        "#,
    )
    .bind(&name)
    .bind(min_rate)
    .bind(mid_rate)
    .bind(max_rate)
    .bind(effective_date)
    .bind(grade_id)
    .execute(pool.get_ref())
    .await
    .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Salary grade updated"
    })))
}

#[utoipa::path(
    put,
    path = "/api/v1/grades/{grade_id}/approve",
    params(("grade_id" = u64, Path, description = "Grade to activate")),
    responses(
        (status = 200, description = "Grade activated; any prior active version superseded"),
        (status = 404),
        (status = 409, description = "Grade is not a draft")
    ),
    tag = "Grades"
)]
pub async fn approve_grade(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    actor.require_hr_or_admin()?;

    grades::approve_grade(pool.get_ref(), &actor, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Salary grade activated"
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/grades/{grade_id}",
    params(("grade_id" = u64, Path, description = "Grade id")),
    responses(
        (status = 200, description = "Grade with its steps", body = GradeDetailResponse),
        (status = 404)
    ),
    tag = "Grades"
)]
pub async fn get_grade(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    actor.require_hr_or_admin()?;

    let grade_id = path.into_inner();
    let grade = sqlx::query_as::<_, SalaryGrade>(&format!(
        "SELECT {GRADE_COLUMNS} FROM salary_grades WHERE id = ?"
    ))
    .bind(grade_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(AppError::from)?
    .ok_or_else(|| AppError::not_found("salary grade", grade_id))?;

    let steps = sqlx::query_as::<_, SalaryStep>(
        r#"
        SELECT id, grade_id, step_number, min_rate, base_rate, max_rate
        FROM salary_steps
        WHERE grade_id = ?
        ORDER BY step_number
        "#,
    )
    .bind(grade_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(GradeDetailResponse { grade, steps }))
}

#[utoipa::path(
    get,
    path = "/api/v1/grades",
    params(GradeFilter),
    responses(
        (status = 200, description = "Paginated grade list", body = GradeListResponse)
    ),
    tag = "Grades"
)]
pub async fn list_grades(
    actor: Actor,
    pool: web::Data<MySqlPool>,
    query: web::Query<GradeFilter>,
) -> actix_web::Result<HttpResponse> {
    actor.require_hr_or_admin()?;

    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM salary_grades WHERE 1=1");
    push_grade_filters(&mut count_qb, &query);
    let total: i64 = count_qb
        .build_query_scalar()
        .fetch_one(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    let mut data_qb =
        QueryBuilder::new(format!("SELECT {GRADE_COLUMNS} FROM salary_grades WHERE 1=1"));
    push_grade_filters(&mut data_qb, &query);
    data_qb.push(" ORDER BY code, effective_date DESC LIMIT ");
    data_qb.push_bind(per_page as i64);
    data_qb.push(" OFFSET ");
    data_qb.push_bind(offset as i64);

    let data = data_qb
        .build_query_as::<SalaryGrade>()
        .fetch_all(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(GradeListResponse {
        data,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}
