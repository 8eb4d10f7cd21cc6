//! Read interfaces for the collaborators the engine depends on.
//!
//! Employee directory, timesheet aggregates, bonuses and deductions are
//! separate subsystems; the engine consumes them through these traits so the
//! computation can be exercised against stub sources. `DbSources` is the
//! production implementation reading the collaborator tables directly.

use std::future::Future;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{FromRow, MySqlPool};
use strum_macros::{Display, EnumString};

use crate::error::AppError;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum PayFrequency {
    Monthly,
    Daily,
    Hourly,
}

#[derive(Debug, Clone, FromRow)]
pub struct EligibleEmployee {
    pub id: u64,
    pub full_name: String,
    pub branch_id: Option<u64>,
    pub department_id: Option<u64>,
    pub position_id: Option<u64>,
    pub pay_frequency: String,
    pub base_salary: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HoursAggregate {
    pub regular: Decimal,
    pub overtime: Decimal,
    pub night: Decimal,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeductionTotals {
    pub voluntary: Decimal,
    pub hmo: Decimal,
}

pub trait EmployeeDirectory {
    /// Active employees assigned to the branch, plus employees with no
    /// branch assignment at all (open-enrollment fallback).
    fn eligible_employees(
        &self,
        branch_id: u64,
        as_of: NaiveDate,
    ) -> impl Future<Output = Result<Vec<EligibleEmployee>, AppError>> + Send;
}

pub trait TimesheetSource {
    /// Approved regular/overtime/night-shift hour totals within the period.
    fn approved_hours(
        &self,
        employee_id: u64,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> impl Future<Output = Result<HoursAggregate, AppError>> + Send;
}

pub trait BonusSource {
    /// Bonuses in computed/approved/paid states within the period.
    fn bonus_total(
        &self,
        employee_id: u64,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> impl Future<Output = Result<Decimal, AppError>> + Send;

    /// Recurring allowances active at any point of the period.
    fn allowance_total(
        &self,
        employee_id: u64,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> impl Future<Output = Result<Decimal, AppError>> + Send;
}

pub trait DeductionSource {
    /// Voluntary (statutory-exempt) and HMO-premium deduction totals within
    /// the period, separately.
    fn deduction_totals(
        &self,
        employee_id: u64,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> impl Future<Output = Result<DeductionTotals, AppError>> + Send;
}

/// Production sources backed by the shared MySQL pool.
#[derive(Clone)]
pub struct DbSources {
    pool: MySqlPool,
}

impl DbSources {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl EmployeeDirectory for DbSources {
    async fn eligible_employees(
        &self,
        branch_id: u64,
        _as_of: NaiveDate,
    ) -> Result<Vec<EligibleEmployee>, AppError> {
        let rows = sqlx::query_as::<_, EligibleEmployee>(
            r#"
            SELECT id, full_name, branch_id, department_id, position_id,
                   pay_frequency, base_salary
            FROM employees
            WHERE is_active = 1
              AND (branch_id = ? OR branch_id IS NULL)
            ORDER BY id
            "#,
        )
        .bind(branch_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

impl TimesheetSource for DbSources {
    async fn approved_hours(
        &self,
        employee_id: u64,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<HoursAggregate, AppError> {
        let (regular, overtime, night) = sqlx::query_as::<_, (Decimal, Decimal, Decimal)>(
            r#"
            SELECT COALESCE(SUM(regular_hours), 0),
                   COALESCE(SUM(overtime_hours), 0),
                   COALESCE(SUM(night_hours), 0)
            FROM timesheets
            WHERE employee_id = ?
              AND work_date BETWEEN ? AND ?
              AND status = 'approved'
            "#,
        )
        .bind(employee_id)
        .bind(period_start)
        .bind(period_end)
        .fetch_one(&self.pool)
        .await?;

        Ok(HoursAggregate {
            regular,
            overtime,
            night,
        })
    }
}

impl BonusSource for DbSources {
    async fn bonus_total(
        &self,
        employee_id: u64,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<Decimal, AppError> {
        let total = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(amount), 0)
            FROM bonuses
            WHERE employee_id = ?
              AND bonus_date BETWEEN ? AND ?
              AND status IN ('computed', 'approved', 'paid')
            "#,
        )
        .bind(employee_id)
        .bind(period_start)
        .bind(period_end)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    async fn allowance_total(
        &self,
        employee_id: u64,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<Decimal, AppError> {
        let total = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(amount), 0)
            FROM allowances
            WHERE employee_id = ?
              AND start_date <= ?
              AND (end_date IS NULL OR end_date >= ?)
            "#,
        )
        .bind(employee_id)
        .bind(period_end)
        .bind(period_start)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }
}

impl DeductionSource for DbSources {
    async fn deduction_totals(
        &self,
        employee_id: u64,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<DeductionTotals, AppError> {
        let (voluntary, hmo) = sqlx::query_as::<_, (Decimal, Decimal)>(
            r#"
            SELECT COALESCE(SUM(CASE WHEN kind = 'voluntary' THEN amount END), 0),
                   COALESCE(SUM(CASE WHEN kind = 'hmo' THEN amount END), 0)
            FROM deductions
            WHERE employee_id = ?
              AND deduction_date BETWEEN ? AND ?
            "#,
        )
        .bind(employee_id)
        .bind(period_start)
        .bind(period_end)
        .fetch_one(&self.pool)
        .await?;

        Ok(DeductionTotals { voluntary, hmo })
    }
}
