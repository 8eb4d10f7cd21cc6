//! Payroll run processing.
//!
//! `process_run` is the long transaction of the system: it claims the run,
//! computes one payslip per eligible employee and aggregates totals, all
//! inside a single database transaction. An error anywhere rolls the whole
//! run back; an employee without a usable salary record is skipped and
//! reported, not failed.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::actor::Actor;
use crate::audit;
use crate::error::AppError;
use crate::model::payroll_run::{PayrollRun, RunStatus};
use crate::model::payslip::{ComputationTrace, TRACE_SCHEMA_VERSION};
use crate::model::round2;
use crate::payroll::calendar;
use crate::payroll::rates::{self, BranchPayConfig};
use crate::payroll::sources::{
    BonusSource, DeductionSource, EligibleEmployee, EmployeeDirectory, HoursAggregate,
    PayFrequency, TimesheetSource,
};
use crate::payroll::tax;

/// Hours in a working day for hourly-equivalent rates.
const HOURS_PER_DAY: Decimal = Decimal::from_parts(8, 0, 0, false, 0);
/// Night-shift differential over the hourly-equivalent rate.
const NIGHT_DIFF_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2); // 0.10

#[derive(Debug, Clone)]
pub struct PayInputs {
    pub base_salary: Decimal,
    pub frequency: PayFrequency,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub hours: HoursAggregate,
    pub allowances: Decimal,
    pub bonuses: Decimal,
    pub other_deductions: Decimal,
}

#[derive(Debug, Clone)]
pub struct PayBreakdown {
    pub working_days: u32,
    pub hourly_rate: Decimal,
    pub basic_pay: Decimal,
    pub overtime_pay: Decimal,
    pub night_diff_pay: Decimal,
    pub allowances: Decimal,
    pub bonuses: Decimal,
    pub gross_pay: Decimal,
    pub social_insurance: Decimal,
    pub health_insurance: Decimal,
    pub housing_fund: Decimal,
    pub taxable_income: Decimal,
    pub withholding_tax: Decimal,
    pub other_deductions: Decimal,
    pub total_deductions: Decimal,
    pub net_pay: Decimal,
}

/// Pure payslip arithmetic. Every monetary sub-total is rounded to 2 dp as
/// it is produced, so the persisted components always add up exactly.
pub fn compute_pay(inputs: &PayInputs, cfg: &BranchPayConfig) -> Result<PayBreakdown, AppError> {
    let working_days = calendar::prorated_working_days(inputs.period_start, inputs.period_end);
    let monthly_days = Decimal::from(calendar::MONTHLY_WORKING_DAYS);

    let hourly_rate = round2(match inputs.frequency {
        PayFrequency::Monthly => inputs.base_salary / (monthly_days * HOURS_PER_DAY),
        PayFrequency::Daily => inputs.base_salary / HOURS_PER_DAY,
        PayFrequency::Hourly => inputs.base_salary,
    });

    let basic_pay = round2(match inputs.frequency {
        // multiply before dividing so a full 22-day period pays the exact base
        PayFrequency::Monthly => inputs.base_salary * Decimal::from(working_days) / monthly_days,
        PayFrequency::Daily => inputs.base_salary * Decimal::from(working_days),
        PayFrequency::Hourly => inputs.base_salary * inputs.hours.regular,
    });

    let overtime_pay = round2(hourly_rate * cfg.overtime_multiplier * inputs.hours.overtime);
    let night_diff_pay = round2(hourly_rate * NIGHT_DIFF_RATE * inputs.hours.night);
    let allowances = round2(inputs.allowances);
    let bonuses = round2(inputs.bonuses);

    let gross_pay = round2(basic_pay + overtime_pay + night_diff_pay + allowances + bonuses);

    let social_insurance = round2(gross_pay * cfg.social_insurance_rate);
    let health_insurance = round2(gross_pay * cfg.health_insurance_rate);
    let housing_fund = round2(gross_pay * cfg.housing_fund_rate);

    let taxable_income = gross_pay - (social_insurance + health_insurance + housing_fund);
    let withholding_tax = tax::withholding_tax(&cfg.tax_table_version, taxable_income)?;

    let other_deductions = round2(inputs.other_deductions);
    let total_deductions = round2(
        social_insurance + health_insurance + housing_fund + withholding_tax + other_deductions,
    );
    let net_pay = gross_pay - total_deductions;

    Ok(PayBreakdown {
        working_days,
        hourly_rate,
        basic_pay,
        overtime_pay,
        night_diff_pay,
        allowances,
        bonuses,
        gross_pay,
        social_insurance,
        health_insurance,
        housing_fund,
        taxable_income,
        withholding_tax,
        other_deductions,
        total_deductions,
        net_pay,
    })
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SkippedEmployee {
    pub employee_id: u64,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RunOutcome {
    pub run_id: u64,
    #[schema(example = "completed")]
    pub status: String,
    pub employee_count: i32,
    pub total_gross: Decimal,
    pub total_deductions: Decimal,
    pub total_net: Decimal,
    /// Employees excluded from the run, for operator reconciliation.
    pub skipped: Vec<SkippedEmployee>,
}

pub async fn create_run(
    pool: &MySqlPool,
    actor: &Actor,
    branch_id: u64,
    period_start: NaiveDate,
    period_end: NaiveDate,
    pay_date: NaiveDate,
) -> Result<u64, AppError> {
    if period_start > period_end {
        return Err(AppError::Validation(
            "period_start cannot be after period_end".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    // One run per branch and period slice: overlapping periods are refused
    // so the same days cannot be paid twice.
    let overlapping = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM payroll_runs
        WHERE branch_id = ?
          AND period_start <= ?
          AND period_end >= ?
        "#,
    )
    .bind(branch_id)
    .bind(period_end)
    .bind(period_start)
    .fetch_one(&mut *tx)
    .await?;

    if overlapping > 0 {
        return Err(AppError::Validation(format!(
            "branch {branch_id} already has a payroll run overlapping {period_start}..{period_end}"
        )));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO payroll_runs
            (branch_id, period_start, period_end, pay_date, status, created_by)
        VALUES (?, ?, ?, ?, 'draft', ?)
        "#,
    )
    .bind(branch_id)
    .bind(period_start)
    .bind(period_end)
    .bind(pay_date)
    .bind(actor.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let run_id = result.last_insert_id();
    audit::record(
        pool,
        Some(run_id),
        None,
        "payroll_run_created",
        actor,
        serde_json::json!({ "branch_id": branch_id, "period_start": period_start, "period_end": period_end }),
    )
    .await;

    Ok(run_id)
}

pub async fn process_run<S>(
    pool: &MySqlPool,
    sources: &S,
    actor: &Actor,
    run_id: u64,
) -> Result<RunOutcome, AppError>
where
    S: EmployeeDirectory + TimesheetSource + BonusSource + DeductionSource,
{
    let mut tx = pool.begin().await?;

    // Claim the run. The conditional update is both the status transition
    // and the concurrency guard: the row stays locked until commit, and a
    // second processor finds the status already moved.
    let claimed = sqlx::query(
        r#"UPDATE payroll_runs SET status = 'processing' WHERE id = ? AND status = 'draft'"#,
    )
    .bind(run_id)
    .execute(&mut *tx)
    .await?;

    if claimed.rows_affected() == 0 {
        let status = sqlx::query_scalar::<_, String>(
            r#"SELECT status FROM payroll_runs WHERE id = ?"#,
        )
        .bind(run_id)
        .fetch_optional(&mut *tx)
        .await?;

        return Err(match status {
            None => AppError::not_found("payroll run", run_id),
            Some(s) => AppError::invalid_state(
                "payroll run",
                run_id,
                s,
                "only a draft run can be processed",
            ),
        });
    }

    let run = sqlx::query_as::<_, PayrollRun>(
        r#"
        SELECT id, branch_id, period_start, period_end, pay_date, status,
               total_gross, total_deductions, total_net, employee_count,
               created_by, processed_at, approved_by, approved_at,
               locked_by, locked_at, created_at
        FROM payroll_runs
        WHERE id = ?
        "#,
    )
    .bind(run_id)
    .fetch_one(&mut *tx)
    .await?;

    let cfg = rates::branch_pay_config(&mut *tx, run.branch_id).await?;
    let employees = sources
        .eligible_employees(run.branch_id, run.period_end)
        .await?;

    let mut skipped: Vec<SkippedEmployee> = Vec::new();
    let mut employee_count: i32 = 0;
    let mut total_gross = Decimal::ZERO;
    let mut total_deductions = Decimal::ZERO;
    let mut total_net = Decimal::ZERO;

    for emp in &employees {
        let frequency = match emp.pay_frequency.parse::<PayFrequency>() {
            Ok(f) => f,
            Err(_) => {
                tracing::warn!(
                    run_id,
                    employee_id = emp.id,
                    frequency = %emp.pay_frequency,
                    "skipping employee with unknown pay frequency"
                );
                skipped.push(SkippedEmployee {
                    employee_id: emp.id,
                    reason: format!("unknown pay frequency '{}'", emp.pay_frequency),
                });
                continue;
            }
        };

        // Grade mapping is the salary truth; directory base salary is the
        // fallback for unmapped employees.
        let mapped_salary = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT current_salary
            FROM employee_grade_mappings
            WHERE employee_id = ?
              AND effective_date <= ?
              AND (end_date IS NULL OR end_date >= ?)
            ORDER BY effective_date DESC
            LIMIT 1
            "#,
        )
        .bind(emp.id)
        .bind(run.period_end)
        .bind(run.period_end)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(base_salary) = mapped_salary.or(emp.base_salary) else {
            tracing::warn!(run_id, employee_id = emp.id, "skipping employee with no salary record");
            skipped.push(SkippedEmployee {
                employee_id: emp.id,
                reason: "no current salary record".to_string(),
            });
            continue;
        };

        let slip = compute_employee_payslip(sources, &run, &cfg, emp, frequency, base_salary)
            .await?;

        let trace_json = slip.trace.encode()?;
        sqlx::query(
            r#"
            INSERT INTO payslips
                (run_id, employee_id, branch_id, period_start, period_end,
                 basic_pay, overtime_pay, night_diff_pay, allowances, bonuses,
                 gross_pay, social_insurance, health_insurance, housing_fund,
                 withholding_tax, other_deductions, total_deductions, net_pay,
                 status, detail)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'active', ?)
            "#,
        )
        .bind(run.id)
        .bind(emp.id)
        .bind(run.branch_id)
        .bind(run.period_start)
        .bind(run.period_end)
        .bind(slip.breakdown.basic_pay)
        .bind(slip.breakdown.overtime_pay)
        .bind(slip.breakdown.night_diff_pay)
        .bind(slip.breakdown.allowances)
        .bind(slip.breakdown.bonuses)
        .bind(slip.breakdown.gross_pay)
        .bind(slip.breakdown.social_insurance)
        .bind(slip.breakdown.health_insurance)
        .bind(slip.breakdown.housing_fund)
        .bind(slip.breakdown.withholding_tax)
        .bind(slip.breakdown.other_deductions)
        .bind(slip.breakdown.total_deductions)
        .bind(slip.breakdown.net_pay)
        .bind(trace_json)
        .execute(&mut *tx)
        .await?;

        employee_count += 1;
        total_gross += slip.breakdown.gross_pay;
        total_deductions += slip.breakdown.total_deductions;
        total_net += slip.breakdown.net_pay;
    }

    sqlx::query(
        r#"
        UPDATE payroll_runs
        SET status = 'completed', total_gross = ?, total_deductions = ?,
            total_net = ?, employee_count = ?, processed_at = NOW()
        WHERE id = ?
        "#,
    )
    .bind(total_gross)
    .bind(total_deductions)
    .bind(total_net)
    .bind(employee_count)
    .bind(run_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        run_id,
        employee_count,
        skipped = skipped.len(),
        %total_net,
        "payroll run completed"
    );

    audit::record(
        pool,
        Some(run_id),
        None,
        "payroll_run_processed",
        actor,
        serde_json::json!({
            "employee_count": employee_count,
            "skipped": skipped.len(),
            "total_gross": total_gross,
            "total_net": total_net,
        }),
    )
    .await;

    Ok(RunOutcome {
        run_id,
        status: RunStatus::Completed.to_string(),
        employee_count,
        total_gross,
        total_deductions,
        total_net,
        skipped,
    })
}

struct EmployeeSlip {
    breakdown: PayBreakdown,
    trace: ComputationTrace,
}

/// Gather collaborator inputs for one employee and run the computation.
/// Collaborator failures degrade to zero contributions; only the store and
/// the computation itself can abort the run.
async fn compute_employee_payslip<S>(
    sources: &S,
    run: &PayrollRun,
    cfg: &BranchPayConfig,
    emp: &EligibleEmployee,
    frequency: PayFrequency,
    base_salary: Decimal,
) -> Result<EmployeeSlip, AppError>
where
    S: TimesheetSource + BonusSource + DeductionSource,
{
    let hours = match sources
        .approved_hours(emp.id, run.period_start, run.period_end)
        .await
    {
        Ok(h) => h,
        Err(e) => {
            tracing::warn!(employee_id = emp.id, error = %e, "timesheet source unavailable, using zero hours");
            HoursAggregate::default()
        }
    };

    let bonuses = match sources
        .bonus_total(emp.id, run.period_start, run.period_end)
        .await
    {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(employee_id = emp.id, error = %e, "bonus source unavailable, using zero");
            Decimal::ZERO
        }
    };

    let allowances = match sources
        .allowance_total(emp.id, run.period_start, run.period_end)
        .await
    {
        Ok(a) => a,
        Err(e) => {
            tracing::warn!(employee_id = emp.id, error = %e, "allowance source unavailable, using zero");
            Decimal::ZERO
        }
    };

    let deductions = match sources
        .deduction_totals(emp.id, run.period_start, run.period_end)
        .await
    {
        Ok(d) => d,
        Err(e) => {
            tracing::warn!(employee_id = emp.id, error = %e, "deduction source unavailable, using zero");
            crate::payroll::sources::DeductionTotals::default()
        }
    };

    let inputs = PayInputs {
        base_salary,
        frequency,
        period_start: run.period_start,
        period_end: run.period_end,
        hours,
        allowances,
        bonuses,
        other_deductions: deductions.voluntary + deductions.hmo,
    };

    let breakdown = compute_pay(&inputs, cfg)?;

    let trace = ComputationTrace {
        schema_version: TRACE_SCHEMA_VERSION,
        trace_id: Uuid::new_v4(),
        pay_frequency: frequency.to_string(),
        base_salary,
        working_days: breakdown.working_days,
        hourly_rate: breakdown.hourly_rate,
        regular_hours: hours.regular,
        overtime_hours: hours.overtime,
        night_hours: hours.night,
        overtime_multiplier: cfg.overtime_multiplier,
        social_insurance_rate: cfg.social_insurance_rate,
        health_insurance_rate: cfg.health_insurance_rate,
        housing_fund_rate: cfg.housing_fund_rate,
        tax_table_version: cfg.tax_table_version.clone(),
        taxable_income: breakdown.taxable_income,
    };

    Ok(EmployeeSlip { breakdown, trace })
}

/// Completed -> Approved.
pub async fn approve_run(pool: &MySqlPool, actor: &Actor, run_id: u64) -> Result<(), AppError> {
    advance_run(
        pool,
        actor,
        run_id,
        RunStatus::Approved,
        r#"
        UPDATE payroll_runs
        SET status = 'approved', approved_by = ?, approved_at = NOW()
        WHERE id = ? AND status = 'completed'
        "#,
        "only a completed run can be approved",
        "payroll_run_approved",
    )
    .await
}

/// Approved -> Locked. Past this point payslips are immutable.
pub async fn lock_run(pool: &MySqlPool, actor: &Actor, run_id: u64) -> Result<(), AppError> {
    advance_run(
        pool,
        actor,
        run_id,
        RunStatus::Locked,
        r#"
        UPDATE payroll_runs
        SET status = 'locked', locked_by = ?, locked_at = NOW()
        WHERE id = ? AND status = 'approved'
        "#,
        "only an approved run can be locked",
        "payroll_run_locked",
    )
    .await
}

async fn advance_run(
    pool: &MySqlPool,
    actor: &Actor,
    run_id: u64,
    target: RunStatus,
    sql: &str,
    requirement: &str,
    action: &str,
) -> Result<(), AppError> {
    let result = sqlx::query(sql)
        .bind(actor.id)
        .bind(run_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        let status =
            sqlx::query_scalar::<_, String>(r#"SELECT status FROM payroll_runs WHERE id = ?"#)
                .bind(run_id)
                .fetch_optional(pool)
                .await?;

        return Err(match status {
            None => AppError::not_found("payroll run", run_id),
            Some(s) => AppError::invalid_state("payroll run", run_id, s, requirement),
        });
    }

    audit::record(
        pool,
        Some(run_id),
        None,
        action,
        actor,
        serde_json::json!({ "status": target.to_string() }),
    )
    .await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payroll::rates::DEFAULT_BRANCH_CONFIG;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn monthly_inputs(base: &str) -> PayInputs {
        PayInputs {
            base_salary: dec(base),
            frequency: PayFrequency::Monthly,
            // July 2025: 23 weekdays, capped at 22
            period_start: date(2025, 7, 1),
            period_end: date(2025, 7, 31),
            hours: HoursAggregate::default(),
            allowances: Decimal::ZERO,
            bonuses: Decimal::ZERO,
            other_deductions: Decimal::ZERO,
        }
    }

    fn example_config() -> BranchPayConfig {
        BranchPayConfig {
            overtime_multiplier: dec("1.25"),
            social_insurance_rate: dec("0.045"),
            health_insurance_rate: dec("0.02"),
            housing_fund_rate: dec("0.01"),
            tax_table_version: "train-2018".to_string(),
        }
    }

    /// The worked reference case: 30,000 monthly, full month, no extras.
    #[test]
    fn test_monthly_full_period_reference_figures() {
        let breakdown = compute_pay(&monthly_inputs("30000"), &example_config()).unwrap();

        assert_eq!(breakdown.basic_pay, dec("30000.00"));
        assert_eq!(breakdown.gross_pay, dec("30000.00"));
        assert_eq!(breakdown.social_insurance, dec("1350.00"));
        assert_eq!(breakdown.health_insurance, dec("600.00"));
        assert_eq!(breakdown.housing_fund, dec("300.00"));
        assert_eq!(breakdown.taxable_income, dec("27750.00"));
        assert_eq!(breakdown.withholding_tax, dec("1383.40"));
        assert_eq!(breakdown.total_deductions, dec("3633.40"));
        assert_eq!(breakdown.net_pay, dec("26366.60"));
    }

    #[test]
    fn test_net_equals_gross_minus_deductions() {
        let mut inputs = monthly_inputs("45123.45");
        inputs.hours.overtime = dec("10.5");
        inputs.hours.night = dec("16");
        inputs.allowances = dec("1500");
        inputs.bonuses = dec("2000");
        inputs.other_deductions = dec("750.25");

        let b = compute_pay(&inputs, &example_config()).unwrap();
        assert_eq!(
            b.net_pay,
            b.gross_pay
                - (b.social_insurance
                    + b.health_insurance
                    + b.housing_fund
                    + b.withholding_tax
                    + b.other_deductions)
        );
        assert_eq!(
            b.gross_pay,
            b.basic_pay + b.overtime_pay + b.night_diff_pay + b.allowances + b.bonuses
        );
    }

    #[test]
    fn test_partial_month_prorates() {
        let mut inputs = monthly_inputs("22000");
        // 1st..15th of July 2025 has 11 weekdays
        inputs.period_end = date(2025, 7, 15);

        let b = compute_pay(&inputs, &example_config()).unwrap();
        assert_eq!(b.working_days, 11);
        assert_eq!(b.basic_pay, dec("11000.00"));
    }

    #[test]
    fn test_overtime_and_night_differential() {
        let mut inputs = monthly_inputs("35200");
        inputs.hours.overtime = dec("8");
        inputs.hours.night = dec("24");

        let b = compute_pay(&inputs, &example_config()).unwrap();
        // hourly equivalent: 35,200 / 176 = 200.00
        assert_eq!(b.hourly_rate, dec("200.00"));
        // 200 * 1.25 * 8
        assert_eq!(b.overtime_pay, dec("2000.00"));
        // 200 * 0.10 * 24
        assert_eq!(b.night_diff_pay, dec("480.00"));
    }

    #[test]
    fn test_daily_frequency_pays_per_weekday() {
        let inputs = PayInputs {
            base_salary: dec("1200"),
            frequency: PayFrequency::Daily,
            period_start: date(2025, 7, 7),
            period_end: date(2025, 7, 11), // one full week
            hours: HoursAggregate::default(),
            allowances: Decimal::ZERO,
            bonuses: Decimal::ZERO,
            other_deductions: Decimal::ZERO,
        };

        let b = compute_pay(&inputs, &example_config()).unwrap();
        assert_eq!(b.basic_pay, dec("6000.00"));
        assert_eq!(b.hourly_rate, dec("150.00"));
    }

    #[test]
    fn test_hourly_frequency_pays_logged_hours() {
        let inputs = PayInputs {
            base_salary: dec("250"),
            frequency: PayFrequency::Hourly,
            period_start: date(2025, 7, 1),
            period_end: date(2025, 7, 15),
            hours: HoursAggregate {
                regular: dec("80"),
                overtime: dec("4"),
                night: Decimal::ZERO,
            },
            allowances: Decimal::ZERO,
            bonuses: Decimal::ZERO,
            other_deductions: Decimal::ZERO,
        };

        let b = compute_pay(&inputs, &example_config()).unwrap();
        assert_eq!(b.basic_pay, dec("20000.00"));
        // 250 * 1.25 * 4
        assert_eq!(b.overtime_pay, dec("1250.00"));
    }

    struct UnavailableSources;

    impl TimesheetSource for UnavailableSources {
        async fn approved_hours(
            &self,
            _employee_id: u64,
            _period_start: NaiveDate,
            _period_end: NaiveDate,
        ) -> Result<HoursAggregate, AppError> {
            Err(AppError::DependencyUnavailable {
                name: "timesheets",
                message: "connection refused".to_string(),
            })
        }
    }

    impl BonusSource for UnavailableSources {
        async fn bonus_total(
            &self,
            _employee_id: u64,
            _period_start: NaiveDate,
            _period_end: NaiveDate,
        ) -> Result<Decimal, AppError> {
            Err(AppError::DependencyUnavailable {
                name: "bonuses",
                message: "connection refused".to_string(),
            })
        }

        async fn allowance_total(
            &self,
            _employee_id: u64,
            _period_start: NaiveDate,
            _period_end: NaiveDate,
        ) -> Result<Decimal, AppError> {
            Err(AppError::DependencyUnavailable {
                name: "allowances",
                message: "connection refused".to_string(),
            })
        }
    }

    impl DeductionSource for UnavailableSources {
        async fn deduction_totals(
            &self,
            _employee_id: u64,
            _period_start: NaiveDate,
            _period_end: NaiveDate,
        ) -> Result<crate::payroll::sources::DeductionTotals, AppError> {
            Err(AppError::DependencyUnavailable {
                name: "deductions",
                message: "connection refused".to_string(),
            })
        }
    }

    /// Collaborator outages degrade to zero contributions instead of
    /// failing the employee's payslip.
    #[test]
    fn test_unavailable_collaborators_degrade_to_zero() {
        let run = PayrollRun {
            id: 1,
            branch_id: 1,
            period_start: date(2025, 7, 1),
            period_end: date(2025, 7, 31),
            pay_date: date(2025, 8, 5),
            status: "processing".to_string(),
            total_gross: Decimal::ZERO,
            total_deductions: Decimal::ZERO,
            total_net: Decimal::ZERO,
            employee_count: 0,
            created_by: 7,
            processed_at: None,
            approved_by: None,
            approved_at: None,
            locked_by: None,
            locked_at: None,
            created_at: chrono::DateTime::<chrono::Utc>::MIN_UTC,
        };
        let emp = EligibleEmployee {
            id: 1001,
            full_name: "Test Employee".to_string(),
            branch_id: Some(1),
            department_id: None,
            position_id: None,
            pay_frequency: "monthly".to_string(),
            base_salary: Some(dec("30000")),
        };

        let slip = futures::executor::block_on(compute_employee_payslip(
            &UnavailableSources,
            &run,
            &example_config(),
            &emp,
            PayFrequency::Monthly,
            dec("30000"),
        ))
        .unwrap();

        // identical to the reference case with no extras
        assert_eq!(slip.breakdown.overtime_pay, dec("0.00"));
        assert_eq!(slip.breakdown.bonuses, dec("0.00"));
        assert_eq!(slip.breakdown.other_deductions, dec("0.00"));
        assert_eq!(slip.breakdown.net_pay, dec("26366.60"));
        assert_eq!(slip.trace.tax_table_version, "train-2018");
        assert_eq!(slip.trace.base_salary, dec("30000"));
    }

    #[test]
    fn test_default_config_uses_2023_table() {
        let b = compute_pay(&monthly_inputs("30000"), &DEFAULT_BRANCH_CONFIG).unwrap();
        // same taxable income, 15% marginal bracket
        assert_eq!(b.withholding_tax, dec("1037.55"));
    }

    #[test]
    fn test_unknown_tax_version_fails_computation() {
        let mut cfg = example_config();
        cfg.tax_table_version = "missing".to_string();
        assert!(compute_pay(&monthly_inputs("30000"), &cfg).is_err());
    }
}
