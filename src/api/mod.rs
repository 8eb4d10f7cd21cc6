pub mod audit_log;
pub mod grade;
pub mod grade_mapping;
pub mod grade_revision;
pub mod pay_adjustment;
pub mod payroll_run;
pub mod payslip;
pub mod salary_adjustment;
