use crate::api::audit_log::{AuditFilter, AuditListResponse};
use crate::api::grade::{
    CreateGrade, CreateStep, GradeDetailResponse, GradeFilter, GradeListResponse, UpdateGrade,
};
use crate::api::grade_mapping::{CreateMapping, MappingFilter, MappingListResponse};
use crate::api::grade_revision::{
    CreateRevision, RevisionFilter, RevisionListResponse, RevisionStatusChange,
};
use crate::api::pay_adjustment::{
    CreateWorkflow, DetailRowsResponse, WorkflowDetailResponse, WorkflowFilter,
    WorkflowListResponse,
};
use crate::api::payroll_run::{CreateRun, RunFilter, RunListResponse};
use crate::api::payslip::{PayslipDetailResponse, PayslipFilter, PayslipListResponse};
use crate::api::salary_adjustment::{
    AdjustmentFilter, AdjustmentListResponse, AdjustmentStatusChange, CreateAdjustment,
};
use crate::audit::AuditEntry;
use crate::model::grade::{SalaryGrade, SalaryStep};
use crate::model::grade_mapping::EmployeeGradeMapping;
use crate::model::grade_revision::{GradeRevision, RevisionStatus};
use crate::model::pay_adjustment::{
    BatchAdjustmentType, PayAdjustmentDetail, PayAdjustmentWorkflow, TargetSet,
};
use crate::model::payroll_run::PayrollRun;
use crate::model::payslip::Payslip;
use crate::model::salary_adjustment::{AdjustmentStatus, SalaryAdjustment};
use crate::payroll::engine::{RunOutcome, SkippedEmployee};
use crate::workflow::batch::{ImpactSummary, ImplementSummary};
use crate::workflow::revision::ImplementOutcome;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Hospital HR Payroll API",
        version = "1.0.0",
        description = r#"
## Hospital HR/Payroll Back Office

This API powers the payroll back office of a hospital HR system.

### Key Features
- **Payroll Runs**
  - Create a run per branch and pay period, process it into payslips,
    approve and lock it
- **Salary Grades & Steps**
  - Grade bands with ordered steps, draft/active/superseded lifecycle
- **Employee Grade Mappings**
  - Time-bounded grade assignments with band-position tracking
- **Grade Revisions**
  - Band or percentage revisions cascading adjustment drafts to mapped
    employees
- **Salary Adjustments**
  - Per-employee salary changes through a review/approval state machine
- **Pay Adjustment Workflows**
  - Bulk adjustments with a persisted dry-run impact estimate

### Actor Identity
Requests carry `X-Actor-Id` and `X-Actor-Role` headers set by the upstream
gateway; every mutating operation records the acting user.

### Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::payroll_run::create_run,
        crate::api::payroll_run::list_runs,
        crate::api::payroll_run::get_run,
        crate::api::payroll_run::process_run,
        crate::api::payroll_run::approve_run,
        crate::api::payroll_run::lock_run,

        crate::api::payslip::list_payslips,
        crate::api::payslip::get_payslip,
        crate::api::payslip::void_payslip,

        crate::api::grade::create_grade,
        crate::api::grade::update_grade,
        crate::api::grade::approve_grade,
        crate::api::grade::get_grade,
        crate::api::grade::list_grades,

        crate::api::grade_mapping::create_mapping,
        crate::api::grade_mapping::approve_mapping,
        crate::api::grade_mapping::get_mapping,
        crate::api::grade_mapping::list_mappings,

        crate::api::grade_revision::create_revision,
        crate::api::grade_revision::change_status,
        crate::api::grade_revision::implement_revision,
        crate::api::grade_revision::get_revision,
        crate::api::grade_revision::list_revisions,

        crate::api::salary_adjustment::create_adjustment,
        crate::api::salary_adjustment::change_status,
        crate::api::salary_adjustment::get_adjustment,
        crate::api::salary_adjustment::list_adjustments,

        crate::api::pay_adjustment::create_workflow,
        crate::api::pay_adjustment::calculate_impact,
        crate::api::pay_adjustment::approve_workflow,
        crate::api::pay_adjustment::implement_workflow,
        crate::api::pay_adjustment::get_workflow,
        crate::api::pay_adjustment::list_details,
        crate::api::pay_adjustment::list_workflows,

        crate::api::audit_log::list_audit_entries
    ),
    components(
        schemas(
            CreateRun,
            RunFilter,
            RunListResponse,
            PayrollRun,
            RunOutcome,
            SkippedEmployee,
            PayslipFilter,
            PayslipListResponse,
            PayslipDetailResponse,
            Payslip,
            CreateGrade,
            CreateStep,
            UpdateGrade,
            GradeFilter,
            GradeListResponse,
            GradeDetailResponse,
            SalaryGrade,
            SalaryStep,
            CreateMapping,
            MappingFilter,
            MappingListResponse,
            EmployeeGradeMapping,
            CreateRevision,
            RevisionStatus,
            RevisionStatusChange,
            RevisionFilter,
            RevisionListResponse,
            GradeRevision,
            ImplementOutcome,
            CreateAdjustment,
            AdjustmentStatus,
            AdjustmentStatusChange,
            AdjustmentFilter,
            AdjustmentListResponse,
            SalaryAdjustment,
            CreateWorkflow,
            BatchAdjustmentType,
            WorkflowFilter,
            WorkflowListResponse,
            WorkflowDetailResponse,
            DetailRowsResponse,
            PayAdjustmentWorkflow,
            PayAdjustmentDetail,
            TargetSet,
            ImpactSummary,
            ImplementSummary,
            AuditFilter,
            AuditListResponse,
            AuditEntry
        )
    ),
    tags(
        (name = "Payroll Runs", description = "Payroll run lifecycle APIs"),
        (name = "Payslips", description = "Payslip query and void APIs"),
        (name = "Grades", description = "Salary grade and step APIs"),
        (name = "Grade Mappings", description = "Employee grade mapping APIs"),
        (name = "Grade Revisions", description = "Grade revision workflow APIs"),
        (name = "Salary Adjustments", description = "Salary adjustment workflow APIs"),
        (name = "Pay Adjustment Workflows", description = "Bulk pay adjustment APIs"),
        (name = "Audit", description = "Audit trail APIs"),
    )
)]
pub struct ApiDoc;
