//! Append-only action trail.
//!
//! Every mutating operation records who did what to which run/payslip.
//! Writes are fire-and-forget: a failed audit insert is logged and swallowed,
//! it never fails the operation that triggered it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, MySqlPool};
use utoipa::ToSchema;

use crate::actor::Actor;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AuditEntry {
    pub id: u64,
    pub run_id: Option<u64>,
    pub payslip_id: Option<u64>,
    #[schema(example = "payroll_run_processed")]
    pub action: String,
    pub actor_id: u64,
    pub actor_role: String,
    pub details: String,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

pub async fn record(
    pool: &MySqlPool,
    run_id: Option<u64>,
    payslip_id: Option<u64>,
    action: &str,
    actor: &Actor,
    details: serde_json::Value,
) {
    let result = sqlx::query(
        r#"
        INSERT INTO audit_log (run_id, payslip_id, action, actor_id, actor_role, details)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(run_id)
    .bind(payslip_id)
    .bind(action)
    .bind(actor.id)
    .bind(actor.role.to_string())
    .bind(details.to_string())
    .execute(pool)
    .await;

    if let Err(e) = result {
        tracing::warn!(error = %e, action, run_id, payslip_id, "failed to write audit entry");
    }
}
