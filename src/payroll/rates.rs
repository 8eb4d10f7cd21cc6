//! Per-branch statutory rates with one documented default table.
//!
//! A branch without its own row degrades to the defaults below; that is a
//! policy, not an error. There are no mutation operations on this data here;
//! rate maintenance happens outside this service.

use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use sqlx::FromRow;

use crate::error::AppError;
use crate::payroll::tax::DEFAULT_TAX_TABLE_VERSION;

#[derive(Debug, Clone, FromRow)]
pub struct BranchPayConfig {
    pub overtime_multiplier: Decimal,
    pub social_insurance_rate: Decimal,
    pub health_insurance_rate: Decimal,
    pub housing_fund_rate: Decimal,
    pub tax_table_version: String,
}

/// The single place fallback rates live.
pub static DEFAULT_BRANCH_CONFIG: Lazy<BranchPayConfig> = Lazy::new(|| BranchPayConfig {
    overtime_multiplier: Decimal::new(125, 2),    // 1.25
    social_insurance_rate: Decimal::new(45, 3),   // 4.5%
    health_insurance_rate: Decimal::new(2, 2),    // 2.0%
    housing_fund_rate: Decimal::new(1, 2),        // 1.0%
    tax_table_version: DEFAULT_TAX_TABLE_VERSION.to_string(),
});

/// Resolve the statutory rates for a branch, falling back to
/// [`DEFAULT_BRANCH_CONFIG`] when the branch has no row.
pub async fn branch_pay_config<'e, E>(db: E, branch_id: u64) -> Result<BranchPayConfig, AppError>
where
    E: sqlx::Executor<'e, Database = sqlx::MySql>,
{
    let row = sqlx::query_as::<_, BranchPayConfig>(
        r#"
        SELECT overtime_multiplier, social_insurance_rate,
               health_insurance_rate, housing_fund_rate, tax_table_version
        FROM branch_pay_config
        WHERE branch_id = ?
        "#,
    )
    .bind(branch_id)
    .fetch_optional(db)
    .await?;

    Ok(row.unwrap_or_else(|| {
        tracing::debug!(branch_id, "no branch pay config row, using defaults");
        DEFAULT_BRANCH_CONFIG.clone()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_default_rates_match_documented_table() {
        let cfg = &*DEFAULT_BRANCH_CONFIG;
        assert_eq!(cfg.overtime_multiplier, Decimal::from_str("1.25").unwrap());
        assert_eq!(
            cfg.social_insurance_rate,
            Decimal::from_str("0.045").unwrap()
        );
        assert_eq!(cfg.health_insurance_rate, Decimal::from_str("0.02").unwrap());
        assert_eq!(cfg.housing_fund_rate, Decimal::from_str("0.01").unwrap());
        assert_eq!(cfg.tax_table_version, DEFAULT_TAX_TABLE_VERSION);
    }
}
