pub mod grade;
pub mod grade_mapping;
pub mod grade_revision;
pub mod pay_adjustment;
pub mod payroll_run;
pub mod payslip;
pub mod salary_adjustment;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::AppError;

/// Round a monetary amount to 2 decimal places, half away from zero.
/// Applied at every sub-total, not only at the end, to match how payroll
/// figures are carried on real payslips.
pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Parse a status string loaded from the store into its typed enum.
/// A value outside the known set means the row was written by something
/// other than this service.
pub fn parse_status<T: std::str::FromStr>(entity: &'static str, raw: &str) -> Result<T, AppError> {
    raw.parse::<T>()
        .map_err(|_| AppError::Transaction(format!("unknown {entity} status '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_round2_half_away_from_zero() {
        assert_eq!(round2(dec("1.005")), dec("1.01"));
        assert_eq!(round2(dec("1.004")), dec("1.00"));
        assert_eq!(round2(dec("-1.005")), dec("-1.01"));
        assert_eq!(round2(dec("1383.3994")), dec("1383.40"));
    }

    #[test]
    fn test_round2_leaves_two_dp_values_alone() {
        assert_eq!(round2(dec("26366.60")), dec("26366.60"));
    }

    #[test]
    fn test_parse_status_rejects_unknown() {
        use super::payroll_run::RunStatus;
        assert!(parse_status::<RunStatus>("payroll run", "draft").is_ok());
        assert!(parse_status::<RunStatus>("payroll run", "weird").is_err());
    }
}
