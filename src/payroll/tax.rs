//! Versioned progressive withholding-tax tables.
//!
//! Each table is six bands of (floor, base amount, marginal rate over the
//! floor). Base amounts are chosen so the schedule is continuous at every
//! boundary and monotone in taxable income. Tables are selected by the
//! `tax_table_version` carried on branch config, so a law change ships as a
//! new table, not a code change.

use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::error::AppError;
use crate::model::round2;

pub const DEFAULT_TAX_TABLE_VERSION: &str = "train-2023";

#[derive(Debug, Clone, Copy)]
pub struct TaxBracket {
    /// Taxable income at which this bracket starts.
    pub floor: Decimal,
    /// Tax accumulated by all lower brackets.
    pub base: Decimal,
    /// Marginal rate applied above the floor.
    pub rate: Decimal,
}

#[derive(Debug, Clone)]
pub struct TaxTable {
    pub version: &'static str,
    pub brackets: Vec<TaxBracket>,
}

fn bracket(floor: i64, base_cents: i64, rate_bp: i64) -> TaxBracket {
    TaxBracket {
        floor: Decimal::from(floor),
        base: Decimal::new(base_cents, 2),
        rate: Decimal::new(rate_bp, 4),
    }
}

static TAX_TABLES: Lazy<HashMap<&'static str, TaxTable>> = Lazy::new(|| {
    let mut tables = HashMap::new();

    tables.insert(
        "train-2018",
        TaxTable {
            version: "train-2018",
            brackets: vec![
                bracket(0, 0, 0),
                bracket(20_833, 0, 2_000),
                bracket(33_333, 250_000, 2_500),
                bracket(66_667, 1_083_350, 3_000),
                bracket(166_667, 4_083_350, 3_200),
                bracket(666_667, 20_083_350, 3_500),
            ],
        },
    );

    tables.insert(
        "train-2023",
        TaxTable {
            version: "train-2023",
            brackets: vec![
                bracket(0, 0, 0),
                bracket(20_833, 0, 1_500),
                bracket(33_333, 187_500, 2_000),
                bracket(66_667, 854_180, 2_500),
                bracket(166_667, 3_354_180, 3_000),
                bracket(666_667, 18_354_180, 3_500),
            ],
        },
    );

    tables
});

pub fn tax_table(version: &str) -> Result<&'static TaxTable, AppError> {
    TAX_TABLES
        .get(version)
        .ok_or_else(|| AppError::Validation(format!("unknown tax table version '{version}'")))
}

/// Withholding tax on monthly taxable income, rounded to 2 dp. Never
/// negative; zero for non-positive taxable income.
pub fn withholding_tax(version: &str, taxable: Decimal) -> Result<Decimal, AppError> {
    let table = tax_table(version)?;

    if taxable <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }

    // Brackets are ordered by floor; pick the highest one at or below.
    let applicable = table
        .brackets
        .iter()
        .rfind(|b| b.floor <= taxable)
        .ok_or_else(|| {
            AppError::Validation(format!("tax table '{version}' has no bracket for {taxable}"))
        })?;

    Ok(round2(
        applicable.base + applicable.rate * (taxable - applicable.floor),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_zero_and_negative_taxable_pay_no_tax() {
        assert_eq!(
            withholding_tax(DEFAULT_TAX_TABLE_VERSION, Decimal::ZERO).unwrap(),
            Decimal::ZERO
        );
        assert_eq!(
            withholding_tax(DEFAULT_TAX_TABLE_VERSION, dec("-5000")).unwrap(),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_exempt_band() {
        assert_eq!(
            withholding_tax("train-2023", dec("20833")).unwrap(),
            Decimal::ZERO
        );
        assert_eq!(
            withholding_tax("train-2018", dec("15000")).unwrap(),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_second_bracket_2018_table() {
        // 27,750 taxable: 20% of the excess over 20,833
        assert_eq!(
            withholding_tax("train-2018", dec("27750")).unwrap(),
            dec("1383.40")
        );
    }

    #[test]
    fn test_second_bracket_2023_table() {
        // Same income under the 2023 table: 15% marginal
        assert_eq!(
            withholding_tax("train-2023", dec("27750")).unwrap(),
            dec("1037.55")
        );
    }

    #[test]
    fn test_top_bracket() {
        // 700,000 on train-2023: 183,541.80 + 35% of 33,333
        assert_eq!(
            withholding_tax("train-2023", dec("700000")).unwrap(),
            dec("195208.35")
        );
    }

    #[test]
    fn test_unknown_version_is_a_validation_error() {
        assert!(matches!(
            withholding_tax("train-1997", dec("30000")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_continuity_at_every_bracket_boundary() {
        for version in ["train-2018", "train-2023"] {
            let table = tax_table(version).unwrap();
            for b in table.brackets.iter().skip(1) {
                let at = withholding_tax(version, b.floor).unwrap();
                let just_below = withholding_tax(version, b.floor - dec("0.01")).unwrap();
                let gap = at - just_below;
                assert!(
                    gap >= Decimal::ZERO && gap <= dec("0.02"),
                    "{version}: tax jumps by {gap} at {}",
                    b.floor
                );
                // base amount equals tax accumulated at the floor
                assert_eq!(at, round2(b.base));
            }
        }
    }

    proptest! {
        #[test]
        fn prop_tax_monotone_non_decreasing(lo in 0u64..1_000_000, delta in 0u64..100_000) {
            let a = Decimal::from(lo);
            let b = Decimal::from(lo + delta);
            for version in ["train-2018", "train-2023"] {
                let tax_a = withholding_tax(version, a).unwrap();
                let tax_b = withholding_tax(version, b).unwrap();
                prop_assert!(tax_a <= tax_b, "{version}: tax({a})={tax_a} > tax({b})={tax_b}");
            }
        }

        #[test]
        fn prop_tax_never_exceeds_income_and_never_negative(v in 0u64..2_000_000) {
            let taxable = Decimal::from(v);
            for version in ["train-2018", "train-2023"] {
                let tax = withholding_tax(version, taxable).unwrap();
                prop_assert!(tax >= Decimal::ZERO);
                prop_assert!(tax <= taxable);
            }
        }
    }
}
