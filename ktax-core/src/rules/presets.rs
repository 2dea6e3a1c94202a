//! Built-in year-default rule tables.
//!
//! Two corporate presets are known: 2023 and later (9/19/21/24) and
//! 2020-2022 (10/20/22/25), both with the same subtractive deductions.
//! The comprehensive income schedule changed shape in 2023 (first band
//! widened to 14,000,000).

use rust_decimal::Decimal;

use crate::calc::common::{krw, rate};
use crate::models::{BracketTable, TaxBracket};

use super::{CorporateRules, FinancialRules, RateTier, RoundingRules, RuleError, RuleSet};

const MIN_SUPPORTED_YEAR: i32 = 2020;
const MAX_SUPPORTED_YEAR: i32 = 2025;

pub(super) fn defaults_for_year(tax_year: i32) -> Result<RuleSet, RuleError> {
    if !(MIN_SUPPORTED_YEAR..=MAX_SUPPORTED_YEAR).contains(&tax_year) {
        return Err(RuleError::UnsupportedTaxYear(tax_year));
    }

    Ok(RuleSet {
        tax_year,
        income_brackets: income_brackets(tax_year),
        corporate_brackets: corporate_brackets(tax_year),
        financial: financial_rules(),
        corporate: corporate_rules(),
        rounding: rounding_rules(),
    })
}

fn bracket(upper: Option<i64>, r: Decimal, subtractive: i64) -> TaxBracket {
    TaxBracket {
        upper_bound: upper.map(krw),
        rate: r,
        subtractive_deduction: krw(subtractive),
    }
}

fn income_brackets(tax_year: i32) -> BracketTable {
    if tax_year >= 2023 {
        vec![
            bracket(Some(14_000_000), rate(6, 2), 0),
            bracket(Some(50_000_000), rate(15, 2), 1_260_000),
            bracket(Some(88_000_000), rate(24, 2), 5_760_000),
            bracket(Some(150_000_000), rate(35, 2), 15_440_000),
            bracket(Some(300_000_000), rate(38, 2), 19_940_000),
            bracket(Some(500_000_000), rate(40, 2), 25_940_000),
            bracket(Some(1_000_000_000), rate(42, 2), 35_940_000),
            bracket(None, rate(45, 2), 65_940_000),
        ]
    } else {
        vec![
            bracket(Some(12_000_000), rate(6, 2), 0),
            bracket(Some(46_000_000), rate(15, 2), 1_080_000),
            bracket(Some(88_000_000), rate(24, 2), 5_220_000),
            bracket(Some(150_000_000), rate(35, 2), 14_900_000),
            bracket(Some(300_000_000), rate(38, 2), 19_400_000),
            bracket(Some(500_000_000), rate(40, 2), 25_400_000),
            bracket(Some(1_000_000_000), rate(42, 2), 35_400_000),
            bracket(None, rate(45, 2), 65_400_000),
        ]
    }
}

fn corporate_brackets(tax_year: i32) -> BracketTable {
    if tax_year >= 2023 {
        vec![
            bracket(Some(200_000_000), rate(9, 2), 0),
            bracket(Some(20_000_000_000), rate(19, 2), 20_000_000),
            bracket(Some(300_000_000_000), rate(21, 2), 420_000_000),
            bracket(None, rate(24, 2), 9_420_000_000),
        ]
    } else {
        vec![
            bracket(Some(200_000_000), rate(10, 2), 0),
            bracket(Some(20_000_000_000), rate(20, 2), 20_000_000),
            bracket(Some(300_000_000_000), rate(22, 2), 420_000_000),
            bracket(None, rate(25, 2), 9_420_000_000),
        ]
    }
}

fn financial_rules() -> FinancialRules {
    FinancialRules {
        comprehensive_threshold: krw(20_000_000),
        gross_up_rate: rate(10, 2),
        rental_separate_cap: krw(20_000_000),
        rental_separate_rate: rate(14, 2),
        imputed_rent_deposit_threshold: krw(300_000_000),
        imputed_rent_ratio: rate(60, 2),
        imputed_rent_interest_rate: rate(35, 3),
        imputed_rent_min_houses: 3,
        local_tax_rate: rate(10, 2),
    }
}

fn corporate_rules() -> CorporateRules {
    CorporateRules {
        overdraft_rate: rate(46, 3),
        deemed_rent_rate: rate(46, 3),
        promotion_base_limit_sme: krw(36_000_000),
        promotion_base_limit_general: krw(12_000_000),
        promotion_revenue_tiers: vec![
            RateTier {
                upper_bound: Some(krw(10_000_000_000)),
                rate: rate(3, 3),
            },
            RateTier {
                upper_bound: Some(krw(50_000_000_000)),
                rate: rate(2, 3),
            },
            RateTier {
                upper_bound: None,
                rate: rate(3, 4),
            },
        ],
        culture_promotion_bonus_ratio: rate(20, 2),
        market_promotion_bonus_ratio: rate(10, 2),
        vehicle_depreciation_cap: krw(8_000_000),
        statutory_donation_cap_ratio: rate(50, 2),
        designated_donation_cap_ratio: rate(10, 2),
        loss_cap_ratio_sme: Decimal::ONE,
        loss_cap_ratio_general: rate(80, 2),
        loss_expiry_years_pre2020: 10,
        loss_expiry_years: 15,
        minimum_tax_rate_sme: rate(7, 2),
        minimum_tax_tiers_general: vec![
            RateTier {
                upper_bound: Some(krw(10_000_000_000)),
                rate: rate(10, 2),
            },
            RateTier {
                upper_bound: Some(krw(100_000_000_000)),
                rate: rate(12, 2),
            },
            RateTier {
                upper_bound: None,
                rate: rate(17, 2),
            },
        ],
        rnd_rate_sme_current: rate(25, 2),
        rnd_rate_sme_increment: rate(50, 2),
        rnd_rate_general_current: rate(2, 2),
        rnd_rate_general_increment: rate(25, 2),
        investment_rate_sme: rate(10, 2),
        investment_rate_general: rate(1, 2),
        investment_growth_rate: rate(3, 2),
    }
}

fn rounding_rules() -> RoundingRules {
    RoundingRules {
        bracket_unit: Decimal::ONE,
        determined_unit: krw(10),
        national_unit: Decimal::ONE,
        payable_unit: krw(10),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn corporate_presets_agree_at_bracket_boundaries() {
        // Both presets use subtractive deductions that keep the schedule
        // continuous; spot-check the first boundary of each.
        for year in [2022, 2024] {
            let table = corporate_brackets(year);
            let boundary = dec!(200_000_000);
            let low = boundary * table[0].rate - table[0].subtractive_deduction;
            let high = boundary * table[1].rate - table[1].subtractive_deduction;
            assert_eq!(low, high, "discontinuity in {year} preset");
        }
    }

    #[test]
    fn all_supported_years_resolve() {
        for year in 2020..=2025 {
            assert!(defaults_for_year(year).is_ok(), "year {year}");
        }
    }

    #[test]
    fn income_schedule_first_band_widened_in_2023() {
        assert_eq!(income_brackets(2022)[0].upper_bound, Some(dec!(12_000_000)));
        assert_eq!(income_brackets(2023)[0].upper_bound, Some(dec!(14_000_000)));
    }
}
