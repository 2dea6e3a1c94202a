//! Corporate tax credits, applied in fixed order against remaining tax.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calc::common::clamp_non_negative;
use crate::models::{Warning, WarningCode};
use crate::rules::CorporateRules;

use super::CorporateInput;

/// Credits actually applied, after capping each against the tax remaining
/// when its turn comes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CorporateCredits {
    pub rnd: Decimal,
    pub investment: Decimal,
    pub other: Decimal,
    pub foreign: Decimal,
    pub total: Decimal,
}

/// Applies R&D, investment, other, then foreign credits, in that order.
/// Each is truncated to the tax remaining after the previous one; the
/// order is statutory, not an optimization.
pub(super) fn apply_credits(
    input: &CorporateInput,
    rules: &CorporateRules,
    calculated_tax: Decimal,
    warnings: &mut Vec<Warning>,
) -> CorporateCredits {
    let claims = [
        rnd_credit(input, rules),
        investment_credit(input, rules),
        input.other_credits,
        input.foreign_tax_paid,
    ];

    let mut remaining = clamp_non_negative(calculated_tax);
    let mut applied = [Decimal::ZERO; 4];
    let mut truncated = false;
    for (slot, claim) in applied.iter_mut().zip(claims) {
        *slot = claim.min(remaining);
        truncated |= claim > *slot;
        remaining -= *slot;
    }

    if truncated {
        warnings.push(Warning::new(
            WarningCode::CreditCappedByRemainingTax,
            "credit claims exceed remaining tax; excess carries no benefit",
        ));
    }

    let [rnd, investment, other, foreign] = applied;
    CorporateCredits {
        rnd,
        investment,
        other,
        foreign,
        total: rnd + investment + other + foreign,
    }
}

/// R&D credit: the better of a current-spend rate and an incremental-spend
/// rate, with both rates depending on entity size.
fn rnd_credit(input: &CorporateInput, rules: &CorporateRules) -> Decimal {
    let increment = clamp_non_negative(input.rnd_current_spend - input.rnd_prior_spend);
    let (current_rate, increment_rate) = if input.is_sme {
        (rules.rnd_rate_sme_current, rules.rnd_rate_sme_increment)
    } else {
        (rules.rnd_rate_general_current, rules.rnd_rate_general_increment)
    };
    (input.rnd_current_spend * current_rate).max(increment * increment_rate)
}

/// Investment credit: a base rate on current investment plus a growth rate
/// on the excess over the trailing three-year average.
fn investment_credit(input: &CorporateInput, rules: &CorporateRules) -> Decimal {
    let base_rate = if input.is_sme {
        rules.investment_rate_sme
    } else {
        rules.investment_rate_general
    };
    let growth = clamp_non_negative(input.investment_spend - input.investment_three_year_avg);
    input.investment_spend * base_rate + growth * rules.investment_growth_rate
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use crate::rules::RuleSet;

    use super::*;

    fn corporate_rules() -> CorporateRules {
        RuleSet::for_year(2024).unwrap().corporate
    }

    #[test]
    fn sme_rnd_credit_takes_better_of_current_and_increment() {
        let current_heavy = CorporateInput {
            is_sme: true,
            rnd_current_spend: dec!(100_000_000),
            rnd_prior_spend: dec!(90_000_000),
            ..CorporateInput::default()
        };
        let increment_heavy = CorporateInput {
            is_sme: true,
            rnd_current_spend: dec!(100_000_000),
            rnd_prior_spend: dec!(20_000_000),
            ..CorporateInput::default()
        };
        let mut warnings = Vec::new();

        let current = apply_credits(
            &current_heavy,
            &corporate_rules(),
            dec!(1_000_000_000),
            &mut warnings,
        );
        let increment = apply_credits(
            &increment_heavy,
            &corporate_rules(),
            dec!(1_000_000_000),
            &mut warnings,
        );

        // 25% of 100M beats 50% of 10M; 50% of 80M beats 25% of 100M.
        assert_eq!(current.rnd, dec!(25_000_000));
        assert_eq!(increment.rnd, dec!(40_000_000));
    }

    #[test]
    fn general_rnd_rates_are_lower() {
        let input = CorporateInput {
            rnd_current_spend: dec!(100_000_000),
            ..CorporateInput::default()
        };
        let mut warnings = Vec::new();

        let result =
            apply_credits(&input, &corporate_rules(), dec!(1_000_000_000), &mut warnings);

        // max(2% of 100M, 25% of 100M increment) = 25M.
        assert_eq!(result.rnd, dec!(25_000_000));
    }

    #[test]
    fn investment_credit_adds_growth_component() {
        let input = CorporateInput {
            is_sme: true,
            investment_spend: dec!(50_000_000),
            investment_three_year_avg: dec!(30_000_000),
            ..CorporateInput::default()
        };
        let mut warnings = Vec::new();

        let result =
            apply_credits(&input, &corporate_rules(), dec!(1_000_000_000), &mut warnings);

        // 10% of 50M plus 3% of the 20M growth.
        assert_eq!(result.investment, dec!(5_600_000));
    }

    #[test]
    fn credits_apply_in_order_and_truncate_at_remaining_tax() {
        let input = CorporateInput {
            is_sme: true,
            rnd_current_spend: dec!(20_000_000), // 5M credit (no increment)
            rnd_prior_spend: dec!(20_000_000),
            other_credits: dec!(4_000_000),
            foreign_tax_paid: dec!(3_000_000),
            ..CorporateInput::default()
        };
        let mut warnings = Vec::new();

        let result = apply_credits(&input, &corporate_rules(), dec!(8_000_000), &mut warnings);

        assert_eq!(result.rnd, dec!(5_000_000));
        assert_eq!(result.other, dec!(3_000_000));
        assert_eq!(result.foreign, dec!(0));
        assert_eq!(result.total, dec!(8_000_000));
        assert_eq!(warnings[0].code, WarningCode::CreditCappedByRemainingTax);
    }
}
