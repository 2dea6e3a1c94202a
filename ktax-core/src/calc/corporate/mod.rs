//! Corporate tax calculator.
//!
//! Pipeline: book-to-tax adjustments (deemed revenue, non-deductible
//! expenses, donation waterfall) build the taxable base, loss carryforward
//! reduces it under an expiry and a cap, bracket tax is computed on the
//! result, credits apply in fixed order, the minimum-tax floor overrides a
//! lower post-credit amount, and prepaid tax nets out to the final payable
//! (negative means refund).

mod adjustments;
mod credits;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calc::brackets;
use crate::calc::common::{clamp_non_negative, floor_to_unit};
use crate::models::{TraceEntry, Warning, WarningCode, coerce};
use crate::rules::RuleSet;

pub use adjustments::Adjustments;
pub use credits::CorporateCredits;

const LOSS_ORIGIN_CUTOFF_YEAR: i32 = 2020;

/// A single loss-carryforward ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LossCarryforward {
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub available: Decimal,
    pub origin_year: i32,
}

/// Flat input payload for the corporate calculator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorporateInput {
    pub is_sme: bool,
    pub is_real_estate_rental: bool,
    /// Zero means "use the rule set's tax year".
    pub filing_year: i32,

    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub net_income: Decimal,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub revenue: Decimal,

    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub related_party_advances: Decimal,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub advance_interest_received: Decimal,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub total_debt: Decimal,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub total_equity: Decimal,

    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub promotion_spend: Decimal,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub culture_promotion_spend: Decimal,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub market_promotion_spend: Decimal,

    pub vehicle_depreciation: Vec<Decimal>,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub depreciation_claimed: Decimal,
    #[serde(deserialize_with = "coerce::lenient_opt_amount")]
    pub depreciation_limit: Option<Decimal>,

    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub statutory_donations: Decimal,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub designated_donations: Decimal,

    pub tonnage_mode: bool,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub tonnage_base: Decimal,

    pub losses: Vec<LossCarryforward>,

    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub rnd_current_spend: Decimal,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub rnd_prior_spend: Decimal,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub investment_spend: Decimal,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub investment_three_year_avg: Decimal,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub other_credits: Decimal,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub foreign_tax_paid: Decimal,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub exempt_credit: Decimal,

    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub prepaid_tax: Decimal,
}

/// Corporate result with every intermediate stage amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorporateResult {
    pub adjustments: Adjustments,
    pub donation_disallowed: Decimal,
    pub taxable_before_loss: Decimal,
    pub loss_applied: Decimal,
    pub tax_base: Decimal,

    pub calculated_tax: Decimal,
    pub credits: CorporateCredits,
    pub tax_after_credits: Decimal,
    pub minimum_tax: Decimal,
    pub exempt_credit_applied: Decimal,
    pub final_tax: Decimal,
    pub payable: Decimal,

    pub warnings: Vec<Warning>,
    pub trace: Vec<TraceEntry>,
}

/// Corporate tax calculator over a resolved rule set.
#[derive(Debug, Clone)]
pub struct CorporateCalculator<'a> {
    rules: &'a RuleSet,
}

impl<'a> CorporateCalculator<'a> {
    pub fn new(rules: &'a RuleSet) -> Self {
        Self { rules }
    }

    pub fn calculate(&self, input: &CorporateInput) -> CorporateResult {
        let mut warnings = Vec::new();
        let mut trace = Vec::new();
        let corp = &self.rules.corporate;

        let adjustments = adjustments::adjustments(input, corp, &mut warnings);

        // Donations are expensed in book income; add both categories back to
        // form the pre-donation base, then keep only the disallowed excess.
        let base_before_donations = input.net_income
            + adjustments.total
            + input.statutory_donations
            + input.designated_donations;
        let donation_disallowed = adjustments::donation_disallowed(
            input,
            base_before_donations,
            corp,
            &mut warnings,
        );

        let taxable_before_loss = if input.tonnage_mode {
            warnings.push(Warning::new(
                WarningCode::TonnageBaseApplied,
                "tonnage-tax base replaces the adjusted book income",
            ));
            input.tonnage_base
        } else {
            input.net_income + adjustments.total + donation_disallowed
        };
        trace.push(TraceEntry::new("taxable_before_loss", taxable_before_loss));

        let loss_applied = self.apply_losses(input, taxable_before_loss, &mut warnings);
        let tax_base = clamp_non_negative(taxable_before_loss - loss_applied);
        trace.push(TraceEntry::new("tax_base", tax_base));

        let bracket_tax = brackets::evaluate(
            tax_base,
            &self.rules.corporate_brackets,
            self.rules.rounding.bracket_unit,
        );
        let calculated_tax = clamp_non_negative(bracket_tax.tax);
        trace.push(TraceEntry::new("calculated_tax", calculated_tax));
        debug!(%tax_base, %calculated_tax, "corporate bracket tax computed");

        let credits = credits::apply_credits(input, corp, calculated_tax, &mut warnings);
        let tax_after_credits = clamp_non_negative(calculated_tax - credits.total);

        let minimum_tax = self.minimum_tax(input, tax_base);
        trace.push(TraceEntry::new("minimum_tax", minimum_tax));
        let floored = if minimum_tax > tax_after_credits {
            warnings.push(Warning::new(
                WarningCode::MinimumTaxApplied,
                "post-credit tax fell below the minimum-tax floor",
            ));
            minimum_tax
        } else {
            tax_after_credits
        };

        let exempt_credit_applied = input.exempt_credit.min(floored);
        let final_tax = floor_to_unit(
            floored - exempt_credit_applied,
            self.rules.rounding.determined_unit,
        );
        trace.push(TraceEntry::new("final_tax", final_tax));

        let payable = floor_to_unit(
            final_tax - input.prepaid_tax,
            self.rules.rounding.payable_unit,
        );
        trace.push(TraceEntry::new("payable", payable));

        CorporateResult {
            adjustments,
            donation_disallowed,
            taxable_before_loss,
            loss_applied,
            tax_base,
            calculated_tax,
            credits,
            tax_after_credits,
            minimum_tax,
            exempt_credit_applied,
            final_tax,
            payable,
            warnings,
            trace,
        }
    }

    /// Applies carryforward losses in ledger order. Expired entries are
    /// skipped; the total applied is capped at a fraction of the base by
    /// entity size.
    fn apply_losses(
        &self,
        input: &CorporateInput,
        taxable_before_loss: Decimal,
        warnings: &mut Vec<Warning>,
    ) -> Decimal {
        let corp = &self.rules.corporate;
        let filing_year = if input.filing_year == 0 {
            self.rules.tax_year
        } else {
            input.filing_year
        };
        let cap_ratio = if input.is_sme {
            corp.loss_cap_ratio_sme
        } else {
            corp.loss_cap_ratio_general
        };
        let cap = clamp_non_negative(taxable_before_loss) * cap_ratio;

        let mut applied = Decimal::ZERO;
        let mut capped = false;
        for loss in &input.losses {
            let expiry = if loss.origin_year < LOSS_ORIGIN_CUTOFF_YEAR {
                corp.loss_expiry_years_pre2020
            } else {
                corp.loss_expiry_years
            };
            if filing_year - loss.origin_year >= expiry {
                warnings.push(Warning::new(
                    WarningCode::LossCarryforwardExpired,
                    format!("loss from {} expired after {expiry} years", loss.origin_year),
                ));
                continue;
            }
            let usable = loss.available.min(cap - applied);
            capped |= loss.available > usable;
            applied += usable;
        }

        if capped {
            warnings.push(Warning::new(
                WarningCode::LossDeductionCapped,
                format!("loss deduction capped at {cap_ratio} of the pre-loss base"),
            ));
        }
        applied
    }

    /// Minimum-tax floor: a flat rate for SMEs, a base-size tier table for
    /// general companies.
    fn minimum_tax(&self, input: &CorporateInput, tax_base: Decimal) -> Decimal {
        let corp = &self.rules.corporate;
        let min_rate = if input.is_sme {
            corp.minimum_tax_rate_sme
        } else {
            corp.minimum_tax_tiers_general
                .iter()
                .find(|tier| tier.upper_bound.is_none_or(|upper| tax_base <= upper))
                .map(|tier| tier.rate)
                .unwrap_or(Decimal::ZERO)
        };
        floor_to_unit(tax_base * min_rate, self.rules.rounding.bracket_unit)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use crate::rules::RuleSet;

    use super::*;

    fn rules() -> RuleSet {
        RuleSet::for_year(2024).unwrap()
    }

    #[test]
    fn sme_baseline_scenario() {
        let rules = rules();
        let calculator = CorporateCalculator::new(&rules);
        let input = CorporateInput {
            is_sme: true,
            net_income: dec!(100_000_000),
            ..CorporateInput::default()
        };

        let result = calculator.calculate(&input);

        assert_eq!(result.tax_base, dec!(100_000_000));
        // 9% tier, below 200M.
        assert_eq!(result.calculated_tax, dec!(9_000_000));
        // SME minimum is 7% of the base; the computed tax already exceeds it.
        assert_eq!(result.minimum_tax, dec!(7_000_000));
        assert_eq!(result.final_tax, dec!(9_000_000));
        assert_eq!(result.payable, dec!(9_000_000));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn pre_2023_rules_use_old_rate_preset() {
        let rules = RuleSet::for_year(2022).unwrap();
        let calculator = CorporateCalculator::new(&rules);
        let input = CorporateInput {
            is_sme: true,
            net_income: dec!(100_000_000),
            ..CorporateInput::default()
        };

        let result = calculator.calculate(&input);

        assert_eq!(result.calculated_tax, dec!(10_000_000));
    }

    #[test]
    fn expired_losses_are_skipped() {
        let rules = rules();
        let calculator = CorporateCalculator::new(&rules);
        let input = CorporateInput {
            is_sme: true,
            net_income: dec!(100_000_000),
            losses: vec![
                LossCarryforward {
                    available: dec!(30_000_000),
                    origin_year: 2012, // pre-2020: 10-year expiry, gone
                },
                LossCarryforward {
                    available: dec!(20_000_000),
                    origin_year: 2021,
                },
            ],
            ..CorporateInput::default()
        };

        let result = calculator.calculate(&input);

        assert_eq!(result.loss_applied, dec!(20_000_000));
        assert_eq!(result.tax_base, dec!(80_000_000));
        assert_eq!(result.warnings[0].code, WarningCode::LossCarryforwardExpired);
    }

    #[test]
    fn post_2020_losses_expire_after_fifteen_years() {
        let rules = rules();
        let calculator = CorporateCalculator::new(&rules);
        let input = CorporateInput {
            is_sme: true,
            filing_year: 2036, // 2021 + 15: exactly at expiry
            net_income: dec!(100_000_000),
            losses: vec![LossCarryforward {
                available: dec!(50_000_000),
                origin_year: 2021,
            }],
            ..CorporateInput::default()
        };

        let result = calculator.calculate(&input);

        assert_eq!(result.loss_applied, dec!(0));
        assert_eq!(result.tax_base, dec!(100_000_000));
        assert_eq!(result.warnings[0].code, WarningCode::LossCarryforwardExpired);
    }

    #[test]
    fn general_company_loss_capped_at_eighty_percent() {
        let rules = rules();
        let calculator = CorporateCalculator::new(&rules);
        let input = CorporateInput {
            net_income: dec!(100_000_000),
            losses: vec![LossCarryforward {
                available: dec!(100_000_000),
                origin_year: 2022,
            }],
            ..CorporateInput::default()
        };

        let result = calculator.calculate(&input);

        assert_eq!(result.loss_applied, dec!(80_000_000));
        assert_eq!(result.tax_base, dec!(20_000_000));
        assert!(
            result
                .warnings
                .iter()
                .any(|w| w.code == WarningCode::LossDeductionCapped)
        );
    }

    #[test]
    fn sme_losses_can_erase_the_whole_base() {
        let rules = rules();
        let calculator = CorporateCalculator::new(&rules);
        let input = CorporateInput {
            is_sme: true,
            net_income: dec!(100_000_000),
            losses: vec![LossCarryforward {
                available: dec!(150_000_000),
                origin_year: 2022,
            }],
            ..CorporateInput::default()
        };

        let result = calculator.calculate(&input);

        assert_eq!(result.loss_applied, dec!(100_000_000));
        assert_eq!(result.tax_base, dec!(0));
        assert_eq!(result.final_tax, dec!(0));
    }

    #[test]
    fn minimum_tax_floor_overrides_lower_post_credit_tax() {
        let rules = rules();
        let calculator = CorporateCalculator::new(&rules);
        let input = CorporateInput {
            is_sme: true,
            net_income: dec!(100_000_000),
            other_credits: dec!(5_000_000),
            ..CorporateInput::default()
        };

        let result = calculator.calculate(&input);

        // 9M - 5M = 4M falls below the 7M floor.
        assert_eq!(result.tax_after_credits, dec!(4_000_000));
        assert_eq!(result.final_tax, dec!(7_000_000));
        assert!(
            result
                .warnings
                .iter()
                .any(|w| w.code == WarningCode::MinimumTaxApplied)
        );
    }

    #[test]
    fn general_minimum_tax_uses_base_size_tiers() {
        let rules = rules();
        let calculator = CorporateCalculator::new(&rules);
        let input = CorporateInput {
            net_income: dec!(200_000_000_000),
            other_credits: dec!(40_000_000_000),
            ..CorporateInput::default()
        };

        let result = calculator.calculate(&input);

        // 200B base: 12% tier.
        assert_eq!(result.minimum_tax, dec!(24_000_000_000));
        assert_eq!(result.final_tax, dec!(24_000_000_000));
    }

    #[test]
    fn exempt_credit_cannot_exceed_pre_exempt_tax() {
        let rules = rules();
        let calculator = CorporateCalculator::new(&rules);
        let input = CorporateInput {
            is_sme: true,
            net_income: dec!(10_000_000),
            exempt_credit: dec!(5_000_000),
            ..CorporateInput::default()
        };

        let result = calculator.calculate(&input);

        // 9% of 10M = 900,000 but the 7% minimum floor is 700,000; the
        // computed tax stands, then the exempt credit absorbs all of it.
        assert_eq!(result.exempt_credit_applied, dec!(900_000));
        assert_eq!(result.final_tax, dec!(0));
    }

    #[test]
    fn prepaid_tax_can_flip_payable_negative() {
        let rules = rules();
        let calculator = CorporateCalculator::new(&rules);
        let input = CorporateInput {
            is_sme: true,
            net_income: dec!(100_000_000),
            prepaid_tax: dec!(12_000_000),
            ..CorporateInput::default()
        };

        let result = calculator.calculate(&input);

        assert_eq!(result.payable, dec!(-3_000_000));
    }

    #[test]
    fn tonnage_base_replaces_adjusted_income() {
        let rules = rules();
        let calculator = CorporateCalculator::new(&rules);
        let input = CorporateInput {
            is_sme: true,
            net_income: dec!(500_000_000),
            tonnage_mode: true,
            tonnage_base: dec!(50_000_000),
            ..CorporateInput::default()
        };

        let result = calculator.calculate(&input);

        assert_eq!(result.taxable_before_loss, dec!(50_000_000));
        assert_eq!(result.calculated_tax, dec!(4_500_000));
        assert!(
            result
                .warnings
                .iter()
                .any(|w| w.code == WarningCode::TonnageBaseApplied)
        );
    }

    #[test]
    fn identical_inputs_yield_identical_results() {
        let rules = rules();
        let calculator = CorporateCalculator::new(&rules);
        let input = CorporateInput {
            is_sme: true,
            net_income: dec!(250_000_000),
            promotion_spend: dec!(50_000_000),
            losses: vec![LossCarryforward {
                available: dec!(40_000_000),
                origin_year: 2021,
            }],
            rnd_current_spend: dec!(10_000_000),
            ..CorporateInput::default()
        };

        assert_eq!(calculator.calculate(&input), calculator.calculate(&input));
    }
}
