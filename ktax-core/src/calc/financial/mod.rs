//! Financial-income comparative-taxation calculator.
//!
//! Interest and dividend income below a shared annual threshold is settled
//! by withholding alone. Above it (or whenever any item is foreign-source)
//! two methods are computed and the taxpayer owes the HIGHER of the two:
//!
//! - Method A (comprehensive): withholding on the threshold portions plus
//!   bracket tax on the excess folded into other comprehensive income.
//! - Method B (separate): full withholding on every financial item plus
//!   bracket tax on the other income alone.
//!
//! The dividend gross-up credit and the foreign tax credit then reduce the
//! chosen amount, never below zero.

mod allocation;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calc::brackets;
use crate::calc::common::{clamp_non_negative, floor_to_unit};
use crate::models::{IncomeItem, OtherIncome, OtherIncomeKind, TraceEntry, Warning, WarningCode, coerce};
use crate::rules::RuleSet;

pub use allocation::{AllocationTotals, ItemAllocation};

/// Which taxation method produced the chosen liability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxMethod {
    Comprehensive,
    Separate,
}

/// Flat input payload for the financial-income calculator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialInput {
    pub items: Vec<IncomeItem>,
    pub other_income: Vec<OtherIncome>,

    /// Deposit proxy driving the imputed-rent addback.
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub rental_deposit: Decimal,
    pub house_count: u32,

    /// Deductions against the comprehensive base (personal etc.).
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub comprehensive_deductions: Decimal,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub other_credits: Decimal,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub other_prepaid_tax: Decimal,
}

/// Financial-income result with both method totals and the final payable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialResult {
    pub allocations: Vec<ItemAllocation>,
    pub financial_total: Decimal,
    pub threshold_total: Decimal,
    pub excess_total: Decimal,
    pub gross_up_amount: Decimal,

    pub imputed_rent: Decimal,
    pub rental_separate_base: Decimal,
    pub rental_separate_tax: Decimal,
    pub other_income_base: Decimal,

    pub method_a: Decimal,
    pub method_b: Decimal,
    pub method: TaxMethod,
    pub chosen_tax: Decimal,

    pub dividend_credit: Decimal,
    pub foreign_tax_credit: Decimal,
    pub other_credits_applied: Decimal,

    pub national_tax: Decimal,
    pub local_tax: Decimal,
    pub payable: Decimal,

    pub warnings: Vec<Warning>,
    pub trace: Vec<TraceEntry>,
}

/// Comparative-taxation calculator over a resolved rule set.
#[derive(Debug, Clone)]
pub struct FinancialCalculator<'a> {
    rules: &'a RuleSet,
}

impl<'a> FinancialCalculator<'a> {
    pub fn new(rules: &'a RuleSet) -> Self {
        Self { rules }
    }

    pub fn calculate(&self, input: &FinancialInput) -> FinancialResult {
        let mut warnings = Vec::new();
        let mut trace = Vec::new();
        let fin = &self.rules.financial;
        let bracket_unit = self.rules.rounding.bracket_unit;

        // Other (non-financial) income, with the rental carve-out.
        let imputed_rent = self.imputed_rent(input, &mut warnings);
        let mut rental_total = imputed_rent;
        let mut other_base = Decimal::ZERO;
        for item in &input.other_income {
            match item.kind {
                OtherIncomeKind::Rental => rental_total += item.taxable(),
                _ => other_base += item.taxable(),
            }
        }
        let rental_separate_base = rental_total.min(fin.rental_separate_cap);
        let rental_excess = rental_total - rental_separate_base;
        if rental_excess > Decimal::ZERO {
            warnings.push(Warning::new(
                WarningCode::RentalCarveOutExceeded,
                "rental income above the separate-taxation cap joins the comprehensive base",
            ));
        }
        other_base += rental_excess;
        let rental_separate_tax =
            floor_to_unit(rental_separate_base * fin.rental_separate_rate, bracket_unit);
        trace.push(TraceEntry::new("other_income_base", other_base));

        // Threshold allocation and gross-up.
        let (allocations, totals) = allocation::allocate(&input.items, fin.comprehensive_threshold);
        let gross_up_amount = floor_to_unit(
            allocation::gross_up_base(&allocations) * fin.gross_up_rate,
            bracket_unit,
        );
        trace.push(TraceEntry::new("financial_total", totals.financial_total));
        trace.push(TraceEntry::new("gross_up_amount", gross_up_amount));

        // Both methods are always computed so the result can expose them.
        let comprehensive_base = clamp_non_negative(
            totals.excess_total + gross_up_amount + other_base - input.comprehensive_deductions,
        );
        let other_only_base = clamp_non_negative(other_base - input.comprehensive_deductions);
        let comprehensive_bracket_tax = clamp_non_negative(
            brackets::evaluate(comprehensive_base, &self.rules.income_brackets, bracket_unit).tax,
        );
        let other_only_bracket_tax = clamp_non_negative(
            brackets::evaluate(other_only_base, &self.rules.income_brackets, bracket_unit).tax,
        );
        let threshold_withholding = allocation::threshold_withholding(&allocations);
        let full_withholding = allocation::full_withholding(&allocations);

        let method_a = threshold_withholding + comprehensive_bracket_tax + rental_separate_tax;
        let method_b = other_only_bracket_tax + full_withholding + rental_separate_tax;
        trace.push(TraceEntry::new("method_a", method_a));
        trace.push(TraceEntry::new("method_b", method_b));

        let under_threshold = totals.financial_total <= fin.comprehensive_threshold;
        if totals.has_foreign && under_threshold {
            warnings.push(Warning::new(
                WarningCode::ForeignIncomeForcesComprehensive,
                "foreign-source income forces comparative evaluation below the threshold",
            ));
        }
        let (method, chosen_tax) = if under_threshold && !totals.has_foreign {
            (TaxMethod::Separate, method_b)
        } else if method_a >= method_b {
            (TaxMethod::Comprehensive, method_a)
        } else {
            (TaxMethod::Separate, method_b)
        };
        debug!(?method, %chosen_tax, "comparative method chosen");

        // Dividend gross-up credit: limited to the comprehensive tax the
        // excess actually attracted beyond separate treatment.
        let dividend_headroom = clamp_non_negative(
            comprehensive_bracket_tax - (other_only_bracket_tax + full_withholding),
        );
        let dividend_credit = gross_up_amount.min(dividend_headroom);
        if dividend_credit < gross_up_amount && gross_up_amount > Decimal::ZERO {
            warnings.push(Warning::new(
                WarningCode::DividendCreditLimited,
                "gross-up credit limited by the comparative-tax headroom",
            ));
        }

        // Foreign tax credit: capped at the chosen tax prorated by the
        // foreign share of total income.
        let total_for_ratio = totals.financial_total + other_base;
        let foreign_cap = if total_for_ratio > Decimal::ZERO {
            chosen_tax * totals.foreign_income / total_for_ratio
        } else {
            Decimal::ZERO
        };
        let foreign_tax_credit = totals.foreign_tax_paid.min(foreign_cap);
        if foreign_tax_credit < totals.foreign_tax_paid {
            warnings.push(Warning::new(
                WarningCode::ForeignTaxCreditLimited,
                "foreign tax credit limited by the foreign share of the chosen tax",
            ));
        }

        let national_tax = floor_to_unit(
            clamp_non_negative(
                chosen_tax - dividend_credit - foreign_tax_credit - input.other_credits,
            ),
            self.rules.rounding.national_unit,
        );
        let other_credits_applied = clamp_non_negative(chosen_tax - dividend_credit - foreign_tax_credit)
            .min(input.other_credits);
        let local_tax = floor_to_unit(
            national_tax * fin.local_tax_rate,
            self.rules.rounding.national_unit,
        );
        let payable = floor_to_unit(
            national_tax + local_tax - totals.prepaid_tax - input.other_prepaid_tax,
            self.rules.rounding.payable_unit,
        );
        trace.push(TraceEntry::new("national_tax", national_tax));
        trace.push(TraceEntry::new("local_tax", local_tax));
        trace.push(TraceEntry::new("payable", payable));

        FinancialResult {
            allocations,
            financial_total: totals.financial_total,
            threshold_total: totals.threshold_total,
            excess_total: totals.excess_total,
            gross_up_amount,
            imputed_rent,
            rental_separate_base,
            rental_separate_tax,
            other_income_base: other_base,
            method_a,
            method_b,
            method,
            chosen_tax,
            dividend_credit,
            foreign_tax_credit,
            other_credits_applied,
            national_tax,
            local_tax,
            payable,
            warnings,
            trace,
        }
    }

    /// Imputed rent on a deposit proxy, applied only past the statutory
    /// deposit threshold and the minimum house count.
    fn imputed_rent(&self, input: &FinancialInput, warnings: &mut Vec<Warning>) -> Decimal {
        let fin = &self.rules.financial;
        if input.house_count < fin.imputed_rent_min_houses
            || input.rental_deposit <= fin.imputed_rent_deposit_threshold
        {
            return Decimal::ZERO;
        }
        let principal =
            (input.rental_deposit - fin.imputed_rent_deposit_threshold) * fin.imputed_rent_ratio;
        let imputed = floor_to_unit(
            principal * fin.imputed_rent_interest_rate,
            self.rules.rounding.bracket_unit,
        );
        warnings.push(Warning::new(
            WarningCode::ImputedRentAdded,
            "imputed rent on the excess deposit added to rental income",
        ));
        imputed
    }
}
