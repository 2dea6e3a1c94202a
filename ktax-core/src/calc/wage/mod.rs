//! Wage (year-end settlement) calculator.
//!
//! Stages run strictly in order; no stage reads a later stage's output:
//!
//! | Stage | Description |
//! |-------|-------------|
//! | 1     | Gross salary resolution (annual minus nontaxable, or direct) |
//! | 2     | Withholding resolution (local surtax derived at 10% if absent) |
//! | 3     | Dependent classification (pure predicates) |
//! | 4     | Personal, earned-income, social-insurance deductions |
//! | 5     | Card-spend deduction |
//! | 6     | Housing deductions (shared cap, savings first) |
//! | 7     | Taxable income (clamped at zero) |
//! | 8     | Bracket tax on taxable income |
//! | 9     | Credit cascade (standard-credit switch honored) |
//! | 10    | Determined tax, local surtax, refund/additional due |
//! | 11    | Warnings accumulated throughout |
//!
//! Out-of-range numeric input never raises: coercion defaults malformed
//! values to zero and the computation proceeds, surfacing advisory warnings
//! instead. That policy suits a live form recomputed on every keystroke.

mod card;
mod credits;
mod deductions;
mod donations;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calc::brackets;
use crate::calc::common::{clamp_non_negative, floor_to_unit, krw};
use crate::models::{Dependent, TraceEntry, Warning, WarningCode, coerce};
use crate::rules::RuleSet;

pub use card::CardDeduction;
pub use credits::WageCredits;
pub use deductions::PersonalDeductions;
pub use donations::DonationCredits;

/// Flat input payload for the wage calculator. Every numeric field is
/// leniently coerced; every flag defaults to false.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WageInput {
    pub use_annual_salary: bool,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub annual_salary: Decimal,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub nontaxable_salary: Decimal,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub gross_salary: Decimal,

    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub income_tax_withheld: Decimal,
    /// Absent means "derive as 10% of withheld income tax".
    #[serde(deserialize_with = "coerce::lenient_opt_amount")]
    pub local_tax_withheld: Option<Decimal>,

    pub dependents: Vec<Dependent>,
    pub self_disabled: bool,
    pub is_single_parent: bool,
    pub is_female_head: bool,

    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub social_insurance_paid: Decimal,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub mortgage_interest_paid: Decimal,

    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub credit_card_spend: Decimal,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub debit_card_spend: Decimal,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub culture_spend: Decimal,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub transit_spend: Decimal,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub market_spend: Decimal,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub prior_year_card_spend: Decimal,
    pub culture_eligible: bool,

    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub housing_savings_paid: Decimal,
    pub housing_savings_eligible: bool,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub lease_loan_repaid: Decimal,
    pub lease_loan_eligible: bool,

    pub use_standard_credit: bool,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub pension_contribution: Decimal,
    pub has_irp: bool,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub isa_transfer: Decimal,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub insurance_premium: Decimal,
    pub disabled_policy: bool,

    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub medical_general: Decimal,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub medical_special: Decimal,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub medical_infertility: Decimal,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub medical_premature: Decimal,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub medical_reimbursement: Decimal,

    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub education_k12_spend: Decimal,
    pub education_k12_students: u32,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub education_university_spend: Decimal,
    pub education_university_students: u32,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub education_self_spend: Decimal,

    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub donation_political: Decimal,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub donation_hometown: Decimal,
    pub hometown_disaster: bool,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub donation_special: Decimal,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub donation_employee_stock: Decimal,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub donation_general: Decimal,
    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub donation_religious: Decimal,

    #[serde(deserialize_with = "coerce::lenient_amount")]
    pub rent_paid: Decimal,
    pub rent_eligible: bool,

    /// Order of birth for each child born or adopted this year.
    pub birth_orders: Vec<u32>,
    pub married_this_year: bool,
}

/// Full wage-settlement result with every intermediate amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WageResult {
    pub gross_salary: Decimal,
    pub withheld_income_tax: Decimal,
    pub withheld_local_tax: Decimal,

    pub personal: PersonalDeductions,
    pub earned_income_deduction: Decimal,
    pub earned_income: Decimal,
    pub social_insurance_deduction: Decimal,
    pub card: CardDeduction,
    pub housing_deduction: Decimal,
    pub mortgage_deduction: Decimal,
    pub total_deductions: Decimal,
    pub taxable_income: Decimal,

    pub calculated_tax: Decimal,
    pub credits: WageCredits,
    pub determined_tax: Decimal,
    pub local_tax: Decimal,
    /// Positive means refund; negative means additional payment due.
    pub refund: Decimal,

    pub warnings: Vec<Warning>,
    pub trace: Vec<TraceEntry>,
}

/// Year-end settlement calculator over a resolved rule set.
#[derive(Debug, Clone)]
pub struct WageCalculator<'a> {
    rules: &'a RuleSet,
}

impl<'a> WageCalculator<'a> {
    pub fn new(rules: &'a RuleSet) -> Self {
        Self { rules }
    }

    /// Runs the full settlement cascade. Infallible: configuration was
    /// validated when the rule set was resolved, and malformed input has
    /// already been coerced at the deserialization boundary.
    pub fn calculate(&self, input: &WageInput) -> WageResult {
        let mut warnings = Vec::new();
        let mut trace = Vec::new();

        // Stage 1: gross salary.
        let gross = if input.use_annual_salary && input.annual_salary > Decimal::ZERO {
            clamp_non_negative(input.annual_salary - input.nontaxable_salary)
        } else {
            input.gross_salary
        };
        trace.push(TraceEntry::new("gross_salary", gross));

        // Stage 2: withholding.
        let withheld_income = input.income_tax_withheld;
        let withheld_local = match input.local_tax_withheld {
            Some(value) => value,
            None => {
                let derived = floor_to_unit(
                    withheld_income * self.rules.financial.local_tax_rate,
                    self.rules.rounding.determined_unit,
                );
                if withheld_income > Decimal::ZERO {
                    warnings.push(Warning::new(
                        WarningCode::LocalWithholdingDerived,
                        "local surtax withheld derived as 10% of income tax withheld",
                    ));
                }
                derived
            }
        };

        // Stages 3-4: dependent classification and deductions.
        let personal = deductions::personal_deductions(input, &mut warnings);
        let earned_income_deduction = deductions::earned_income_deduction(gross, &mut warnings);
        let earned_income = clamp_non_negative(gross - earned_income_deduction);
        trace.push(TraceEntry::new("earned_income", earned_income));
        let social_insurance = input.social_insurance_paid;
        let mortgage = input.mortgage_interest_paid;

        // Stage 5: card spend.
        let card = card::card_deduction(input, gross, &mut warnings);

        // Stage 6: housing.
        let housing = deductions::housing_deduction(input, gross, &mut warnings);

        // Stage 7: taxable income.
        let total_deductions =
            personal.total + social_insurance + card.total + housing + mortgage;
        let taxable_income = clamp_non_negative(earned_income - total_deductions);
        trace.push(TraceEntry::new("taxable_income", taxable_income));

        // Stage 8: bracket tax, clamped to zero on this path.
        let bracket_tax = brackets::evaluate(
            taxable_income,
            &self.rules.income_brackets,
            self.rules.rounding.bracket_unit,
        );
        let calculated_tax = clamp_non_negative(bracket_tax.tax);
        trace.push(TraceEntry::new("calculated_tax", calculated_tax));
        debug!(%taxable_income, %calculated_tax, "wage bracket tax computed");

        // Stage 9: credit cascade.
        let credits = self.credit_cascade(
            input,
            gross,
            earned_income,
            calculated_tax,
            personal.child_credit_dependents,
            &mut warnings,
        );
        trace.push(TraceEntry::new("total_credits", credits.total));

        // Stage 10: determined tax, local surtax, refund.
        let unit = self.rules.rounding.determined_unit;
        let determined_tax =
            credits::clamped_non_negative_floor(calculated_tax - credits.total, unit);
        let local_tax = floor_to_unit(determined_tax * self.rules.financial.local_tax_rate, unit);
        let refund = (withheld_income + withheld_local) - (determined_tax + local_tax);
        trace.push(TraceEntry::new("determined_tax", determined_tax));
        trace.push(TraceEntry::new("local_tax", local_tax));
        trace.push(TraceEntry::new("refund", refund));

        WageResult {
            gross_salary: gross,
            withheld_income_tax: withheld_income,
            withheld_local_tax: withheld_local,
            personal,
            earned_income_deduction,
            earned_income,
            social_insurance_deduction: social_insurance,
            card,
            housing_deduction: housing,
            mortgage_deduction: mortgage,
            total_deductions,
            taxable_income,
            calculated_tax,
            credits,
            determined_tax,
            local_tax,
            refund,
            warnings,
            trace,
        }
    }

    fn credit_cascade(
        &self,
        input: &WageInput,
        gross: Decimal,
        earned_income: Decimal,
        calculated_tax: Decimal,
        child_credit_dependents: usize,
        warnings: &mut Vec<Warning>,
    ) -> WageCredits {
        let use_standard = input.use_standard_credit;
        if use_standard {
            warnings.push(Warning::new(
                WarningCode::StandardCreditSubstituted,
                "standard credit replaces insurance/medical/education/rent/general-donation credits",
            ));
        }

        let earned = credits::earned_income_credit(calculated_tax, gross);
        let child = credits::child_credit(child_credit_dependents);
        let birth = credits::birth_adoption_credit(&input.birth_orders);
        let pension = credits::pension_credit(input, gross, warnings);

        let (insurance, medical, education, rent) = if use_standard {
            (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
        } else {
            (
                credits::insurance_credit(input, warnings),
                credits::medical_credit(input, gross, warnings),
                credits::education_credit(input, warnings),
                credits::rent_credit(input, gross, warnings),
            )
        };

        let donation_detail = donations::donation_credits(input, earned_income, !use_standard, warnings);
        let marriage = credits::marriage_credit(input);
        let standard = if use_standard {
            krw(credits::STANDARD_CREDIT)
        } else {
            Decimal::ZERO
        };

        let total = earned
            + child
            + birth
            + pension
            + insurance
            + medical
            + education
            + donation_detail.total
            + rent
            + marriage
            + standard;

        WageCredits {
            earned_income: earned,
            child,
            birth_adoption: birth,
            pension,
            insurance,
            medical,
            education,
            donation: donation_detail.total,
            donation_detail,
            rent,
            marriage,
            standard,
            total,
        }
    }
}
