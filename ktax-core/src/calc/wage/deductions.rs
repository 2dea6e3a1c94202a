//! Income deductions for the year-end settlement: personal, earned-income,
//! and housing. Card spend has its own module.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::calc::common::{floor_to_unit, krw, rate};
use crate::models::{Dependent, Warning, WarningCode};

use super::WageInput;

pub(super) const DEPENDENT_INCOME_CAP: i64 = 1_000_000;

const BASIC_DEDUCTION_PER_PERSON: i64 = 1_500_000;
const ELDERLY_DEDUCTION: i64 = 1_000_000;
const ELDERLY_AGE: u32 = 70;
const DISABILITY_DEDUCTION: i64 = 2_000_000;
const SINGLE_PARENT_DEDUCTION: i64 = 1_000_000;
const FEMALE_HEAD_DEDUCTION: i64 = 500_000;
const EARNED_INCOME_DEDUCTION_CAP: i64 = 20_000_000;
const HOUSING_SAVINGS_BASE_CAP: i64 = 3_000_000;
const HOUSING_COMBINED_CAP: i64 = 4_000_000;
const HOUSING_GROSS_LIMIT: i64 = 70_000_000;

/// Itemized personal deductions plus the classification counts the credit
/// cascade reuses.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersonalDeductions {
    pub basic: Decimal,
    pub elderly: Decimal,
    pub disability: Decimal,
    pub household: Decimal,
    pub total: Decimal,
    pub eligible_dependents: usize,
    pub child_credit_dependents: usize,
}

/// Classifies dependents and composes the personal deduction block.
///
/// Single-parent and female-head are mutually exclusive; single-parent wins
/// on conflict and the resolution is surfaced as a warning.
pub(super) fn personal_deductions(
    input: &WageInput,
    warnings: &mut Vec<Warning>,
) -> PersonalDeductions {
    let income_cap = krw(DEPENDENT_INCOME_CAP);
    let eligible: Vec<&Dependent> = input
        .dependents
        .iter()
        .filter(|dep| dep.is_eligible(income_cap))
        .collect();

    let eligible_count = eligible.len();
    let child_credit_count = eligible
        .iter()
        .filter(|dep| dep.is_child_credit_eligible(income_cap))
        .count();
    let elderly_count = eligible.iter().filter(|dep| dep.age >= ELDERLY_AGE).count();
    let disabled_count =
        eligible.iter().filter(|dep| dep.disabled).count() + usize::from(input.self_disabled);

    let basic = krw(BASIC_DEDUCTION_PER_PERSON) * Decimal::from(1 + eligible_count as u64);
    let elderly = krw(ELDERLY_DEDUCTION) * Decimal::from(elderly_count as u64);
    let disability = krw(DISABILITY_DEDUCTION) * Decimal::from(disabled_count as u64);

    let household = if input.is_single_parent {
        if input.is_female_head {
            warn!("single-parent and female-head both set; single-parent takes priority");
            warnings.push(Warning::new(
                WarningCode::SingleParentPriority,
                "single-parent and female-head both set; applied single-parent only",
            ));
        }
        krw(SINGLE_PARENT_DEDUCTION)
    } else if input.is_female_head {
        krw(FEMALE_HEAD_DEDUCTION)
    } else {
        Decimal::ZERO
    };

    let total = basic + elderly + disability + household;

    PersonalDeductions {
        basic,
        elderly,
        disability,
        household,
        total,
        eligible_dependents: eligible_count,
        child_credit_dependents: child_credit_count,
    }
}

/// Earned-income deduction: a five-tier declining-rate schedule of gross
/// salary, capped at 20,000,000.
pub(super) fn earned_income_deduction(gross: Decimal, warnings: &mut Vec<Warning>) -> Decimal {
    let deduction = if gross <= krw(5_000_000) {
        gross * rate(70, 2)
    } else if gross <= krw(15_000_000) {
        krw(3_500_000) + (gross - krw(5_000_000)) * rate(40, 2)
    } else if gross <= krw(45_000_000) {
        krw(7_500_000) + (gross - krw(15_000_000)) * rate(15, 2)
    } else if gross <= krw(100_000_000) {
        krw(12_000_000) + (gross - krw(45_000_000)) * rate(5, 2)
    } else {
        krw(14_750_000) + (gross - krw(100_000_000)) * rate(2, 2)
    };

    let cap = krw(EARNED_INCOME_DEDUCTION_CAP);
    if deduction > cap {
        warnings.push(Warning::new(
            WarningCode::EarnedIncomeDeductionCapped,
            format!("earned-income deduction capped at {cap}"),
        ));
        return cap;
    }
    floor_to_unit(deduction, Decimal::ONE)
}

/// Housing-savings and lease-loan-repayment deductions, sharing a combined
/// 4,000,000 cap with savings prioritized.
pub(super) fn housing_deduction(
    input: &WageInput,
    gross: Decimal,
    warnings: &mut Vec<Warning>,
) -> Decimal {
    let deduction_rate = rate(40, 2);

    let savings = if input.housing_savings_eligible && gross <= krw(HOUSING_GROSS_LIMIT) {
        input
            .housing_savings_paid
            .min(krw(HOUSING_SAVINGS_BASE_CAP))
            * deduction_rate
    } else {
        Decimal::ZERO
    };
    let lease = if input.lease_loan_eligible {
        input.lease_loan_repaid * deduction_rate
    } else {
        Decimal::ZERO
    };

    let cap = krw(HOUSING_COMBINED_CAP);
    let savings_applied = savings.min(cap);
    let lease_applied = lease.min(cap - savings_applied);

    if savings + lease > cap {
        warnings.push(Warning::new(
            WarningCode::HousingDeductionCapped,
            format!("housing deductions capped at combined {cap}"),
        ));
    }

    savings_applied + lease_applied
}
