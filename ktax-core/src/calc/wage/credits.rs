//! Tax-credit cascade for the year-end settlement.
//!
//! Each credit is computed independently from its own inputs and summed by
//! the orchestrator in `mod.rs`, which also handles the standard-credit
//! switch that replaces the itemized group.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calc::common::{clamp_non_negative, floor_to_unit, krw, rate};
use crate::models::{Warning, WarningCode};

use super::WageInput;
use super::donations::DonationCredits;

const EARNED_CREDIT_BREAK: i64 = 1_300_000;
const PENSION_CAP: i64 = 6_000_000;
const PENSION_CAP_WITH_IRP: i64 = 9_000_000;
const ISA_PORTION_CAP: i64 = 3_000_000;
const PENSION_RATE_GROSS_LIMIT: i64 = 55_000_000;
const INSURANCE_PREMIUM_CAP: i64 = 1_000_000;
const MEDICAL_JOINT_CREDIT_CAP: i64 = 7_000_000;
const EDUCATION_K12_CAP_PER_STUDENT: i64 = 3_000_000;
const EDUCATION_UNIVERSITY_CAP_PER_STUDENT: i64 = 9_000_000;
const RENT_PAID_CAP: i64 = 10_000_000;
const RENT_GROSS_LIMIT: i64 = 80_000_000;
const MARRIAGE_CREDIT: i64 = 500_000;
pub(super) const STANDARD_CREDIT: i64 = 130_000;

/// Itemized credit amounts, all floored to whole won.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WageCredits {
    pub earned_income: Decimal,
    pub child: Decimal,
    pub birth_adoption: Decimal,
    pub pension: Decimal,
    pub insurance: Decimal,
    pub medical: Decimal,
    pub education: Decimal,
    pub donation: Decimal,
    pub donation_detail: DonationCredits,
    pub rent: Decimal,
    pub marriage: Decimal,
    pub standard: Decimal,
    pub total: Decimal,
}

/// Earned-income credit: 55% of calculated tax up to 1,300,000, then a
/// two-piece formula, capped by a gross-salary tier table.
pub(super) fn earned_income_credit(calculated_tax: Decimal, gross: Decimal) -> Decimal {
    let brk = krw(EARNED_CREDIT_BREAK);
    let credit = if calculated_tax <= brk {
        calculated_tax * rate(55, 2)
    } else {
        krw(715_000) + (calculated_tax - brk) * rate(30, 2)
    };

    let cap = if gross <= krw(33_000_000) {
        krw(740_000)
    } else if gross <= krw(70_000_000) {
        krw(660_000)
    } else if gross <= krw(120_000_000) {
        krw(500_000)
    } else {
        krw(200_000)
    };

    floor_to_unit(credit.min(cap), Decimal::ONE)
}

/// Child credit, stepped by the count of child-credit-eligible dependents.
pub(super) fn child_credit(count: usize) -> Decimal {
    match count {
        0 => Decimal::ZERO,
        1 => krw(250_000),
        2 => krw(550_000),
        n => krw(550_000) + krw(400_000) * Decimal::from((n - 2) as u64),
    }
}

/// Birth/adoption credit: flat amount per order of birth.
pub(super) fn birth_adoption_credit(birth_orders: &[u32]) -> Decimal {
    birth_orders
        .iter()
        .map(|order| match order {
            0 | 1 => krw(300_000),
            2 => krw(500_000),
            _ => krw(700_000),
        })
        .sum()
}

/// Pension/ISA credit: capped eligible contribution plus 10% of the ISA
/// transfer, at 15% (gross <= 55,000,000) or 12%.
pub(super) fn pension_credit(
    input: &WageInput,
    gross: Decimal,
    warnings: &mut Vec<Warning>,
) -> Decimal {
    let cap = if input.has_irp {
        krw(PENSION_CAP_WITH_IRP)
    } else {
        krw(PENSION_CAP)
    };
    let contribution = input.pension_contribution.min(cap);
    if input.pension_contribution > cap {
        warnings.push(Warning::new(
            WarningCode::PensionContributionCapped,
            format!("pension contribution capped at {cap}"),
        ));
    }

    let isa_portion = (input.isa_transfer * rate(10, 2)).min(krw(ISA_PORTION_CAP));
    if input.isa_transfer * rate(10, 2) > isa_portion {
        warnings.push(Warning::new(
            WarningCode::IsaTransferCapped,
            "ISA transfer credit base capped at 3,000,000",
        ));
    }

    let credit_rate = if gross <= krw(PENSION_RATE_GROSS_LIMIT) {
        rate(15, 2)
    } else {
        rate(12, 2)
    };

    floor_to_unit((contribution + isa_portion) * credit_rate, Decimal::ONE)
}

/// Insurance credit: min(premium, 1,000,000) at 15% for disabled-person
/// policies, else 12%.
pub(super) fn insurance_credit(input: &WageInput, warnings: &mut Vec<Warning>) -> Decimal {
    let premium = input.insurance_premium.min(krw(INSURANCE_PREMIUM_CAP));
    if input.insurance_premium > premium {
        warnings.push(Warning::new(
            WarningCode::InsurancePremiumCapped,
            "insurance premium capped at 1,000,000",
        ));
    }
    let credit_rate = if input.disabled_policy {
        rate(15, 2)
    } else {
        rate(12, 2)
    };
    floor_to_unit(premium * credit_rate, Decimal::ONE)
}

/// Medical credit over four categories.
///
/// Insurance reimbursement is pro-rated across categories by the overall
/// reimbursement ratio; the 3%-of-gross floor is then consumed in priority
/// order general, special, premature, infertility. General and special
/// credits are jointly capped at 7,000,000.
pub(super) fn medical_credit(
    input: &WageInput,
    gross: Decimal,
    warnings: &mut Vec<Warning>,
) -> Decimal {
    let total = input.medical_general
        + input.medical_special
        + input.medical_premature
        + input.medical_infertility;
    if total <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let reimbursement_ratio = (input.medical_reimbursement / total).min(Decimal::ONE);
    let keep = Decimal::ONE - reimbursement_ratio;

    let mut general = input.medical_general * keep;
    let mut special = input.medical_special * keep;
    let mut premature = input.medical_premature * keep;
    let mut infertility = input.medical_infertility * keep;

    // The non-creditable floor eats categories in priority order.
    let mut floor_remaining = gross * rate(3, 2);
    for category in [&mut general, &mut special, &mut premature, &mut infertility] {
        let consumed = (*category).min(floor_remaining);
        *category -= consumed;
        floor_remaining -= consumed;
    }

    let joint = (general + special) * rate(15, 2);
    let joint_cap = krw(MEDICAL_JOINT_CREDIT_CAP);
    if joint > joint_cap {
        warnings.push(Warning::new(
            WarningCode::MedicalCreditCapped,
            "general and special medical credits capped at combined 7,000,000",
        ));
    }

    let credit = joint.min(joint_cap) + premature * rate(20, 2) + infertility * rate(30, 2);
    floor_to_unit(credit, Decimal::ONE)
}

/// Education credit: 15% of capped K-12 and university spend plus uncapped
/// self-education.
pub(super) fn education_credit(input: &WageInput, warnings: &mut Vec<Warning>) -> Decimal {
    let k12_cap = krw(EDUCATION_K12_CAP_PER_STUDENT) * Decimal::from(input.education_k12_students);
    let university_cap =
        krw(EDUCATION_UNIVERSITY_CAP_PER_STUDENT) * Decimal::from(input.education_university_students);

    let k12 = input.education_k12_spend.min(k12_cap);
    let university = input.education_university_spend.min(university_cap);

    if input.education_k12_spend > k12 || input.education_university_spend > university {
        warnings.push(Warning::new(
            WarningCode::EducationSpendCapped,
            "education spend capped per eligible dependent",
        ));
    }

    floor_to_unit(
        (k12 + university + input.education_self_spend) * rate(15, 2),
        Decimal::ONE,
    )
}

/// Rent credit: min(rent, 10,000,000) at 17% (gross <= 55,000,000) or 15%,
/// gated on eligibility and gross <= 80,000,000.
pub(super) fn rent_credit(input: &WageInput, gross: Decimal, warnings: &mut Vec<Warning>) -> Decimal {
    if !input.rent_eligible {
        return Decimal::ZERO;
    }
    if gross > krw(RENT_GROSS_LIMIT) {
        if input.rent_paid > Decimal::ZERO {
            warnings.push(Warning::new(
                WarningCode::RentIneligible,
                "rent credit requires gross salary <= 80,000,000",
            ));
        }
        return Decimal::ZERO;
    }

    let paid = input.rent_paid.min(krw(RENT_PAID_CAP));
    if input.rent_paid > paid {
        warnings.push(Warning::new(
            WarningCode::RentPaidCapped,
            "rent credit base capped at 10,000,000",
        ));
    }

    let credit_rate = if gross <= krw(PENSION_RATE_GROSS_LIMIT) {
        rate(17, 2)
    } else {
        rate(15, 2)
    };
    floor_to_unit(paid * credit_rate, Decimal::ONE)
}

/// Marriage credit: flat 500,000 when flagged.
pub(super) fn marriage_credit(input: &WageInput) -> Decimal {
    if input.married_this_year {
        krw(MARRIAGE_CREDIT)
    } else {
        Decimal::ZERO
    }
}

pub(super) fn clamped_non_negative_floor(value: Decimal, unit: Decimal) -> Decimal {
    floor_to_unit(clamp_non_negative(value), unit)
}
