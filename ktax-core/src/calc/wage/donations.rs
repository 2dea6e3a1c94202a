//! Donation credit waterfall for the wage calculator.
//!
//! Categories consume the earned-income base in a fixed order: political,
//! hometown, special-purpose, employee-stock, then general/religious. The
//! order is a preserved policy decision; it determines which category gets
//! starved first when earned income runs out.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calc::common::{clamp_non_negative, floor_to_unit, krw, rate};
use crate::models::{Warning, WarningCode};

use super::WageInput;

const POLITICAL_FIRST_TIER: i64 = 100_000;
const SECOND_TIER_CAP: i64 = 30_000_000;
const HOMETOWN_CAP: i64 = 20_000_000;
const COMBINED_RATE_STEP: i64 = 10_000_000;

/// Itemized donation bases and credits.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DonationCredits {
    pub political_base: Decimal,
    pub hometown_base: Decimal,
    pub combined_base: Decimal,
    pub political_credit: Decimal,
    pub hometown_credit: Decimal,
    pub combined_credit: Decimal,
    pub total: Decimal,
}

/// Tiered rate shared by political and hometown donations: the first
/// 100,000 at 100/110, the next 30,000,000 at `second_rate`, the remainder
/// at 25%.
fn tiered_credit(base: Decimal, second_rate: Decimal) -> Decimal {
    let first = base.min(krw(POLITICAL_FIRST_TIER));
    let second = (base - first).min(krw(SECOND_TIER_CAP));
    let third = base - first - second;
    first * krw(100) / krw(110) + second * second_rate + third * rate(25, 2)
}

pub(super) fn donation_credits(
    input: &WageInput,
    earned_income: Decimal,
    include_general: bool,
    warnings: &mut Vec<Warning>,
) -> DonationCredits {
    let mut remaining = clamp_non_negative(earned_income);
    let mut starved = false;

    let political_base = input.donation_political.min(remaining);
    starved |= input.donation_political > political_base;
    remaining -= political_base;

    let hometown_cap = krw(HOMETOWN_CAP).min(remaining);
    let hometown_base = input.donation_hometown.min(hometown_cap);
    starved |= input.donation_hometown > hometown_base;
    remaining -= hometown_base;

    let special_base = input.donation_special.min(remaining);
    starved |= input.donation_special > special_base;
    remaining -= special_base;

    let employee_base = input
        .donation_employee_stock
        .min(remaining * rate(30, 2));
    starved |= input.donation_employee_stock > employee_base;
    remaining -= employee_base;

    let (religious_base, general_base) = if include_general {
        let religious = input.donation_religious.min(remaining * rate(10, 2));
        let general_cap_rate = if religious > Decimal::ZERO {
            rate(20, 2)
        } else {
            rate(30, 2)
        };
        let general = input.donation_general.min(remaining * general_cap_rate);
        starved |= input.donation_religious > religious || input.donation_general > general;
        (religious, general)
    } else {
        (Decimal::ZERO, Decimal::ZERO)
    };

    if starved {
        warnings.push(Warning::new(
            WarningCode::DonationBaseExhausted,
            "donation exceeds its remaining earned-income base; excess carries no credit",
        ));
    }

    let political_credit = tiered_credit(political_base, rate(15, 2));
    let hometown_second_rate = if input.hometown_disaster {
        rate(30, 2)
    } else {
        rate(15, 2)
    };
    let hometown_credit = tiered_credit(hometown_base, hometown_second_rate);

    let combined_base = special_base + employee_base + general_base + religious_base;
    let step = krw(COMBINED_RATE_STEP);
    let combined_credit =
        combined_base.min(step) * rate(15, 2) + clamp_non_negative(combined_base - step) * rate(30, 2);

    let total = floor_to_unit(
        political_credit + hometown_credit + combined_credit,
        Decimal::ONE,
    );

    DonationCredits {
        political_base,
        hometown_base,
        combined_base,
        political_credit,
        hometown_credit,
        combined_credit,
        total,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn income() -> Decimal {
        dec!(50_000_000)
    }

    #[test]
    fn political_donation_tiered_rates() {
        let input = WageInput {
            donation_political: dec!(1_100_000),
            ..WageInput::default()
        };
        let mut warnings = Vec::new();

        let result = donation_credits(&input, income(), true, &mut warnings);

        // First 100,000 at 100/110 plus 1,000,000 at 15%.
        let expected = dec!(100_000) * dec!(100) / dec!(110) + dec!(150_000);
        assert_eq!(result.political_credit, expected);
        assert!(warnings.is_empty());
    }

    #[test]
    fn hometown_disaster_raises_second_tier() {
        let input = WageInput {
            donation_hometown: dec!(5_100_000),
            hometown_disaster: true,
            ..WageInput::default()
        };
        let mut warnings = Vec::new();

        let result = donation_credits(&input, income(), true, &mut warnings);

        let expected = dec!(100_000) * dec!(100) / dec!(110) + dec!(5_000_000) * dec!(0.30);
        assert_eq!(result.hometown_credit, expected);
    }

    #[test]
    fn hometown_base_caps_at_twenty_million() {
        let input = WageInput {
            donation_hometown: dec!(30_000_000),
            ..WageInput::default()
        };
        let mut warnings = Vec::new();

        let result = donation_credits(&input, income(), true, &mut warnings);

        assert_eq!(result.hometown_base, dec!(20_000_000));
        assert_eq!(warnings[0].code, WarningCode::DonationBaseExhausted);
    }

    #[test]
    fn religious_capped_at_ten_percent_of_remainder() {
        let input = WageInput {
            donation_religious: dec!(10_000_000),
            ..WageInput::default()
        };
        let mut warnings = Vec::new();

        let result = donation_credits(&input, income(), true, &mut warnings);

        // 10% of the untouched 50M base.
        assert_eq!(result.combined_base, dec!(5_000_000));
    }

    #[test]
    fn general_rate_drops_when_religious_present() {
        let with_religious = WageInput {
            donation_religious: dec!(1_000_000),
            donation_general: dec!(20_000_000),
            ..WageInput::default()
        };
        let without_religious = WageInput {
            donation_general: dec!(20_000_000),
            ..WageInput::default()
        };
        let mut warnings = Vec::new();

        let with_result = donation_credits(&with_religious, income(), true, &mut warnings);
        let without_result = donation_credits(&without_religious, income(), true, &mut warnings);

        // 20% vs 30% of the 50M remainder.
        assert_eq!(with_result.combined_base, dec!(11_000_000));
        assert_eq!(without_result.combined_base, dec!(15_000_000));
    }

    #[test]
    fn combined_credit_steps_up_past_ten_million() {
        let input = WageInput {
            donation_special: dec!(14_000_000),
            ..WageInput::default()
        };
        let mut warnings = Vec::new();

        let result = donation_credits(&input, income(), true, &mut warnings);

        // 15% of 10M plus 30% of 4M.
        assert_eq!(result.combined_credit, dec!(2_700_000));
    }

    #[test]
    fn waterfall_starves_later_categories() {
        let input = WageInput {
            donation_political: dec!(4_000_000),
            donation_special: dec!(10_000_000),
            ..WageInput::default()
        };
        let mut warnings = Vec::new();

        let result = donation_credits(&input, dec!(5_000_000), true, &mut warnings);

        assert_eq!(result.political_base, dec!(4_000_000));
        // Only 1M of base left for the special-purpose donation.
        assert_eq!(result.combined_base, dec!(1_000_000));
        assert_eq!(warnings[0].code, WarningCode::DonationBaseExhausted);
    }

    #[test]
    fn standard_credit_excludes_general_and_religious_only() {
        let input = WageInput {
            donation_political: dec!(100_000),
            donation_general: dec!(1_000_000),
            donation_religious: dec!(1_000_000),
            ..WageInput::default()
        };
        let mut warnings = Vec::new();

        let result = donation_credits(&input, income(), false, &mut warnings);

        assert!(result.political_credit > dec!(0));
        assert_eq!(result.combined_base, dec!(0));
    }
}
