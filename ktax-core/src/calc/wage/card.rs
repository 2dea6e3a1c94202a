//! Card-spend deduction.
//!
//! Spend only counts past a 25%-of-gross floor. The floor is consumed by
//! category in ascending order of per-unit deduction rate (credit, then
//! debit/culture, then transit/market), so the cheapest deduction rates are
//! burned first. The net deduction is capped at a base cap, topped up from
//! culture and transit/market deductions within an extra cap, and finished
//! with a consumption-growth bonus that fills remaining extra-cap headroom.
//!
//! Transit and traditional-market spend form a single 40% category: they
//! share one slot in the floor-consumption order and both feed the top-up
//! pool alongside culture.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calc::common::{clamp_non_negative, floor_to_unit, krw, rate};
use crate::models::{Warning, WarningCode};

use super::WageInput;

const SPEND_FLOOR_RATE: (i64, u32) = (25, 2);
const CREDIT_RATE: (i64, u32) = (15, 2);
const DEBIT_RATE: (i64, u32) = (30, 2);
const CULTURE_RATE: (i64, u32) = (30, 2);
const TRANSIT_MARKET_RATE: (i64, u32) = (40, 2);
const CULTURE_GROSS_LIMIT: i64 = 70_000_000;
const BASE_CAP_LOW: i64 = 3_000_000;
const BASE_CAP_HIGH: i64 = 2_500_000;
const EXTRA_CAP_LOW: i64 = 3_000_000;
const EXTRA_CAP_HIGH: i64 = 2_000_000;
const GROWTH_BASE_RATE: (i64, u32) = (105, 2);
const GROWTH_BONUS_RATE: (i64, u32) = (10, 2);
const GROWTH_BONUS_CAP: i64 = 1_000_000;

/// Breakdown of the card-spend deduction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CardDeduction {
    pub eligible_spend: Decimal,
    pub spend_floor: Decimal,
    pub base_deduction: Decimal,
    pub extra_deduction: Decimal,
    pub growth_bonus: Decimal,
    pub total: Decimal,
}

pub(super) fn card_deduction(
    input: &WageInput,
    gross: Decimal,
    warnings: &mut Vec<Warning>,
) -> CardDeduction {
    let low_gross = gross <= krw(CULTURE_GROSS_LIMIT);

    let culture = if low_gross && input.culture_eligible {
        input.culture_spend
    } else {
        if input.culture_spend > Decimal::ZERO {
            warnings.push(Warning::new(
                WarningCode::CultureSpendExcluded,
                "culture/sports spend excluded (requires eligibility and gross <= 70,000,000)",
            ));
        }
        Decimal::ZERO
    };

    let credit = input.credit_card_spend;
    let debit = input.debit_card_spend;
    let transit_market = input.transit_spend + input.market_spend;
    let eligible_spend = credit + debit + culture + transit_market;

    let spend_floor = gross * rate(SPEND_FLOOR_RATE.0, SPEND_FLOOR_RATE.1);
    if eligible_spend <= spend_floor {
        return CardDeduction {
            eligible_spend,
            spend_floor,
            ..CardDeduction::default()
        };
    }

    let culture_deduction = culture * rate(CULTURE_RATE.0, CULTURE_RATE.1);
    let transit_market_deduction =
        transit_market * rate(TRANSIT_MARKET_RATE.0, TRANSIT_MARKET_RATE.1);
    let raw_deduction = credit * rate(CREDIT_RATE.0, CREDIT_RATE.1)
        + debit * rate(DEBIT_RATE.0, DEBIT_RATE.1)
        + culture_deduction
        + transit_market_deduction;

    // Burn the non-deductible floor through the categories with the lowest
    // per-unit deduction rate first.
    let mut floor_remaining = spend_floor;
    let mut floor_deduction = Decimal::ZERO;
    for (spend, tier_rate) in [
        (credit, rate(CREDIT_RATE.0, CREDIT_RATE.1)),
        (debit + culture, rate(DEBIT_RATE.0, DEBIT_RATE.1)),
        (transit_market, rate(TRANSIT_MARKET_RATE.0, TRANSIT_MARKET_RATE.1)),
    ] {
        let consumed = spend.min(floor_remaining);
        floor_deduction += consumed * tier_rate;
        floor_remaining -= consumed;
    }

    let net = clamp_non_negative(raw_deduction - floor_deduction);

    let (base_cap, extra_cap) = if low_gross {
        (krw(BASE_CAP_LOW), krw(EXTRA_CAP_LOW))
    } else {
        (krw(BASE_CAP_HIGH), krw(EXTRA_CAP_HIGH))
    };

    let base_deduction = net.min(base_cap);
    let over_base = net - base_deduction;

    // The top-up beyond the base cap can only come from culture and
    // transit/market deductions.
    let extra_pool = culture_deduction + transit_market_deduction;
    let extra_deduction = over_base.min(extra_pool).min(extra_cap);

    if over_base > extra_deduction {
        warnings.push(Warning::new(
            WarningCode::CardDeductionCapped,
            format!("card deduction capped at base {base_cap} plus extra {extra_cap}"),
        ));
    }

    // Growth cannot be estimated without prior-year data.
    let growth_bonus = if input.prior_year_card_spend > Decimal::ZERO {
        let growth = clamp_non_negative(
            eligible_spend
                - input.prior_year_card_spend * rate(GROWTH_BASE_RATE.0, GROWTH_BASE_RATE.1),
        );
        (growth * rate(GROWTH_BONUS_RATE.0, GROWTH_BONUS_RATE.1))
            .min(krw(GROWTH_BONUS_CAP))
            .min(extra_cap - extra_deduction)
    } else {
        Decimal::ZERO
    };

    let total = floor_to_unit(base_deduction + extra_deduction + growth_bonus, Decimal::ONE);

    CardDeduction {
        eligible_spend,
        spend_floor,
        base_deduction,
        extra_deduction,
        growth_bonus,
        total,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn gross() -> Decimal {
        dec!(40_000_000)
    }

    #[test]
    fn spend_at_or_below_floor_deducts_nothing() {
        let input = WageInput {
            credit_card_spend: dec!(10_000_000), // floor is 10M at 40M gross
            ..WageInput::default()
        };
        let mut warnings = Vec::new();

        let result = card_deduction(&input, gross(), &mut warnings);

        assert_eq!(result.total, dec!(0));
        assert_eq!(result.spend_floor, dec!(10_000_000));
    }

    #[test]
    fn credit_only_spend_above_floor() {
        let input = WageInput {
            credit_card_spend: dec!(20_000_000),
            ..WageInput::default()
        };
        let mut warnings = Vec::new();

        let result = card_deduction(&input, gross(), &mut warnings);

        // Raw 20M * 15% = 3M; floor consumes 10M at 15% = 1.5M; net 1.5M.
        assert_eq!(result.base_deduction, dec!(1_500_000));
        assert_eq!(result.total, dec!(1_500_000));
    }

    #[test]
    fn floor_burns_lowest_rate_category_first() {
        let input = WageInput {
            credit_card_spend: dec!(10_000_000),
            market_spend: dec!(10_000_000),
            ..WageInput::default()
        };
        let mut warnings = Vec::new();

        let result = card_deduction(&input, gross(), &mut warnings);

        // Raw: 10M*15% + 10M*40% = 5.5M. Floor 10M fully consumed by credit
        // at 15% = 1.5M. Net 4M, base capped at 3M, extra from market pool.
        assert_eq!(result.base_deduction, dec!(3_000_000));
        assert_eq!(result.extra_deduction, dec!(1_000_000));
    }

    #[test]
    fn transit_spend_feeds_the_top_up_pool() {
        let input = WageInput {
            credit_card_spend: dec!(10_000_000),
            transit_spend: dec!(12_000_000),
            ..WageInput::default()
        };
        let mut warnings = Vec::new();

        let result = card_deduction(&input, gross(), &mut warnings);

        // Raw: 10M*15% + 12M*40% = 6.3M. Floor 10M fully consumed by credit
        // at 15% = 1.5M. Net 4.8M: base 3M, the 1.8M overflow drawn from the
        // transit deduction.
        assert_eq!(result.base_deduction, dec!(3_000_000));
        assert_eq!(result.extra_deduction, dec!(1_800_000));
        assert_eq!(result.total, dec!(4_800_000));
    }

    #[test]
    fn saturates_at_base_plus_extra_cap() {
        let input = WageInput {
            credit_card_spend: dec!(50_000_000),
            market_spend: dec!(50_000_000),
            culture_spend: dec!(20_000_000),
            culture_eligible: true,
            ..WageInput::default()
        };
        let mut warnings = Vec::new();

        let result = card_deduction(&input, gross(), &mut warnings);

        assert_eq!(result.base_deduction, dec!(3_000_000));
        assert_eq!(result.extra_deduction, dec!(3_000_000));
        assert_eq!(result.growth_bonus, dec!(0));
        assert_eq!(result.total, dec!(6_000_000));
        assert!(warnings.iter().any(|w| w.code == WarningCode::CardDeductionCapped));
    }

    #[test]
    fn culture_spend_requires_low_gross_and_flag() {
        let input = WageInput {
            credit_card_spend: dec!(30_000_000),
            culture_spend: dec!(5_000_000),
            culture_eligible: true,
            ..WageInput::default()
        };
        let mut warnings = Vec::new();

        let result = card_deduction(&input, dec!(80_000_000), &mut warnings);

        assert_eq!(result.eligible_spend, dec!(30_000_000));
        assert!(warnings.iter().any(|w| w.code == WarningCode::CultureSpendExcluded));
    }

    #[test]
    fn high_gross_uses_tighter_caps() {
        let input = WageInput {
            credit_card_spend: dec!(80_000_000),
            market_spend: dec!(30_000_000),
            ..WageInput::default()
        };
        let mut warnings = Vec::new();

        let result = card_deduction(&input, dec!(80_000_000), &mut warnings);

        assert_eq!(result.base_deduction, dec!(2_500_000));
        assert_eq!(result.extra_deduction, dec!(2_000_000));
    }

    #[test]
    fn growth_bonus_fills_remaining_extra_headroom() {
        let input = WageInput {
            credit_card_spend: dec!(30_000_000),
            prior_year_card_spend: dec!(20_000_000),
            ..WageInput::default()
        };
        let mut warnings = Vec::new();

        let result = card_deduction(&input, gross(), &mut warnings);

        // Growth: 30M - 21M = 9M -> 10% = 900,000, capped at 1M, headroom 3M.
        assert_eq!(result.growth_bonus, dec!(900_000));
        // Net deduction: 30M*15% - 10M*15% = 3M (exactly the base cap).
        assert_eq!(result.total, dec!(3_900_000));
    }
}
