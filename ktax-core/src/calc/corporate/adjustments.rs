//! Book-to-tax adjustments: deemed revenue on related-party dealings and
//! non-deductible expense add-backs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calc::common::{clamp_non_negative, krw};
use crate::models::{Warning, WarningCode};
use crate::rules::CorporateRules;

use super::CorporateInput;

/// Itemized add-backs to book net income.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Adjustments {
    pub deemed_interest: Decimal,
    pub deemed_rent: Decimal,
    pub promotion_disallowed: Decimal,
    pub vehicle_disallowed: Decimal,
    pub depreciation_disallowed: Decimal,
    pub total: Decimal,
}

pub(super) fn adjustments(
    input: &CorporateInput,
    rules: &CorporateRules,
    warnings: &mut Vec<Warning>,
) -> Adjustments {
    let deemed_interest = clamp_non_negative(
        input.related_party_advances * rules.overdraft_rate - input.advance_interest_received,
    );

    // Deemed rent applies only to real-estate-rental companies whose debt
    // exceeds twice their equity, on the excess portion.
    let deemed_rent = if input.is_real_estate_rental {
        let excess_debt = clamp_non_negative(input.total_debt - input.total_equity * krw(2));
        excess_debt * rules.deemed_rent_rate
    } else {
        Decimal::ZERO
    };

    let promotion_disallowed = promotion_disallowed(input, rules, warnings);

    let vehicle_disallowed: Decimal = input
        .vehicle_depreciation
        .iter()
        .map(|amount| clamp_non_negative(*amount - rules.vehicle_depreciation_cap))
        .sum();
    if vehicle_disallowed > Decimal::ZERO {
        warnings.push(Warning::new(
            WarningCode::VehicleDepreciationCapped,
            format!(
                "vehicle depreciation capped at {} per vehicle",
                rules.vehicle_depreciation_cap
            ),
        ));
    }

    let depreciation_disallowed = match input.depreciation_limit {
        Some(limit) => {
            let excess = clamp_non_negative(input.depreciation_claimed - limit);
            if excess > Decimal::ZERO {
                warnings.push(Warning::new(
                    WarningCode::DepreciationCapped,
                    format!("depreciation capped at statutory limit {limit}"),
                ));
            }
            excess
        }
        None => Decimal::ZERO,
    };

    let total = deemed_interest
        + deemed_rent
        + promotion_disallowed
        + vehicle_disallowed
        + depreciation_disallowed;

    Adjustments {
        deemed_interest,
        deemed_rent,
        promotion_disallowed,
        vehicle_disallowed,
        depreciation_disallowed,
        total,
    }
}

/// Business-promotion spend above the revenue-based limit. The limit is a
/// base amount by entity size plus a marginal schedule over revenue, with
/// culture and traditional-market spend each granted a bonus sub-cap as a
/// fraction of that limit.
fn promotion_disallowed(
    input: &CorporateInput,
    rules: &CorporateRules,
    warnings: &mut Vec<Warning>,
) -> Decimal {
    let base = if input.is_sme {
        rules.promotion_base_limit_sme
    } else {
        rules.promotion_base_limit_general
    };
    let limit = base + marginal_revenue_limit(input.revenue, rules);

    let general_allowed = input.promotion_spend.min(limit);
    let culture_allowed = input
        .culture_promotion_spend
        .min(limit * rules.culture_promotion_bonus_ratio);
    let market_allowed = input
        .market_promotion_spend
        .min(limit * rules.market_promotion_bonus_ratio);

    let total_spend =
        input.promotion_spend + input.culture_promotion_spend + input.market_promotion_spend;
    let disallowed = total_spend - general_allowed - culture_allowed - market_allowed;

    if disallowed > Decimal::ZERO {
        warnings.push(Warning::new(
            WarningCode::PromotionSpendCapped,
            format!("business-promotion spend exceeds the deductible limit {limit}"),
        ));
    }
    disallowed
}

fn marginal_revenue_limit(revenue: Decimal, rules: &CorporateRules) -> Decimal {
    let mut remaining = clamp_non_negative(revenue);
    let mut previous_bound = Decimal::ZERO;
    let mut limit = Decimal::ZERO;
    for tier in &rules.promotion_revenue_tiers {
        let width = match tier.upper_bound {
            Some(upper) => (upper - previous_bound).min(remaining),
            None => remaining,
        };
        limit += width * tier.rate;
        remaining -= width;
        if let Some(upper) = tier.upper_bound {
            previous_bound = upper;
        }
        if remaining <= Decimal::ZERO {
            break;
        }
    }
    limit
}

/// Two-tier donation waterfall. Both donation categories are first added
/// back to form the pre-donation base; the statutory category is then
/// allowed up to its fraction of that base and the designated category up
/// to its fraction of the remainder. The disallowed excess stays added
/// back.
pub(super) fn donation_disallowed(
    input: &CorporateInput,
    base_before_donations: Decimal,
    rules: &CorporateRules,
    warnings: &mut Vec<Warning>,
) -> Decimal {
    let base = clamp_non_negative(base_before_donations);

    let statutory_allowed = input
        .statutory_donations
        .min(base * rules.statutory_donation_cap_ratio);
    let remaining = base - statutory_allowed;
    let designated_allowed = input
        .designated_donations
        .min(remaining * rules.designated_donation_cap_ratio);

    let disallowed = (input.statutory_donations - statutory_allowed)
        + (input.designated_donations - designated_allowed);
    if disallowed > Decimal::ZERO {
        warnings.push(Warning::new(
            WarningCode::CorporateDonationCapped,
            "donations exceed the deductible fraction of the pre-donation base",
        ));
    }
    disallowed
}
