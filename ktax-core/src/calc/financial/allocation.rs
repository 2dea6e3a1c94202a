//! Threshold allocation of financial-income items.
//!
//! Each item is split into a threshold portion (taxed separately at its own
//! withholding rate) and an excess portion (folded into the comprehensive
//! base). Allocation runs in list order, first come first served, never
//! size-sorted; the split is recomputed on every call.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calc::common::clamp_non_negative;
use crate::models::{IncomeItem, IncomeSource};

/// Derived split of one income item against the shared threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAllocation {
    pub amount: Decimal,
    pub threshold_portion: Decimal,
    pub excess_portion: Decimal,
    pub withholding_rate: Decimal,
    pub source: IncomeSource,
    pub gross_up_eligible: bool,
}

/// Aggregates computed alongside the per-item splits.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AllocationTotals {
    pub financial_total: Decimal,
    pub threshold_total: Decimal,
    pub excess_total: Decimal,
    pub foreign_income: Decimal,
    pub foreign_tax_paid: Decimal,
    pub prepaid_tax: Decimal,
    pub has_foreign: bool,
}

pub(super) fn allocate(
    items: &[IncomeItem],
    threshold: Decimal,
) -> (Vec<ItemAllocation>, AllocationTotals) {
    let mut remaining = clamp_non_negative(threshold);
    let mut allocations = Vec::with_capacity(items.len());
    let mut totals = AllocationTotals::default();

    for item in items {
        let amount = clamp_non_negative(item.amount);
        let threshold_portion = amount.min(remaining);
        let excess_portion = amount - threshold_portion;
        remaining -= threshold_portion;

        totals.financial_total += amount;
        totals.threshold_total += threshold_portion;
        totals.excess_total += excess_portion;
        totals.foreign_tax_paid += item.foreign_tax_paid;
        totals.prepaid_tax += item.prepaid_tax;
        if item.source == IncomeSource::Foreign {
            totals.has_foreign = true;
            totals.foreign_income += amount;
        }

        allocations.push(ItemAllocation {
            amount,
            threshold_portion,
            excess_portion,
            withholding_rate: item.withholding_rate,
            source: item.source,
            gross_up_eligible: item.gross_up_eligible,
        });
    }

    (allocations, totals)
}

/// Withholding tax on the threshold portions only (comprehensive method).
pub(super) fn threshold_withholding(allocations: &[ItemAllocation]) -> Decimal {
    allocations
        .iter()
        .map(|a| a.threshold_portion * a.withholding_rate)
        .sum()
}

/// Withholding tax on the full amounts (separate method).
pub(super) fn full_withholding(allocations: &[ItemAllocation]) -> Decimal {
    allocations
        .iter()
        .map(|a| a.amount * a.withholding_rate)
        .sum()
}

/// Gross-up base: excess portions of gross-up-eligible items.
pub(super) fn gross_up_base(allocations: &[ItemAllocation]) -> Decimal {
    allocations
        .iter()
        .filter(|a| a.gross_up_eligible)
        .map(|a| a.excess_portion)
        .sum()
}
