//! Progressive bracket evaluator shared by all three calculators.
//!
//! A bracket table pairs each band with a subtractive deduction, so the tax
//! for a base landing in a bracket is `base * rate - subtractive_deduction`,
//! floored to the caller's rounding unit. Negative results are NOT clamped
//! here: callers clamp to zero where their own semantics require it, which
//! keeps the evaluator reusable across differently-signed downstream uses.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calc::common::floor_to_unit;
use crate::models::TaxBracket;

/// Result of evaluating a base against a bracket table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketTax {
    /// Tax for the base, floored to the rounding unit. May be negative.
    pub tax: Decimal,
    /// The base the tax was computed on.
    pub taxable: Decimal,
    /// Index of the bracket that matched.
    pub bracket_used: usize,
}

/// Evaluates `base` against `table`.
///
/// Selects the first bracket (in table order) whose upper bound is open or
/// at least `base`. Tables are validated at rule-resolution time to end in
/// a catch-all; an unvalidated table that matches nothing degrades to its
/// last entry, and an empty table yields zero tax.
pub fn evaluate(base: Decimal, table: &[TaxBracket], rounding_unit: Decimal) -> BracketTax {
    let hit = table
        .iter()
        .enumerate()
        .find(|(_, bracket)| bracket.upper_bound.is_none_or(|upper| base <= upper))
        .or_else(|| table.iter().enumerate().last());

    match hit {
        Some((index, bracket)) => BracketTax {
            tax: floor_to_unit(base * bracket.rate - bracket.subtractive_deduction, rounding_unit),
            taxable: base,
            bracket_used: index,
        },
        None => BracketTax {
            tax: Decimal::ZERO,
            taxable: base,
            bracket_used: 0,
        },
    }
}
