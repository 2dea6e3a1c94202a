use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One row of a progressive rate schedule.
///
/// The national schedules are published with a per-bracket subtractive
/// deduction, so tax for a base that lands in a bracket is a single
/// multiply-and-subtract: `base * rate - subtractive_deduction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    /// Inclusive upper bound of the bracket. `None` marks the catch-all
    /// bracket, which must be the last entry of its table.
    pub upper_bound: Option<Decimal>,
    /// Marginal rate as a fraction in `0..=1`.
    pub rate: Decimal,
    /// Amount subtracted after applying the rate to the full base.
    pub subtractive_deduction: Decimal,
}

/// An ordered progressive rate schedule.
///
/// Validated once at rule-resolution time (exactly one trailing catch-all,
/// non-decreasing rates); calculators treat a resolved table as trusted.
pub type BracketTable = Vec<TaxBracket>;
