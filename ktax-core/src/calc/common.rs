//! Shared numeric primitives for tax calculations.
//!
//! Amounts are KRW as `Decimal`; statutory flooring happens in multiples of
//! a rounding unit (1 won for bracket math, 10 won for determined amounts).

use rust_decimal::Decimal;

/// Floors a value to a multiple of `unit`.
///
/// Units below 1 behave as unit 1 (plain floor to whole won). Flooring is
/// toward negative infinity, matching statutory truncation of tax amounts.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use ktax_core::calc::common::floor_to_unit;
///
/// assert_eq!(floor_to_unit(dec!(1234.9), dec!(1)), dec!(1234));
/// assert_eq!(floor_to_unit(dec!(1239), dec!(10)), dec!(1230));
/// assert_eq!(floor_to_unit(dec!(-5), dec!(10)), dec!(-10));
/// ```
pub fn floor_to_unit(value: Decimal, unit: Decimal) -> Decimal {
    if unit <= Decimal::ONE {
        return value.floor();
    }
    (value / unit).floor() * unit
}

/// Normalizes a rate: values above 1 are read as percentages, negatives
/// collapse to zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use ktax_core::calc::common::normalize_rate;
///
/// assert_eq!(normalize_rate(dec!(0.14)), dec!(0.14));
/// assert_eq!(normalize_rate(dec!(14)), dec!(0.14));
/// assert_eq!(normalize_rate(dec!(-1)), dec!(0));
/// ```
pub fn normalize_rate(rate: Decimal) -> Decimal {
    if rate < Decimal::ZERO {
        Decimal::ZERO
    } else if rate > Decimal::ONE {
        rate / Decimal::ONE_HUNDRED
    } else {
        rate
    }
}

/// Clamps a value to zero from below.
pub fn clamp_non_negative(value: Decimal) -> Decimal {
    if value < Decimal::ZERO {
        Decimal::ZERO
    } else {
        value
    }
}

/// Shorthand for building whole-won amounts in rule tables and statutory
/// constants.
pub fn krw(value: i64) -> Decimal {
    Decimal::from(value)
}

/// Builds a rate from mantissa and scale, e.g. `rate(15, 2)` is 0.15.
pub fn rate(mantissa: i64, scale: u32) -> Decimal {
    Decimal::new(mantissa, scale)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // =========================================================================
    // floor_to_unit tests
    // =========================================================================

    #[test]
    fn floor_to_unit_one_drops_fraction() {
        let result = floor_to_unit(dec!(2827500.9), dec!(1));

        assert_eq!(result, dec!(2827500));
    }

    #[test]
    fn floor_to_unit_ten_drops_last_digit() {
        let result = floor_to_unit(dec!(2167507), dec!(10));

        assert_eq!(result, dec!(2167500));
    }

    #[test]
    fn floor_to_unit_preserves_exact_multiples() {
        let result = floor_to_unit(dec!(2167500), dec!(10));

        assert_eq!(result, dec!(2167500));
    }

    #[test]
    fn floor_to_unit_floors_negatives_downward() {
        let result = floor_to_unit(dec!(-15), dec!(10));

        assert_eq!(result, dec!(-20));
    }

    #[test]
    fn floor_to_unit_sub_one_unit_acts_as_one() {
        let result = floor_to_unit(dec!(123.45), dec!(0));

        assert_eq!(result, dec!(123));
    }

    // =========================================================================
    // normalize_rate tests
    // =========================================================================

    #[test]
    fn normalize_rate_keeps_fractions() {
        assert_eq!(normalize_rate(dec!(0.45)), dec!(0.45));
    }

    #[test]
    fn normalize_rate_converts_percentages() {
        assert_eq!(normalize_rate(dec!(45)), dec!(0.45));
    }

    #[test]
    fn normalize_rate_keeps_exactly_one() {
        assert_eq!(normalize_rate(dec!(1)), dec!(1));
    }

    #[test]
    fn normalize_rate_zeroes_negatives() {
        assert_eq!(normalize_rate(dec!(-0.1)), dec!(0));
    }

    // =========================================================================
    // clamp_non_negative tests
    // =========================================================================

    #[test]
    fn clamp_non_negative_passes_positives() {
        assert_eq!(clamp_non_negative(dec!(5)), dec!(5));
    }

    #[test]
    fn clamp_non_negative_zeroes_negatives() {
        assert_eq!(clamp_non_negative(dec!(-5)), dec!(0));
    }
}
