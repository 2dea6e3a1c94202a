//! Lenient deserialization for form-style payloads.
//!
//! Live-form input is permissive by contract: a numeric field may arrive as a
//! number, a numeric string, `null`, or not at all, and anything unparseable
//! collapses to zero rather than failing the request. These helpers are the
//! single home of that policy; every numeric input field routes through them
//! via `#[serde(default, deserialize_with = ...)]`.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

use crate::calc::common::normalize_rate;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Num(Decimal),
    Text(String),
    Other(serde::de::IgnoredAny),
}

/// Deserializes an amount, coercing missing/unparseable values to zero.
pub fn lenient_amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawNumber>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawNumber::Num(value)) => value,
        Some(RawNumber::Text(text)) => text.trim().parse().unwrap_or(Decimal::ZERO),
        Some(RawNumber::Other(_)) | None => Decimal::ZERO,
    })
}

/// Deserializes a rate with the same coercion as [`lenient_amount`], then
/// normalizes it: values above 1 are read as percentages.
pub fn lenient_rate<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_amount(deserializer).map(normalize_rate)
}

/// Optional-amount variant: absent and junk stay `None`, so callers can tell
/// "not provided" apart from an explicit zero.
pub fn lenient_opt_amount<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawNumber>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawNumber::Num(value)) => Some(value),
        Some(RawNumber::Text(text)) => text.trim().parse().ok(),
        Some(RawNumber::Other(_)) | None => None,
    })
}
