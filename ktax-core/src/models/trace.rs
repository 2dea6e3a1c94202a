use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One named checkpoint of a calculation, emitted in stage order so a
/// reviewer can audit how a result was reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub label: String,
    pub amount: Decimal,
}

impl TraceEntry {
    pub fn new(label: impl Into<String>, amount: Decimal) -> Self {
        Self {
            label: label.into(),
            amount,
        }
    }
}
