use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::coerce;

/// Origin of a financial-income item. Any foreign-source item forces the
/// comparative calculator onto the comprehensive method regardless of the
/// annual threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IncomeSource {
    #[default]
    Domestic,
    Foreign,
}

/// One interest or dividend income item.
///
/// Items are allocated against the shared annual threshold in list order and
/// split into a threshold portion and an excess portion. The split is derived
/// on every calculation, never stored here.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IncomeItem {
    #[serde(default, deserialize_with = "coerce::lenient_amount")]
    pub amount: Decimal,
    /// Flat withholding rate for this item; accepts a fraction or a
    /// percentage (e.g. `0.14` or `14`).
    #[serde(default, deserialize_with = "coerce::lenient_rate")]
    pub withholding_rate: Decimal,
    #[serde(default)]
    pub source: IncomeSource,
    /// Whether the excess portion participates in the dividend gross-up.
    #[serde(default)]
    pub gross_up_eligible: bool,
    #[serde(default, deserialize_with = "coerce::lenient_amount")]
    pub foreign_tax_paid: Decimal,
    #[serde(default, deserialize_with = "coerce::lenient_amount")]
    pub prepaid_tax: Decimal,
}

/// Category of a non-financial income line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OtherIncomeKind {
    #[default]
    Business,
    /// Housing rental income, eligible for the separate-taxation carve-out
    /// up to the shared annual cap.
    Rental,
    Other,
}

/// One non-financial income line feeding the comprehensive base.
///
/// Expenses are deducted as the larger of actual expenses and the
/// expense-ratio estimate.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OtherIncome {
    #[serde(default)]
    pub kind: OtherIncomeKind,
    #[serde(default, deserialize_with = "coerce::lenient_amount")]
    pub gross: Decimal,
    /// Deemed expense ratio; fraction or percentage.
    #[serde(default, deserialize_with = "coerce::lenient_rate")]
    pub expense_ratio: Decimal,
    #[serde(default, deserialize_with = "coerce::lenient_amount")]
    pub actual_expenses: Decimal,
}

impl OtherIncome {
    /// Taxable amount of this line after the expense deduction.
    pub fn taxable(&self) -> Decimal {
        let deemed = self.gross * self.expense_ratio;
        let expenses = if self.actual_expenses > deemed {
            self.actual_expenses
        } else {
            deemed
        };
        (self.gross - expenses).max(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn taxable_uses_larger_of_ratio_and_actual() {
        let line = OtherIncome {
            kind: OtherIncomeKind::Business,
            gross: dec!(10_000_000),
            expense_ratio: dec!(0.6),
            actual_expenses: dec!(7_000_000),
        };

        assert_eq!(line.taxable(), dec!(3_000_000));
    }

    #[test]
    fn taxable_never_goes_negative() {
        let line = OtherIncome {
            kind: OtherIncomeKind::Other,
            gross: dec!(1_000_000),
            expense_ratio: dec!(0),
            actual_expenses: dec!(2_000_000),
        };

        assert_eq!(line.taxable(), dec!(0));
    }

    #[test]
    fn income_item_deserializes_leniently() {
        let item: IncomeItem = serde_json::from_str(
            r#"{ "amount": "30000000", "withholding_rate": 14, "gross_up_eligible": true }"#,
        )
        .unwrap();

        assert_eq!(item.amount, dec!(30000000));
        assert_eq!(item.withholding_rate, dec!(0.14));
        assert_eq!(item.source, IncomeSource::Domestic);
        assert_eq!(item.foreign_tax_paid, dec!(0));
    }
}
