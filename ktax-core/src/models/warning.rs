use std::fmt;

use serde::{Deserialize, Serialize};

/// Machine-readable kind of an advisory warning.
///
/// Warnings record a policy boundary the engine clamped through — a capped
/// input, a flag conflict resolved by priority, or a value the engine derived
/// on the caller's behalf. They never block computation, and downstream code
/// asserts on the code rather than on wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningCode {
    // Wage calculator.
    LocalWithholdingDerived,
    SingleParentPriority,
    CultureSpendExcluded,
    CardDeductionCapped,
    HousingDeductionCapped,
    EarnedIncomeDeductionCapped,
    PensionContributionCapped,
    IsaTransferCapped,
    InsurancePremiumCapped,
    MedicalCreditCapped,
    EducationSpendCapped,
    DonationBaseExhausted,
    RentIneligible,
    RentPaidCapped,
    StandardCreditSubstituted,

    // Corporate calculator.
    PromotionSpendCapped,
    VehicleDepreciationCapped,
    DepreciationCapped,
    CorporateDonationCapped,
    LossCarryforwardExpired,
    LossDeductionCapped,
    CreditCappedByRemainingTax,
    MinimumTaxApplied,
    TonnageBaseApplied,

    // Financial calculator.
    ForeignIncomeForcesComprehensive,
    RentalCarveOutExceeded,
    ImputedRentAdded,
    DividendCreditLimited,
    ForeignTaxCreditLimited,
}

/// A non-fatal advisory attached to a calculation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub code: WarningCode,
    /// Human-readable context: which input, which cap, what was substituted.
    pub context: String,
}

impl Warning {
    pub fn new(code: WarningCode, context: impl Into<String>) -> Self {
        Self {
            code,
            context: context.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.context)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn serializes_with_snake_case_code() {
        let warning = Warning::new(WarningCode::SingleParentPriority, "both flags set");
        let json = serde_json::to_string(&warning).unwrap();

        assert_eq!(
            json,
            r#"{"code":"single_parent_priority","context":"both flags set"}"#
        );
    }
}
