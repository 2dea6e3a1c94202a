use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::coerce;

/// Relation of a dependent to the taxpayer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Spouse,
    Child,
    Parent,
    Sibling,
    Other,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spouse => "spouse",
            Self::Child => "child",
            Self::Parent => "parent",
            Self::Sibling => "sibling",
            Self::Other => "other",
        }
    }
}

/// One dependent row from the settlement form.
///
/// Dependents carry no derived state: classification is recomputed from the
/// raw fields on every calculation through the predicates below, which form
/// a strict chain — `is_active` ⊇ `is_eligible` ⊇ `is_child_credit_eligible`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Dependent {
    #[serde(default)]
    pub relation: Option<Relation>,
    #[serde(default)]
    pub age: u32,
    /// Annual income of the dependent.
    #[serde(default, deserialize_with = "coerce::lenient_amount")]
    pub income: Decimal,
    #[serde(default)]
    pub disabled: bool,
}

impl Dependent {
    /// A row counts as active once any of its fields is populated. Empty
    /// trailing form rows are inert.
    pub fn is_active(&self) -> bool {
        self.relation.is_some() || self.age > 0 || self.income > Decimal::ZERO || self.disabled
    }

    /// Basic-deduction eligibility: relation-specific age rule plus the
    /// shared annual income cap. Disabled dependents are exempt from the
    /// age rule.
    pub fn is_eligible(&self, income_cap: Decimal) -> bool {
        if !self.is_active() || self.income > income_cap {
            return false;
        }
        match self.relation {
            Some(Relation::Spouse) => true,
            Some(Relation::Child) => self.age <= 20 || self.disabled,
            Some(Relation::Parent) => self.age >= 60 || self.disabled,
            Some(Relation::Sibling) => self.age <= 20 || self.age >= 60 || self.disabled,
            Some(Relation::Other) | None => false,
        }
    }

    /// Child-credit eligibility: an eligible dependent aged 8 through 20.
    pub fn is_child_credit_eligible(&self, income_cap: Decimal) -> bool {
        self.is_eligible(income_cap) && (8..=20).contains(&self.age)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn cap() -> Decimal {
        dec!(1_000_000)
    }

    #[test]
    fn empty_row_is_inactive() {
        let dep = Dependent::default();

        assert!(!dep.is_active());
        assert!(!dep.is_eligible(cap()));
    }

    #[test]
    fn spouse_has_no_age_rule() {
        let dep = Dependent {
            relation: Some(Relation::Spouse),
            age: 45,
            income: dec!(0),
            disabled: false,
        };

        assert!(dep.is_eligible(cap()));
    }

    #[test]
    fn child_over_twenty_is_not_eligible() {
        let dep = Dependent {
            relation: Some(Relation::Child),
            age: 21,
            income: dec!(0),
            disabled: false,
        };

        assert!(dep.is_active());
        assert!(!dep.is_eligible(cap()));
    }

    #[test]
    fn disabled_child_over_twenty_is_eligible() {
        let dep = Dependent {
            relation: Some(Relation::Child),
            age: 25,
            income: dec!(0),
            disabled: true,
        };

        assert!(dep.is_eligible(cap()));
    }

    #[test]
    fn income_over_cap_blocks_eligibility() {
        let dep = Dependent {
            relation: Some(Relation::Parent),
            age: 68,
            income: dec!(1_200_000),
            disabled: false,
        };

        assert!(!dep.is_eligible(cap()));
    }

    #[test]
    fn parent_under_sixty_is_not_eligible() {
        let dep = Dependent {
            relation: Some(Relation::Parent),
            age: 55,
            income: dec!(0),
            disabled: false,
        };

        assert!(!dep.is_eligible(cap()));
    }

    #[test]
    fn child_credit_requires_age_eight_to_twenty() {
        let young = Dependent {
            relation: Some(Relation::Child),
            age: 7,
            income: dec!(0),
            disabled: false,
        };
        let in_range = Dependent {
            relation: Some(Relation::Child),
            age: 8,
            ..young.clone()
        };

        assert!(!young.is_child_credit_eligible(cap()));
        assert!(in_range.is_child_credit_eligible(cap()));
    }

    #[test]
    fn classification_chain_is_strict() {
        let dep = Dependent {
            relation: Some(Relation::Child),
            age: 12,
            income: dec!(0),
            disabled: false,
        };

        assert_eq!(
            [dep.is_active(), dep.is_eligible(cap()), dep.is_child_credit_eligible(cap())],
            [true, true, true]
        );
    }
}
