//! Calculation modules for the three tax calculators.
//!
//! The calculators are independent of each other; they share only the
//! numeric primitives in [`common`], the progressive bracket evaluator in
//! [`brackets`], and a resolved [`crate::rules::RuleSet`].

pub mod brackets;
pub mod common;
pub mod corporate;
pub mod financial;
pub mod wage;

pub use brackets::{BracketTax, evaluate};
pub use corporate::{CorporateCalculator, CorporateInput, CorporateResult};
pub use financial::{FinancialCalculator, FinancialInput, FinancialResult, TaxMethod};
pub use wage::{WageCalculator, WageInput, WageResult};
