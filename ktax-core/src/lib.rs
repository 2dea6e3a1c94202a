//! Core computation engine for simplified Korean tax estimates.
//!
//! Three calculators share the same primitives: a progressive bracket
//! evaluator, a resolved immutable [`rules::RuleSet`], and lenient numeric
//! coercion for form-style input. Each calculator is a pure synchronous
//! function of its input and rules; configuration defects surface as
//! [`rules::RuleError`] at resolution time, never per call.

pub mod calc;
pub mod models;
pub mod rules;

pub use models::*;
pub use rules::{RuleError, RuleSet, Settings};
