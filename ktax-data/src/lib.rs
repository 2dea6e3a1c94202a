//! Rule-override data loading for the ktax engine.
//!
//! Bracket-table overrides arrive as CSV files keyed by tax year and table
//! kind; this crate parses them into [`ktax_core::Settings`] payloads that
//! the engine resolves onto its year defaults.

mod loader;

pub use loader::{OverrideRecord, RuleOverrideError, RuleOverrideLoader};
