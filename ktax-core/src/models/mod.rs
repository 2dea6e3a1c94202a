mod bracket;
pub mod coerce;
mod dependent;
mod income;
mod trace;
mod warning;

pub use bracket::{BracketTable, TaxBracket};
pub use dependent::{Dependent, Relation};
pub use income::{IncomeItem, IncomeSource, OtherIncome, OtherIncomeKind};
pub use trace::TraceEntry;
pub use warning::{Warning, WarningCode};
