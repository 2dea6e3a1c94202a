use std::io::Read;

use ktax_core::{Settings, TaxBracket};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur when loading bracket-override data.
#[derive(Debug, Error, PartialEq)]
pub enum RuleOverrideError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Unknown bracket table '{0}' (expected 'income' or 'corporate')")]
    UnknownTable(String),

    #[error("No override records for tax year {0}")]
    YearNotFound(i32),
}

impl From<csv::Error> for RuleOverrideError {
    fn from(err: csv::Error) -> Self {
        RuleOverrideError::CsvParse(err.to_string())
    }
}

/// A single record from the bracket-overrides CSV file.
///
/// Columns:
/// - `tax_year`: the tax year the override applies to (e.g., 2024)
/// - `table`: which bracket table to override (`income` or `corporate`)
/// - `upper_bound`: the bracket's upper bound (empty for the catch-all)
/// - `rate`: the bracket rate, as a fraction or a percentage
/// - `subtractive_deduction`: the bracket's subtractive deduction
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OverrideRecord {
    pub tax_year: i32,
    pub table: String,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
    pub subtractive_deduction: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Loader for bracket-table overrides from CSV files.
///
/// Records are grouped by tax year in file order; table shape (catch-all
/// present and last, non-decreasing rates) is NOT checked here — the
/// engine validates the assembled table at rule-resolution time, keeping a
/// single source of truth for what a well-formed table is.
pub struct RuleOverrideLoader;

impl RuleOverrideLoader {
    /// Parse override records from a CSV reader.
    ///
    /// The reader can be any type that implements `Read`, such as a file
    /// or a string slice.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<OverrideRecord>, RuleOverrideError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: OverrideRecord = result?;
            records.push(record);
        }

        debug!(count = records.len(), "parsed override records");
        Ok(records)
    }

    /// Assemble a [`Settings`] payload for one tax year from parsed
    /// records, in file order. Records for other years are ignored; a
    /// table kind with no records for the year is left as `None` so the
    /// engine falls back to its preset.
    pub fn settings_for_year(
        records: &[OverrideRecord],
        tax_year: i32,
    ) -> Result<Settings, RuleOverrideError> {
        let mut income = Vec::new();
        let mut corporate = Vec::new();
        let mut seen_year = false;

        for record in records {
            if record.tax_year != tax_year {
                continue;
            }
            seen_year = true;
            let bracket = TaxBracket {
                upper_bound: record.upper_bound,
                rate: record.rate,
                subtractive_deduction: record.subtractive_deduction,
            };
            match record.table.as_str() {
                "income" => income.push(bracket),
                "corporate" => corporate.push(bracket),
                other => return Err(RuleOverrideError::UnknownTable(other.to_string())),
            }
        }

        if !seen_year {
            return Err(RuleOverrideError::YearNotFound(tax_year));
        }
        debug!(
            tax_year,
            income_rows = income.len(),
            corporate_rows = corporate.len(),
            "assembled override settings"
        );

        Ok(Settings {
            tax_year,
            income_brackets: (!income.is_empty()).then_some(income),
            corporate_brackets: (!corporate.is_empty()).then_some(corporate),
            ..Settings::default()
        })
    }
}
