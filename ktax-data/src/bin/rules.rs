use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ktax_core::{RuleSet, Settings};
use ktax_data::RuleOverrideLoader;

/// Resolve and print the rule set for a tax year.
///
/// With `--file`, bracket overrides are read from a CSV with columns:
/// - tax_year: the tax year the override applies to (e.g., 2024)
/// - table: which bracket table to override (income or corporate)
/// - upper_bound: the bracket's upper bound (empty for the catch-all)
/// - rate: the bracket rate as a fraction or a percentage
/// - subtractive_deduction: the bracket's subtractive deduction
#[derive(Parser, Debug)]
#[command(name = "ktax-rules")]
#[command(version, about, long_about = None)]
struct Args {
    /// Tax year to resolve
    #[arg(short, long)]
    year: i32,

    /// Path to a CSV file with bracket-table overrides
    #[arg(short, long)]
    file: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let settings = match &args.file {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
            let records = RuleOverrideLoader::parse(file)
                .with_context(|| format!("Failed to parse CSV: {}", path.display()))?;
            RuleOverrideLoader::settings_for_year(&records, args.year)
                .with_context(|| format!("No usable overrides for {}", args.year))?
        }
        None => Settings {
            tax_year: args.year,
            ..Settings::default()
        },
    };

    let rules = RuleSet::resolve(&settings)
        .with_context(|| format!("Failed to resolve rules for {}", args.year))?;

    println!("{}", serde_json::to_string_pretty(&rules)?);

    Ok(())
}
