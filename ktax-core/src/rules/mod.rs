//! Rule resolution: year-default tables merged with caller overrides.
//!
//! A [`RuleSet`] is resolved once per calculation call from a [`Settings`]
//! payload: year defaults first, then caller overrides key by key (override
//! wins, missing keys fall back). The resolved set is validated and then
//! treated as immutable; malformed tables are a deployment defect and fail
//! fast here rather than inside a calculator.

mod presets;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calc::common::normalize_rate;
use crate::models::BracketTable;

/// Errors raised while resolving or validating a rule set.
///
/// These indicate configuration defects (bad override tables, unknown year
/// presets), never user-input problems.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    /// No rate-table preset exists for the requested tax year.
    #[error("unsupported tax year {0} (supported: 2020-2025)")]
    UnsupportedTaxYear(i32),

    /// A bracket table has no open-ended catch-all entry.
    #[error("{table} bracket table has no catch-all entry")]
    MissingCatchAll { table: &'static str },

    /// The catch-all entry is not the last entry of its table.
    #[error("{table} bracket table has entries after the catch-all")]
    CatchAllNotLast { table: &'static str },

    /// Bracket rates decrease between consecutive entries.
    #[error("{table} bracket table rates decrease at entry {index}")]
    DecreasingRates { table: &'static str, index: usize },

    /// Bracket upper bounds are not strictly increasing.
    #[error("{table} bracket table upper bounds are not increasing at entry {index}")]
    UnorderedBounds { table: &'static str, index: usize },

    /// A rounding unit below 1 was configured.
    #[error("rounding unit must be at least 1, got {0}")]
    InvalidRoundingUnit(Decimal),

    /// A rate outside 0..=1 survived normalization.
    #[error("{name} must be a rate between 0 and 1, got {value}")]
    InvalidRate { name: &'static str, value: Decimal },
}

/// A rate keyed by an upper bound on some driving amount; `None` is the
/// open-ended tier. Used both for marginal accumulation (business-promotion
/// revenue limits) and flat tier selection (minimum tax).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTier {
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
}

/// Rounding units for the various statutory flooring points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundingRules {
    /// Unit for bracket-tax flooring (whole won).
    pub bracket_unit: Decimal,
    /// Unit for determined/local tax on the wage path (10 won).
    pub determined_unit: Decimal,
    /// Unit for national/local tax on the financial path (whole won).
    pub national_unit: Decimal,
    /// Coarser unit for the final payable amount (10 won).
    pub payable_unit: Decimal,
}

/// Thresholds and rates for the financial-income comparative calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialRules {
    /// Annual financial-income threshold below which separate taxation is
    /// final (20,000,000).
    pub comprehensive_threshold: Decimal,
    /// Dividend gross-up rate applied to eligible excess portions.
    pub gross_up_rate: Decimal,
    /// Shared cap on the rental separate-taxation carve-out.
    pub rental_separate_cap: Decimal,
    /// Flat rate on the rental carve-out portion.
    pub rental_separate_rate: Decimal,
    /// Deposit size above which imputed rent is added back.
    pub imputed_rent_deposit_threshold: Decimal,
    /// Fraction of the excess deposit treated as principal for imputed rent.
    pub imputed_rent_ratio: Decimal,
    /// Statutory interest rate applied to the imputed-rent principal.
    pub imputed_rent_interest_rate: Decimal,
    /// Minimum house count for the imputed-rent addback.
    pub imputed_rent_min_houses: u32,
    /// Local surtax rate on national tax.
    pub local_tax_rate: Decimal,
}

/// Rates, caps and tier tables for the corporate calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorporateRules {
    /// Deemed-interest rate on related-party advances.
    pub overdraft_rate: Decimal,
    /// Deemed-rent rate on excess debt of real-estate-rental companies.
    pub deemed_rent_rate: Decimal,
    /// Base business-promotion limit for SMEs (36,000,000).
    pub promotion_base_limit_sme: Decimal,
    /// Base business-promotion limit for general companies (12,000,000).
    pub promotion_base_limit_general: Decimal,
    /// Marginal revenue tiers added to the promotion base limit.
    pub promotion_revenue_tiers: Vec<RateTier>,
    /// Culture-spend bonus as a fraction of the promotion limit.
    pub culture_promotion_bonus_ratio: Decimal,
    /// Traditional-market bonus as a fraction of the promotion limit.
    pub market_promotion_bonus_ratio: Decimal,
    /// Depreciation cap per business vehicle (8,000,000).
    pub vehicle_depreciation_cap: Decimal,
    /// Statutory-donation cap as a fraction of the pre-donation base.
    pub statutory_donation_cap_ratio: Decimal,
    /// Designated-donation cap as a fraction of the remaining base.
    pub designated_donation_cap_ratio: Decimal,
    /// Loss-carryforward cap ratio for SMEs (1.0).
    pub loss_cap_ratio_sme: Decimal,
    /// Loss-carryforward cap ratio for general companies (0.8).
    pub loss_cap_ratio_general: Decimal,
    /// Expiry in years for losses originating before 2020.
    pub loss_expiry_years_pre2020: i32,
    /// Expiry in years for losses originating in 2020 or later.
    pub loss_expiry_years: i32,
    /// Minimum-tax rate for SMEs.
    pub minimum_tax_rate_sme: Decimal,
    /// Minimum-tax rate tiers for general companies, selected by base size.
    pub minimum_tax_tiers_general: Vec<RateTier>,
    /// R&D credit: SME current-spend rate.
    pub rnd_rate_sme_current: Decimal,
    /// R&D credit: SME incremental-spend rate.
    pub rnd_rate_sme_increment: Decimal,
    /// R&D credit: general current-spend rate.
    pub rnd_rate_general_current: Decimal,
    /// R&D credit: general incremental-spend rate.
    pub rnd_rate_general_increment: Decimal,
    /// Investment credit base rate for SMEs.
    pub investment_rate_sme: Decimal,
    /// Investment credit base rate for general companies.
    pub investment_rate_general: Decimal,
    /// Investment credit rate on growth over the three-year average.
    pub investment_growth_rate: Decimal,
}

/// The resolved, immutable rule bundle consumed by all three calculators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub tax_year: i32,
    pub income_brackets: BracketTable,
    pub corporate_brackets: BracketTable,
    pub financial: FinancialRules,
    pub corporate: CorporateRules,
    pub rounding: RoundingRules,
}

/// Caller-supplied overrides merged onto year defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Settings {
    pub tax_year: i32,
    #[serde(default)]
    pub income_brackets: Option<BracketTable>,
    #[serde(default)]
    pub corporate_brackets: Option<BracketTable>,
    #[serde(default)]
    pub thresholds: ThresholdOverrides,
    #[serde(default)]
    pub rates: RateOverrides,
    #[serde(default)]
    pub rounding: RoundingOverrides,
}

/// Optional threshold overrides; `None` falls back to the year default.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ThresholdOverrides {
    #[serde(default)]
    pub comprehensive_threshold: Option<Decimal>,
    #[serde(default)]
    pub rental_separate_cap: Option<Decimal>,
    #[serde(default)]
    pub imputed_rent_deposit_threshold: Option<Decimal>,
}

/// Optional rate overrides; values above 1 are read as percentages.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RateOverrides {
    #[serde(default)]
    pub gross_up_rate: Option<Decimal>,
    #[serde(default)]
    pub local_tax_rate: Option<Decimal>,
    #[serde(default)]
    pub rental_separate_rate: Option<Decimal>,
    #[serde(default)]
    pub overdraft_rate: Option<Decimal>,
    #[serde(default)]
    pub deemed_rent_rate: Option<Decimal>,
}

/// Optional rounding-unit overrides.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoundingOverrides {
    #[serde(default)]
    pub bracket_unit: Option<Decimal>,
    #[serde(default)]
    pub determined_unit: Option<Decimal>,
    #[serde(default)]
    pub national_unit: Option<Decimal>,
    #[serde(default)]
    pub payable_unit: Option<Decimal>,
}

impl RuleSet {
    /// Resolves a rule set for the settings' tax year, merging overrides
    /// onto that year's defaults (never onto another year's), then validates
    /// the result.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError`] for an unsupported tax year or a malformed
    /// override (no catch-all, decreasing rates, rounding unit below 1).
    pub fn resolve(settings: &Settings) -> Result<Self, RuleError> {
        let mut rules = presets::defaults_for_year(settings.tax_year)?;

        if let Some(table) = &settings.income_brackets {
            rules.income_brackets = normalize_table(table);
        }
        if let Some(table) = &settings.corporate_brackets {
            rules.corporate_brackets = normalize_table(table);
        }

        let thresholds = &settings.thresholds;
        if let Some(value) = thresholds.comprehensive_threshold {
            rules.financial.comprehensive_threshold = value;
        }
        if let Some(value) = thresholds.rental_separate_cap {
            rules.financial.rental_separate_cap = value;
        }
        if let Some(value) = thresholds.imputed_rent_deposit_threshold {
            rules.financial.imputed_rent_deposit_threshold = value;
        }

        let rates = &settings.rates;
        if let Some(value) = rates.gross_up_rate {
            rules.financial.gross_up_rate = normalize_rate(value);
        }
        if let Some(value) = rates.local_tax_rate {
            rules.financial.local_tax_rate = normalize_rate(value);
        }
        if let Some(value) = rates.rental_separate_rate {
            rules.financial.rental_separate_rate = normalize_rate(value);
        }
        if let Some(value) = rates.overdraft_rate {
            rules.corporate.overdraft_rate = normalize_rate(value);
        }
        if let Some(value) = rates.deemed_rent_rate {
            rules.corporate.deemed_rent_rate = normalize_rate(value);
        }

        let rounding = &settings.rounding;
        if let Some(value) = rounding.bracket_unit {
            rules.rounding.bracket_unit = value;
        }
        if let Some(value) = rounding.determined_unit {
            rules.rounding.determined_unit = value;
        }
        if let Some(value) = rounding.national_unit {
            rules.rounding.national_unit = value;
        }
        if let Some(value) = rounding.payable_unit {
            rules.rounding.payable_unit = value;
        }

        rules.validate()?;
        Ok(rules)
    }

    /// Convenience resolver for a bare tax year with no overrides.
    pub fn for_year(tax_year: i32) -> Result<Self, RuleError> {
        Self::resolve(&Settings {
            tax_year,
            ..Settings::default()
        })
    }

    fn validate(&self) -> Result<(), RuleError> {
        validate_table("income", &self.income_brackets)?;
        validate_table("corporate", &self.corporate_brackets)?;

        for unit in [
            self.rounding.bracket_unit,
            self.rounding.determined_unit,
            self.rounding.national_unit,
            self.rounding.payable_unit,
        ] {
            if unit < Decimal::ONE {
                return Err(RuleError::InvalidRoundingUnit(unit));
            }
        }

        for (name, value) in [
            ("gross_up_rate", self.financial.gross_up_rate),
            ("local_tax_rate", self.financial.local_tax_rate),
            ("rental_separate_rate", self.financial.rental_separate_rate),
            ("overdraft_rate", self.corporate.overdraft_rate),
            ("deemed_rent_rate", self.corporate.deemed_rent_rate),
        ] {
            if value < Decimal::ZERO || value > Decimal::ONE {
                return Err(RuleError::InvalidRate { name, value });
            }
        }

        Ok(())
    }
}

/// Normalizes an override table's rates (fraction-or-percentage) before
/// validation.
fn normalize_table(table: &BracketTable) -> BracketTable {
    table
        .iter()
        .map(|bracket| crate::models::TaxBracket {
            upper_bound: bracket.upper_bound,
            rate: normalize_rate(bracket.rate),
            subtractive_deduction: bracket.subtractive_deduction,
        })
        .collect()
}

fn validate_table(name: &'static str, table: &BracketTable) -> Result<(), RuleError> {
    let catch_all_count = table.iter().filter(|b| b.upper_bound.is_none()).count();
    if catch_all_count == 0 {
        return Err(RuleError::MissingCatchAll { table: name });
    }
    if catch_all_count > 1 || table.last().is_none_or(|b| b.upper_bound.is_some()) {
        return Err(RuleError::CatchAllNotLast { table: name });
    }

    for (index, pair) in table.windows(2).enumerate() {
        if pair[1].rate < pair[0].rate {
            return Err(RuleError::DecreasingRates {
                table: name,
                index: index + 1,
            });
        }
        if let (Some(lower), Some(upper)) = (pair[0].upper_bound, pair[1].upper_bound)
            && upper <= lower
        {
            return Err(RuleError::UnorderedBounds {
                table: name,
                index: index + 1,
            });
        }
    }

    Ok(())
}
