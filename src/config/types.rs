//! Configuration types for statutory deduction tables.
//!
//! This module contains the strongly-typed structures deserialized from the
//! YAML tax tables. Every snapshot is immutable once loaded and is shared
//! behind an `Arc` by the provider cache.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::Jurisdiction;

/// One row of a progressive tax table.
///
/// Tax for annual income `A` in this bracket is `rate × A − constant`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    /// Lowest annual income the bracket applies to.
    pub threshold: Decimal,
    /// Marginal rate (e.g. `0.205`).
    pub rate: Decimal,
    /// Bracket constant subtracted from `rate × A`.
    pub constant: Decimal,
}

/// Non-refundable credit multipliers for one jurisdiction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditRates {
    /// Rate applied to the personal claim amount (K1).
    pub claim: Decimal,
    /// Rate applied to CPP and EI contributions (K2).
    pub cpp_ei: Decimal,
    /// Rate applied to the employment amount (K4).
    pub employment: Decimal,
}

/// Linear phase-out of the basic personal amount for high incomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BpaPhaseOut {
    /// The basic personal amount once fully phased out.
    pub min_amount: Decimal,
    /// Annual income where the phase-out begins.
    pub income_start: Decimal,
    /// Annual income where the phase-out ends.
    pub income_end: Decimal,
}

/// One tier of a surtax levied on basic provincial tax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurtaxTier {
    /// Basic provincial tax above which the tier applies.
    pub threshold: Decimal,
    /// Surtax rate on the excess.
    pub rate: Decimal,
}

/// One tier of a health premium keyed on annual taxable income.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthPremiumTier {
    /// Annual income above which the tier applies.
    pub threshold: Decimal,
    /// Premium already due at the threshold.
    pub base: Decimal,
    /// Rate on income above the threshold.
    pub rate: Decimal,
    /// Maximum premium within the tier.
    pub cap: Decimal,
}

/// Provincial tax reduction applied after surtax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaxReduction {
    /// `S = min(T, max(0, 2 × basic_amount − T))` on basic tax plus surtax.
    Ontario {
        /// The basic reduction amount.
        basic_amount: Decimal,
    },
    /// `S = max(0, amount − rate × max(0, A − threshold))`, capped at basic tax.
    IncomeTested {
        /// The full reduction.
        amount: Decimal,
        /// Annual income where the reduction starts to shrink.
        threshold: Decimal,
        /// Rate at which the reduction shrinks.
        rate: Decimal,
    },
}

/// The tables in force for a jurisdiction from one effective date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxEdition {
    /// First pay date the edition applies to.
    pub effective_date: NaiveDate,
    /// Progressive brackets, ascending by threshold.
    pub brackets: Vec<TaxBracket>,
    /// Basic personal amount (the maximum, where a phase-out exists).
    pub basic_personal_amount: Decimal,
    /// Optional high-income phase-out of the basic personal amount.
    #[serde(default)]
    pub bpa_phase_out: Option<BpaPhaseOut>,
    /// Credit multipliers.
    pub credit_rates: CreditRates,
    /// Canada employment amount, where the jurisdiction grants one (K4).
    #[serde(default)]
    pub employment_amount: Option<Decimal>,
    /// Surtax tiers on basic tax.
    #[serde(default)]
    pub surtax: Vec<SurtaxTier>,
    /// Health premium tiers on annual income.
    #[serde(default)]
    pub health_premium: Vec<HealthPremiumTier>,
    /// Tax reduction.
    #[serde(default)]
    pub tax_reduction: Option<TaxReduction>,
}

/// An immutable tax-table snapshot for one (jurisdiction, year, edition).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JurisdictionTaxConfig {
    /// The jurisdiction the tables belong to.
    pub jurisdiction: Jurisdiction,
    /// The tax year.
    pub year: i32,
    /// The edition's tables.
    pub edition: TaxEdition,
}

impl JurisdictionTaxConfig {
    /// Returns the bracket whose threshold is the highest one not above `income`.
    ///
    /// Incomes below the first threshold fall into the first bracket.
    pub fn bracket_for(&self, income: Decimal) -> &TaxBracket {
        let brackets = &self.edition.brackets;
        brackets
            .iter()
            .rev()
            .find(|b| b.threshold <= income)
            .unwrap_or(&brackets[0])
    }

    /// Returns the basic personal amount in force at annual income `income`.
    ///
    /// Without a phase-out this is the configured amount. With one, the
    /// amount falls linearly from the maximum to `min_amount` between the
    /// phase-out bounds.
    pub fn basic_personal_amount_at(&self, income: Decimal) -> Decimal {
        let max_amount = self.edition.basic_personal_amount;
        let Some(phase_out) = &self.edition.bpa_phase_out else {
            return max_amount;
        };

        if income <= phase_out.income_start {
            max_amount
        } else if income >= phase_out.income_end {
            phase_out.min_amount
        } else {
            let span = phase_out.income_end - phase_out.income_start;
            let reduction = (max_amount - phase_out.min_amount) * (income - phase_out.income_start)
                / span;
            max_amount - reduction
        }
    }

    /// Checks the table invariants.
    pub fn validate(&self) -> EngineResult<()> {
        let brackets = &self.edition.brackets;
        if brackets.is_empty() {
            return Err(invalid(format!(
                "{} {} edition {} has no brackets",
                self.jurisdiction, self.year, self.edition.effective_date
            )));
        }
        if brackets[0].threshold < Decimal::ZERO {
            return Err(invalid(format!(
                "{} {} first bracket threshold is negative",
                self.jurisdiction, self.year
            )));
        }
        for pair in brackets.windows(2) {
            if pair[1].threshold <= pair[0].threshold {
                return Err(invalid(format!(
                    "{} {} bracket thresholds must be strictly increasing ({} then {})",
                    self.jurisdiction, self.year, pair[0].threshold, pair[1].threshold
                )));
            }
        }
        if self.edition.effective_date.year() != self.year {
            return Err(invalid(format!(
                "{} {} edition effective {} is outside the tax year",
                self.jurisdiction, self.year, self.edition.effective_date
            )));
        }
        if let Some(phase_out) = &self.edition.bpa_phase_out {
            if phase_out.income_end <= phase_out.income_start {
                return Err(invalid(format!(
                    "{} {} BPA phase-out end must exceed its start",
                    self.jurisdiction, self.year
                )));
            }
        }
        Ok(())
    }
}

/// One jurisdiction's tables for a year, as stored on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct TaxYearFile {
    /// The jurisdiction the file describes.
    pub jurisdiction: Jurisdiction,
    /// The tax year.
    pub year: i32,
    /// Editions in force during the year.
    pub editions: Vec<TaxEdition>,
}

impl TaxYearFile {
    /// Splits the file into validated snapshots, sorted oldest edition first.
    pub fn into_configs(self) -> EngineResult<Vec<JurisdictionTaxConfig>> {
        let mut configs: Vec<JurisdictionTaxConfig> = self
            .editions
            .into_iter()
            .map(|edition| JurisdictionTaxConfig {
                jurisdiction: self.jurisdiction,
                year: self.year,
                edition,
            })
            .collect();
        configs.sort_by(|a, b| a.edition.effective_date.cmp(&b.edition.effective_date));

        if configs.is_empty() {
            return Err(invalid(format!(
                "{} {} has no editions",
                self.jurisdiction, self.year
            )));
        }
        for config in &configs {
            config.validate()?;
        }
        Ok(configs)
    }
}

/// Canada Pension Plan parameters for one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CppConfig {
    /// The contribution year.
    pub year: i32,
    /// Base contribution rate (e.g. `0.0595`).
    pub base_rate: Decimal,
    /// The enhancement portion of the base rate (e.g. `0.01`).
    pub enhancement_rate: Decimal,
    /// Second additional contribution rate (e.g. `0.04`).
    pub additional_rate: Decimal,
    /// Annual basic exemption.
    pub basic_exemption: Decimal,
    /// Year's maximum pensionable earnings.
    pub ympe: Decimal,
    /// Year's additional maximum pensionable earnings.
    pub yampe: Decimal,
    /// Maximum annual base contribution.
    pub max_base_contribution: Decimal,
    /// Maximum annual second additional contribution.
    pub max_additional_contribution: Decimal,
}

impl CppConfig {
    /// Share of a base contribution that predates the enhancement.
    ///
    /// Only this share earns the CPP tax credit; the enhancement share is a
    /// deduction from income instead.
    pub fn pre_enhancement_ratio(&self) -> Decimal {
        (self.base_rate - self.enhancement_rate) / self.base_rate
    }

    /// Checks the table invariants.
    pub fn validate(&self) -> EngineResult<()> {
        if self.base_rate <= Decimal::ZERO || self.enhancement_rate > self.base_rate {
            return Err(invalid(format!(
                "CPP {} enhancement rate must not exceed a positive base rate",
                self.year
            )));
        }
        if self.yampe <= self.ympe {
            return Err(invalid(format!(
                "CPP {} YAMPE must exceed YMPE",
                self.year
            )));
        }
        Ok(())
    }
}

/// Employment Insurance parameters for one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EiConfig {
    /// The premium year.
    pub year: i32,
    /// Employee premium rate (e.g. `0.0164`).
    pub rate: Decimal,
    /// Maximum annual insurable earnings.
    pub max_insurable_earnings: Decimal,
    /// Maximum annual employee premium.
    pub max_employee_premium: Decimal,
    /// Employer premium as a multiple of the employee premium.
    pub employer_multiplier: Decimal,
}

impl EiConfig {
    /// Checks the table invariants.
    pub fn validate(&self) -> EngineResult<()> {
        if self.rate <= Decimal::ZERO || self.employer_multiplier <= Decimal::ZERO {
            return Err(invalid(format!(
                "EI {} rate and employer multiplier must be positive",
                self.year
            )));
        }
        Ok(())
    }
}

fn invalid(message: String) -> EngineError {
    EngineError::InvalidConfig { message }
}
