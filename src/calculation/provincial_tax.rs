//! Provincial and territorial income tax withheld per pay period.
//!
//! The method is the federal one applied to the province's own tables.
//! Provinces add optional parts after basic provincial tax: Ontario levies
//! a surtax and a health premium and grants a low-income reduction; British
//! Columbia grants an income-tested reduction.

use rust_decimal::Decimal;

use crate::config::{CppConfig, EiConfig, JurisdictionTaxConfig};
use crate::error::{EngineError, EngineResult};
use crate::models::AuditStep;

use super::income_tax::{PeriodTaxInput, PeriodTaxResult, period_tax};

/// Calculates provincial or territorial tax for one pay period.
///
/// # Returns
///
/// Returns `InvalidJurisdiction` if `config` is the federal table, or
/// `InvalidInput` if `periods_per_year` is zero.
pub fn calculate_provincial_tax(
    input: &PeriodTaxInput,
    config: &JurisdictionTaxConfig,
    cpp: &CppConfig,
    ei: &EiConfig,
    step_number: u32,
) -> EngineResult<PeriodTaxResult> {
    if !config.jurisdiction.is_province() {
        return Err(EngineError::InvalidJurisdiction {
            code: config.jurisdiction.code().to_string(),
        });
    }

    let (breakdown, per_period) = period_tax(input, config, cpp, ei)?;

    let mut add_ons = Vec::new();
    if breakdown.surtax > Decimal::ZERO {
        add_ons.push(format!("surtax ${}", breakdown.surtax.round_dp(2)));
    }
    if breakdown.reduction > Decimal::ZERO {
        add_ons.push(format!("reduction −${}", breakdown.reduction.round_dp(2)));
    }
    if breakdown.health_premium > Decimal::ZERO {
        add_ons.push(format!("health premium ${}", breakdown.health_premium.round_dp(2)));
    }
    let add_ons = if add_ons.is_empty() {
        String::new()
    } else {
        format!(" ({})", add_ons.join(", "))
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "provincial_tax".to_string(),
        rule_name: format!("{} Income Tax", config.jurisdiction),
        formula_ref: format!(
            "T4127 {} edition {}",
            config.jurisdiction, config.edition.effective_date
        ),
        input: serde_json::json!({
            "jurisdiction": config.jurisdiction.code(),
            "gross": input.gross.to_string(),
            "periods_per_year": input.periods_per_year,
            "rrsp": input.rrsp.to_string(),
            "union_dues": input.union_dues.to_string(),
            "cpp_enhancement": input.cpp_enhancement.to_string(),
            "cpp2": input.cpp2.to_string(),
            "cpp_contribution": input.cpp_contribution.to_string(),
            "ei_premium": input.ei_premium.to_string()
        }),
        output: serde_json::json!({
            "annual_income": breakdown.annual_income.to_string(),
            "rate": breakdown.rate.to_string(),
            "constant": breakdown.constant.to_string(),
            "basic_tax": breakdown.basic_tax.round_dp(2).to_string(),
            "surtax": breakdown.surtax.round_dp(2).to_string(),
            "reduction": breakdown.reduction.round_dp(2).to_string(),
            "health_premium": breakdown.health_premium.round_dp(2).to_string(),
            "annual_tax": breakdown.annual_tax.round_dp(2).to_string(),
            "period_tax": per_period.to_string()
        }),
        reasoning: format!(
            "A = ${}; basic {} tax ${}{}; ${} annual, ${} per period",
            breakdown.annual_income,
            config.jurisdiction,
            breakdown.basic_tax.round_dp(2),
            add_ons,
            breakdown.annual_tax.round_dp(2),
            per_period
        ),
    };

    Ok(PeriodTaxResult {
        jurisdiction: config.jurisdiction,
        edition: config.edition.effective_date,
        breakdown,
        period_tax: per_period,
        audit_step,
    })
}
