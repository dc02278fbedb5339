//! Federal income tax withheld per pay period.

use crate::config::{CppConfig, EiConfig, JurisdictionTaxConfig};
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, Jurisdiction};

use super::income_tax::{PeriodTaxInput, PeriodTaxResult, period_tax};

/// Calculates federal tax for one pay period.
///
/// The period's regular earnings are annualized, taxed with the federal
/// brackets and credits of the edition in `config`, and divided back into
/// the period. CPP and EI amounts for the period must already be known
/// because they feed the K2 credit.
///
/// # Returns
///
/// Returns `InvalidJurisdiction` if `config` is not a federal table, or
/// `InvalidInput` if `periods_per_year` is zero.
///
/// # Examples
///
/// ```no_run
/// use payroll_engine::calculation::{PeriodTaxInput, calculate_federal_tax};
/// use payroll_engine::config::{CachedTaxTables, ConfigLoader, TaxTableProvider};
/// use payroll_engine::models::Jurisdiction;
/// use rust_decimal::Decimal;
///
/// let tables = CachedTaxTables::new(ConfigLoader::new("./config")?);
/// let federal = tables.tax_config(Jurisdiction::Federal, 2025, None)?;
/// let cpp = tables.cpp_config(2025)?;
/// let ei = tables.ei_config(2025)?;
/// let input = PeriodTaxInput {
///     gross: Decimal::from(2000),
///     periods_per_year: 26,
///     ..PeriodTaxInput::default()
/// };
///
/// let result = calculate_federal_tax(&input, &federal, &cpp, &ei, 3)?;
/// println!("Federal tax: {}", result.period_tax);
/// # Ok::<(), payroll_engine::error::EngineError>(())
/// ```
pub fn calculate_federal_tax(
    input: &PeriodTaxInput,
    config: &JurisdictionTaxConfig,
    cpp: &CppConfig,
    ei: &EiConfig,
    step_number: u32,
) -> EngineResult<PeriodTaxResult> {
    if config.jurisdiction != Jurisdiction::Federal {
        return Err(EngineError::InvalidJurisdiction {
            code: config.jurisdiction.code().to_string(),
        });
    }

    let (breakdown, per_period) = period_tax(input, config, cpp, ei)?;

    let audit_step = AuditStep {
        step_number,
        rule_id: "federal_tax".to_string(),
        rule_name: "Federal Income Tax".to_string(),
        formula_ref: format!("T4127 federal edition {}", config.edition.effective_date),
        input: serde_json::json!({
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
            "k1": breakdown.k1.normalize().to_string(),
            "k2": breakdown.k2.round_dp(2).to_string(),
            "k3": breakdown.k3.normalize().to_string(),
            "k4": breakdown.k4.normalize().to_string(),
            "annual_tax": breakdown.annual_tax.round_dp(2).to_string(),
            "period_tax": per_period.to_string()
        }),
        reasoning: format!(
            "A = ${}; {} × A − {} − credits ${} = ${} annual; ${} per period",
            breakdown.annual_income,
            breakdown.rate,
            breakdown.constant,
            (breakdown.k1 + breakdown.k2 + breakdown.k3 + breakdown.k4).round_dp(2),
            breakdown.annual_tax.round_dp(2),
            per_period
        ),
    };

    Ok(PeriodTaxResult {
        jurisdiction: Jurisdiction::Federal,
        edition: config.edition.effective_date,
        breakdown,
        period_tax: per_period,
        audit_step,
    })
}
