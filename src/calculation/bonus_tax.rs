//! Tax on bonuses under the marginal-rate method.
//!
//! A bonus is taxed as the increase in annual federal and provincial tax
//! it causes on top of the employee's base annual income:
//! `Tax(base + bonus) − Tax(base)`. The bonus is never annualized as if it
//! recurred every period.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{CppConfig, EiConfig, JurisdictionTaxConfig};
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, Jurisdiction};

use super::income_tax::{AnnualTaxInput, MarginalTax, SupplementalIncome, marginal_tax};

/// A one-time payment and the annual context it is taxed against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplementalTaxInput {
    /// Gross amount of the payment.
    pub amount: Decimal,
    /// RRSP deducted at source from the payment.
    pub rrsp: Decimal,
    /// CPP enhancement contributed on the payment.
    pub cpp_enhancement: Decimal,
    /// CPP2 contributed on the payment.
    pub cpp2: Decimal,
    /// Base CPP contributed on the payment, for the K2 credit.
    pub cpp_contribution: Decimal,
    /// EI premium paid on the payment, for the K2 credit.
    pub ei_premium: Decimal,
    /// Annual taxable income before the payment.
    pub base_annual_income: Decimal,
    /// Annual base CPP before the payment.
    pub base_annual_cpp: Decimal,
    /// Annual EI before the payment.
    pub base_annual_ei: Decimal,
    /// Federal claim amount. `None` uses the basic personal amount.
    pub federal_claim: Option<Decimal>,
    /// Provincial claim amount. `None` uses the basic personal amount.
    pub provincial_claim: Option<Decimal>,
    /// Other federal credits (K3).
    pub federal_other_credits: Decimal,
    /// Other provincial credits (K3P).
    pub provincial_other_credits: Decimal,
}

impl SupplementalTaxInput {
    /// The payment less its RRSP, CPP enhancement and CPP2, floored at zero.
    pub fn taxable_amount(&self) -> Decimal {
        (self.amount - self.rrsp - self.cpp_enhancement - self.cpp2).max(Decimal::ZERO)
    }

    fn base(&self, claim_amount: Option<Decimal>, other_credits: Decimal) -> AnnualTaxInput {
        AnnualTaxInput {
            annual_income: self.base_annual_income,
            claim_amount,
            annual_cpp: self.base_annual_cpp,
            annual_ei: self.base_annual_ei,
            other_credits,
        }
    }

    fn payment(&self, taxable_amount: Decimal) -> SupplementalIncome {
        SupplementalIncome {
            taxable_amount,
            cpp_contribution: self.cpp_contribution,
            ei_premium: self.ei_premium,
        }
    }
}

/// Federal and provincial marginal tax on one payment.
#[derive(Debug, Clone)]
pub struct SupplementalTaxResult {
    /// The payment after its deductions.
    pub taxable_amount: Decimal,
    /// Federal computation.
    pub federal: MarginalTax,
    /// Provincial computation.
    pub provincial: MarginalTax,
    /// Federal tax on the payment.
    pub federal_tax: Decimal,
    /// Provincial tax on the payment.
    pub provincial_tax: Decimal,
    /// Federal plus provincial tax on the payment.
    pub total_tax: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

pub(crate) fn check_tables(
    federal: &JurisdictionTaxConfig,
    provincial: &JurisdictionTaxConfig,
) -> EngineResult<()> {
    if federal.jurisdiction != Jurisdiction::Federal {
        return Err(EngineError::InvalidJurisdiction {
            code: federal.jurisdiction.code().to_string(),
        });
    }
    if !provincial.jurisdiction.is_province() {
        return Err(EngineError::InvalidJurisdiction {
            code: provincial.jurisdiction.code().to_string(),
        });
    }
    Ok(())
}

/// Applies the marginal-rate method federally and provincially.
pub(crate) fn marginal_pair(
    input: &SupplementalTaxInput,
    taxable_amount: Decimal,
    federal: &JurisdictionTaxConfig,
    provincial: &JurisdictionTaxConfig,
    cpp: &CppConfig,
    ei: &EiConfig,
) -> (MarginalTax, MarginalTax) {
    let payment = input.payment(taxable_amount);
    let federal_tax = marginal_tax(
        federal,
        cpp,
        ei,
        &input.base(input.federal_claim, input.federal_other_credits),
        &payment,
    );
    let provincial_tax = marginal_tax(
        provincial,
        cpp,
        ei,
        &input.base(input.provincial_claim, input.provincial_other_credits),
        &payment,
    );
    (federal_tax, provincial_tax)
}

/// Calculates federal and provincial tax on a bonus.
///
/// # Returns
///
/// Returns `InvalidJurisdiction` if `federal` is not the federal table or
/// `provincial` is not a provincial one.
///
/// # Examples
///
/// ```no_run
/// use payroll_engine::calculation::{SupplementalTaxInput, calculate_bonus_tax};
/// use payroll_engine::config::{CachedTaxTables, ConfigLoader, TaxTableProvider};
/// use payroll_engine::models::Jurisdiction;
/// use rust_decimal::Decimal;
///
/// let tables = CachedTaxTables::new(ConfigLoader::new("./config")?);
/// let federal = tables.tax_config(Jurisdiction::Federal, 2025, None)?;
/// let provincial = tables.tax_config(Jurisdiction::BritishColumbia, 2025, None)?;
/// let cpp = tables.cpp_config(2025)?;
/// let ei = tables.ei_config(2025)?;
/// let input = SupplementalTaxInput {
///     amount: Decimal::from(60000),
///     base_annual_income: Decimal::from(76333),
///     ..SupplementalTaxInput::default()
/// };
///
/// let result = calculate_bonus_tax(&input, &federal, &provincial, &cpp, &ei, 5)?;
/// println!("Tax on bonus: {}", result.total_tax);
/// # Ok::<(), payroll_engine::error::EngineError>(())
/// ```
pub fn calculate_bonus_tax(
    input: &SupplementalTaxInput,
    federal: &JurisdictionTaxConfig,
    provincial: &JurisdictionTaxConfig,
    cpp: &CppConfig,
    ei: &EiConfig,
    step_number: u32,
) -> EngineResult<SupplementalTaxResult> {
    check_tables(federal, provincial)?;

    let taxable_amount = input.taxable_amount();
    let (federal_marginal, provincial_marginal) =
        marginal_pair(input, taxable_amount, federal, provincial, cpp, ei);

    let federal_tax = federal_marginal.tax;
    let provincial_tax = provincial_marginal.tax;
    let total_tax = federal_tax + provincial_tax;

    let audit_step = AuditStep {
        step_number,
        rule_id: "bonus_tax".to_string(),
        rule_name: "Bonus Tax (Marginal Rate)".to_string(),
        formula_ref: "T4127 bonus method".to_string(),
        input: serde_json::json!({
            "amount": input.amount.to_string(),
            "rrsp": input.rrsp.to_string(),
            "cpp_enhancement": input.cpp_enhancement.to_string(),
            "cpp2": input.cpp2.to_string(),
            "base_annual_income": input.base_annual_income.to_string(),
            "provincial_jurisdiction": provincial.jurisdiction.code()
        }),
        output: serde_json::json!({
            "taxable_amount": taxable_amount.to_string(),
            "federal_before": federal_marginal.without.annual_tax.round_dp(2).to_string(),
            "federal_after": federal_marginal.with.annual_tax.round_dp(2).to_string(),
            "provincial_before": provincial_marginal.without.annual_tax.round_dp(2).to_string(),
            "provincial_after": provincial_marginal.with.annual_tax.round_dp(2).to_string(),
            "federal_tax": federal_tax.to_string(),
            "provincial_tax": provincial_tax.to_string(),
            "total_tax": total_tax.to_string()
        }),
        reasoning: format!(
            "Tax(${} + ${}) − Tax(${}): federal ${}, {} ${}",
            input.base_annual_income,
            taxable_amount,
            input.base_annual_income,
            federal_tax,
            provincial.jurisdiction,
            provincial_tax
        ),
    };

    Ok(SupplementalTaxResult {
        taxable_amount,
        federal: federal_marginal,
        provincial: provincial_marginal,
        federal_tax,
        provincial_tax,
        total_tax,
        audit_step,
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::config::{BpaPhaseOut, CreditRates, TaxBracket, TaxEdition, TaxReduction};
    use chrono::NaiveDate;
    use std::str::FromStr;

    pub fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn bracket(threshold: &str, rate: &str, constant: &str) -> TaxBracket {
        TaxBracket {
            threshold: dec(threshold),
            rate: dec(rate),
            constant: dec(constant),
        }
    }

    pub fn cpp() -> CppConfig {
        CppConfig {
            year: 2025,
            base_rate: dec("0.0595"),
            enhancement_rate: dec("0.01"),
            additional_rate: dec("0.04"),
            basic_exemption: dec("3500"),
            ympe: dec("71300"),
            yampe: dec("81200"),
            max_base_contribution: dec("4034.10"),
            max_additional_contribution: dec("396.00"),
        }
    }

    pub fn ei() -> EiConfig {
        EiConfig {
            year: 2025,
            rate: dec("0.0164"),
            max_insurable_earnings: dec("65700"),
            max_employee_premium: dec("1077.48"),
            employer_multiplier: dec("1.4"),
        }
    }

    pub fn federal() -> JurisdictionTaxConfig {
        JurisdictionTaxConfig {
            jurisdiction: Jurisdiction::Federal,
            year: 2025,
            edition: TaxEdition {
                effective_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                brackets: vec![
                    bracket("0", "0.15", "0"),
                    bracket("57375", "0.205", "3156"),
                    bracket("114750", "0.26", "9467"),
                    bracket("177882", "0.29", "14803"),
                    bracket("253414", "0.33", "24940"),
                ],
                basic_personal_amount: dec("16129"),
                bpa_phase_out: Some(BpaPhaseOut {
                    min_amount: dec("14538"),
                    income_start: dec("177882"),
                    income_end: dec("253414"),
                }),
                credit_rates: CreditRates {
                    claim: dec("0.15"),
                    cpp_ei: dec("0.15"),
                    employment: dec("0.15"),
                },
                employment_amount: Some(dec("1471")),
                surtax: vec![],
                health_premium: vec![],
                tax_reduction: None,
            },
        }
    }

    pub fn british_columbia() -> JurisdictionTaxConfig {
        JurisdictionTaxConfig {
            jurisdiction: Jurisdiction::BritishColumbia,
            year: 2025,
            edition: TaxEdition {
                effective_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                brackets: vec![
                    bracket("0", "0.0506", "0"),
                    bracket("49279", "0.077", "1301"),
                    bracket("98560", "0.105", "4061"),
                    bracket("113158", "0.1229", "6086"),
                    bracket("137407", "0.147", "9398"),
                    bracket("186306", "0.168", "13310"),
                    bracket("259829", "0.205", "22924"),
                ],
                basic_personal_amount: dec("12932"),
                bpa_phase_out: None,
                credit_rates: CreditRates {
                    claim: dec("0.0506"),
                    cpp_ei: dec("0.0506"),
                    employment: Decimal::ZERO,
                },
                employment_amount: None,
                surtax: vec![],
                health_premium: vec![],
                tax_reduction: Some(TaxReduction::IncomeTested {
                    amount: dec("562"),
                    threshold: dec("25020"),
                    rate: dec("0.0356"),
                }),
            },
        }
    }
}
