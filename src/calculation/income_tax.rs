//! Annual income tax on the bracket-with-credits method.
//!
//! This module holds the raw annual tax primitive shared by the per-period
//! federal and provincial calculators and by the marginal-rate bonus and
//! retroactive calculators. It works on annual amounts only; converting a
//! pay period to an annual income and back happens at the call sites.
//!
//! # Method
//!
//! For annual taxable income `A`:
//!
//! 1. Select the bracket with the highest threshold not above `A` to get
//!    `R` (rate) and `K` (constant).
//! 2. Credits: `K1 = claim_rate × claim`, `K2 = cpp_ei_rate × (CPP credit +
//!    EI credit)`, `K3` other credits, `K4 = employment_rate ×
//!    min(A, employment_amount)`.
//! 3. Basic tax `T = max(0, R × A − K − K1 − K2 − K3 − K4)`.
//! 4. Where configured: surtax on `T`, then a tax reduction, then a health
//!    premium on `A`. The annual tax is floored at zero.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{CppConfig, EiConfig, HealthPremiumTier, JurisdictionTaxConfig, TaxReduction};
use crate::error::EngineResult;
use crate::models::{AuditStep, Jurisdiction, periods_decimal};

use super::rounding::round_money;

/// Annual amounts feeding one raw tax computation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnualTaxInput {
    /// Annual taxable income `A`, after deductions.
    pub annual_income: Decimal,
    /// Claim amount for K1. `None` uses the basic personal amount at `A`.
    pub claim_amount: Option<Decimal>,
    /// Annual base CPP contributions used for the K2 credit.
    pub annual_cpp: Decimal,
    /// Annual EI premiums used for the K2 credit.
    pub annual_ei: Decimal,
    /// Other non-refundable credits (K3), already in tax dollars.
    pub other_credits: Decimal,
}

/// Every intermediate of a raw annual tax computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnualTaxBreakdown {
    /// Annual taxable income `A`.
    pub annual_income: Decimal,
    /// Bracket rate `R`.
    pub rate: Decimal,
    /// Bracket constant `K`.
    pub constant: Decimal,
    /// Claim amount used for K1.
    pub claim_amount: Decimal,
    /// Personal claim credit.
    pub k1: Decimal,
    /// CPP and EI credit.
    pub k2: Decimal,
    /// Other credits.
    pub k3: Decimal,
    /// Employment amount credit.
    pub k4: Decimal,
    /// Tax before surtax, reduction and health premium.
    pub basic_tax: Decimal,
    /// Surtax on the basic tax.
    pub surtax: Decimal,
    /// Tax reduction.
    pub reduction: Decimal,
    /// Health premium.
    pub health_premium: Decimal,
    /// Annual tax, unrounded.
    pub annual_tax: Decimal,
}

/// Computes raw annual tax for one jurisdiction.
///
/// # Examples
///
/// ```no_run
/// use payroll_engine::calculation::{AnnualTaxInput, annual_tax};
/// use payroll_engine::config::{CachedTaxTables, ConfigLoader, TaxTableProvider};
/// use payroll_engine::models::Jurisdiction;
/// use rust_decimal::Decimal;
///
/// let tables = CachedTaxTables::new(ConfigLoader::new("./config")?);
/// let federal = tables.tax_config(Jurisdiction::Federal, 2025, None)?;
/// let cpp = tables.cpp_config(2025)?;
/// let ei = tables.ei_config(2025)?;
///
/// let input = AnnualTaxInput { annual_income: Decimal::from(60000), ..Default::default() };
/// let breakdown = annual_tax(&federal, &cpp, &ei, &input);
/// println!("Federal tax on $60,000: {}", breakdown.annual_tax);
/// # Ok::<(), payroll_engine::error::EngineError>(())
/// ```
pub fn annual_tax(
    config: &JurisdictionTaxConfig,
    cpp: &CppConfig,
    ei: &EiConfig,
    input: &AnnualTaxInput,
) -> AnnualTaxBreakdown {
    let a = input.annual_income.max(Decimal::ZERO);
    let edition = &config.edition;
    let credits = &edition.credit_rates;

    let bracket = config.bracket_for(a);
    let claim_amount = input
        .claim_amount
        .unwrap_or_else(|| config.basic_personal_amount_at(a));

    let k1 = credits.claim * claim_amount;

    let ratio = cpp.pre_enhancement_ratio();
    let cpp_credit = (input.annual_cpp * ratio).min(cpp.max_base_contribution * ratio);
    let ei_credit = input.annual_ei.min(ei.max_employee_premium);
    let k2 = credits.cpp_ei * (cpp_credit.max(Decimal::ZERO) + ei_credit.max(Decimal::ZERO));

    let k3 = input.other_credits.max(Decimal::ZERO);

    let k4 = match edition.employment_amount {
        Some(amount) => (credits.employment * a).min(credits.employment * amount),
        None => Decimal::ZERO,
    };

    let basic_tax =
        (bracket.rate * a - bracket.constant - k1 - k2 - k3 - k4).max(Decimal::ZERO);

    let surtax: Decimal = edition
        .surtax
        .iter()
        .map(|tier| tier.rate * (basic_tax - tier.threshold).max(Decimal::ZERO))
        .sum();

    let reduction = match &edition.tax_reduction {
        Some(TaxReduction::Ontario { basic_amount }) => {
            let taxed = basic_tax + surtax;
            taxed.min((Decimal::TWO * basic_amount - taxed).max(Decimal::ZERO))
        }
        Some(TaxReduction::IncomeTested {
            amount,
            threshold,
            rate,
        }) => {
            let clawback = *rate * (a - threshold).max(Decimal::ZERO);
            (*amount - clawback).max(Decimal::ZERO).min(basic_tax)
        }
        None => Decimal::ZERO,
    };

    let health_premium = health_premium(&edition.health_premium, a);
    let annual_tax = (basic_tax + surtax - reduction + health_premium).max(Decimal::ZERO);

    AnnualTaxBreakdown {
        annual_income: a,
        rate: bracket.rate,
        constant: bracket.constant,
        claim_amount,
        k1,
        k2,
        k3,
        k4,
        basic_tax,
        surtax,
        reduction,
        health_premium,
        annual_tax,
    }
}

/// Premium for the tier with the highest threshold below `income`.
fn health_premium(tiers: &[HealthPremiumTier], income: Decimal) -> Decimal {
    tiers
        .iter()
        .rev()
        .find(|tier| income > tier.threshold)
        .map(|tier| (tier.base + tier.rate * (income - tier.threshold)).min(tier.cap))
        .unwrap_or(Decimal::ZERO)
}

/// One pay period's facts for federal or provincial tax.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodTaxInput {
    /// Regular taxable earnings for the period.
    pub gross: Decimal,
    /// Pay periods per year.
    pub periods_per_year: u32,
    /// RRSP contributions deducted at source.
    pub rrsp: Decimal,
    /// Union dues.
    pub union_dues: Decimal,
    /// CPP enhancement contribution for the period.
    pub cpp_enhancement: Decimal,
    /// CPP2 contribution for the period.
    pub cpp2: Decimal,
    /// Annual deductions authorized by the tax authority (F1).
    pub annual_deductions: Decimal,
    /// Annual prescribed-zone deduction (HD).
    pub prescribed_zone: Decimal,
    /// Base CPP contribution for the period, for the K2 credit.
    pub cpp_contribution: Decimal,
    /// EI premium for the period, for the K2 credit.
    pub ei_premium: Decimal,
    /// Personal claim amount. `None` uses the basic personal amount.
    pub claim_amount: Option<Decimal>,
    /// Other annual credits (K3).
    pub other_credits: Decimal,
}

impl PeriodTaxInput {
    /// Annualized taxable income `A`, floored at zero.
    ///
    /// `A = P × (gross − RRSP − union dues − CPP enhancement − CPP2) − HD − F1`
    pub fn annual_income(&self) -> EngineResult<Decimal> {
        let periods = periods_decimal(self.periods_per_year)?;
        let net = self.gross - self.rrsp - self.union_dues - self.cpp_enhancement - self.cpp2;
        Ok((periods * net - self.prescribed_zone - self.annual_deductions).max(Decimal::ZERO))
    }

    /// The annual inputs this period implies.
    pub fn to_annual(&self) -> EngineResult<AnnualTaxInput> {
        let periods = periods_decimal(self.periods_per_year)?;
        Ok(AnnualTaxInput {
            annual_income: self.annual_income()?,
            claim_amount: self.claim_amount,
            annual_cpp: periods * self.cpp_contribution,
            annual_ei: periods * self.ei_premium,
            other_credits: self.other_credits,
        })
    }
}

/// The result of a federal or provincial period tax calculation.
#[derive(Debug, Clone)]
pub struct PeriodTaxResult {
    /// Jurisdiction whose tables were applied.
    pub jurisdiction: Jurisdiction,
    /// Effective date of the edition applied.
    pub edition: NaiveDate,
    /// The annual computation.
    pub breakdown: AnnualTaxBreakdown,
    /// Tax withheld this period.
    pub period_tax: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Annual tax for a period and its rounded per-period share.
pub fn period_tax(
    input: &PeriodTaxInput,
    config: &JurisdictionTaxConfig,
    cpp: &CppConfig,
    ei: &EiConfig,
) -> EngineResult<(AnnualTaxBreakdown, Decimal)> {
    let periods = periods_decimal(input.periods_per_year)?;
    let breakdown = annual_tax(config, cpp, ei, &input.to_annual()?);
    let per_period = round_money(breakdown.annual_tax / periods);
    Ok((breakdown, per_period))
}

/// A one-time payment layered on top of annual base income.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplementalIncome {
    /// Taxable amount after its own deductions.
    pub taxable_amount: Decimal,
    /// Base CPP contributed on the payment.
    pub cpp_contribution: Decimal,
    /// EI premium paid on the payment.
    pub ei_premium: Decimal,
}

/// Tax attributable to a supplemental payment under the marginal-rate method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginalTax {
    /// Annual tax on base income alone.
    pub without: AnnualTaxBreakdown,
    /// Annual tax on base income plus the payment.
    pub with: AnnualTaxBreakdown,
    /// `max(0, with − without)`, rounded.
    pub tax: Decimal,
}

/// Computes `Tax(base + supplemental) − Tax(base)` for one jurisdiction.
///
/// The payment is never annualized on its own. Credits in the "with"
/// computation include CPP and EI paid on the payment; the annual maximums
/// cap them.
pub fn marginal_tax(
    config: &JurisdictionTaxConfig,
    cpp: &CppConfig,
    ei: &EiConfig,
    base: &AnnualTaxInput,
    supplemental: &SupplementalIncome,
) -> MarginalTax {
    let without = annual_tax(config, cpp, ei, base);
    let combined = AnnualTaxInput {
        annual_income: base.annual_income + supplemental.taxable_amount.max(Decimal::ZERO),
        claim_amount: base.claim_amount,
        annual_cpp: base.annual_cpp + supplemental.cpp_contribution,
        annual_ei: base.annual_ei + supplemental.ei_premium,
        other_credits: base.other_credits,
    };
    let with = annual_tax(config, cpp, ei, &combined);
    let tax = round_money((with.annual_tax - without.annual_tax).max(Decimal::ZERO));

    MarginalTax { without, with, tax }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BpaPhaseOut, CreditRates, SurtaxTier, TaxBracket, TaxEdition};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn bracket(threshold: &str, rate: &str, constant: &str) -> TaxBracket {
        TaxBracket {
            threshold: dec(threshold),
            rate: dec(rate),
            constant: dec(constant),
        }
    }

    fn cpp() -> CppConfig {
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

    fn ei() -> EiConfig {
        EiConfig {
            year: 2025,
            rate: dec("0.0164"),
            max_insurable_earnings: dec("65700"),
            max_employee_premium: dec("1077.48"),
            employer_multiplier: dec("1.4"),
        }
    }

    fn federal() -> JurisdictionTaxConfig {
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

    fn ontario() -> JurisdictionTaxConfig {
        JurisdictionTaxConfig {
            jurisdiction: Jurisdiction::Ontario,
            year: 2025,
            edition: TaxEdition {
                effective_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                brackets: vec![
                    bracket("0", "0.0505", "0"),
                    bracket("52886", "0.0915", "2168"),
                    bracket("105775", "0.1116", "4294"),
                    bracket("150000", "0.1216", "5794"),
                    bracket("220000", "0.1316", "7994"),
                ],
                basic_personal_amount: dec("12747"),
                bpa_phase_out: None,
                credit_rates: CreditRates {
                    claim: dec("0.0505"),
                    cpp_ei: dec("0.0505"),
                    employment: Decimal::ZERO,
                },
                employment_amount: None,
                surtax: vec![
                    SurtaxTier {
                        threshold: dec("5710"),
                        rate: dec("0.20"),
                    },
                    SurtaxTier {
                        threshold: dec("7307"),
                        rate: dec("0.36"),
                    },
                ],
                health_premium: vec![
                    HealthPremiumTier {
                        threshold: dec("20000"),
                        base: dec("0"),
                        rate: dec("0.06"),
                        cap: dec("300"),
                    },
                    HealthPremiumTier {
                        threshold: dec("36000"),
                        base: dec("300"),
                        rate: dec("0.06"),
                        cap: dec("450"),
                    },
                    HealthPremiumTier {
                        threshold: dec("48000"),
                        base: dec("450"),
                        rate: dec("0.25"),
                        cap: dec("600"),
                    },
                ],
                tax_reduction: Some(TaxReduction::Ontario {
                    basic_amount: dec("294"),
                }),
            },
        }
    }

    fn income(amount: &str) -> AnnualTaxInput {
        AnnualTaxInput {
            annual_income: dec(amount),
            ..AnnualTaxInput::default()
        }
    }

    #[test]
    fn test_first_bracket_with_basic_credits() {
        let result = annual_tax(&federal(), &cpp(), &ei(), &income("50000"));

        assert_eq!(result.rate, dec("0.15"));
        assert_eq!(result.k1, dec("2419.35"));
        assert_eq!(result.k4, dec("220.65"));
        // 7500 − 2419.35 − 220.65
        assert_eq!(result.annual_tax, dec("4860.00"));
    }

    #[test]
    fn test_k2_caps_cpp_credit_at_pre_enhancement_share_of_maximum() {
        let mut input = income("100000");
        input.annual_cpp = dec("10000");
        input.annual_ei = dec("5000");

        let result = annual_tax(&federal(), &cpp(), &ei(), &input);
        let expected_credit_base = dec("4034.10") * cpp().pre_enhancement_ratio() + dec("1077.48");
        assert_eq!(result.k2, dec("0.15") * expected_credit_base);
    }

    #[test]
    fn test_supplied_claim_replaces_basic_personal_amount() {
        let mut input = income("50000");
        input.claim_amount = Some(Decimal::ZERO);

        let result = annual_tax(&federal(), &cpp(), &ei(), &input);
        assert_eq!(result.k1, Decimal::ZERO);
        assert_eq!(result.claim_amount, Decimal::ZERO);
    }

    #[test]
    fn test_credits_never_make_tax_negative() {
        let result = annual_tax(&federal(), &cpp(), &ei(), &income("5000"));
        assert_eq!(result.basic_tax, Decimal::ZERO);
        assert_eq!(result.annual_tax, Decimal::ZERO);
    }

    #[test]
    fn test_ontario_surtax_and_health_premium() {
        let result = annual_tax(&ontario(), &cpp(), &ei(), &income("150000"));

        assert_eq!(result.rate, dec("0.1216"));
        assert!(result.surtax > Decimal::ZERO);
        assert_eq!(result.health_premium, dec("600"));
        assert_eq!(result.reduction, Decimal::ZERO);
        assert_eq!(
            result.annual_tax,
            result.basic_tax + result.surtax + result.health_premium
        );
    }

    #[test]
    fn test_ontario_reduction_eliminates_small_tax() {
        let result = annual_tax(&ontario(), &cpp(), &ei(), &income("18000"));

        // No premium at or below 20000; basic tax is under the reduction.
        assert_eq!(result.health_premium, Decimal::ZERO);
        assert_eq!(result.reduction, result.basic_tax);
        assert_eq!(result.annual_tax, Decimal::ZERO);
    }

    #[test]
    fn test_health_premium_tiers_are_continuous() {
        let tiers = ontario().edition.health_premium;
        assert_eq!(health_premium(&tiers, dec("20000")), Decimal::ZERO);
        assert_eq!(health_premium(&tiers, dec("25000")), dec("300"));
        assert_eq!(health_premium(&tiers, dec("36000")), dec("300"));
        assert_eq!(health_premium(&tiers, dec("38000")), dec("420"));
        assert_eq!(health_premium(&tiers, dec("48000")), dec("450"));
        assert_eq!(health_premium(&tiers, dec("48400")), dec("550"));
    }

    #[test]
    fn test_period_annualization() {
        let input = PeriodTaxInput {
            gross: dec("2000.00"),
            periods_per_year: 26,
            rrsp: dec("100.00"),
            union_dues: dec("20.00"),
            cpp_enhancement: dec("18.65"),
            annual_deductions: dec("1000"),
            ..PeriodTaxInput::default()
        };
        // 26 × 1861.35 − 1000
        assert_eq!(input.annual_income().unwrap(), dec("47395.10"));
    }

    #[test]
    fn test_period_tax_divides_and_rounds() {
        let input = PeriodTaxInput {
            gross: dec("2000.00"),
            periods_per_year: 26,
            ..PeriodTaxInput::default()
        };
        let (breakdown, per_period) = period_tax(&input, &federal(), &cpp(), &ei()).unwrap();
        assert_eq!(breakdown.annual_income, dec("52000"));
        assert_eq!(per_period, round_money(breakdown.annual_tax / dec("26")));
    }

    #[test]
    fn test_marginal_tax_uses_marginal_rate() {
        let base = income("76333");
        let bonus = SupplementalIncome {
            taxable_amount: dec("10000"),
            ..SupplementalIncome::default()
        };
        let result = marginal_tax(&federal(), &cpp(), &ei(), &base, &bonus);

        // Entirely inside the 20.5% bracket.
        assert_eq!(result.tax, dec("2050.00"));
    }

    #[test]
    fn test_marginal_tax_is_zero_for_zero_payment() {
        let result = marginal_tax(
            &federal(),
            &cpp(),
            &ei(),
            &income("60000"),
            &SupplementalIncome::default(),
        );
        assert_eq!(result.tax, Decimal::ZERO);
    }
}
