//! The composition root for one employee's pay period.
//!
//! [`PayrollEngine`] resolves the tables in force on the pay date, runs
//! CPP, EI, federal and provincial tax, then bonus and retroactive tax,
//! and returns every amount together with the audit trace and the
//! employee's advanced year-to-date accumulators.

use std::time::Instant;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::calculation::{
    CppInput, CppResult, EarningsFetcher, EiInput, EiResult, HolidayPayInput, HolidayPayResult,
    PeriodTaxInput, Proration, RetroactiveTaxInput, SupplementalTaxInput, calculate_bonus_tax,
    calculate_cpp, calculate_ei, calculate_federal_tax, calculate_holiday_pay,
    calculate_provincial_tax, calculate_retroactive_tax, split_rrsp,
};
use crate::config::{CppConfig, EiConfig, TaxTableProvider};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditStep, AuditTrace, AuditWarning, Jurisdiction, PayPeriodInput, YtdAccumulators, YtdDelta,
    periods_decimal,
};

/// Employee deductions withheld for the period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionAmounts {
    /// Base CPP contribution.
    pub cpp: Decimal,
    /// Second additional CPP contribution.
    pub cpp2: Decimal,
    /// EI premium.
    pub ei: Decimal,
    /// Federal tax on regular earnings.
    pub federal_tax: Decimal,
    /// Provincial tax on regular earnings.
    pub provincial_tax: Decimal,
    /// Federal plus provincial tax on the bonus.
    pub bonus_tax: Decimal,
    /// Federal plus provincial tax on retroactive pay.
    pub retroactive_tax: Decimal,
    /// RRSP withheld, including any taken from the bonus.
    pub rrsp: Decimal,
    /// Union dues.
    pub union_dues: Decimal,
}

impl DeductionAmounts {
    /// All income tax withheld.
    pub fn income_tax(&self) -> Decimal {
        self.federal_tax + self.provincial_tax + self.bonus_tax + self.retroactive_tax
    }

    /// Every deduction.
    pub fn total(&self) -> Decimal {
        self.cpp + self.cpp2 + self.ei + self.income_tax() + self.rrsp + self.union_dues
    }
}

/// Employer contributions owed for the period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployerContributions {
    /// Employer base CPP.
    pub cpp: Decimal,
    /// Employer CPP2.
    pub cpp2: Decimal,
    /// Employer EI.
    pub ei: Decimal,
}

/// The complete result for one employee's pay period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollResult {
    /// Unique identifier for this calculation.
    pub calculation_id: Uuid,
    /// When the calculation ran.
    pub timestamp: DateTime<Utc>,
    /// Version of the engine that produced the result.
    pub engine_version: String,
    /// The employee.
    pub employee_id: String,
    /// Province or territory of employment.
    pub jurisdiction: Jurisdiction,
    /// The pay date.
    pub pay_date: NaiveDate,
    /// Effective date of the federal edition applied.
    pub federal_edition: NaiveDate,
    /// Effective date of the provincial edition applied.
    pub provincial_edition: NaiveDate,
    /// Gross earnings for the period.
    pub gross: Decimal,
    /// Employee deductions.
    pub deductions: DeductionAmounts,
    /// Total employee deductions.
    pub total_deductions: Decimal,
    /// Gross less total deductions.
    pub net_pay: Decimal,
    /// Employer contributions.
    pub employer: EmployerContributions,
    /// Year-to-date totals including this period.
    pub ytd: YtdAccumulators,
    /// The audit trace.
    pub audit_trace: AuditTrace,
}

/// CPP and EI amounts attributed to one kind of earnings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct StatutoryShare {
    cpp_base: Decimal,
    cpp_enhancement: Decimal,
    cpp2: Decimal,
    ei: Decimal,
    employer_ei: Decimal,
    insurable: Decimal,
    cpp_max_reached: bool,
    ei_max_reached: bool,
}

impl StatutoryShare {
    fn assessed(cpp: &CppResult, ei: &EiResult) -> Self {
        Self {
            cpp_base: cpp.base,
            cpp_enhancement: cpp.enhancement,
            cpp2: cpp.additional,
            ei: ei.employee_premium,
            employer_ei: ei.employer_premium,
            insurable: ei.insurable_assessed,
            cpp_max_reached: cpp.max_reached,
            ei_max_reached: ei.max_reached,
        }
    }

    /// What `self` adds over `without`; the flags are `self`'s.
    fn less(&self, without: &Self) -> Self {
        Self {
            cpp_base: self.cpp_base - without.cpp_base,
            cpp_enhancement: self.cpp_enhancement - without.cpp_enhancement,
            cpp2: self.cpp2 - without.cpp2,
            ei: self.ei - without.ei,
            employer_ei: self.employer_ei - without.employer_ei,
            insurable: self.insurable - without.insurable,
            ..*self
        }
    }

    fn plus(&self, other: &Self) -> Self {
        Self {
            cpp_base: self.cpp_base + other.cpp_base,
            cpp_enhancement: self.cpp_enhancement + other.cpp_enhancement,
            cpp2: self.cpp2 + other.cpp2,
            ei: self.ei + other.ei,
            employer_ei: self.employer_ei + other.employer_ei,
            insurable: self.insurable + other.insurable,
            cpp_max_reached: self.cpp_max_reached || other.cpp_max_reached,
            ei_max_reached: self.ei_max_reached || other.ei_max_reached,
        }
    }
}

/// CPP and EI on supplemental slices paid on top of regular earnings.
///
/// Each slice is assessed as if paid alongside one period's `regular`
/// earnings: it gets whatever basic exemption regular pay left unused and
/// pays CPP2 only above that period's share of the YMPE. `cpp_input` and
/// `ei_input` carry the year-to-date totals before this period; `prior` is
/// what earlier supplemental slices of the period already consumed.
fn assess_on_top(
    regular: Decimal,
    slices: impl IntoIterator<Item = Decimal>,
    prior: StatutoryShare,
    cpp_input: &CppInput,
    cpp_config: &CppConfig,
    ei_input: &EiInput,
    ei_config: &EiConfig,
) -> EngineResult<StatutoryShare> {
    let mut consumed = prior;
    let mut total = StatutoryShare::default();

    for slice in slices {
        let at = |earnings: Decimal| -> EngineResult<StatutoryShare> {
            let cpp = calculate_cpp(
                &CppInput {
                    pensionable_earnings: earnings,
                    ytd_base: cpp_input.ytd_base + consumed.cpp_base,
                    ytd_additional: cpp_input.ytd_additional + consumed.cpp2,
                    ..cpp_input.clone()
                },
                cpp_config,
                0,
            )?;
            let ei = calculate_ei(
                &EiInput {
                    insurable_earnings: earnings,
                    ytd_insurable_earnings: ei_input.ytd_insurable_earnings + consumed.insurable,
                    ytd_premium: ei_input.ytd_premium + consumed.ei,
                    ..ei_input.clone()
                },
                ei_config,
                0,
            );
            Ok(StatutoryShare::assessed(&cpp, &ei))
        };

        let share = at(regular + slice)?.less(&at(regular)?);
        consumed = consumed.plus(&share);
        total = total.plus(&share);
    }

    Ok(total)
}

/// Records the contributions assessed on bonus and retroactive pay.
fn supplemental_step(
    step_number: u32,
    input: &PayPeriodInput,
    bonus: &StatutoryShare,
    retroactive: &StatutoryShare,
) -> AuditStep {
    let earnings = &input.earnings;
    AuditStep {
        step_number,
        rule_id: "supplemental_contributions".to_string(),
        rule_name: "CPP/EI on Bonus and Retroactive Pay".to_string(),
        formula_ref: "T4127 CPP / CPP2 / EI".to_string(),
        input: serde_json::json!({
            "regular": earnings.regular_taxable().to_string(),
            "bonus": earnings.bonus.to_string(),
            "retroactive": earnings.retroactive.to_string(),
            "retroactive_periods": input.retroactive_periods
        }),
        output: serde_json::json!({
            "bonus_cpp": bonus.cpp_base.to_string(),
            "bonus_cpp2": bonus.cpp2.to_string(),
            "bonus_ei": bonus.ei.to_string(),
            "retroactive_cpp": retroactive.cpp_base.to_string(),
            "retroactive_cpp2": retroactive.cpp2.to_string(),
            "retroactive_ei": retroactive.ei.to_string()
        }),
        reasoning: format!(
            "Bonus assessed on top of regular pay: CPP ${} + CPP2 ${}, EI ${}; \
             retroactive pay over {} originating period(s): CPP ${} + CPP2 ${}, EI ${}",
            bonus.cpp_base,
            bonus.cpp2,
            bonus.ei,
            input.retroactive_periods,
            retroactive.cpp_base,
            retroactive.cpp2,
            retroactive.ei
        ),
    }
}

/// Calculates statutory deductions for pay periods.
///
/// # Example
///
/// ```no_run
/// use payroll_engine::config::{CachedTaxTables, ConfigLoader};
/// use payroll_engine::engine::PayrollEngine;
/// use payroll_engine::models::{
///     Jurisdiction, PayFrequency, PayPeriodInput, PeriodEarnings, YtdAccumulators,
/// };
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let engine = PayrollEngine::new(CachedTaxTables::new(ConfigLoader::new("./config")?));
/// let input = PayPeriodInput {
///     employee_id: "emp_001".to_string(),
///     jurisdiction: Jurisdiction::Ontario,
///     pay_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
///     frequency: PayFrequency::BiWeekly,
///     earnings: PeriodEarnings {
///         regular: Decimal::from(2000),
///         ..PeriodEarnings::default()
///     },
///     retroactive_periods: 1,
///     deductions: Default::default(),
///     claims: Default::default(),
///     exemptions: Default::default(),
/// };
///
/// let result = engine.calculate_period(&input, &YtdAccumulators::default())?;
/// println!("Net pay: {}", result.net_pay);
/// # Ok::<(), payroll_engine::error::EngineError>(())
/// ```
pub struct PayrollEngine<P> {
    tables: P,
}

impl<P: TaxTableProvider> PayrollEngine<P> {
    /// Creates an engine over a table provider.
    pub fn new(tables: P) -> Self {
        Self { tables }
    }

    /// The table provider.
    pub fn tables(&self) -> &P {
        &self.tables
    }

    /// Calculates one employee's deductions for one pay period.
    ///
    /// `ytd` holds the totals before this period and is not modified; the
    /// result carries the advanced totals.
    ///
    /// # Returns
    ///
    /// Returns `InvalidJurisdiction` if the employment jurisdiction is not a
    /// province or territory, `ConfigNotFound` if the pay date's year has
    /// no tables, or `InvalidInput` for a zero period count.
    pub fn calculate_period(
        &self,
        input: &PayPeriodInput,
        ytd: &YtdAccumulators,
    ) -> EngineResult<PayrollResult> {
        let start_time = Instant::now();
        let mut steps: Vec<AuditStep> = Vec::new();
        let mut warnings: Vec<AuditWarning> = Vec::new();
        let mut step_number: u32 = 1;

        if !input.jurisdiction.is_province() {
            return Err(EngineError::InvalidJurisdiction {
                code: input.jurisdiction.code().to_string(),
            });
        }

        let periods_per_year = input.frequency.periods_per_year();
        let periods = periods_decimal(periods_per_year)?;
        let year = input.pay_date.year();

        let cpp_config = self.tables.cpp_config(year)?;
        let ei_config = self.tables.ei_config(year)?;
        let federal = self
            .tables
            .tax_config(Jurisdiction::Federal, year, Some(input.pay_date))?;
        let provincial = self
            .tables
            .tax_config(input.jurisdiction, year, Some(input.pay_date))?;
        debug!(
            employee_id = %input.employee_id,
            federal_edition = %federal.edition.effective_date,
            provincial_edition = %provincial.edition.effective_date,
            "Resolved tax tables"
        );

        let earnings = &input.earnings;
        let deductions = &input.deductions;
        let claims = &input.claims;
        let gross = earnings.total();
        let regular = earnings.regular_taxable();

        // CPP and EI on regular earnings alone
        let cpp_input = CppInput {
            pensionable_earnings: regular,
            ytd_base: ytd.cpp_base,
            ytd_additional: ytd.cpp_additional,
            periods_per_year,
            cpp_exempt: input.exemptions.cpp_exempt,
            cpp2_exempt: input.exemptions.cpp2_exempt,
        };
        let cpp = calculate_cpp(&cpp_input, &cpp_config, step_number)?;
        steps.push(cpp.audit_step.clone());
        step_number += 1;

        let ei_input = EiInput {
            insurable_earnings: regular,
            ytd_insurable_earnings: ytd.insurable_earnings,
            ytd_premium: ytd.ei,
            ei_exempt: input.exemptions.ei_exempt,
        };
        let ei = calculate_ei(&ei_input, &ei_config, step_number);
        steps.push(ei.audit_step.clone());
        step_number += 1;
        let regular_share = StatutoryShare::assessed(&cpp, &ei);

        // Bonus on top of regular pay, then retroactive pay one originating
        // period at a time
        let bonus_share = if earnings.bonus > Decimal::ZERO {
            assess_on_top(
                regular,
                [earnings.bonus],
                StatutoryShare::default(),
                &cpp_input,
                &cpp_config,
                &ei_input,
                &ei_config,
            )?
        } else {
            StatutoryShare::default()
        };
        let retro_share = if earnings.retroactive > Decimal::ZERO {
            let proration = Proration::new(earnings.retroactive, input.retroactive_periods)?;
            assess_on_top(
                regular,
                proration.slices(),
                bonus_share,
                &cpp_input,
                &cpp_config,
                &ei_input,
                &ei_config,
            )?
        } else {
            StatutoryShare::default()
        };
        if earnings.bonus > Decimal::ZERO || earnings.retroactive > Decimal::ZERO {
            steps.push(supplemental_step(
                step_number,
                input,
                &bonus_share,
                &retro_share,
            ));
            step_number += 1;
        }

        let period = regular_share.plus(&bonus_share).plus(&retro_share);
        if period.cpp_max_reached {
            warnings.push(AuditWarning::low(
                "CPP_MAX_REACHED",
                format!(
                    "Annual CPP maximum of ${} reached this period",
                    cpp_config.max_base_contribution
                ),
            ));
        }
        if period.ei_max_reached {
            warnings.push(AuditWarning::low(
                "EI_MAX_REACHED",
                format!(
                    "Annual EI maximum of ${} reached",
                    ei_config.max_employee_premium
                ),
            ));
        }
        let rrsp = split_rrsp(deductions.rrsp, regular, earnings.retroactive);

        // Regular income tax
        let federal_input = PeriodTaxInput {
            gross: regular,
            periods_per_year,
            rrsp: rrsp.regular,
            union_dues: deductions.union_dues,
            cpp_enhancement: regular_share.cpp_enhancement,
            cpp2: regular_share.cpp2,
            annual_deductions: deductions.annual_deductions,
            prescribed_zone: deductions.prescribed_zone,
            cpp_contribution: regular_share.cpp_base,
            ei_premium: regular_share.ei,
            claim_amount: claims.federal,
            other_credits: claims.federal_other_credits,
        };
        let federal_tax = calculate_federal_tax(
            &federal_input,
            &federal,
            &cpp_config,
            &ei_config,
            step_number,
        )?;
        steps.push(federal_tax.audit_step.clone());
        step_number += 1;

        let provincial_input = PeriodTaxInput {
            claim_amount: claims.provincial,
            other_credits: claims.provincial_other_credits,
            ..federal_input.clone()
        };
        let provincial_tax = calculate_provincial_tax(
            &provincial_input,
            &provincial,
            &cpp_config,
            &ei_config,
            step_number,
        )?;
        steps.push(provincial_tax.audit_step.clone());
        step_number += 1;

        // Supplemental payments, taxed at the margin of annual base income
        let base_annual_income = federal_tax.breakdown.annual_income.max(ytd.taxable_income);
        let supplemental = |amount: Decimal, rrsp: Decimal, share: &StatutoryShare, base: Decimal| {
            SupplementalTaxInput {
                amount,
                rrsp,
                cpp_enhancement: share.cpp_enhancement,
                cpp2: share.cpp2,
                cpp_contribution: share.cpp_base,
                ei_premium: share.ei,
                base_annual_income: base,
                base_annual_cpp: periods * regular_share.cpp_base,
                base_annual_ei: periods * regular_share.ei,
                federal_claim: claims.federal,
                provincial_claim: claims.provincial,
                federal_other_credits: claims.federal_other_credits,
                provincial_other_credits: claims.provincial_other_credits,
            }
        };

        let mut bonus_tax = Decimal::ZERO;
        let mut bonus_taxable = Decimal::ZERO;
        if earnings.bonus > Decimal::ZERO {
            let result = calculate_bonus_tax(
                &supplemental(
                    earnings.bonus,
                    deductions.rrsp_on_bonus,
                    &bonus_share,
                    base_annual_income,
                ),
                &federal,
                &provincial,
                &cpp_config,
                &ei_config,
                step_number,
            )?;
            bonus_tax = result.total_tax;
            bonus_taxable = result.taxable_amount;
            steps.push(result.audit_step);
            step_number += 1;
        }

        let mut retroactive_tax = Decimal::ZERO;
        let mut retroactive_taxable = Decimal::ZERO;
        if earnings.retroactive > Decimal::ZERO {
            let result = calculate_retroactive_tax(
                &RetroactiveTaxInput {
                    payment: supplemental(
                        earnings.retroactive,
                        deductions.rrsp,
                        &retro_share,
                        base_annual_income + bonus_taxable,
                    ),
                    regular_gross: regular,
                    originating_periods: input.retroactive_periods,
                },
                &federal,
                &provincial,
                &cpp_config,
                &ei_config,
                step_number,
            )?;
            retroactive_tax = result.total_tax;
            retroactive_taxable = result.taxable_amount;
            steps.push(result.audit_step);
        }

        let amounts = DeductionAmounts {
            cpp: period.cpp_base,
            cpp2: period.cpp2,
            ei: period.ei,
            federal_tax: federal_tax.period_tax,
            provincial_tax: provincial_tax.period_tax,
            bonus_tax,
            retroactive_tax,
            rrsp: deductions.rrsp + deductions.rrsp_on_bonus,
            union_dues: deductions.union_dues,
        };
        let total_deductions = amounts.total();
        let net_pay = gross - total_deductions;

        let regular_taxable = (regular
            - rrsp.regular
            - deductions.union_dues
            - regular_share.cpp_enhancement
            - regular_share.cpp2)
            .max(Decimal::ZERO);
        let new_ytd = ytd.advance(&YtdDelta {
            pensionable_earnings: if input.exemptions.cpp_exempt {
                Decimal::ZERO
            } else {
                gross
            },
            insurable_earnings: period.insurable,
            cpp_base: period.cpp_base,
            cpp_additional: period.cpp2,
            ei: period.ei,
            taxable_income: regular_taxable + bonus_taxable + retroactive_taxable,
            income_tax: amounts.income_tax(),
        });

        let duration_us = start_time.elapsed().as_micros() as u64;
        info!(
            employee_id = %input.employee_id,
            jurisdiction = %input.jurisdiction,
            pay_date = %input.pay_date,
            gross = %gross,
            net_pay = %net_pay,
            steps = steps.len(),
            duration_us,
            "Pay period calculation completed"
        );

        Ok(PayrollResult {
            calculation_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            employee_id: input.employee_id.clone(),
            jurisdiction: input.jurisdiction,
            pay_date: input.pay_date,
            federal_edition: federal_tax.edition,
            provincial_edition: provincial_tax.edition,
            gross,
            deductions: amounts,
            total_deductions,
            net_pay,
            employer: EmployerContributions {
                cpp: period.cpp_base,
                cpp2: period.cpp2,
                ei: period.employer_ei,
            },
            ytd: new_ytd,
            audit_trace: AuditTrace {
                steps,
                warnings,
                duration_us,
            },
        })
    }

    /// Calculates holiday pay under the jurisdiction's rules for the
    /// holiday's year.
    pub async fn calculate_holiday_pay<F: EarningsFetcher>(
        &self,
        jurisdiction: Jurisdiction,
        input: &HolidayPayInput,
        fetcher: &F,
    ) -> EngineResult<HolidayPayResult> {
        let config = self
            .tables
            .holiday_pay_config(jurisdiction, input.holiday_date.year())?;
        calculate_holiday_pay(&config, input, fetcher, 1).await
    }
}
