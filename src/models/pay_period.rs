//! Pay period input models.
//!
//! This module contains the [`PayPeriodInput`] type and its parts: the
//! employee-period facts a payroll run supplies for each deduction
//! calculation.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

use super::Jurisdiction;

/// How often the employee is paid.
///
/// # Example
///
/// ```
/// use payroll_engine::models::PayFrequency;
///
/// assert_eq!(PayFrequency::BiWeekly.periods_per_year(), 26);
/// assert_eq!(PayFrequency::Custom(13).periods_per_year(), 13);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayFrequency {
    /// 52 pay periods per year.
    Weekly,
    /// 26 pay periods per year.
    BiWeekly,
    /// 24 pay periods per year.
    SemiMonthly,
    /// 12 pay periods per year.
    Monthly,
    /// Any other number of pay periods per year.
    Custom(u32),
}

impl PayFrequency {
    /// Returns the number of pay periods in a year.
    pub fn periods_per_year(&self) -> u32 {
        match self {
            PayFrequency::Weekly => 52,
            PayFrequency::BiWeekly => 26,
            PayFrequency::SemiMonthly => 24,
            PayFrequency::Monthly => 12,
            PayFrequency::Custom(n) => *n,
        }
    }

    /// Returns the period count as a decimal, rejecting zero.
    pub fn periods(&self) -> EngineResult<Decimal> {
        periods_decimal(self.periods_per_year())
    }
}

/// Converts a period count into a decimal divisor, rejecting zero.
pub fn periods_decimal(periods: u32) -> EngineResult<Decimal> {
    if periods == 0 {
        return Err(EngineError::InvalidInput {
            field: "periods_per_year".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }
    Ok(Decimal::from(periods))
}

/// Gross earnings for one pay period, by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodEarnings {
    /// Regular wages or salary.
    #[serde(default)]
    pub regular: Decimal,
    /// Overtime wages.
    #[serde(default)]
    pub overtime: Decimal,
    /// Statutory holiday pay.
    #[serde(default)]
    pub holiday: Decimal,
    /// One-time bonus, taxed with the marginal-rate bonus method.
    #[serde(default)]
    pub bonus: Decimal,
    /// Retroactive pay increase, taxed with the marginal-rate retroactive method.
    #[serde(default)]
    pub retroactive: Decimal,
}

impl PeriodEarnings {
    /// Earnings taxed through the regular per-period formula.
    pub fn regular_taxable(&self) -> Decimal {
        self.regular + self.overtime + self.holiday
    }

    /// All earnings, which are pensionable and insurable in this period.
    pub fn total(&self) -> Decimal {
        self.regular_taxable() + self.bonus + self.retroactive
    }
}

/// Deductions at source that reduce taxable income.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodDeductions {
    /// RRSP or registered pension contributions withheld this period.
    #[serde(default)]
    pub rrsp: Decimal,
    /// RRSP withheld from the bonus payment itself.
    #[serde(default)]
    pub rrsp_on_bonus: Decimal,
    /// Union dues withheld this period.
    #[serde(default)]
    pub union_dues: Decimal,
    /// Annual deductions authorized by a tax services office (child care, support).
    #[serde(default)]
    pub annual_deductions: Decimal,
    /// Annual prescribed-zone deduction for northern residents.
    #[serde(default)]
    pub prescribed_zone: Decimal,
}

/// Claim amounts from the employee's TD1 forms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimAmounts {
    /// Federal total claim amount; `None` means the basic personal amount.
    #[serde(default)]
    pub federal: Option<Decimal>,
    /// Provincial total claim amount; `None` means the basic personal amount.
    #[serde(default)]
    pub provincial: Option<Decimal>,
    /// Other annual federal credits (K3).
    #[serde(default)]
    pub federal_other_credits: Decimal,
    /// Other annual provincial credits (K3P).
    #[serde(default)]
    pub provincial_other_credits: Decimal,
}

/// Statutory exemptions for the employee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExemptionFlags {
    /// Exempt from CPP (base and additional).
    #[serde(default)]
    pub cpp_exempt: bool,
    /// Exempt from the second additional contribution only.
    #[serde(default)]
    pub cpp2_exempt: bool,
    /// Exempt from EI premiums.
    #[serde(default)]
    pub ei_exempt: bool,
}

/// Everything the engine needs about one employee for one pay period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayPeriodInput {
    /// The employee being paid.
    pub employee_id: String,
    /// Province or territory of employment.
    pub jurisdiction: Jurisdiction,
    /// The pay date; selects the tax year and table edition.
    pub pay_date: NaiveDate,
    /// Pay frequency.
    pub frequency: PayFrequency,
    /// Gross earnings by kind.
    pub earnings: PeriodEarnings,
    /// Number of past pay periods the retroactive amount covers.
    #[serde(default = "default_retroactive_periods")]
    pub retroactive_periods: u32,
    /// Deductions at source.
    #[serde(default)]
    pub deductions: PeriodDeductions,
    /// TD1 claim amounts and other credits.
    #[serde(default)]
    pub claims: ClaimAmounts,
    /// CPP/CPP2/EI exemptions.
    #[serde(default)]
    pub exemptions: ExemptionFlags,
}

fn default_retroactive_periods() -> u32 {
    1
}
