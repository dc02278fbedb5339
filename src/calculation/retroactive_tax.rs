//! Tax on retroactive pay increases under the marginal-rate method.
//!
//! Retroactive pay is pensionable and insurable in the period it is paid,
//! but it was earned across earlier periods. It is taxed like a bonus, as
//! the marginal increase in annual tax, after the period's RRSP deduction
//! is split between the regular and retroactive portions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{CppConfig, EiConfig, JurisdictionTaxConfig};
use crate::error::{EngineError, EngineResult};
use crate::models::AuditStep;

use super::bonus_tax::{SupplementalTaxInput, check_tables, marginal_pair};
use super::income_tax::MarginalTax;
use super::rounding::{round_money, truncate_money};

/// An RRSP deduction divided between regular and retroactive pay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RrspSplit {
    /// Share deducted from regular pay.
    pub regular: Decimal,
    /// Share deducted from retroactive pay.
    pub retroactive: Decimal,
}

/// Splits `rrsp` in proportion to the regular and retroactive amounts.
///
/// The retroactive share is rounded to cents and the regular share takes
/// the remainder, so the two always add back to `rrsp`.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::split_rrsp;
/// use rust_decimal::Decimal;
///
/// let split = split_rrsp(Decimal::from(300), Decimal::from(2000), Decimal::from(1000));
/// assert_eq!(split.retroactive, Decimal::from(100));
/// assert_eq!(split.regular, Decimal::from(200));
/// ```
pub fn split_rrsp(rrsp: Decimal, regular: Decimal, retroactive: Decimal) -> RrspSplit {
    let regular = regular.max(Decimal::ZERO);
    let retroactive = retroactive.max(Decimal::ZERO);
    let total = regular + retroactive;
    if total.is_zero() || retroactive.is_zero() {
        return RrspSplit {
            regular: rrsp,
            retroactive: Decimal::ZERO,
        };
    }

    let retroactive_share = round_money(rrsp * retroactive / total);
    RrspSplit {
        regular: rrsp - retroactive_share,
        retroactive: retroactive_share,
    }
}

/// A retroactive payment divided across the periods it was earned in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proration {
    /// Number of originating periods.
    pub periods: u32,
    /// Amount attributed to each period but the last.
    pub per_period: Decimal,
    /// Amount attributed to the last period.
    pub last: Decimal,
}

impl Proration {
    /// Divides `amount` across `periods` originating periods.
    ///
    /// Each slice but the last is truncated to cents; the last takes the
    /// remainder so the slices add back to `amount`.
    ///
    /// # Returns
    ///
    /// Returns `InvalidInput` if `periods` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use payroll_engine::calculation::Proration;
    /// use rust_decimal::Decimal;
    ///
    /// let proration = Proration::new(Decimal::from(100), 3).unwrap();
    /// assert_eq!(proration.per_period, Decimal::new(3333, 2));
    /// assert_eq!(proration.last, Decimal::new(3334, 2));
    /// assert_eq!(proration.slices().sum::<Decimal>(), Decimal::from(100));
    /// ```
    pub fn new(amount: Decimal, periods: u32) -> EngineResult<Self> {
        if periods == 0 {
            return Err(EngineError::InvalidInput {
                field: "retroactive_periods".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        let per_period = truncate_money(amount / Decimal::from(periods));
        Ok(Self {
            periods,
            per_period,
            last: amount - per_period * Decimal::from(periods - 1),
        })
    }

    /// The amount attributed to each originating period, in order.
    pub fn slices(&self) -> impl Iterator<Item = Decimal> + '_ {
        (1..=self.periods).map(|i| {
            if i == self.periods {
                self.last
            } else {
                self.per_period
            }
        })
    }
}

/// A retroactive payment and the annual context it is taxed against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetroactiveTaxInput {
    /// The payment. Its `rrsp` is the period's whole RRSP deduction, which
    /// is split against `regular_gross` before the payment is taxed.
    pub payment: SupplementalTaxInput,
    /// Regular earnings paid alongside the retroactive amount.
    pub regular_gross: Decimal,
    /// Number of earlier periods the payment covers.
    pub originating_periods: u32,
}

/// The result of a retroactive tax calculation.
#[derive(Debug, Clone)]
pub struct RetroactiveTaxResult {
    /// The payment attributed to each originating period.
    pub per_period_amount: Decimal,
    /// The RRSP split between regular and retroactive pay.
    pub rrsp_split: RrspSplit,
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

/// Calculates federal and provincial tax on retroactive pay.
///
/// # Returns
///
/// Returns `InvalidInput` if `originating_periods` is zero, or
/// `InvalidJurisdiction` if the tables are not a federal/provincial pair.
pub fn calculate_retroactive_tax(
    input: &RetroactiveTaxInput,
    federal: &JurisdictionTaxConfig,
    provincial: &JurisdictionTaxConfig,
    cpp: &CppConfig,
    ei: &EiConfig,
    step_number: u32,
) -> EngineResult<RetroactiveTaxResult> {
    check_tables(federal, provincial)?;
    let payment = &input.payment;
    let per_period_amount = Proration::new(payment.amount, input.originating_periods)?.per_period;
    let rrsp_split = split_rrsp(payment.rrsp, input.regular_gross, payment.amount);

    let taxable_amount = SupplementalTaxInput {
        rrsp: rrsp_split.retroactive,
        ..payment.clone()
    }
    .taxable_amount();

    let (federal_marginal, provincial_marginal) =
        marginal_pair(payment, taxable_amount, federal, provincial, cpp, ei);
    let federal_tax = federal_marginal.tax;
    let provincial_tax = provincial_marginal.tax;
    let total_tax = federal_tax + provincial_tax;

    let audit_step = AuditStep {
        step_number,
        rule_id: "retroactive_tax".to_string(),
        rule_name: "Retroactive Pay Tax (Marginal Rate)".to_string(),
        formula_ref: "T4127 retroactive method".to_string(),
        input: serde_json::json!({
            "amount": payment.amount.to_string(),
            "originating_periods": input.originating_periods,
            "regular_gross": input.regular_gross.to_string(),
            "period_rrsp": payment.rrsp.to_string(),
            "base_annual_income": payment.base_annual_income.to_string()
        }),
        output: serde_json::json!({
            "per_period_amount": per_period_amount.to_string(),
            "rrsp_regular": rrsp_split.regular.to_string(),
            "rrsp_retroactive": rrsp_split.retroactive.to_string(),
            "taxable_amount": taxable_amount.to_string(),
            "federal_tax": federal_tax.to_string(),
            "provincial_tax": provincial_tax.to_string(),
            "total_tax": total_tax.to_string()
        }),
        reasoning: format!(
            "${} over {} period(s) (${} each); RRSP ${} attributed; marginal tax ${}",
            payment.amount,
            input.originating_periods,
            per_period_amount,
            rrsp_split.retroactive,
            total_tax
        ),
    };

    Ok(RetroactiveTaxResult {
        per_period_amount,
        rrsp_split,
        taxable_amount,
        federal: federal_marginal,
        provincial: provincial_marginal,
        federal_tax,
        provincial_tax,
        total_tax,
        audit_step,
    })
}
