//! Regular holiday-pay formulas.
//!
//! Each leaf [`HolidayPayFormula`] turns historical earnings (or the
//! current period, for `current_period_daily`) into one day's holiday pay.
//! The split variants only choose a leaf and are resolved first by
//! [`resolve_formula`].

use rust_decimal::Decimal;

use crate::calculation::rounding::round_money;
use crate::config::HolidayPayFormula;
use crate::error::{EngineError, EngineResult};
use crate::models::{CompensationType, Employee, HistoricalEarnings, Jurisdiction};

/// The current pay period, for formulas that read it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CurrentPeriod {
    /// Gross earnings of the current period.
    pub gross: Decimal,
    /// Days worked in the current period.
    pub days_worked: u32,
}

impl CurrentPeriod {
    /// Gross per day worked, or zero with no days worked.
    pub fn daily_gross(&self) -> Decimal {
        if self.days_worked == 0 {
            return Decimal::ZERO;
        }
        round_money(self.gross / Decimal::from(self.days_worked))
    }
}

/// A formula's amount and how it was reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaOutcome {
    /// The day's regular holiday pay, rounded.
    pub amount: Decimal,
    /// Working shown for the audit trail.
    pub explanation: String,
}

/// Follows split variants down to the leaf formula for `employee`.
///
/// Casual employees take the part-time branch. A commission employee
/// under a split with no commission branch is a configuration error.
pub fn resolve_formula<'a>(
    formula: &'a HolidayPayFormula,
    employee: &Employee,
    jurisdiction: Jurisdiction,
) -> EngineResult<&'a HolidayPayFormula> {
    match formula {
        HolidayPayFormula::SplitByEmploymentType {
            full_time,
            part_time,
        } => {
            let branch = if employee.is_full_time() {
                full_time
            } else {
                part_time
            };
            resolve_formula(branch, employee, jurisdiction)
        }
        HolidayPayFormula::SplitByCompensationType {
            hourly,
            salaried,
            commission,
        } => match employee.compensation_type {
            CompensationType::Hourly => resolve_formula(hourly, employee, jurisdiction),
            CompensationType::Salaried => resolve_formula(salaried, employee, jurisdiction),
            CompensationType::Commission => match commission {
                Some(formula) => resolve_formula(formula, employee, jurisdiction),
                None => Err(EngineError::InvalidFormulaConfiguration {
                    jurisdiction: jurisdiction.to_string(),
                    formula_type: formula.formula_type().to_string(),
                    message: "no commission formula for a commission employee".to_string(),
                }),
            },
        },
        leaf => Ok(leaf),
    }
}

fn wage_base(
    history: &HistoricalEarnings,
    include_vacation_pay: bool,
    include_overtime: bool,
) -> (Decimal, Vec<String>) {
    let mut base = history.wages;
    let mut parts = vec![format!("wages ${}", history.wages)];
    if include_overtime {
        base += history.overtime_wages;
        parts.push(format!("overtime ${}", history.overtime_wages));
    }
    if include_vacation_pay {
        base += history.vacation_pay;
        parts.push(format!("vacation ${}", history.vacation_pay));
    }
    (base, parts)
}

fn per_day_worked(base: Decimal, history: &HistoricalEarnings) -> Decimal {
    if history.days_worked == 0 {
        return Decimal::ZERO;
    }
    round_money(base / Decimal::from(history.days_worked))
}

/// Applies a leaf formula.
///
/// # Returns
///
/// Returns `InvalidFormulaConfiguration` if given an unresolved split.
pub fn apply_formula(
    formula: &HolidayPayFormula,
    history: &HistoricalEarnings,
    current: &CurrentPeriod,
    jurisdiction: Jurisdiction,
) -> EngineResult<FormulaOutcome> {
    let outcome = match formula {
        HolidayPayFormula::FourWeekAverage {
            divisor,
            include_vacation_pay,
            include_overtime,
            ..
        } => {
            let (base, parts) = wage_base(history, *include_vacation_pay, *include_overtime);
            let amount = round_money(base / *divisor);
            FormulaOutcome {
                amount,
                explanation: format!("({}) / {} = ${}", parts.join(" + "), divisor, amount),
            }
        }
        HolidayPayFormula::ThirtyDayAverage {
            include_vacation_pay,
            include_overtime,
            ..
        }
        | HolidayPayFormula::FourWeekAverageDaily {
            include_vacation_pay,
            include_overtime,
            ..
        } => {
            let (base, parts) = wage_base(history, *include_vacation_pay, *include_overtime);
            let amount = per_day_worked(base, history);
            FormulaOutcome {
                amount,
                explanation: format!(
                    "({}) / {} day(s) worked = ${}",
                    parts.join(" + "),
                    history.days_worked,
                    amount
                ),
            }
        }
        HolidayPayFormula::FivePercent28Days {
            percentage,
            include_vacation_pay,
            include_holiday_pay,
            include_overtime,
            ..
        } => {
            let (mut base, mut parts) =
                wage_base(history, *include_vacation_pay, *include_overtime);
            if *include_holiday_pay {
                base += history.holiday_pay;
                parts.push(format!("holiday pay ${}", history.holiday_pay));
            }
            let amount = round_money(base * *percentage);
            FormulaOutcome {
                amount,
                explanation: format!("{} × ({}) = ${}", percentage, parts.join(" + "), amount),
            }
        }
        HolidayPayFormula::CurrentPeriodDaily => {
            let amount = current.daily_gross();
            FormulaOutcome {
                amount,
                explanation: format!(
                    "current period ${} / {} day(s) worked = ${}",
                    current.gross, current.days_worked, amount
                ),
            }
        }
        HolidayPayFormula::IrregularHours {
            percentage,
            include_vacation_pay,
            ..
        } => {
            let (base, parts) = wage_base(history, *include_vacation_pay, false);
            let amount = round_money(base * *percentage);
            FormulaOutcome {
                amount,
                explanation: format!("{} × ({}) = ${}", percentage, parts.join(" + "), amount),
            }
        }
        HolidayPayFormula::Commission { divisor, .. } => {
            let amount = round_money((history.wages + history.commission) / *divisor);
            FormulaOutcome {
                amount,
                explanation: format!(
                    "(wages ${} + commission ${}) / {} = ${}",
                    history.wages, history.commission, divisor, amount
                ),
            }
        }
        HolidayPayFormula::SplitByEmploymentType { .. }
        | HolidayPayFormula::SplitByCompensationType { .. } => {
            return Err(EngineError::InvalidFormulaConfiguration {
                jurisdiction: jurisdiction.to_string(),
                formula_type: formula.formula_type().to_string(),
                message: "split formula must be resolved before it is applied".to_string(),
            });
        }
    };
    Ok(outcome)
}
