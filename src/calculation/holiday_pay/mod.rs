//! Statutory holiday pay.
//!
//! Each jurisdiction names one [`HolidayPayFormula`] for regular holiday
//! pay. The dispatcher resolves split formulas for the employee, fetches
//! earnings history for the formula's lookback window, checks eligibility
//! and applies the formula. Premium pay for hours worked on the holiday is
//! computed the same way everywhere and does not depend on eligibility.

mod eligibility;
mod fetcher;
mod formulas;

pub use eligibility::{EligibilityDecision, EligibilityFacts, check_eligibility};
pub use fetcher::{EarningsFetcher, EarningsRecord, InMemoryEarningsFetcher};
pub use formulas::{CurrentPeriod, FormulaOutcome, apply_formula, resolve_formula};

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::calculation::rounding::round_money;
use crate::config::{HolidayPayConfig, NewEmployeeFallback};
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, EarningsQuery, Employee, HistoricalEarnings, RunStatus};

/// Facts for one employee and one holiday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayPayInput {
    /// The employee.
    pub employee: Employee,
    /// The holiday.
    pub holiday_date: NaiveDate,
    /// The payroll run being calculated; its earnings are never history.
    pub run_id: Uuid,
    /// Hours worked on the holiday itself.
    #[serde(default)]
    pub hours_worked_on_holiday: Decimal,
    /// Rate for premium pay; the employee's hourly rate when absent.
    #[serde(default)]
    pub hourly_rate: Option<Decimal>,
    /// Gross earnings of the current period.
    #[serde(default)]
    pub current_period_gross: Decimal,
    /// Days worked in the current period.
    #[serde(default)]
    pub current_period_days_worked: u32,
    /// Whether the last scheduled day before the holiday was worked.
    pub worked_last_scheduled_day: bool,
    /// Whether the first scheduled day after the holiday was worked.
    pub worked_next_scheduled_day: bool,
}

/// The result of a holiday pay calculation.
#[derive(Debug, Clone)]
pub struct HolidayPayResult {
    /// The leaf formula applied.
    pub formula_type: String,
    /// Regular holiday pay for the day.
    pub regular_pay: Decimal,
    /// Premium pay for hours worked on the holiday.
    pub premium_pay: Decimal,
    /// Regular plus premium pay.
    pub total: Decimal,
    /// Eligibility outcome.
    pub eligibility: EligibilityDecision,
    /// True if the new-employee fallback decided the regular pay.
    pub used_new_employee_fallback: bool,
    /// Earnings history the formula read.
    pub history: HistoricalEarnings,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Premium pay for hours worked on a holiday.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::premium_pay;
/// use rust_decimal::Decimal;
///
/// let pay = premium_pay(Decimal::from(8), Decimal::from(25), Decimal::new(15, 1));
/// assert_eq!(pay, Decimal::from(300));
/// ```
pub fn premium_pay(hours: Decimal, hourly_rate: Decimal, premium_rate: Decimal) -> Decimal {
    round_money(hours.max(Decimal::ZERO) * hourly_rate * premium_rate)
}

/// Builds the earnings query for a lookback window ending the day before
/// the holiday.
pub fn lookback_query(input: &HolidayPayInput, lookback_days: u32) -> EarningsQuery {
    EarningsQuery {
        employee_id: input.employee.id.clone(),
        window_start: input.holiday_date - Duration::days(i64::from(lookback_days)),
        window_end: input.holiday_date - Duration::days(1),
        statuses: RunStatus::COMPLETED.to_vec(),
        exclude_run_id: Some(input.run_id),
    }
}

/// Calculates holiday pay for one employee and one holiday.
///
/// # Returns
///
/// Returns `InvalidFormulaConfiguration` if no formula applies to the
/// employee, `InvalidInput` if hours were worked on the holiday with no
/// hourly rate, or the fetcher's error if history cannot be fetched.
///
/// # Examples
///
/// ```no_run
/// use payroll_engine::calculation::{HolidayPayInput, InMemoryEarningsFetcher, calculate_holiday_pay};
/// use payroll_engine::config::{CachedTaxTables, ConfigLoader, TaxTableProvider};
/// use payroll_engine::models::{CompensationType, Employee, EmploymentType, Jurisdiction};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
/// use uuid::Uuid;
///
/// # async fn run() -> Result<(), payroll_engine::error::EngineError> {
/// let tables = CachedTaxTables::new(ConfigLoader::new("./config")?);
/// let config = tables.holiday_pay_config(Jurisdiction::BritishColumbia, 2025)?;
/// let input = HolidayPayInput {
///     employee: Employee {
///         id: "emp_001".to_string(),
///         employment_type: EmploymentType::FullTime,
///         compensation_type: CompensationType::Hourly,
///         hire_date: NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
///         hourly_rate: Some(Decimal::from(25)),
///     },
///     holiday_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
///     run_id: Uuid::new_v4(),
///     hours_worked_on_holiday: Decimal::ZERO,
///     hourly_rate: None,
///     current_period_gross: Decimal::ZERO,
///     current_period_days_worked: 0,
///     worked_last_scheduled_day: true,
///     worked_next_scheduled_day: true,
/// };
///
/// let result = calculate_holiday_pay(&config, &input, &InMemoryEarningsFetcher::default(), 1).await?;
/// println!("Holiday pay: {}", result.total);
/// # Ok(())
/// # }
/// ```
pub async fn calculate_holiday_pay<F: EarningsFetcher>(
    config: &HolidayPayConfig,
    input: &HolidayPayInput,
    fetcher: &F,
    step_number: u32,
) -> EngineResult<HolidayPayResult> {
    let formula = resolve_formula(&config.formula, &input.employee, config.jurisdiction)?;

    let rate = input
        .hourly_rate
        .or(input.employee.hourly_rate)
        .unwrap_or(Decimal::ZERO);
    if input.hours_worked_on_holiday > Decimal::ZERO && rate.is_zero() {
        return Err(EngineError::InvalidInput {
            field: "hourly_rate".to_string(),
            message: format!(
                "{} hour(s) worked on the holiday with no hourly rate",
                input.hours_worked_on_holiday
            ),
        });
    }
    let premium = premium_pay(input.hours_worked_on_holiday, rate, config.premium_rate);

    let query = formula
        .lookback_days()
        .map(|days| lookback_query(input, days));
    let history = match &query {
        Some(query) => fetcher.fetch_earnings(query).await?,
        None => HistoricalEarnings::default(),
    };

    let eligibility = check_eligibility(
        &config.eligibility,
        &input.employee,
        &EligibilityFacts {
            holiday_date: input.holiday_date,
            days_worked_in_window: history.days_worked,
            worked_last_scheduled_day: input.worked_last_scheduled_day,
            worked_next_scheduled_day: input.worked_next_scheduled_day,
        },
    );

    let current = CurrentPeriod {
        gross: input.current_period_gross,
        days_worked: input.current_period_days_worked,
    };
    let new_hire_without_history = query.as_ref().is_some_and(|q| {
        history.is_empty() && input.employee.hire_date >= q.window_start
    });

    let (regular, explanation, used_fallback) = if !eligibility.eligible {
        (Decimal::ZERO, eligibility.reason.clone(), false)
    } else if new_hire_without_history {
        let (amount, explanation) = match config.new_employee_fallback {
            NewEmployeeFallback::ProRated => {
                let amount = current.daily_gross();
                (
                    amount,
                    format!(
                        "New employee, no history: current period ${} / {} day(s) = ${}",
                        current.gross, current.days_worked, amount
                    ),
                )
            }
            NewEmployeeFallback::Ineligible => (
                Decimal::ZERO,
                "New employee, no history: not paid".to_string(),
            ),
        };
        info!(
            employee_id = %input.employee.id,
            jurisdiction = %config.jurisdiction,
            fallback = ?config.new_employee_fallback,
            amount = %amount,
            "Applied new-employee holiday pay fallback"
        );
        (amount, explanation, true)
    } else {
        let outcome = apply_formula(formula, &history, &current, config.jurisdiction)?;
        (outcome.amount, outcome.explanation, false)
    };

    let total = regular + premium;

    let audit_step = AuditStep {
        step_number,
        rule_id: "holiday_pay".to_string(),
        rule_name: format!("{} Statutory Holiday Pay", config.jurisdiction),
        formula_ref: format!("{} {}", config.jurisdiction, formula.formula_type()),
        input: serde_json::json!({
            "employee_id": input.employee.id,
            "holiday_date": input.holiday_date.to_string(),
            "formula_type": formula.formula_type(),
            "window_start": query.as_ref().map(|q| q.window_start.to_string()),
            "window_end": query.as_ref().map(|q| q.window_end.to_string()),
            "history_wages": history.wages.to_string(),
            "history_days_worked": history.days_worked,
            "hours_worked_on_holiday": input.hours_worked_on_holiday.to_string(),
            "hourly_rate": rate.to_string(),
            "premium_rate": config.premium_rate.to_string()
        }),
        output: serde_json::json!({
            "eligible": eligibility.eligible,
            "used_new_employee_fallback": used_fallback,
            "regular_pay": regular.to_string(),
            "premium_pay": premium.to_string(),
            "total": total.to_string()
        }),
        reasoning: format!(
            "{}; premium {}h × ${} × {} = ${}",
            explanation, input.hours_worked_on_holiday, rate, config.premium_rate, premium
        ),
    };

    Ok(HolidayPayResult {
        formula_type: formula.formula_type().to_string(),
        regular_pay: regular,
        premium_pay: premium,
        total,
        eligibility,
        used_new_employee_fallback: used_fallback,
        history,
        audit_step,
    })
}
