//! Holiday pay configuration.
//!
//! On disk a jurisdiction names its formula with a `formula_type` string
//! and a bag of optional `formula_params`. [`RawHolidayPayConfig`] mirrors
//! that shape; [`HolidayPayConfig`] is the validated form, in which every
//! formula is a [`HolidayPayFormula`] variant carrying exactly the
//! parameters it uses. Converting between them is where missing parameters
//! are caught.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::Jurisdiction;

/// What to pay a newly hired employee with no earnings history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewEmployeeFallback {
    /// Use current-period gross per day worked in the current period.
    ProRated,
    /// Pay no regular holiday pay.
    #[default]
    Ineligible,
}

/// Rules deciding whether a holiday is payable at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayEligibilityRules {
    /// Calendar days of employment required before the holiday.
    #[serde(default)]
    pub min_employment_days: u32,
    /// Days worked in the lookback window required (e.g. 15 of 30).
    #[serde(default)]
    pub min_days_worked_in_window: Option<u32>,
    /// Whether the last scheduled day before and first after must be worked.
    #[serde(default)]
    pub require_last_and_next_scheduled_day: bool,
}

/// A regular holiday-pay formula.
///
/// # Example
///
/// ```
/// use payroll_engine::config::HolidayPayFormula;
///
/// let formula = HolidayPayFormula::ThirtyDayAverage {
///     lookback_days: 30,
///     include_vacation_pay: true,
///     include_overtime: false,
/// };
/// assert_eq!(formula.formula_type(), "30_day_average");
/// assert_eq!(formula.lookback_days(), Some(30));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "formula_type")]
pub enum HolidayPayFormula {
    /// Wages in the lookback window divided by a fixed divisor (e.g. 20).
    #[serde(rename = "4_week_average")]
    FourWeekAverage {
        /// Window length in days.
        lookback_days: u32,
        /// Fixed divisor.
        divisor: Decimal,
        /// Whether vacation pay counts as wages.
        include_vacation_pay: bool,
        /// Whether overtime wages count.
        include_overtime: bool,
    },
    /// Wages in the window divided by days worked in the window.
    #[serde(rename = "30_day_average")]
    ThirtyDayAverage {
        /// Window length in days.
        lookback_days: u32,
        /// Whether vacation pay counts as wages.
        include_vacation_pay: bool,
        /// Whether overtime wages count.
        include_overtime: bool,
    },
    /// Average daily wage over four weeks: wages divided by days worked.
    #[serde(rename = "4_week_average_daily")]
    FourWeekAverageDaily {
        /// Window length in days.
        lookback_days: u32,
        /// Whether vacation pay counts as wages.
        include_vacation_pay: bool,
        /// Whether overtime wages count.
        include_overtime: bool,
    },
    /// A percentage of wages earned in the window.
    #[serde(rename = "5_percent_28_days")]
    FivePercent28Days {
        /// Window length in days.
        lookback_days: u32,
        /// Percentage as a fraction (e.g. `0.05`).
        percentage: Decimal,
        /// Whether vacation pay counts as wages.
        include_vacation_pay: bool,
        /// Whether prior holiday pay counts as wages.
        include_holiday_pay: bool,
        /// Whether overtime wages count.
        include_overtime: bool,
    },
    /// Current-period gross divided by days worked this period.
    #[serde(rename = "current_period_daily")]
    CurrentPeriodDaily,
    /// A percentage of wages for employees without regular hours.
    #[serde(rename = "irregular_hours")]
    IrregularHours {
        /// Window length in days.
        lookback_days: u32,
        /// Percentage as a fraction (e.g. `0.10`).
        percentage: Decimal,
        /// Whether vacation pay counts as wages.
        include_vacation_pay: bool,
    },
    /// Wages and commission in the window divided by a fixed divisor.
    #[serde(rename = "commission")]
    Commission {
        /// Window length in days.
        lookback_days: u32,
        /// Fixed divisor (e.g. 60 over twelve weeks).
        divisor: Decimal,
    },
    /// Different formulas for full-time and part-time/casual staff.
    #[serde(rename = "split_by_employment_type")]
    SplitByEmploymentType {
        /// Formula for full-time employees.
        full_time: Box<HolidayPayFormula>,
        /// Formula for part-time and casual employees.
        part_time: Box<HolidayPayFormula>,
    },
    /// Different formulas by compensation type.
    #[serde(rename = "split_by_compensation_type")]
    SplitByCompensationType {
        /// Formula for hourly employees.
        hourly: Box<HolidayPayFormula>,
        /// Formula for salaried employees.
        salaried: Box<HolidayPayFormula>,
        /// Formula for commission employees; required to pay one.
        commission: Option<Box<HolidayPayFormula>>,
    },
}

impl HolidayPayFormula {
    /// The `formula_type` name used in configuration files.
    pub fn formula_type(&self) -> &'static str {
        match self {
            HolidayPayFormula::FourWeekAverage { .. } => "4_week_average",
            HolidayPayFormula::ThirtyDayAverage { .. } => "30_day_average",
            HolidayPayFormula::FourWeekAverageDaily { .. } => "4_week_average_daily",
            HolidayPayFormula::FivePercent28Days { .. } => "5_percent_28_days",
            HolidayPayFormula::CurrentPeriodDaily => "current_period_daily",
            HolidayPayFormula::IrregularHours { .. } => "irregular_hours",
            HolidayPayFormula::Commission { .. } => "commission",
            HolidayPayFormula::SplitByEmploymentType { .. } => "split_by_employment_type",
            HolidayPayFormula::SplitByCompensationType { .. } => "split_by_compensation_type",
        }
    }

    /// Lookback window length, for formulas that read earnings history.
    pub fn lookback_days(&self) -> Option<u32> {
        match self {
            HolidayPayFormula::FourWeekAverage { lookback_days, .. }
            | HolidayPayFormula::ThirtyDayAverage { lookback_days, .. }
            | HolidayPayFormula::FourWeekAverageDaily { lookback_days, .. }
            | HolidayPayFormula::FivePercent28Days { lookback_days, .. }
            | HolidayPayFormula::IrregularHours { lookback_days, .. }
            | HolidayPayFormula::Commission { lookback_days, .. } => Some(*lookback_days),
            HolidayPayFormula::CurrentPeriodDaily
            | HolidayPayFormula::SplitByEmploymentType { .. }
            | HolidayPayFormula::SplitByCompensationType { .. } => None,
        }
    }
}

/// Validated holiday pay rules for one jurisdiction and year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayPayConfig {
    /// The jurisdiction whose employment standards apply.
    pub jurisdiction: Jurisdiction,
    /// The year the rules apply to.
    pub year: i32,
    /// The regular holiday-pay formula.
    pub formula: HolidayPayFormula,
    /// Policy for new hires with no earnings history.
    pub new_employee_fallback: NewEmployeeFallback,
    /// Eligibility rules.
    pub eligibility: HolidayEligibilityRules,
    /// Multiplier for hours worked on the holiday (e.g. `1.5`).
    pub premium_rate: Decimal,
}

/// A formula as written in YAML.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFormula {
    /// Formula name.
    pub formula_type: String,
    /// Parameters; which ones are required depends on `formula_type`.
    #[serde(default)]
    pub formula_params: Option<RawFormulaParams>,
}

/// Every parameter any formula may take.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFormulaParams {
    /// Window length in days.
    pub lookback_days: Option<u32>,
    /// Fixed divisor.
    pub divisor: Option<Decimal>,
    /// Percentage as a fraction.
    pub percentage: Option<Decimal>,
    /// Whether vacation pay counts as wages.
    pub include_vacation_pay: Option<bool>,
    /// Whether prior holiday pay counts as wages.
    pub include_holiday_pay: Option<bool>,
    /// Whether overtime wages count.
    pub include_overtime: Option<bool>,
    /// New-employee fallback policy.
    pub new_employee_fallback: Option<NewEmployeeFallback>,
    /// Nested formula for full-time employees.
    pub full_time: Option<Box<RawFormula>>,
    /// Nested formula for part-time employees.
    pub part_time: Option<Box<RawFormula>>,
    /// Nested formula for hourly employees.
    pub hourly: Option<Box<RawFormula>>,
    /// Nested formula for salaried employees.
    pub salaried: Option<Box<RawFormula>>,
    /// Nested formula for commission employees.
    pub commission: Option<Box<RawFormula>>,
}

/// A holiday pay file as written in YAML.
#[derive(Debug, Clone, Deserialize)]
pub struct RawHolidayPayConfig {
    /// The jurisdiction.
    pub jurisdiction: Jurisdiction,
    /// The year.
    pub year: i32,
    /// The top-level formula.
    #[serde(flatten)]
    pub formula: RawFormula,
    /// Eligibility rules.
    #[serde(default)]
    pub eligibility: HolidayEligibilityRules,
    /// Premium multiplier for hours worked on the holiday.
    pub premium_rate: Decimal,
}

impl RawHolidayPayConfig {
    /// Converts into the validated config.
    pub fn into_config(self) -> EngineResult<HolidayPayConfig> {
        let jurisdiction = self.jurisdiction;
        let new_employee_fallback = self
            .formula
            .formula_params
            .as_ref()
            .and_then(|p| p.new_employee_fallback)
            .unwrap_or_default();
        let formula = self.formula.into_formula(jurisdiction)?;

        if self.premium_rate < Decimal::ONE {
            return Err(EngineError::InvalidFormulaConfiguration {
                jurisdiction: jurisdiction.to_string(),
                formula_type: formula.formula_type().to_string(),
                message: format!("premium_rate {} is below 1", self.premium_rate),
            });
        }

        Ok(HolidayPayConfig {
            jurisdiction,
            year: self.year,
            formula,
            new_employee_fallback,
            eligibility: self.eligibility,
            premium_rate: self.premium_rate,
        })
    }
}

impl RawFormula {
    /// Converts into a typed formula, failing on missing parameters.
    pub fn into_formula(self, jurisdiction: Jurisdiction) -> EngineResult<HolidayPayFormula> {
        let formula_type = self.formula_type.trim().to_string();
        let params = Params {
            jurisdiction,
            formula_type: &formula_type,
            values: self.formula_params.unwrap_or_default(),
        };

        match formula_type.as_str() {
            "4_week_average" => Ok(HolidayPayFormula::FourWeekAverage {
                lookback_days: params.require("lookback_days", |p| p.lookback_days)?,
                divisor: params.require_positive("divisor", |p| p.divisor)?,
                include_vacation_pay: params.flag(|p| p.include_vacation_pay),
                include_overtime: params.flag(|p| p.include_overtime),
            }),
            "30_day_average" => Ok(HolidayPayFormula::ThirtyDayAverage {
                lookback_days: params.require("lookback_days", |p| p.lookback_days)?,
                include_vacation_pay: params.flag(|p| p.include_vacation_pay),
                include_overtime: params.flag(|p| p.include_overtime),
            }),
            "4_week_average_daily" => Ok(HolidayPayFormula::FourWeekAverageDaily {
                lookback_days: params.require("lookback_days", |p| p.lookback_days)?,
                include_vacation_pay: params.flag(|p| p.include_vacation_pay),
                include_overtime: params.flag(|p| p.include_overtime),
            }),
            "5_percent_28_days" => Ok(HolidayPayFormula::FivePercent28Days {
                lookback_days: params.require("lookback_days", |p| p.lookback_days)?,
                percentage: params.require_positive("percentage", |p| p.percentage)?,
                include_vacation_pay: params.flag(|p| p.include_vacation_pay),
                include_holiday_pay: params.flag(|p| p.include_holiday_pay),
                include_overtime: params.flag(|p| p.include_overtime),
            }),
            "current_period_daily" => Ok(HolidayPayFormula::CurrentPeriodDaily),
            "irregular_hours" => Ok(HolidayPayFormula::IrregularHours {
                lookback_days: params.require("lookback_days", |p| p.lookback_days)?,
                percentage: params.require_positive("percentage", |p| p.percentage)?,
                include_vacation_pay: params.flag(|p| p.include_vacation_pay),
            }),
            "commission" => Ok(HolidayPayFormula::Commission {
                lookback_days: params.require("lookback_days", |p| p.lookback_days)?,
                divisor: params.require_positive("divisor", |p| p.divisor)?,
            }),
            "split_by_employment_type" => {
                let mut values = params.values.clone();
                let full_time = params.nested("full_time", values.full_time.take())?;
                let part_time = params.nested("part_time", values.part_time.take())?;
                Ok(HolidayPayFormula::SplitByEmploymentType {
                    full_time,
                    part_time,
                })
            }
            "split_by_compensation_type" => {
                let mut values = params.values.clone();
                let hourly = params.nested("hourly", values.hourly.take())?;
                let salaried = params.nested("salaried", values.salaried.take())?;
                let commission = match values.commission.take() {
                    Some(raw) => Some(Box::new((*raw).into_formula(jurisdiction)?)),
                    None => None,
                };
                Ok(HolidayPayFormula::SplitByCompensationType {
                    hourly,
                    salaried,
                    commission,
                })
            }
            _ => Err(params.error("unknown formula_type".to_string())),
        }
    }
}

struct Params<'a> {
    jurisdiction: Jurisdiction,
    formula_type: &'a str,
    values: RawFormulaParams,
}

impl Params<'_> {
    fn error(&self, message: String) -> EngineError {
        EngineError::InvalidFormulaConfiguration {
            jurisdiction: self.jurisdiction.to_string(),
            formula_type: self.formula_type.to_string(),
            message,
        }
    }

    fn require<T>(
        &self,
        name: &str,
        get: impl Fn(&RawFormulaParams) -> Option<T>,
    ) -> EngineResult<T> {
        get(&self.values).ok_or_else(|| self.error(format!("missing formula_params.{}", name)))
    }

    fn require_positive(
        &self,
        name: &str,
        get: impl Fn(&RawFormulaParams) -> Option<Decimal>,
    ) -> EngineResult<Decimal> {
        let value = self.require(name, get)?;
        if value <= Decimal::ZERO {
            return Err(self.error(format!("formula_params.{} must be positive", name)));
        }
        Ok(value)
    }

    fn flag(&self, get: impl Fn(&RawFormulaParams) -> Option<bool>) -> bool {
        get(&self.values).unwrap_or(false)
    }

    fn nested(
        &self,
        name: &str,
        raw: Option<Box<RawFormula>>,
    ) -> EngineResult<Box<HolidayPayFormula>> {
        let raw = raw.ok_or_else(|| self.error(format!("missing formula_params.{}", name)))?;
        Ok(Box::new((*raw).into_formula(self.jurisdiction)?))
    }
}
