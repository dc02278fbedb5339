//! Core data models for the payroll deduction engine.
//!
//! This module contains the value types passed into and out of the
//! calculators. None of them are retained by the engine between calls.

mod calculation_result;
mod earnings;
mod employee;
mod hours;
mod jurisdiction;
mod pay_period;
mod ytd;

pub use calculation_result::{AuditStep, AuditTrace, AuditWarning};
pub use earnings::{EarningsQuery, HistoricalEarnings, RunStatus};
pub use employee::{CompensationType, Employee, EmploymentType};
pub use hours::{DailyHoursEntry, parse_date};
pub use jurisdiction::Jurisdiction;
pub use pay_period::{
    ClaimAmounts, ExemptionFlags, PayFrequency, PayPeriodInput, PeriodDeductions,
    PeriodEarnings, periods_decimal,
};
pub use ytd::{YtdAccumulators, YtdDelta};
