//! Historical earnings models exchanged with the earnings fetcher.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a payroll run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Being edited; never counted as history.
    Draft,
    /// Calculated but not yet approved.
    Calculated,
    /// Approved for payment.
    Approved,
    /// Paid out.
    Paid,
    /// Cancelled.
    Cancelled,
}

impl RunStatus {
    /// Statuses whose earnings count as completed history.
    pub const COMPLETED: [RunStatus; 2] = [RunStatus::Approved, RunStatus::Paid];
}

/// A request for an employee's earnings in a lookback window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarningsQuery {
    /// The employee whose history is requested.
    pub employee_id: String,
    /// First day of the window (inclusive).
    pub window_start: NaiveDate,
    /// Last day of the window (inclusive).
    pub window_end: NaiveDate,
    /// Run statuses to include.
    pub statuses: Vec<RunStatus>,
    /// The in-progress run, which must never be counted.
    pub exclude_run_id: Option<Uuid>,
}

impl EarningsQuery {
    /// Returns true if `date` falls within the window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.window_start && date <= self.window_end
    }
}

/// Aggregated earnings over a lookback window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalEarnings {
    /// Straight-time wages (excludes overtime).
    #[serde(default)]
    pub wages: Decimal,
    /// Overtime wages.
    #[serde(default)]
    pub overtime_wages: Decimal,
    /// Vacation pay paid in the window.
    #[serde(default)]
    pub vacation_pay: Decimal,
    /// Statutory holiday pay paid in the window.
    #[serde(default)]
    pub holiday_pay: Decimal,
    /// Commission earnings.
    #[serde(default)]
    pub commission: Decimal,
    /// Days on which the employee worked.
    #[serde(default)]
    pub days_worked: u32,
    /// Hours worked.
    #[serde(default)]
    pub hours_worked: Decimal,
}

impl HistoricalEarnings {
    /// True when the window holds no earnings or days worked at all.
    pub fn is_empty(&self) -> bool {
        self.days_worked == 0
            && self.wages.is_zero()
            && self.overtime_wages.is_zero()
            && self.vacation_pay.is_zero()
            && self.holiday_pay.is_zero()
            && self.commission.is_zero()
    }
}
