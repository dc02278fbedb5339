//! Holiday pay eligibility.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::HolidayEligibilityRules;
use crate::models::Employee;

/// Facts about the employee around one holiday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityFacts {
    /// The holiday.
    pub holiday_date: NaiveDate,
    /// Days worked in the lookback window.
    pub days_worked_in_window: u32,
    /// Whether the last scheduled day before the holiday was worked.
    pub worked_last_scheduled_day: bool,
    /// Whether the first scheduled day after the holiday was worked.
    pub worked_next_scheduled_day: bool,
}

/// Whether a holiday is payable, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityDecision {
    /// True if regular holiday pay is owed.
    pub eligible: bool,
    /// Human-readable reason.
    pub reason: String,
}

impl EligibilityDecision {
    fn eligible(reason: impl Into<String>) -> Self {
        Self {
            eligible: true,
            reason: reason.into(),
        }
    }

    fn ineligible(reason: impl Into<String>) -> Self {
        Self {
            eligible: false,
            reason: reason.into(),
        }
    }
}

/// Applies the jurisdiction's eligibility rules.
///
/// Rules are checked in order (employment length, days worked in the
/// window, scheduled days around the holiday) and the first failure is
/// reported.
pub fn check_eligibility(
    rules: &HolidayEligibilityRules,
    employee: &Employee,
    facts: &EligibilityFacts,
) -> EligibilityDecision {
    let days_employed = employee.days_employed(facts.holiday_date);
    if days_employed < i64::from(rules.min_employment_days) {
        return EligibilityDecision::ineligible(format!(
            "Employed {} day(s); {} required",
            days_employed, rules.min_employment_days
        ));
    }

    if let Some(required) = rules.min_days_worked_in_window {
        if facts.days_worked_in_window < required {
            return EligibilityDecision::ineligible(format!(
                "Worked {} day(s) in the lookback window; {} required",
                facts.days_worked_in_window, required
            ));
        }
    }

    if rules.require_last_and_next_scheduled_day {
        if !facts.worked_last_scheduled_day {
            return EligibilityDecision::ineligible("Did not work the last scheduled day before the holiday");
        }
        if !facts.worked_next_scheduled_day {
            return EligibilityDecision::ineligible("Did not work the first scheduled day after the holiday");
        }
    }

    EligibilityDecision::eligible(format!("Employed {} day(s); all rules met", days_employed))
}
