//! Daily hours entries used by the overtime split.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Hours recorded against one calendar day.
///
/// The date stays a string until the overtime split parses it, so a
/// malformed timesheet row surfaces as [`EngineError::InvalidDateFormat`]
/// carrying the offending value.
///
/// # Example
///
/// ```
/// use payroll_engine::models::DailyHoursEntry;
/// use rust_decimal::Decimal;
///
/// let entry = DailyHoursEntry::new("2025-03-03", Decimal::new(95, 1));
/// assert_eq!(entry.parse_date().unwrap().to_string(), "2025-03-03");
/// assert!(!entry.is_holiday);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyHoursEntry {
    /// The work date as `YYYY-MM-DD`.
    pub date: String,
    /// Total hours worked that day.
    pub hours: Decimal,
    /// True when the day is a statutory holiday (paid separately).
    #[serde(default)]
    pub is_holiday: bool,
}

impl DailyHoursEntry {
    /// Creates a non-holiday entry.
    pub fn new(date: impl Into<String>, hours: Decimal) -> Self {
        Self {
            date: date.into(),
            hours,
            is_holiday: false,
        }
    }

    /// Creates a holiday entry.
    pub fn holiday(date: impl Into<String>, hours: Decimal) -> Self {
        Self {
            date: date.into(),
            hours,
            is_holiday: true,
        }
    }

    /// Parses the entry's date.
    pub fn parse_date(&self) -> EngineResult<NaiveDate> {
        parse_date(&self.date)
    }
}

/// Parses a `YYYY-MM-DD` date string.
pub fn parse_date(value: &str) -> EngineResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        EngineError::InvalidDateFormat {
            value: value.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_date() {
        let entry = DailyHoursEntry::new("2025-07-01", Decimal::new(8, 0));
        assert_eq!(
            entry.parse_date().unwrap(),
            NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()
        );
    }

    #[test]
    fn test_parse_invalid_date_carries_value() {
        let entry = DailyHoursEntry::new("07/01/2025", Decimal::new(8, 0));
        match entry.parse_date() {
            Err(EngineError::InvalidDateFormat { value }) => assert_eq!(value, "07/01/2025"),
            other => panic!("Expected InvalidDateFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_impossible_date() {
        assert!(parse_date("2025-02-30").is_err());
    }

    #[test]
    fn test_holiday_flag_defaults_to_false() {
        let entry: DailyHoursEntry =
            serde_json::from_str(r#"{"date": "2025-07-01", "hours": "8"}"#).unwrap();
        assert!(!entry.is_holiday);
        assert!(DailyHoursEntry::holiday("2025-07-01", Decimal::ONE).is_holiday);
    }
}
