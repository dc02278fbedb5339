//! Employee model and related types.
//!
//! This module defines the Employee struct together with the employment and
//! compensation types that drive holiday-pay formula selection.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Represents the type of employment arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    /// Full-time employment with a regular schedule.
    FullTime,
    /// Part-time employment with a regular but reduced schedule.
    PartTime,
    /// Casual or on-call employment with no guaranteed hours.
    Casual,
}

/// How the employee is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompensationType {
    /// Paid per hour worked.
    Hourly,
    /// Paid a fixed salary per period.
    Salaried,
    /// Paid wholly or partly by commission.
    Commission,
}

/// Represents an employee on a payroll run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee.
    pub id: String,
    /// The type of employment arrangement.
    pub employment_type: EmploymentType,
    /// How the employee is compensated.
    pub compensation_type: CompensationType,
    /// The date the employee was hired.
    pub hire_date: NaiveDate,
    /// Hourly rate, used for holiday premium pay.
    pub hourly_rate: Option<Decimal>,
}

impl Employee {
    /// True for full-time employees. Part-time and casual employees share
    /// the part-time holiday pay formula where a jurisdiction splits by
    /// employment type.
    ///
    /// # Examples
    ///
    /// ```
    /// use payroll_engine::models::{CompensationType, Employee, EmploymentType};
    /// use chrono::NaiveDate;
    ///
    /// let on_call = Employee {
    ///     id: "emp_001".to_string(),
    ///     employment_type: EmploymentType::Casual,
    ///     compensation_type: CompensationType::Hourly,
    ///     hire_date: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
    ///     hourly_rate: None,
    /// };
    /// assert!(!on_call.is_full_time());
    /// ```
    pub fn is_full_time(&self) -> bool {
        self.employment_type == EmploymentType::FullTime
    }

    /// Number of calendar days employed as of `date` (zero if not yet hired).
    pub fn days_employed(&self, date: NaiveDate) -> i64 {
        (date - self.hire_date).num_days().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_employee(employment_type: EmploymentType) -> Employee {
        Employee {
            id: "emp_001".to_string(),
            employment_type,
            compensation_type: CompensationType::Hourly,
            hire_date: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
            hourly_rate: None,
        }
    }

    #[test]
    fn test_deserialize_fulltime_employee() {
        let json = r#"{
            "id": "emp_001",
            "employment_type": "full_time",
            "compensation_type": "salaried",
            "hire_date": "2023-06-01",
            "hourly_rate": null
        }"#;

        let employee: Employee = serde_json::from_str(json).unwrap();
        assert_eq!(employee.id, "emp_001");
        assert_eq!(employee.employment_type, EmploymentType::FullTime);
        assert_eq!(employee.compensation_type, CompensationType::Salaried);
        assert_eq!(
            employee.hire_date,
            NaiveDate::from_ymd_opt(2023, 6, 1).unwrap()
        );
        assert!(employee.hourly_rate.is_none());
    }

    #[test]
    fn test_deserialize_hourly_employee_with_rate() {
        let json = r#"{
            "id": "emp_002",
            "employment_type": "part_time",
            "compensation_type": "hourly",
            "hire_date": "2024-01-15",
            "hourly_rate": "25.00"
        }"#;

        let employee: Employee = serde_json::from_str(json).unwrap();
        assert_eq!(employee.employment_type, EmploymentType::PartTime);
        assert_eq!(employee.hourly_rate, Some(Decimal::new(2500, 2)));
    }

    #[test]
    fn test_is_full_time() {
        assert!(create_test_employee(EmploymentType::FullTime).is_full_time());
        assert!(!create_test_employee(EmploymentType::PartTime).is_full_time());
        assert!(!create_test_employee(EmploymentType::Casual).is_full_time());
    }

    #[test]
    fn test_days_employed() {
        let employee = create_test_employee(EmploymentType::FullTime);
        assert_eq!(
            employee.days_employed(NaiveDate::from_ymd_opt(2023, 7, 1).unwrap()),
            30
        );
        assert_eq!(
            employee.days_employed(NaiveDate::from_ymd_opt(2023, 5, 1).unwrap()),
            0
        );
    }

    #[test]
    fn test_compensation_type_serialization() {
        assert_eq!(
            serde_json::to_string(&CompensationType::Commission).unwrap(),
            "\"commission\""
        );
        assert_eq!(
            serde_json::to_string(&EmploymentType::PartTime).unwrap(),
            "\"part_time\""
        );
    }
}
