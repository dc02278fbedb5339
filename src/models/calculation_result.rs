//! Audit trail models shared by every calculator.
//!
//! Each calculator returns its amounts together with an [`AuditStep`]
//! recording the inputs it read, the outputs it produced, and a
//! human-readable explanation. The composition root collects the steps into
//! an [`AuditTrace`].

use serde::{Deserialize, Serialize};

/// A single step in the audit trace recording a calculation decision.
///
/// # Example
///
/// ```
/// use payroll_engine::models::AuditStep;
///
/// let step = AuditStep {
///     step_number: 1,
///     rule_id: "ei_premium".to_string(),
///     rule_name: "EI Premium".to_string(),
///     formula_ref: "EI".to_string(),
///     input: serde_json::json!({"insurable_earnings": "2000.00"}),
///     output: serde_json::json!({"employee_premium": "32.80"}),
///     reasoning: "2000.00 insurable at 1.64%".to_string(),
/// };
/// assert_eq!(step.rule_id, "ei_premium");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// Position of the step within its trace, starting at 1.
    pub step_number: u32,
    /// Stable calculator identifier (`cpp_contribution`, `federal_tax`, ...).
    pub rule_id: String,
    /// Display name, including the jurisdiction where one applies.
    pub rule_name: String,
    /// Reference to the published formula this step implements.
    pub formula_ref: String,
    /// Amounts the calculator read, as decimal strings.
    pub input: serde_json::Value,
    /// Amounts the calculator produced, as decimal strings.
    pub output: serde_json::Value,
    /// How the output follows from the input.
    pub reasoning: String,
}

/// A condition worth surfacing on a result that did not stop the
/// calculation, such as an annual CPP or EI maximum being reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// Machine-readable code, e.g. `CPP_MAX_REACHED`.
    pub code: String,
    /// Explanation including the amounts involved.
    pub message: String,
    /// One of `low`, `medium`, `high`.
    pub severity: String,
}

impl AuditWarning {
    /// A low-severity warning.
    pub fn low(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            severity: "low".to_string(),
        }
    }
}

/// Steps and warnings for one pay-period calculation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// Steps in the order the calculators ran.
    pub steps: Vec<AuditStep>,
    /// Warnings raised by any step.
    pub warnings: Vec<AuditWarning>,
    /// Wall-clock time of the calculation in microseconds.
    pub duration_us: u64,
}

impl AuditTrace {
    /// The first step recorded by calculator `rule_id`.
    pub fn step(&self, rule_id: &str) -> Option<&AuditStep> {
        self.steps.iter().find(|s| s.rule_id == rule_id)
    }

    /// True if a warning with `code` was raised.
    pub fn has_warning(&self, code: &str) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }
}
