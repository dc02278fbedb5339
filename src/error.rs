//! Error types for the payroll deduction engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while resolving tax tables or
//! computing deductions.

use thiserror::Error;

/// The main error type for the payroll deduction engine.
///
/// Every calculator fails fast with one of these variants. None of them are
/// retried inside the engine; retries belong to the I/O collaborators that
/// supply configuration and historical earnings.
///
/// # Example
///
/// ```
/// use payroll_engine::error::EngineError;
///
/// let error = EngineError::InvalidJurisdiction {
///     code: "XX".to_string(),
/// };
/// assert_eq!(error.to_string(), "Invalid jurisdiction code: XX");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// The jurisdiction code is not one the engine supports.
    #[error("Invalid jurisdiction code: {code}")]
    InvalidJurisdiction {
        /// The code that was rejected.
        code: String,
    },

    /// A date string could not be parsed.
    #[error("Invalid date format: '{value}' (expected YYYY-MM-DD)")]
    InvalidDateFormat {
        /// The offending date string.
        value: String,
    },

    /// No tables exist for the jurisdiction/year combination.
    #[error("Configuration not found for {jurisdiction} in {year}")]
    ConfigNotFound {
        /// The jurisdiction code that was looked up.
        jurisdiction: String,
        /// The tax year that was looked up.
        year: i32,
    },

    /// A configuration file or directory was not found on disk.
    #[error("Configuration file not found: {path}")]
    ConfigFileNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// Configuration parsed but violates a table invariant.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// A description of the violated invariant.
        message: String,
    },

    /// A holiday-pay formula is missing parameters it requires.
    #[error("Invalid holiday pay formula '{formula_type}' for {jurisdiction}: {message}")]
    InvalidFormulaConfiguration {
        /// The jurisdiction whose config is broken.
        jurisdiction: String,
        /// The formula type named in the config.
        formula_type: String,
        /// What is missing or wrong.
        message: String,
    },

    /// A caller-supplied input is outside its valid domain.
    #[error("Invalid input '{field}': {message}")]
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// The historical earnings collaborator failed.
    #[error("Failed to fetch earnings for employee '{employee_id}': {message}")]
    EarningsFetchFailed {
        /// The employee whose history was requested.
        employee_id: String,
        /// The collaborator's error message.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
