//! Canada Pension Plan contribution calculation.
//!
//! This module computes the base contribution and the second additional
//! contribution (CPP2) for one pay period, capped against the annual
//! maximums using the year-to-date amounts already withheld.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::CppConfig;
use crate::error::EngineResult;
use crate::models::{AuditStep, periods_decimal};

use super::rounding::{round_money, truncate_money};

/// Facts for one period's CPP calculation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CppInput {
    /// Pensionable earnings paid in the period.
    pub pensionable_earnings: Decimal,
    /// Base contributions withheld earlier in the year.
    pub ytd_base: Decimal,
    /// CPP2 contributions withheld earlier in the year.
    pub ytd_additional: Decimal,
    /// Pay periods per year.
    pub periods_per_year: u32,
    /// The employee contributes nothing.
    pub cpp_exempt: bool,
    /// The employee contributes no CPP2.
    pub cpp2_exempt: bool,
}

/// The result of a CPP calculation.
#[derive(Debug, Clone)]
pub struct CppResult {
    /// Employee base contribution for the period.
    pub base: Decimal,
    /// Employee CPP2 contribution for the period.
    pub additional: Decimal,
    /// The enhancement share of `base`, deductible from taxable income.
    pub enhancement: Decimal,
    /// Employer base contribution (equal to the employee's).
    pub employer_base: Decimal,
    /// Employer CPP2 contribution (equal to the employee's).
    pub employer_additional: Decimal,
    /// Base contributions for the year including this period.
    pub ytd_base: Decimal,
    /// CPP2 contributions for the year including this period.
    pub ytd_additional: Decimal,
    /// True if this period reached the annual base maximum.
    pub max_reached: bool,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

impl CppResult {
    /// Employee base plus CPP2.
    pub fn employee_total(&self) -> Decimal {
        self.base + self.additional
    }
}

/// Calculates CPP and CPP2 contributions for a pay period.
///
/// # Formula
///
/// - Base: `base_rate × max(0, earnings − basic_exemption / P)`, where the
///   per-period exemption is truncated to cents, then limited to the room
///   left under `max_base_contribution`.
/// - CPP2: `additional_rate × min(max(0, earnings − YMPE / P), (YAMPE − YMPE) / P)`,
///   limited to the room left under `max_additional_contribution`.
/// - Enhancement: `base × enhancement_rate / base_rate`.
///
/// Each amount is rounded to cents when computed.
///
/// # Returns
///
/// Returns `InvalidInput` if `periods_per_year` is zero.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::{CppInput, calculate_cpp};
/// use payroll_engine::config::CppConfig;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let dec = |s: &str| Decimal::from_str(s).unwrap();
/// let config = CppConfig {
///     year: 2025,
///     base_rate: dec("0.0595"),
///     enhancement_rate: dec("0.01"),
///     additional_rate: dec("0.04"),
///     basic_exemption: dec("3500"),
///     ympe: dec("71300"),
///     yampe: dec("81200"),
///     max_base_contribution: dec("4034.10"),
///     max_additional_contribution: dec("396.00"),
/// };
/// let input = CppInput {
///     pensionable_earnings: dec("2000.00"),
///     periods_per_year: 26,
///     ..CppInput::default()
/// };
///
/// let result = calculate_cpp(&input, &config, 1).unwrap();
/// assert_eq!(result.base, dec("110.99"));
/// assert_eq!(result.additional, Decimal::ZERO);
/// ```
pub fn calculate_cpp(
    input: &CppInput,
    config: &CppConfig,
    step_number: u32,
) -> EngineResult<CppResult> {
    let periods = periods_decimal(input.periods_per_year)?;
    let earnings = input.pensionable_earnings.max(Decimal::ZERO);

    let period_exemption = truncate_money(config.basic_exemption / periods);
    let base_room = (config.max_base_contribution - input.ytd_base).max(Decimal::ZERO);
    let additional_room =
        (config.max_additional_contribution - input.ytd_additional).max(Decimal::ZERO);

    let (base, uncapped_base) = if input.cpp_exempt {
        (Decimal::ZERO, Decimal::ZERO)
    } else {
        let uncapped =
            round_money(config.base_rate * (earnings - period_exemption).max(Decimal::ZERO));
        (uncapped.min(base_room), uncapped)
    };

    let period_ympe = config.ympe / periods;
    let period_band = (config.yampe - config.ympe) / periods;
    let additional_earnings = (earnings - period_ympe).max(Decimal::ZERO).min(period_band);
    let additional = if input.cpp_exempt || input.cpp2_exempt {
        Decimal::ZERO
    } else {
        round_money(config.additional_rate * additional_earnings).min(additional_room)
    };

    let enhancement = round_money(base * config.enhancement_rate / config.base_rate);
    let ytd_base = input.ytd_base + base;
    let ytd_additional = input.ytd_additional + additional;
    let max_reached = !input.cpp_exempt
        && base < uncapped_base
        && ytd_base >= config.max_base_contribution;

    let reasoning = if input.cpp_exempt {
        "Employee is CPP-exempt; no contributions withheld".to_string()
    } else if max_reached {
        format!(
            "Base CPP limited to remaining room ${} (annual maximum ${} reached)",
            base_room, config.max_base_contribution
        )
    } else {
        format!(
            "{} × (${} − ${} exemption) = ${} base; CPP2 ${} on ${} above YMPE/P",
            config.base_rate,
            earnings,
            period_exemption,
            base,
            additional,
            round_money(additional_earnings)
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "cpp_contribution".to_string(),
        rule_name: "CPP Contribution".to_string(),
        formula_ref: "T4127 CPP / CPP2".to_string(),
        input: serde_json::json!({
            "pensionable_earnings": earnings.to_string(),
            "periods_per_year": input.periods_per_year,
            "ytd_base": input.ytd_base.to_string(),
            "ytd_additional": input.ytd_additional.to_string(),
            "cpp_exempt": input.cpp_exempt,
            "cpp2_exempt": input.cpp2_exempt
        }),
        output: serde_json::json!({
            "base": base.to_string(),
            "additional": additional.to_string(),
            "enhancement": enhancement.to_string(),
            "period_exemption": period_exemption.to_string(),
            "max_reached": max_reached
        }),
        reasoning,
    };

    Ok(CppResult {
        base,
        additional,
        enhancement,
        employer_base: base,
        employer_additional: additional,
        ytd_base,
        ytd_additional,
        max_reached,
        audit_step,
    })
}
