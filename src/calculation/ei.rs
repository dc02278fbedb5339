//! Employment Insurance premium calculation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::EiConfig;
use crate::models::AuditStep;

use super::rounding::round_money;

/// Facts for one period's EI calculation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EiInput {
    /// Insurable earnings paid in the period.
    pub insurable_earnings: Decimal,
    /// Insurable earnings assessed earlier in the year.
    pub ytd_insurable_earnings: Decimal,
    /// Employee premiums withheld earlier in the year.
    pub ytd_premium: Decimal,
    /// The employee pays no premium.
    pub ei_exempt: bool,
}

/// The result of an EI calculation.
#[derive(Debug, Clone)]
pub struct EiResult {
    /// Insurable earnings actually assessed (limited by the ceiling).
    pub insurable_assessed: Decimal,
    /// Employee premium for the period.
    pub employee_premium: Decimal,
    /// Employer premium for the period.
    pub employer_premium: Decimal,
    /// Insurable earnings assessed for the year including this period.
    pub ytd_insurable_earnings: Decimal,
    /// Employee premiums for the year including this period.
    pub ytd_premium: Decimal,
    /// True once the earnings ceiling or premium maximum is reached.
    pub max_reached: bool,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates employee and employer EI premiums for a pay period.
///
/// The employee premium is `rate × min(earnings, room to the insurable
/// ceiling)`, rounded, then limited to the room left under the annual
/// premium maximum. The employer premium is the rounded employee premium
/// times the employer multiplier, rounded again.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::{EiInput, calculate_ei};
/// use payroll_engine::config::EiConfig;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let dec = |s: &str| Decimal::from_str(s).unwrap();
/// let config = EiConfig {
///     year: 2025,
///     rate: dec("0.0164"),
///     max_insurable_earnings: dec("65700"),
///     max_employee_premium: dec("1077.48"),
///     employer_multiplier: dec("1.4"),
/// };
/// let input = EiInput { insurable_earnings: dec("2000.00"), ..EiInput::default() };
///
/// let result = calculate_ei(&input, &config, 1);
/// assert_eq!(result.employee_premium, dec("32.80"));
/// assert_eq!(result.employer_premium, dec("45.92"));
/// ```
pub fn calculate_ei(input: &EiInput, config: &EiConfig, step_number: u32) -> EiResult {
    let earnings = input.insurable_earnings.max(Decimal::ZERO);
    let earnings_room =
        (config.max_insurable_earnings - input.ytd_insurable_earnings).max(Decimal::ZERO);
    let premium_room = (config.max_employee_premium - input.ytd_premium).max(Decimal::ZERO);

    let (insurable_assessed, employee_premium) = if input.ei_exempt {
        (Decimal::ZERO, Decimal::ZERO)
    } else {
        let assessed = earnings.min(earnings_room);
        (assessed, round_money(config.rate * assessed).min(premium_room))
    };
    let employer_premium = round_money(employee_premium * config.employer_multiplier);

    let ytd_insurable_earnings = input.ytd_insurable_earnings + insurable_assessed;
    let ytd_premium = input.ytd_premium + employee_premium;
    let max_reached = !input.ei_exempt
        && (ytd_insurable_earnings >= config.max_insurable_earnings
            || ytd_premium >= config.max_employee_premium);

    let reasoning = if input.ei_exempt {
        "Employee is EI-exempt; no premium withheld".to_string()
    } else if insurable_assessed < earnings
        || employee_premium < round_money(config.rate * insurable_assessed)
    {
        format!(
            "Premium limited by annual maximums: ${} assessed of ${} earned, premium ${}",
            insurable_assessed, earnings, employee_premium
        )
    } else {
        format!(
            "{} × ${} = ${}; employer ${} × {} = ${}",
            config.rate,
            insurable_assessed,
            employee_premium,
            employee_premium,
            config.employer_multiplier,
            employer_premium
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "ei_premium".to_string(),
        rule_name: "EI Premium".to_string(),
        formula_ref: "T4127 EI".to_string(),
        input: serde_json::json!({
            "insurable_earnings": earnings.to_string(),
            "ytd_insurable_earnings": input.ytd_insurable_earnings.to_string(),
            "ytd_premium": input.ytd_premium.to_string(),
            "ei_exempt": input.ei_exempt
        }),
        output: serde_json::json!({
            "insurable_assessed": insurable_assessed.to_string(),
            "employee_premium": employee_premium.to_string(),
            "employer_premium": employer_premium.to_string(),
            "max_reached": max_reached
        }),
        reasoning,
    };

    EiResult {
        insurable_assessed,
        employee_premium,
        employer_premium,
        ytd_insurable_earnings,
        ytd_premium,
        max_reached,
        audit_step,
    }
}
