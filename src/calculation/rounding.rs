//! Monetary rounding rules.
//!
//! Published deduction amounts are rounded to cents, half away from zero.
//! The per-period CPP basic exemption is the one amount that is truncated.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds an amount to cents, half away from zero.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::round_money;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(round_money(Decimal::from_str("110.985").unwrap()).to_string(), "110.99");
/// assert_eq!(round_money(Decimal::from_str("-0.005").unwrap()).to_string(), "-0.01");
/// ```
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Truncates an amount to cents, toward zero.
pub fn truncate_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::ToZero)
}
