//! Year-to-date accumulators.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Running totals carried into a pay period.
///
/// Owned by the caller. Calculators read these values and report period
/// deltas; the composition root produces a fresh value with
/// [`YtdAccumulators::advance`] rather than mutating the caller's copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YtdAccumulators {
    /// Pensionable earnings to date.
    #[serde(default)]
    pub pensionable_earnings: Decimal,
    /// Insurable earnings to date.
    #[serde(default)]
    pub insurable_earnings: Decimal,
    /// Base CPP contributions to date.
    #[serde(default)]
    pub cpp_base: Decimal,
    /// Second additional CPP (CPP2) contributions to date.
    #[serde(default)]
    pub cpp_additional: Decimal,
    /// EI premiums to date.
    #[serde(default)]
    pub ei: Decimal,
    /// Taxable income to date.
    #[serde(default)]
    pub taxable_income: Decimal,
    /// Income tax withheld to date (federal plus provincial).
    #[serde(default)]
    pub income_tax: Decimal,
}

/// The amounts one pay period adds to the accumulators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YtdDelta {
    /// Pensionable earnings assessed this period.
    pub pensionable_earnings: Decimal,
    /// Insurable earnings assessed this period.
    pub insurable_earnings: Decimal,
    /// Base CPP contributed this period.
    pub cpp_base: Decimal,
    /// CPP2 contributed this period.
    pub cpp_additional: Decimal,
    /// EI premium this period.
    pub ei: Decimal,
    /// Taxable income this period.
    pub taxable_income: Decimal,
    /// Income tax withheld this period.
    pub income_tax: Decimal,
}

impl YtdAccumulators {
    /// Returns a new accumulator with the period delta applied.
    ///
    /// # Example
    ///
    /// ```
    /// use payroll_engine::models::{YtdAccumulators, YtdDelta};
    /// use rust_decimal::Decimal;
    ///
    /// let before = YtdAccumulators::default();
    /// let delta = YtdDelta {
    ///     ei: Decimal::new(3280, 2),
    ///     ..YtdDelta::default()
    /// };
    /// let after = before.advance(&delta);
    /// assert_eq!(after.ei, Decimal::new(3280, 2));
    /// assert_eq!(before.ei, Decimal::ZERO);
    /// ```
    pub fn advance(&self, delta: &YtdDelta) -> YtdAccumulators {
        YtdAccumulators {
            pensionable_earnings: self.pensionable_earnings + delta.pensionable_earnings,
            insurable_earnings: self.insurable_earnings + delta.insurable_earnings,
            cpp_base: self.cpp_base + delta.cpp_base,
            cpp_additional: self.cpp_additional + delta.cpp_additional,
            ei: self.ei + delta.ei,
            taxable_income: self.taxable_income + delta.taxable_income,
            income_tax: self.income_tax + delta.income_tax,
        }
    }
}
