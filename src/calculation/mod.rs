//! Calculation logic for the payroll deduction engine.
//!
//! This module contains one calculator per statutory deduction or earnings
//! supplement: CPP and CPP2 contributions, EI premiums, federal and
//! provincial income tax, marginal-rate tax on bonuses and retroactive pay,
//! the overtime split, and the holiday pay dispatcher. Federal and
//! provincial tax share the raw annual tax primitive [`annual_tax`].
//!
//! Every calculator is a pure function of its inputs and a config snapshot
//! and returns an [`AuditStep`](crate::models::AuditStep) with its result.

mod bonus_tax;
mod cpp;
mod ei;
mod federal_tax;
mod holiday_pay;
mod income_tax;
mod overtime_split;
mod provincial_tax;
mod retroactive_tax;
mod rounding;

pub use bonus_tax::{SupplementalTaxInput, SupplementalTaxResult, calculate_bonus_tax};
pub use cpp::{CppInput, CppResult, calculate_cpp};
pub use ei::{EiInput, EiResult, calculate_ei};
pub use federal_tax::calculate_federal_tax;
pub use holiday_pay::{
    CurrentPeriod, EarningsFetcher, EarningsRecord, EligibilityDecision, EligibilityFacts,
    FormulaOutcome, HolidayPayInput, HolidayPayResult, InMemoryEarningsFetcher, apply_formula,
    calculate_holiday_pay, check_eligibility, lookback_query, premium_pay, resolve_formula,
};
pub use income_tax::{
    AnnualTaxBreakdown, AnnualTaxInput, MarginalTax, PeriodTaxInput, PeriodTaxResult,
    SupplementalIncome, annual_tax, marginal_tax, period_tax,
};
pub use overtime_split::{OvertimeRule, OvertimeSplitResult, WeekSplit, split_overtime};
pub use provincial_tax::calculate_provincial_tax;
pub use retroactive_tax::{
    Proration, RetroactiveTaxInput, RetroactiveTaxResult, RrspSplit, calculate_retroactive_tax,
    split_rrsp,
};
pub use rounding::{round_money, truncate_money};
