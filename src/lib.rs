//! Payroll Deduction Engine for Canadian Jurisdictions
//!
//! This crate calculates statutory payroll deductions for one employee and
//! one pay period: CPP and CPP2 contributions, EI premiums, and federal and
//! provincial income tax using the published annualization formulas, with
//! marginal-rate tax on bonuses and retroactive pay. It also splits daily
//! hours into overtime bands and calculates statutory holiday pay under
//! each jurisdiction's formula.

#![warn(missing_docs)]

pub mod calculation;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
