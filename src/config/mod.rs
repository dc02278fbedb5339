//! Tax-table configuration for the payroll deduction engine.
//!
//! This module loads CPP, EI, federal, provincial and holiday pay tables
//! from YAML files and resolves immutable snapshots by jurisdiction, year
//! and pay date.
//!
//! # Example
//!
//! ```no_run
//! use payroll_engine::config::{CachedTaxTables, ConfigLoader, TaxTableProvider};
//!
//! let tables = CachedTaxTables::new(ConfigLoader::new("./config").unwrap());
//! let cpp = tables.cpp_config(2025).unwrap();
//! println!("2025 YMPE: {}", cpp.ympe);
//! ```

mod holiday;
mod loader;
mod provider;
mod types;

pub use holiday::{
    HolidayEligibilityRules, HolidayPayConfig, HolidayPayFormula, NewEmployeeFallback,
    RawFormula, RawFormulaParams, RawHolidayPayConfig,
};
pub use loader::ConfigLoader;
pub use provider::{CachedTaxTables, ConfigKey, TaxTableProvider, TaxTableSource, select_edition};
pub use types::{
    BpaPhaseOut, CppConfig, CreditRates, EiConfig, HealthPremiumTier, JurisdictionTaxConfig,
    SurtaxTier, TaxBracket, TaxEdition, TaxReduction, TaxYearFile,
};
