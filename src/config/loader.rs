//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type, a [`TaxTableSource`]
//! that reads YAML tables from a directory on demand.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{EngineError, EngineResult};
use crate::models::Jurisdiction;

use super::holiday::{HolidayPayConfig, RawHolidayPayConfig};
use super::provider::TaxTableSource;
use super::types::{CppConfig, EiConfig, JurisdictionTaxConfig, TaxYearFile};

/// Reads tax tables from a directory of YAML files.
///
/// # Directory Structure
///
/// ```text
/// config/
/// └── 2025/
///     ├── cpp.yaml
///     ├── ei.yaml
///     ├── tax/
///     │   ├── federal.yaml
///     │   ├── bc.yaml
///     │   └── ...
///     └── holiday_pay/
///         ├── federal.yaml
///         ├── bc.yaml
///         └── ...
/// ```
///
/// Files are read when first requested. Wrap the loader in
/// [`CachedTaxTables`](super::CachedTaxTables) to read each file once.
///
/// # Example
///
/// ```no_run
/// use payroll_engine::config::{ConfigLoader, TaxTableSource};
/// use payroll_engine::models::Jurisdiction;
///
/// let loader = ConfigLoader::new("./config")?;
/// let editions = loader.load_tax_year(Jurisdiction::BritishColumbia, 2025)?;
/// println!("BC 2025 has {} edition(s)", editions.len());
/// # Ok::<(), payroll_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    root: PathBuf,
}

impl ConfigLoader {
    /// Creates a loader rooted at `path`.
    ///
    /// # Returns
    ///
    /// Returns `ConfigFileNotFound` if the directory does not exist.
    pub fn new<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let root = path.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(EngineError::ConfigFileNotFound {
                path: root.display().to_string(),
            });
        }
        Ok(Self { root })
    }

    /// The configuration root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn year_dir(&self, year: i32) -> PathBuf {
        self.root.join(year.to_string())
    }

    /// Loads and parses a YAML file, mapping a missing file to `ConfigNotFound`.
    fn load_yaml<T: serde::de::DeserializeOwned>(
        path: &Path,
        jurisdiction: &str,
        year: i32,
    ) -> EngineResult<T> {
        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            jurisdiction: jurisdiction.to_string(),
            year,
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    fn check_identity(
        path: &Path,
        expected: (Jurisdiction, i32),
        found: (Jurisdiction, i32),
    ) -> EngineResult<()> {
        if expected != found {
            return Err(EngineError::InvalidConfig {
                message: format!(
                    "{} declares {} {} but was loaded as {} {}",
                    path.display(),
                    found.0,
                    found.1,
                    expected.0,
                    expected.1
                ),
            });
        }
        Ok(())
    }
}

impl TaxTableSource for ConfigLoader {
    fn load_tax_year(
        &self,
        jurisdiction: Jurisdiction,
        year: i32,
    ) -> EngineResult<Vec<JurisdictionTaxConfig>> {
        let path = self
            .year_dir(year)
            .join("tax")
            .join(format!("{}.yaml", jurisdiction.file_stem()));
        let file: TaxYearFile = Self::load_yaml(&path, jurisdiction.code(), year)?;
        Self::check_identity(&path, (jurisdiction, year), (file.jurisdiction, file.year))?;
        file.into_configs()
    }

    fn load_cpp(&self, year: i32) -> EngineResult<CppConfig> {
        let path = self.year_dir(year).join("cpp.yaml");
        let config: CppConfig = Self::load_yaml(&path, "CPP", year)?;
        if config.year != year {
            return Err(EngineError::InvalidConfig {
                message: format!("{} declares year {}", path.display(), config.year),
            });
        }
        config.validate()?;
        Ok(config)
    }

    fn load_ei(&self, year: i32) -> EngineResult<EiConfig> {
        let path = self.year_dir(year).join("ei.yaml");
        let config: EiConfig = Self::load_yaml(&path, "EI", year)?;
        if config.year != year {
            return Err(EngineError::InvalidConfig {
                message: format!("{} declares year {}", path.display(), config.year),
            });
        }
        config.validate()?;
        Ok(config)
    }

    fn load_holiday_pay(
        &self,
        jurisdiction: Jurisdiction,
        year: i32,
    ) -> EngineResult<HolidayPayConfig> {
        let path = self
            .year_dir(year)
            .join("holiday_pay")
            .join(format!("{}.yaml", jurisdiction.file_stem()));
        let raw: RawHolidayPayConfig = Self::load_yaml(&path, jurisdiction.code(), year)?;
        Self::check_identity(&path, (jurisdiction, year), (raw.jurisdiction, raw.year))?;
        raw.into_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn config_path() -> &'static str {
        "./config"
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_missing_root_returns_error() {
        match ConfigLoader::new("/nonexistent/path") {
            Err(EngineError::ConfigFileNotFound { path }) => {
                assert!(path.contains("nonexistent"));
            }
            other => panic!("Expected ConfigFileNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_load_federal_editions() {
        let loader = ConfigLoader::new(config_path()).unwrap();
        let editions = loader.load_tax_year(Jurisdiction::Federal, 2025).unwrap();

        assert_eq!(editions.len(), 2);
        assert_eq!(
            editions[0].edition.effective_date,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
        );
        assert_eq!(editions[0].edition.brackets[0].rate, dec("0.15"));
        assert_eq!(
            editions[1].edition.effective_date,
            NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()
        );
        assert_eq!(editions[1].edition.brackets[0].rate, dec("0.145"));
    }

    #[test]
    fn test_every_province_has_tax_and_holiday_tables() {
        let loader = ConfigLoader::new(config_path()).unwrap();
        for province in Jurisdiction::PROVINCES {
            let tax = loader.load_tax_year(province, 2025);
            assert!(tax.is_ok(), "{} tax: {:?}", province, tax.err());

            let holiday = loader.load_holiday_pay(province, 2025);
            assert!(holiday.is_ok(), "{} holiday: {:?}", province, holiday.err());
        }
        assert!(loader.load_holiday_pay(Jurisdiction::Federal, 2025).is_ok());
    }

    #[test]
    fn test_load_cpp_and_ei() {
        let loader = ConfigLoader::new(config_path()).unwrap();

        let cpp = loader.load_cpp(2025).unwrap();
        assert_eq!(cpp.ympe, dec("71300"));
        assert_eq!(cpp.max_base_contribution, dec("4034.10"));

        let ei = loader.load_ei(2025).unwrap();
        assert_eq!(ei.rate, dec("0.0164"));
        assert_eq!(ei.employer_multiplier, dec("1.4"));
    }

    #[test]
    fn test_unknown_year_is_config_not_found() {
        let loader = ConfigLoader::new(config_path()).unwrap();
        match loader.load_tax_year(Jurisdiction::Ontario, 1999) {
            Err(EngineError::ConfigNotFound { jurisdiction, year }) => {
                assert_eq!(jurisdiction, "ON");
                assert_eq!(year, 1999);
            }
            other => panic!("Expected ConfigNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_ontario_carries_surtax_and_health_premium() {
        let loader = ConfigLoader::new(config_path()).unwrap();
        let on = loader.load_tax_year(Jurisdiction::Ontario, 2025).unwrap();
        let edition = &on[0].edition;
        assert_eq!(edition.surtax.len(), 2);
        assert_eq!(edition.health_premium.len(), 5);
        assert!(edition.tax_reduction.is_some());
    }
}
