//! Tax-table resolution with a caller-owned read-through cache.
//!
//! [`TaxTableSource`] is the raw loading seam (files, a database, a remote
//! service). [`TaxTableProvider`] is what calculators and the composition
//! root consume. [`CachedTaxTables`] adapts the former into the latter,
//! memoizing immutable snapshots behind `Arc` so concurrent calculations
//! share them without copying.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use crate::models::Jurisdiction;

use super::holiday::HolidayPayConfig;
use super::types::{CppConfig, EiConfig, JurisdictionTaxConfig};

/// Identifies one immutable tax-table snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigKey {
    /// The jurisdiction.
    pub jurisdiction: Jurisdiction,
    /// The tax year.
    pub year: i32,
    /// Effective date of the edition.
    pub edition: NaiveDate,
}

impl ConfigKey {
    /// The key of an existing snapshot.
    pub fn of(config: &JurisdictionTaxConfig) -> Self {
        Self {
            jurisdiction: config.jurisdiction,
            year: config.year,
            edition: config.edition.effective_date,
        }
    }
}

/// Loads raw tables. Implementations may block on I/O.
pub trait TaxTableSource: Send + Sync {
    /// All editions of a jurisdiction's tax tables for a year, oldest first.
    fn load_tax_year(
        &self,
        jurisdiction: Jurisdiction,
        year: i32,
    ) -> EngineResult<Vec<JurisdictionTaxConfig>>;

    /// CPP parameters for a year.
    fn load_cpp(&self, year: i32) -> EngineResult<CppConfig>;

    /// EI parameters for a year.
    fn load_ei(&self, year: i32) -> EngineResult<EiConfig>;

    /// Holiday pay rules for a jurisdiction and year.
    fn load_holiday_pay(
        &self,
        jurisdiction: Jurisdiction,
        year: i32,
    ) -> EngineResult<HolidayPayConfig>;
}

/// Resolves immutable config snapshots for calculations.
pub trait TaxTableProvider: Send + Sync {
    /// Tax tables for a jurisdiction and year.
    ///
    /// `as_of` selects the edition in force on that date; `None` selects
    /// the latest edition of the year.
    fn tax_config(
        &self,
        jurisdiction: Jurisdiction,
        year: i32,
        as_of: Option<NaiveDate>,
    ) -> EngineResult<Arc<JurisdictionTaxConfig>>;

    /// CPP parameters for a year.
    fn cpp_config(&self, year: i32) -> EngineResult<Arc<CppConfig>>;

    /// EI parameters for a year.
    fn ei_config(&self, year: i32) -> EngineResult<Arc<EiConfig>>;

    /// Holiday pay rules for a jurisdiction and year.
    fn holiday_pay_config(
        &self,
        jurisdiction: Jurisdiction,
        year: i32,
    ) -> EngineResult<Arc<HolidayPayConfig>>;
}

type Editions = Arc<Vec<Arc<JurisdictionTaxConfig>>>;

/// A read-through cache over a [`TaxTableSource`].
///
/// The cache is owned by whoever constructs it; there is no process-wide
/// table state. Entries never expire because published tables never change.
///
/// # Example
///
/// ```no_run
/// use payroll_engine::config::{CachedTaxTables, ConfigLoader, TaxTableProvider};
/// use payroll_engine::models::Jurisdiction;
/// use chrono::NaiveDate;
///
/// let tables = CachedTaxTables::new(ConfigLoader::new("./config")?);
/// let pay_date = NaiveDate::from_ymd_opt(2025, 8, 15).unwrap();
/// let federal = tables.tax_config(Jurisdiction::Federal, 2025, Some(pay_date))?;
/// println!("Lowest federal rate: {}", federal.edition.brackets[0].rate);
/// # Ok::<(), payroll_engine::error::EngineError>(())
/// ```
pub struct CachedTaxTables<S> {
    source: S,
    debug_fallback_year: Option<i32>,
    tax_years: RwLock<HashMap<(Jurisdiction, i32), Editions>>,
    cpp: RwLock<HashMap<i32, Arc<CppConfig>>>,
    ei: RwLock<HashMap<i32, Arc<EiConfig>>>,
    holiday_pay: RwLock<HashMap<(Jurisdiction, i32), Arc<HolidayPayConfig>>>,
}

impl<S: TaxTableSource> CachedTaxTables<S> {
    /// Wraps a source with an empty cache.
    pub fn new(source: S) -> Self {
        Self {
            source,
            debug_fallback_year: None,
            tax_years: RwLock::new(HashMap::new()),
            cpp: RwLock::new(HashMap::new()),
            ei: RwLock::new(HashMap::new()),
            holiday_pay: RwLock::new(HashMap::new()),
        }
    }

    /// Serves `year`'s tables when a requested year is missing.
    ///
    /// For debugging and local development only. Production callers must
    /// leave this unset so an unknown year fails with `ConfigNotFound`.
    pub fn with_debug_fallback(mut self, year: i32) -> Self {
        self.debug_fallback_year = Some(year);
        self
    }

    /// The wrapped source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Keys of every edition currently cached.
    pub fn cached_keys(&self) -> Vec<ConfigKey> {
        let guard = self.tax_years.read().unwrap_or_else(|e| e.into_inner());
        let mut keys: Vec<ConfigKey> = guard
            .values()
            .flat_map(|editions| editions.iter().map(|c| ConfigKey::of(c)))
            .collect();
        keys.sort_by_key(|k| (k.jurisdiction, k.year, k.edition));
        keys
    }

    fn with_fallback<T>(
        &self,
        year: i32,
        load: impl Fn(i32) -> EngineResult<T>,
    ) -> EngineResult<T> {
        match load(year) {
            Err(EngineError::ConfigNotFound { jurisdiction, .. })
                if self.debug_fallback_year.is_some_and(|y| y != year) =>
            {
                let fallback = self.debug_fallback_year.unwrap_or(year);
                warn!(
                    jurisdiction = %jurisdiction,
                    requested_year = year,
                    fallback_year = fallback,
                    "Tax tables missing; using debug fallback year"
                );
                load(fallback)
            }
            other => other,
        }
    }

    fn editions(&self, jurisdiction: Jurisdiction, year: i32) -> EngineResult<Editions> {
        let key = (jurisdiction, year);
        if let Some(hit) = self
            .tax_years
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
        {
            return Ok(Arc::clone(hit));
        }

        debug!(jurisdiction = %jurisdiction, year, "Tax table cache miss");
        let loaded = self.with_fallback(year, |y| self.source.load_tax_year(jurisdiction, y))?;
        let editions: Editions = Arc::new(loaded.into_iter().map(Arc::new).collect());

        let mut guard = self.tax_years.write().unwrap_or_else(|e| e.into_inner());
        Ok(Arc::clone(guard.entry(key).or_insert(editions)))
    }
}

/// Picks the edition in force on `as_of`, or the latest when `as_of` is `None`.
///
/// Dates before the first edition resolve to the first edition.
pub fn select_edition(
    editions: &[Arc<JurisdictionTaxConfig>],
    as_of: Option<NaiveDate>,
) -> Option<&Arc<JurisdictionTaxConfig>> {
    match as_of {
        None => editions.last(),
        Some(date) => editions
            .iter()
            .rev()
            .find(|c| c.edition.effective_date <= date)
            .or_else(|| editions.first()),
    }
}

impl<S: TaxTableSource> TaxTableProvider for CachedTaxTables<S> {
    fn tax_config(
        &self,
        jurisdiction: Jurisdiction,
        year: i32,
        as_of: Option<NaiveDate>,
    ) -> EngineResult<Arc<JurisdictionTaxConfig>> {
        let editions = self.editions(jurisdiction, year)?;
        let selected =
            select_edition(&editions, as_of).ok_or_else(|| EngineError::ConfigNotFound {
                jurisdiction: jurisdiction.code().to_string(),
                year,
            })?;
        debug!(
            jurisdiction = %jurisdiction,
            year,
            edition = %selected.edition.effective_date,
            "Resolved tax table edition"
        );
        Ok(Arc::clone(selected))
    }

    fn cpp_config(&self, year: i32) -> EngineResult<Arc<CppConfig>> {
        if let Some(hit) = self.cpp.read().unwrap_or_else(|e| e.into_inner()).get(&year) {
            return Ok(Arc::clone(hit));
        }
        let loaded = Arc::new(self.with_fallback(year, |y| self.source.load_cpp(y))?);
        let mut guard = self.cpp.write().unwrap_or_else(|e| e.into_inner());
        Ok(Arc::clone(guard.entry(year).or_insert(loaded)))
    }

    fn ei_config(&self, year: i32) -> EngineResult<Arc<EiConfig>> {
        if let Some(hit) = self.ei.read().unwrap_or_else(|e| e.into_inner()).get(&year) {
            return Ok(Arc::clone(hit));
        }
        let loaded = Arc::new(self.with_fallback(year, |y| self.source.load_ei(y))?);
        let mut guard = self.ei.write().unwrap_or_else(|e| e.into_inner());
        Ok(Arc::clone(guard.entry(year).or_insert(loaded)))
    }

    fn holiday_pay_config(
        &self,
        jurisdiction: Jurisdiction,
        year: i32,
    ) -> EngineResult<Arc<HolidayPayConfig>> {
        let key = (jurisdiction, year);
        if let Some(hit) = self
            .holiday_pay
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
        {
            return Ok(Arc::clone(hit));
        }
        let loaded = Arc::new(
            self.with_fallback(year, |y| self.source.load_holiday_pay(jurisdiction, y))?,
        );
        let mut guard = self.holiday_pay.write().unwrap_or_else(|e| e.into_inner());
        Ok(Arc::clone(guard.entry(key).or_insert(loaded)))
    }
}
