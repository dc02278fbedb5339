//! Jurisdiction codes.
//!
//! Quebec is deliberately absent: its QPP/QPIP regime is not supported, so
//! `"QC"` is rejected like any other unknown code.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// A taxing or employment-standards jurisdiction.
///
/// # Example
///
/// ```
/// use payroll_engine::models::Jurisdiction;
///
/// let bc: Jurisdiction = "bc".parse().unwrap();
/// assert_eq!(bc, Jurisdiction::BritishColumbia);
/// assert_eq!(bc.code(), "BC");
/// assert!("QC".parse::<Jurisdiction>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Jurisdiction {
    /// Federal tables, or federally regulated employment for labour standards.
    Federal,
    /// Alberta.
    Alberta,
    /// British Columbia.
    BritishColumbia,
    /// Manitoba.
    Manitoba,
    /// New Brunswick.
    NewBrunswick,
    /// Newfoundland and Labrador.
    NewfoundlandAndLabrador,
    /// Nova Scotia.
    NovaScotia,
    /// Northwest Territories.
    NorthwestTerritories,
    /// Nunavut.
    Nunavut,
    /// Ontario.
    Ontario,
    /// Prince Edward Island.
    PrinceEdwardIsland,
    /// Saskatchewan.
    Saskatchewan,
    /// Yukon.
    Yukon,
}

impl Jurisdiction {
    /// Every supported province and territory (excludes [`Jurisdiction::Federal`]).
    pub const PROVINCES: [Jurisdiction; 12] = [
        Jurisdiction::Alberta,
        Jurisdiction::BritishColumbia,
        Jurisdiction::Manitoba,
        Jurisdiction::NewBrunswick,
        Jurisdiction::NewfoundlandAndLabrador,
        Jurisdiction::NovaScotia,
        Jurisdiction::NorthwestTerritories,
        Jurisdiction::Nunavut,
        Jurisdiction::Ontario,
        Jurisdiction::PrinceEdwardIsland,
        Jurisdiction::Saskatchewan,
        Jurisdiction::Yukon,
    ];

    /// Returns the two- or three-letter code.
    pub fn code(&self) -> &'static str {
        match self {
            Jurisdiction::Federal => "FED",
            Jurisdiction::Alberta => "AB",
            Jurisdiction::BritishColumbia => "BC",
            Jurisdiction::Manitoba => "MB",
            Jurisdiction::NewBrunswick => "NB",
            Jurisdiction::NewfoundlandAndLabrador => "NL",
            Jurisdiction::NovaScotia => "NS",
            Jurisdiction::NorthwestTerritories => "NT",
            Jurisdiction::Nunavut => "NU",
            Jurisdiction::Ontario => "ON",
            Jurisdiction::PrinceEdwardIsland => "PE",
            Jurisdiction::Saskatchewan => "SK",
            Jurisdiction::Yukon => "YT",
        }
    }

    /// Returns the lowercase file stem used by the YAML config layout.
    pub fn file_stem(&self) -> &'static str {
        match self {
            Jurisdiction::Federal => "federal",
            Jurisdiction::Alberta => "ab",
            Jurisdiction::BritishColumbia => "bc",
            Jurisdiction::Manitoba => "mb",
            Jurisdiction::NewBrunswick => "nb",
            Jurisdiction::NewfoundlandAndLabrador => "nl",
            Jurisdiction::NovaScotia => "ns",
            Jurisdiction::NorthwestTerritories => "nt",
            Jurisdiction::Nunavut => "nu",
            Jurisdiction::Ontario => "on",
            Jurisdiction::PrinceEdwardIsland => "pe",
            Jurisdiction::Saskatchewan => "sk",
            Jurisdiction::Yukon => "yt",
        }
    }

    /// Returns true for provinces and territories.
    pub fn is_province(&self) -> bool {
        *self != Jurisdiction::Federal
    }
}

impl FromStr for Jurisdiction {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FED" | "FEDERAL" | "CA" => Ok(Jurisdiction::Federal),
            "AB" => Ok(Jurisdiction::Alberta),
            "BC" => Ok(Jurisdiction::BritishColumbia),
            "MB" => Ok(Jurisdiction::Manitoba),
            "NB" => Ok(Jurisdiction::NewBrunswick),
            "NL" => Ok(Jurisdiction::NewfoundlandAndLabrador),
            "NS" => Ok(Jurisdiction::NovaScotia),
            "NT" => Ok(Jurisdiction::NorthwestTerritories),
            "NU" => Ok(Jurisdiction::Nunavut),
            "ON" => Ok(Jurisdiction::Ontario),
            "PE" => Ok(Jurisdiction::PrinceEdwardIsland),
            "SK" => Ok(Jurisdiction::Saskatchewan),
            "YT" => Ok(Jurisdiction::Yukon),
            _ => Err(EngineError::InvalidJurisdiction {
                code: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Jurisdiction {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Jurisdiction> for String {
    fn from(value: Jurisdiction) -> Self {
        value.code().to_string()
    }
}

impl fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive_and_trimmed() {
        assert_eq!(" on ".parse::<Jurisdiction>().unwrap(), Jurisdiction::Ontario);
        assert_eq!("Fed".parse::<Jurisdiction>().unwrap(), Jurisdiction::Federal);
    }

    #[test]
    fn test_quebec_is_rejected() {
        match "QC".parse::<Jurisdiction>() {
            Err(EngineError::InvalidJurisdiction { code }) => assert_eq!(code, "QC"),
            other => panic!("Expected InvalidJurisdiction, got {:?}", other),
        }
    }

    #[test]
    fn test_every_province_round_trips_through_its_code() {
        for province in Jurisdiction::PROVINCES {
            assert!(province.is_province());
            assert_eq!(province.code().parse::<Jurisdiction>().unwrap(), province);
            assert_eq!(province.file_stem(), province.code().to_lowercase());
        }
    }

    #[test]
    fn test_federal_file_stem() {
        assert_eq!(Jurisdiction::Federal.file_stem(), "federal");
        assert!(!Jurisdiction::Federal.is_province());
    }

    #[test]
    fn test_serde_uses_codes() {
        let json = serde_json::to_string(&Jurisdiction::NovaScotia).unwrap();
        assert_eq!(json, "\"NS\"");

        let parsed: Jurisdiction = serde_json::from_str("\"yt\"").unwrap();
        assert_eq!(parsed, Jurisdiction::Yukon);

        assert!(serde_json::from_str::<Jurisdiction>("\"ZZ\"").is_err());
    }
}
