use serde::{Deserialize, Serialize};
use std::fmt;

/// A point of travel: airport or city code plus the geography it sits in.
///
/// Nation and IATA traffic area are carried alongside the code so that
/// table geography and governing-carrier rules can be evaluated without an
/// external location service.
///
/// # Examples
///
/// ```
/// use cabin_differential::core::geo::{Location, LocSpec};
///
/// let lhr = Location::new("LHR", "GB", 2);
/// assert!(LocSpec::Nation("GB".into()).matches(&lhr));
/// assert!(!LocSpec::Area(1).matches(&lhr));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub code: String,
    pub nation: String,
    pub area: u8,
}

impl Location {
    pub fn new(code: impl Into<String>, nation: impl Into<String>, area: u8) -> Self {
        Self {
            code: code.into(),
            nation: nation.into(),
            area,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

/// A geography filter as published on reference table rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum LocSpec {
    #[default]
    Any,
    City(String),
    Nation(String),
    Area(u8),
}

impl LocSpec {
    pub fn matches(&self, loc: &Location) -> bool {
        match self {
            LocSpec::Any => true,
            LocSpec::City(code) => code == &loc.code,
            LocSpec::Nation(nation) => nation == &loc.nation,
            LocSpec::Area(area) => *area == loc.area,
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, LocSpec::Any)
    }
}

/// Global direction of travel for a fare component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GlobalDirection {
    /// Via the Atlantic.
    AT,
    /// Via the Pacific.
    PA,
    /// Within the Western Hemisphere.
    WH,
    /// Within the Eastern Hemisphere.
    EH,
    /// Via Siberia / trans-Siberian.
    TS,
    /// Via the Atlantic and the Pacific.
    AP,
    /// Polar route.
    PO,
}

/// Which way a fare is priced relative to the direction of travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Directionality {
    /// Fare published from the component's origin to its destination.
    #[default]
    Outbound,
    /// Fare published from the component's destination back to its origin.
    Inbound,
}
