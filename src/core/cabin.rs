use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Passenger cabin, ordered by service level.
///
/// Rank 1 is the highest service level. Comparisons between cabins in this
/// crate are always made on rank, never on the enum discriminant.
///
/// # Examples
///
/// ```
/// use cabin_differential::core::cabin::Cabin;
///
/// assert!(Cabin::Business.is_above(Cabin::Economy));
/// assert_eq!(Cabin::Business.code(), 'C');
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cabin {
    PremiumFirst,
    First,
    PremiumBusiness,
    Business,
    PremiumEconomy,
    Economy,
}

/// Broad grouping used when looking for a local fare that can stand in for
/// the through fare on a single segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CabinFamily {
    First,
    Business,
    Economy,
}

impl Cabin {
    /// All cabins from the highest service level to the lowest.
    pub const ALL: [Cabin; 6] = [
        Cabin::PremiumFirst,
        Cabin::First,
        Cabin::PremiumBusiness,
        Cabin::Business,
        Cabin::PremiumEconomy,
        Cabin::Economy,
    ];

    pub fn rank(self) -> u8 {
        match self {
            Cabin::PremiumFirst => 1,
            Cabin::First => 2,
            Cabin::PremiumBusiness => 3,
            Cabin::Business => 4,
            Cabin::PremiumEconomy => 5,
            Cabin::Economy => 6,
        }
    }

    /// Single-letter cabin code used in sector tags.
    pub fn code(self) -> char {
        match self {
            Cabin::PremiumFirst => 'R',
            Cabin::First => 'F',
            Cabin::PremiumBusiness => 'J',
            Cabin::Business => 'C',
            Cabin::PremiumEconomy => 'W',
            Cabin::Economy => 'Y',
        }
    }

    pub fn from_code(code: char) -> Option<Cabin> {
        match code.to_ascii_uppercase() {
            'R' => Some(Cabin::PremiumFirst),
            'F' => Some(Cabin::First),
            'J' => Some(Cabin::PremiumBusiness),
            'C' => Some(Cabin::Business),
            'W' | 'Z' => Some(Cabin::PremiumEconomy),
            'Y' => Some(Cabin::Economy),
            _ => None,
        }
    }

    pub fn is_premium(self) -> bool {
        matches!(
            self,
            Cabin::PremiumFirst | Cabin::PremiumBusiness | Cabin::PremiumEconomy
        )
    }

    pub fn family(self) -> CabinFamily {
        match self {
            Cabin::PremiumFirst | Cabin::First => CabinFamily::First,
            Cabin::PremiumBusiness | Cabin::Business => CabinFamily::Business,
            Cabin::PremiumEconomy | Cabin::Economy => CabinFamily::Economy,
        }
    }

    /// True when `self` offers a strictly higher service level than `other`.
    pub fn is_above(self, other: Cabin) -> bool {
        self.rank() < other.rank()
    }

    /// The next cabin down in service level, if any.
    pub fn next_lower(self) -> Option<Cabin> {
        Cabin::ALL.get(self.rank() as usize).copied()
    }

    /// The next cabin up in service level, if any.
    pub fn next_higher(self) -> Option<Cabin> {
        let idx = self.rank() as usize;
        if idx < 2 {
            None
        } else {
            Cabin::ALL.get(idx - 2).copied()
        }
    }
}

impl fmt::Display for Cabin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Cabin::PremiumFirst => "premium first",
            Cabin::First => "first",
            Cabin::PremiumBusiness => "premium business",
            Cabin::Business => "business",
            Cabin::PremiumEconomy => "premium economy",
            Cabin::Economy => "economy",
        };
        f.write_str(name)
    }
}

/// Errors arising from parsing cabin and fare-type codes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CabinError {
    #[error("unknown cabin code '{0}'")]
    UnknownCabin(char),
    #[error("invalid fare type filter '{0}'")]
    InvalidFilter(String),
}

/// Fare-type designator letter carried by a fare.
///
/// The letter identifies the cabin the fare is filed in. Premium economy is
/// published under two variants, `W` and `Z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FareTypeDesignator(char);

impl FareTypeDesignator {
    pub fn new(code: char) -> Self {
        Self(code.to_ascii_uppercase())
    }

    pub fn code(self) -> char {
        self.0
    }

    pub fn cabin(self) -> Result<Cabin, CabinError> {
        Cabin::from_code(self.0).ok_or(CabinError::UnknownCabin(self.0))
    }

    pub fn is_premium_economy(self) -> bool {
        matches!(self.0, 'W' | 'Z')
    }
}

impl From<Cabin> for FareTypeDesignator {
    fn from(cabin: Cabin) -> Self {
        Self(cabin.code())
    }
}

impl fmt::Display for FareTypeDesignator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fare-type filter as published on a differential table row.
///
/// `*W` and `*Z` are generic and accept either premium economy variant;
/// a bare letter accepts only that exact designator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FareTypeFilter {
    Exact(FareTypeDesignator),
    AnyPremiumEconomy,
}

impl FareTypeFilter {
    pub fn matches(self, designator: FareTypeDesignator) -> bool {
        match self {
            FareTypeFilter::Exact(expected) => expected == designator,
            FareTypeFilter::AnyPremiumEconomy => designator.is_premium_economy(),
        }
    }

    pub fn is_generic_premium_economy(self) -> bool {
        matches!(self, FareTypeFilter::AnyPremiumEconomy)
    }

    /// True for any filter that targets premium economy, generic or exact.
    pub fn targets_premium_economy(self) -> bool {
        match self {
            FareTypeFilter::Exact(d) => d.is_premium_economy(),
            FareTypeFilter::AnyPremiumEconomy => true,
        }
    }
}

impl FromStr for FareTypeFilter {
    type Err = CabinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().to_ascii_uppercase();
        match trimmed.as_str() {
            "*W" | "*Z" => Ok(FareTypeFilter::AnyPremiumEconomy),
            _ => {
                let mut chars = trimmed.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if Cabin::from_code(c).is_some() => {
                        Ok(FareTypeFilter::Exact(FareTypeDesignator::new(c)))
                    }
                    _ => Err(CabinError::InvalidFilter(s.to_string())),
                }
            }
        }
    }
}

impl TryFrom<String> for FareTypeFilter {
    type Error = CabinError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FareTypeFilter> for String {
    fn from(filter: FareTypeFilter) -> Self {
        match filter {
            FareTypeFilter::Exact(d) => d.code().to_string(),
            FareTypeFilter::AnyPremiumEconomy => "*W".to_string(),
        }
    }
}
