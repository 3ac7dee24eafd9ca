use crate::core::cabin::FareTypeFilter;
use crate::core::geo::{GlobalDirection, LocSpec};
use crate::core::itinerary::{BookingCode, CarrierCode};
use crate::core::sector::CalculationPolicy;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Dates between which a reference row is in force. Open ends are unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePeriod {
    #[serde(default)]
    pub effective: Option<NaiveDate>,
    #[serde(default)]
    pub discontinue: Option<NaiveDate>,
}

impl EffectivePeriod {
    pub fn is_active(&self, date: NaiveDate) -> bool {
        self.effective.map_or(true, |from| date >= from)
            && self.discontinue.map_or(true, |until| date <= until)
    }
}

/// How the through-fare geography of a row is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowDirectionality {
    /// Between loc1 and loc2, in either direction.
    Between,
    /// From loc1 to loc2, in the fare's direction.
    From,
    /// Entirely within loc1.
    Within,
    /// Originating in loc1.
    Origin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FlightApplication {
    #[default]
    None,
    Nonstop,
    SameCarrier,
    /// Intermediate points bound the last/first segments of the sub-range.
    LastFirst,
}

/// One intermediate geography pair (Loc1A/Loc2A or Loc1B/Loc2B).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntermediateGeo {
    pub loc1: LocSpec,
    #[serde(default)]
    pub loc2: LocSpec,
}

/// One row of a carrier's differential table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifferentialRow {
    pub sequence: u32,
    pub directionality: RowDirectionality,
    #[serde(default)]
    pub loc1: LocSpec,
    #[serde(default)]
    pub loc2: LocSpec,
    #[serde(default)]
    pub global_direction: Option<GlobalDirection>,
    /// Through fare filters.
    #[serde(default)]
    pub fare_type: Option<FareTypeFilter>,
    #[serde(default)]
    pub booking_code: Option<BookingCode>,
    /// Prefix of the through fare basis.
    #[serde(default)]
    pub fare_class: Option<String>,
    /// Sector filters.
    #[serde(default)]
    pub intermediate_carrier: Option<CarrierCode>,
    #[serde(default)]
    pub intermediate_fare_type: Option<FareTypeFilter>,
    #[serde(default)]
    pub intermediate_booking_code: Option<BookingCode>,
    #[serde(default)]
    pub intermediate_a: Option<IntermediateGeo>,
    #[serde(default)]
    pub intermediate_b: Option<IntermediateGeo>,
    #[serde(default)]
    pub flight_application: FlightApplication,
    pub calculation: CalculationPolicy,
    #[serde(default)]
    pub hip_exempt: bool,
    #[serde(default, flatten)]
    pub period: EffectivePeriod,
}

impl DifferentialRow {
    /// A row with every filter open, mostly useful as a starting point.
    pub fn open(sequence: u32, calculation: CalculationPolicy) -> Self {
        Self {
            sequence,
            directionality: RowDirectionality::Between,
            loc1: LocSpec::Any,
            loc2: LocSpec::Any,
            global_direction: None,
            fare_type: None,
            booking_code: None,
            fare_class: None,
            intermediate_carrier: None,
            intermediate_fare_type: None,
            intermediate_booking_code: None,
            intermediate_a: None,
            intermediate_b: None,
            flight_application: FlightApplication::None,
            calculation,
            hip_exempt: false,
            period: EffectivePeriod::default(),
        }
    }

    pub fn has_intermediate_points(&self) -> bool {
        self.intermediate_a.is_some() || self.intermediate_b.is_some()
    }
}

/// Which fares may price a sector when industry fares exist alongside the
/// governing carrier's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FarePrecedence {
    /// Only the governing carrier's fares.
    CarrierOnly,
    /// Either carrier; on equal amounts the carrier fare wins.
    PreferCarrier,
    /// Either carrier; the lowest fare wins.
    #[default]
    LowestOfEither,
}

impl FarePrecedence {
    pub fn allows_industry(self) -> bool {
        !matches!(self, FarePrecedence::CarrierOnly)
    }
}

/// Industry pricing application row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustryPricingRow {
    pub carrier: CarrierCode,
    #[serde(default)]
    pub global_direction: Option<GlobalDirection>,
    #[serde(default)]
    pub loc1: LocSpec,
    #[serde(default)]
    pub loc2: LocSpec,
    pub precedence: FarePrecedence,
    #[serde(default, flatten)]
    pub period: EffectivePeriod,
}

/// Carrier preference flags governing cabin slides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarrierPreference {
    pub allow_premium_economy_slide: bool,
    pub allow_premium_business_slide: bool,
    pub allow_non_premium_slide: bool,
}
