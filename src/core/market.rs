use crate::core::cabin::Cabin;
use crate::core::fare::Fare;
use crate::core::itinerary::{CarrierCode, CarrierOverride, Segment, SegmentRange};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lookup key of a fare market: the segments it spans and its governing carrier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarketKey {
    pub range: SegmentRange,
    pub carrier: CarrierCode,
}

impl MarketKey {
    pub fn new(range: SegmentRange, carrier: CarrierCode) -> Self {
        Self { range, carrier }
    }
}

impl fmt::Display for MarketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.carrier, self.range)
    }
}

/// The fares available between the end points of a run of segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FareMarket {
    pub range: SegmentRange,
    pub governing_carrier: CarrierCode,
    #[serde(default)]
    pub fares: Vec<Fare>,
}

impl FareMarket {
    pub fn new(range: SegmentRange, governing_carrier: CarrierCode) -> Self {
        Self {
            range,
            governing_carrier,
            fares: Vec::new(),
        }
    }

    pub fn with_fare(mut self, fare: Fare) -> Self {
        self.fares.push(fare);
        self
    }

    pub fn key(&self) -> MarketKey {
        MarketKey::new(self.range, self.governing_carrier.clone())
    }

    pub fn fares_in_cabin(&self, cabin: Cabin) -> impl Iterator<Item = &Fare> {
        self.fares.iter().filter(move |f| f.cabin == cabin)
    }
}

/// Governing carrier of a run of segments.
///
/// A single-carrier run is governed by that carrier. Otherwise the carrier
/// of the first segment crossing an IATA area boundary governs, then the
/// first segment crossing a national boundary, then the first segment.
pub fn governing_carrier(segments: &[Segment]) -> Option<CarrierCode> {
    let first = segments.first()?;
    if segments.iter().all(|s| s.carrier == first.carrier) {
        return Some(first.carrier.clone());
    }
    segments
        .iter()
        .find(|s| s.crosses_area())
        .or_else(|| segments.iter().find(|s| s.crosses_nation()))
        .or(Some(first))
        .map(|s| s.carrier.clone())
}

/// Governing carrier honoring overrides: industry, then explicit, then normal
/// determination.
pub fn resolve_governing_carrier(
    segments: &[Segment],
    overrides: &CarrierOverride,
    industry_carrier: &CarrierCode,
) -> Option<CarrierCode> {
    if overrides.industry {
        return Some(industry_carrier.clone());
    }
    if let Some(explicit) = &overrides.explicit {
        return Some(explicit.clone());
    }
    governing_carrier(segments)
}
