use crate::core::cabin::Cabin;
use crate::core::fare::Fare;
use crate::core::geo::{GlobalDirection, Location};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Two-character airline designator.
///
/// # Examples
///
/// ```
/// use cabin_differential::core::itinerary::CarrierCode;
///
/// let ba = CarrierCode::new("BA");
/// assert_eq!(ba.as_str(), "BA");
/// assert!(CarrierCode::new("YY").is_industry());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CarrierCode(String);

impl CarrierCode {
    pub const INDUSTRY: &'static str = "YY";

    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn industry() -> Self {
        Self(Self::INDUSTRY.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_industry(&self) -> bool {
        self.0 == Self::INDUSTRY
    }
}

impl fmt::Display for CarrierCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CarrierCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Reservation booking designator (RBD) of a segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingCode(String);

impl BookingCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BookingCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Passenger type code (ADT, CNN, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PassengerType(String);

impl PassengerType {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn adult() -> Self {
        Self("ADT".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PassengerType {
    fn default() -> Self {
        Self::adult()
    }
}

/// Inclusive range of segment positions within a fare component.
///
/// Positions are zero-based. A range is never empty: `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentRange {
    pub start: usize,
    pub end: usize,
}

impl SegmentRange {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "segment range {start}..={end} is inverted");
        Self { start, end }
    }

    pub fn single(index: usize) -> Self {
        Self {
            start: index,
            end: index,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index <= self.end
    }

    pub fn overlaps(&self, other: &SegmentRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// True when `other` begins immediately after `self` ends.
    pub fn precedes(&self, other: &SegmentRange) -> bool {
        self.end + 1 == other.start
    }

    /// Smallest range covering both.
    pub fn span(&self, other: &SegmentRange) -> SegmentRange {
        SegmentRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn indices(&self) -> std::ops::RangeInclusive<usize> {
        self.start..=self.end
    }
}

impl fmt::Display for SegmentRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = if self.start == self.end {
            format!("{}", self.start + 1)
        } else {
            format!("{}-{}", self.start + 1, self.end + 1)
        };
        f.pad(&label)
    }
}

/// Outcome of the rule validation that ran before differential processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentStatus {
    Pass,
    Fail,
    /// Booking code not permitted by the through fare.
    BookingCodeFail,
    /// Booking code not permitted, and it maps to a different cabin.
    BookingCodeCabinMismatch,
}

impl SegmentStatus {
    pub fn is_booking_code_failure(self) -> bool {
        matches!(
            self,
            SegmentStatus::BookingCodeFail | SegmentStatus::BookingCodeCabinMismatch
        )
    }
}

/// Booking code and cabin assigned by a low-fare (no-class) rebook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rebooking {
    pub booking_code: BookingCode,
    pub cabin: Cabin,
}

/// One flight segment of the fare component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub origin: Location,
    pub destination: Location,
    pub carrier: CarrierCode,
    pub booking_code: BookingCode,
    pub cabin: Cabin,
    pub departure: NaiveDate,
    /// Intermediate stops made without a change of flight number.
    #[serde(default)]
    pub hidden_stops: Vec<String>,
    #[serde(default)]
    pub rebooked: Option<Rebooking>,
}

impl Segment {
    /// Booking code in effect; low-fare requests use the rebooked one when present.
    pub fn effective_booking_code(&self, low_fare_request: bool) -> &BookingCode {
        match (&self.rebooked, low_fare_request) {
            (Some(rebook), true) => &rebook.booking_code,
            _ => &self.booking_code,
        }
    }

    pub fn effective_cabin(&self, low_fare_request: bool) -> Cabin {
        match (&self.rebooked, low_fare_request) {
            (Some(rebook), true) => rebook.cabin,
            _ => self.cabin,
        }
    }

    pub fn crosses_area(&self) -> bool {
        self.origin.area != self.destination.area
    }

    pub fn crosses_nation(&self) -> bool {
        self.origin.nation != self.destination.nation
    }
}

/// Seats left in one booking code on a segment, used by low-fare requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatAvailability {
    pub booking_code: BookingCode,
    pub cabin: Cabin,
    pub seats: u16,
}

/// Trip type of the pricing unit owning the fare usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TripType {
    OneWay,
    RoundTrip,
    CircleTrip,
    OpenJaw,
}

/// Governing-carrier overrides requested for this pricing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierOverride {
    /// Price with industry (YY) fares regardless of the operating carrier.
    #[serde(default)]
    pub industry: bool,
    /// Explicit governing carrier requested by the agent.
    #[serde(default)]
    pub explicit: Option<CarrierCode>,
}

/// A priced fare usage: the through fare applied to one fare component.
///
/// `segment_status` is parallel to `segments`. `availability` is only
/// consulted for low-fare requests and, when present, must also be parallel
/// to `segments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FareUsage {
    pub through_fare: Fare,
    pub segments: Vec<Segment>,
    pub segment_status: Vec<SegmentStatus>,
    #[serde(default)]
    pub availability: Vec<Vec<SeatAvailability>>,
    pub trip_type: TripType,
    #[serde(default)]
    pub passenger_type: PassengerType,
    pub governing_carrier: CarrierCode,
    pub global_direction: GlobalDirection,
    #[serde(default)]
    pub carrier_override: CarrierOverride,
    #[serde(default)]
    pub low_fare_request: bool,
    #[serde(default)]
    pub hip_exempt: bool,
}

impl FareUsage {
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Range covering the whole fare component. `None` when there are no segments.
    pub fn full_range(&self) -> Option<SegmentRange> {
        if self.segments.is_empty() {
            None
        } else {
            Some(SegmentRange::new(0, self.segments.len() - 1))
        }
    }

    pub fn covers_component(&self, range: &SegmentRange) -> bool {
        self.full_range() == Some(*range)
    }

    pub fn segments_in(&self, range: &SegmentRange) -> &[Segment] {
        let end = (range.end + 1).min(self.segments.len());
        let start = range.start.min(end);
        &self.segments[start..end]
    }

    pub fn board_point(&self) -> Option<&Location> {
        self.segments.first().map(|s| &s.origin)
    }

    pub fn off_point(&self) -> Option<&Location> {
        self.segments.last().map(|s| &s.destination)
    }

    /// Travel date used for reference data lookups.
    pub fn travel_date(&self) -> Option<NaiveDate> {
        self.segments.first().map(|s| s.departure)
    }
}
