use crate::core::cabin::{Cabin, FareTypeDesignator};
use crate::core::geo::Directionality;
use crate::core::itinerary::{BookingCode, CarrierCode, PassengerType, Segment, TripType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a fare within one pricing request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FareId(String);

impl FareId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FareId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FareId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Restricted / unrestricted class of a fare type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FareRestriction {
    Restricted,
    Unrestricted,
}

/// Journey types a fare may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FareTrip {
    OneWay,
    RoundTrip,
    #[default]
    Either,
}

impl FareTrip {
    pub fn allows(self, trip: TripType) -> bool {
        match (self, trip) {
            (FareTrip::Either, _) => true,
            (FareTrip::OneWay, TripType::OneWay) => true,
            (FareTrip::RoundTrip, TripType::OneWay) => false,
            (FareTrip::RoundTrip, _) => true,
            (FareTrip::OneWay, _) => false,
        }
    }
}

/// Result of booking-code validation already performed on a fare, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BookingCodeStatus {
    #[default]
    NotProcessed,
    Pass,
    Fail,
}

/// A published fare in some fare market.
///
/// Amounts are one-way amounts in the pricing currency. Only the attributes
/// the differential pipeline reads are modelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fare {
    pub id: FareId,
    pub carrier: CarrierCode,
    pub fare_basis: String,
    pub cabin: Cabin,
    pub fare_type: FareTypeDesignator,
    pub restriction: FareRestriction,
    pub amount: Decimal,
    #[serde(default)]
    pub directionality: Directionality,
    #[serde(default = "default_true")]
    pub normal: bool,
    #[serde(default)]
    pub fare_by_rule: bool,
    #[serde(default)]
    pub private_tariff: bool,
    #[serde(default)]
    pub trip: FareTrip,
    /// `None` applies to every passenger type.
    #[serde(default)]
    pub passenger_type: Option<PassengerType>,
    /// Booking codes the fare may be booked in (prime RBDs).
    #[serde(default)]
    pub booking_codes: Vec<BookingCode>,
    #[serde(default)]
    pub booking_code_status: BookingCodeStatus,
    /// Category 23 tag forbidding use of the fare in differential calculation.
    #[serde(default)]
    pub misc_fare_tag_restricted: bool,
}

fn default_true() -> bool {
    true
}

impl Fare {
    pub fn applies_to(&self, passenger: &PassengerType) -> bool {
        self.passenger_type
            .as_ref()
            .map_or(true, |p| p == passenger)
    }

    /// Rule-based booking-code check for one segment.
    ///
    /// The segment passes when it is booked in one of the fare's booking
    /// codes, or when it is booked in a cabin below the fare's cabin.
    pub fn accepts_segment(&self, segment: &Segment, low_fare_request: bool) -> bool {
        let code = segment.effective_booking_code(low_fare_request);
        if self.booking_codes.iter().any(|c| c == code) {
            return true;
        }
        self.cabin.is_above(segment.effective_cabin(low_fare_request))
    }

    /// Booking-code validation over a run of segments.
    ///
    /// A cached `Pass`/`Fail` is only trusted for the booked codes; rebooked
    /// codes of a low-fare request are always validated again.
    pub fn booking_codes_pass(&self, segments: &[Segment], low_fare_request: bool) -> bool {
        match (self.booking_code_status, low_fare_request) {
            (BookingCodeStatus::Pass, false) => true,
            (BookingCodeStatus::Fail, false) => false,
            _ => segments
                .iter()
                .all(|s| self.accepts_segment(s, low_fare_request)),
        }
    }
}

impl fmt::Display for Fare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.carrier, self.fare_basis, self.fare_type, self.amount
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::Location;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn segment(code: &str, cabin: Cabin) -> Segment {
        Segment {
            origin: Location::new("JFK", "US", 1),
            destination: Location::new("LHR", "GB", 2),
            carrier: CarrierCode::new("BA"),
            booking_code: BookingCode::new(code),
            cabin,
            departure: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            hidden_stops: Vec::new(),
            rebooked: None,
        }
    }

    fn business_fare() -> Fare {
        Fare {
            id: FareId::new("C1"),
            carrier: CarrierCode::new("BA"),
            fare_basis: "CUS".into(),
            cabin: Cabin::Business,
            fare_type: FareTypeDesignator::new('C'),
            restriction: FareRestriction::Unrestricted,
            amount: dec!(900),
            directionality: Directionality::Outbound,
            normal: true,
            fare_by_rule: false,
            private_tariff: false,
            trip: FareTrip::Either,
            passenger_type: None,
            booking_codes: vec![BookingCode::new("C"), BookingCode::new("D")],
            booking_code_status: BookingCodeStatus::NotProcessed,
            misc_fare_tag_restricted: false,
        }
    }

    #[test]
    fn test_fare_trip_allows() {
        assert!(FareTrip::Either.allows(TripType::OpenJaw));
        assert!(FareTrip::OneWay.allows(TripType::OneWay));
        assert!(!FareTrip::OneWay.allows(TripType::RoundTrip));
        assert!(!FareTrip::RoundTrip.allows(TripType::OneWay));
    }

    #[test]
    fn test_accepts_listed_code() {
        let fare = business_fare();
        assert!(fare.accepts_segment(&segment("D", Cabin::Business), false));
        assert!(!fare.accepts_segment(&segment("J", Cabin::Business), false));
    }

    #[test]
    fn test_accepts_lower_cabin_booking() {
        let fare = business_fare();
        assert!(fare.accepts_segment(&segment("Y", Cabin::Economy), false));
        assert!(!fare.accepts_segment(&segment("F", Cabin::First), false));
    }

    #[test]
    fn test_cached_status_is_trusted() {
        let mut fare = business_fare();
        fare.booking_code_status = BookingCodeStatus::Fail;
        assert!(!fare.booking_codes_pass(&[segment("C", Cabin::Business)], false));
    }

    #[test]
    fn test_rebooked_code_used_for_low_fare_request() {
        let fare = business_fare();
        let mut seg = segment("J", Cabin::Business);
        seg.rebooked = Some(crate::core::itinerary::Rebooking {
            booking_code: BookingCode::new("D"),
            cabin: Cabin::Business,
        });
        assert!(!fare.booking_codes_pass(std::slice::from_ref(&seg), false));
        assert!(fare.booking_codes_pass(std::slice::from_ref(&seg), true));
    }
}
