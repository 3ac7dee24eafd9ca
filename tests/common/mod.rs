#![allow(dead_code)]

use cabin_differential::core::cabin::{Cabin, FareTypeDesignator};
use cabin_differential::core::fare::{BookingCodeStatus, Fare, FareId, FareRestriction, FareTrip};
use cabin_differential::core::geo::{Directionality, GlobalDirection, Location};
use cabin_differential::core::itinerary::{
    BookingCode, CarrierCode, CarrierOverride, FareUsage, PassengerType, Segment, SegmentRange,
    SegmentStatus, TripType,
};
use cabin_differential::core::market::FareMarket;
use cabin_differential::core::sector::CalculationPolicy;
use cabin_differential::reference::memory::ReferenceTables;
use cabin_differential::reference::DifferentialRow;
use cabin_differential::simulation::scenario::Scenario;
use chrono::NaiveDate;
use rust_decimal::Decimal;

pub fn carrier() -> CarrierCode {
    CarrierCode::new("LH")
}

pub fn city(code: &str) -> Location {
    let (nation, area) = match code {
        "FRA" => ("DE", 2),
        "MUC" => ("DE", 2),
        "VIE" => ("AT", 2),
        "ZRH" => ("CH", 2),
        "MAD" => ("ES", 2),
        "LIS" => ("PT", 2),
        _ => ("ZZ", 2),
    };
    Location::new(code, nation, area)
}

/// One leg flown by the governing carrier, booked in `code`/`cabin`.
pub fn leg(from: &str, to: &str, code: &str, cabin: Cabin) -> Segment {
    Segment {
        origin: city(from),
        destination: city(to),
        carrier: carrier(),
        booking_code: BookingCode::new(code),
        cabin,
        departure: NaiveDate::from_ymd_opt(2026, 11, 3).unwrap(),
        hidden_stops: Vec::new(),
        rebooked: None,
    }
}

/// A normal public fare of the governing carrier that books `code`.
pub fn fare(basis: &str, cabin: Cabin, code: &str, amount: Decimal) -> Fare {
    Fare {
        id: FareId::new(basis),
        carrier: carrier(),
        fare_basis: basis.to_string(),
        cabin,
        fare_type: FareTypeDesignator::from(cabin),
        restriction: FareRestriction::Unrestricted,
        amount,
        directionality: Directionality::Outbound,
        normal: true,
        fare_by_rule: false,
        private_tariff: false,
        trip: FareTrip::Either,
        passenger_type: None,
        booking_codes: vec![BookingCode::new(code)],
        booking_code_status: BookingCodeStatus::NotProcessed,
        misc_fare_tag_restricted: false,
    }
}

pub fn market(start: usize, end: usize, fares: Vec<Fare>) -> FareMarket {
    fares
        .into_iter()
        .fold(FareMarket::new(SegmentRange::new(start, end), carrier()), |m, f| m.with_fare(f))
}

/// Segments booked in economy pass; anything higher fails on booking code.
pub fn usage(legs: Vec<Segment>, through_amount: Decimal) -> FareUsage {
    let segment_status = legs
        .iter()
        .map(|s| {
            if s.cabin == Cabin::Economy {
                SegmentStatus::Pass
            } else {
                SegmentStatus::BookingCodeFail
            }
        })
        .collect();
    FareUsage {
        through_fare: fare("YFLEX", Cabin::Economy, "Y", through_amount),
        segments: legs,
        segment_status,
        availability: Vec::new(),
        trip_type: TripType::OneWay,
        passenger_type: PassengerType::adult(),
        governing_carrier: carrier(),
        global_direction: GlobalDirection::EH,
        carrier_override: CarrierOverride::default(),
        low_fare_request: false,
        hip_exempt: false,
    }
}

/// A scenario with one open row of `policy` for the governing carrier.
pub fn scenario(usage: FareUsage, markets: Vec<FareMarket>, policy: CalculationPolicy) -> Scenario {
    let mut scenario = Scenario::new(usage);
    scenario.reference =
        ReferenceTables::new().with_rows(carrier(), vec![DifferentialRow::open(200, policy)]);
    scenario.markets = markets
        .into_iter()
        .fold(scenario.markets, |catalog, m| catalog.with_market(m));
    scenario
}
