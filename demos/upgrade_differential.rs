//! Upgrade differential example.
//!
//! Demonstrates how business class legs on an economy through fare are
//! priced as differential sectors, and how adjacent sectors consolidate
//! when a longer market is cheaper.

use cabin_differential::core::fare::{BookingCodeStatus, FareRestriction, FareTrip};
use cabin_differential::core::geo::{Directionality, GlobalDirection, Location};
use cabin_differential::core::itinerary::{
    BookingCode, CarrierCode, CarrierOverride, PassengerType, TripType,
};
use cabin_differential::core::sector::CalculationPolicy;
use cabin_differential::prelude::*;
use cabin_differential::reference::memory::ReferenceTables;
use cabin_differential::reference::DifferentialRow;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn carrier() -> CarrierCode {
    CarrierCode::new("AF")
}

fn leg(from: (&str, &str), to: (&str, &str), code: &str, cabin: Cabin) -> Segment {
    Segment {
        origin: Location::new(from.0, from.1, 2),
        destination: Location::new(to.0, to.1, 2),
        carrier: carrier(),
        booking_code: BookingCode::new(code),
        cabin,
        departure: NaiveDate::from_ymd_opt(2026, 12, 14).unwrap_or_default(),
        hidden_stops: Vec::new(),
        rebooked: None,
    }
}

fn fare(basis: &str, cabin: Cabin, code: &str, amount: Decimal) -> Fare {
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

fn market(start: usize, end: usize, fares: Vec<Fare>) -> FareMarket {
    fares.into_iter().fold(
        FareMarket::new(SegmentRange::new(start, end), carrier()),
        |m, f| m.with_fare(f),
    )
}

fn main() {
    println!("╔═══════════════════════════════════════════════╗");
    println!("║  cabin-differential: Upgrade Differential     ║");
    println!("╚═══════════════════════════════════════════════╝\n");

    let paris = ("PAR", "FR");
    let nice = ("NCE", "FR");
    let rome = ("ROM", "IT");
    let athens = ("ATH", "GR");

    let usage = FareUsage {
        through_fare: fare("YOWFR", Cabin::Economy, "Y", dec!(820)),
        segments: vec![
            leg(paris, nice, "J", Cabin::Business),
            leg(nice, rome, "J", Cabin::Business),
            leg(rome, athens, "Y", Cabin::Economy),
        ],
        segment_status: vec![
            SegmentStatus::BookingCodeFail,
            SegmentStatus::BookingCodeFail,
            SegmentStatus::Pass,
        ],
        availability: Vec::new(),
        trip_type: TripType::OneWay,
        passenger_type: PassengerType::adult(),
        governing_carrier: carrier(),
        global_direction: GlobalDirection::EH,
        carrier_override: CarrierOverride::default(),
        low_fare_request: false,
        hip_exempt: false,
    };

    println!("Itinerary (through fare YOWFR, economy, 820):");
    println!("  PAR → NCE  J  business");
    println!("  NCE → ROM  J  business");
    println!("  ROM → ATH  Y  economy\n");

    let mut scenario = Scenario::new(usage);
    scenario.reference = ReferenceTables::new().with_rows(
        carrier(),
        vec![DifferentialRow::open(100, CalculationPolicy::Low)],
    );
    for m in [
        market(0, 0, vec![
            fare("JOWFR1", Cabin::Business, "J", dec!(540)),
            fare("YOWFR1", Cabin::Economy, "Y", dec!(310)),
        ]),
        market(1, 1, vec![
            fare("JOWFR2", Cabin::Business, "J", dec!(580)),
            fare("YOWFR2", Cabin::Economy, "Y", dec!(330)),
        ]),
        market(2, 2, vec![]),
        market(0, 1, vec![
            fare("JOWFR12", Cabin::Business, "J", dec!(890)),
            fare("YOWFR12", Cabin::Economy, "Y", dec!(520)),
        ]),
    ] {
        scenario.markets = scenario.markets.with_market(m);
    }

    // --- Scenario 1: Atomic sectors only ---
    println!("━━━ Scenario 1: Atomic Sectors ━━━\n");
    scenario.config.consolidate = false;
    report(&scenario);

    // --- Scenario 2: With consolidation ---
    println!("━━━ Scenario 2: Consolidated ━━━\n");
    scenario.config.consolidate = true;
    report(&scenario);
}

fn report(scenario: &Scenario) {
    match scenario.validate() {
        Ok(outcome) => {
            print!("{}", outcome);
            println!();
        }
        Err(e) => eprintln!("Validation aborted: {}\n", e),
    }
}
