//! Random scenario generation for benchmarks and property tests.
//!
//! Builds a single-carrier itinerary through a chain of cities, upgrades a
//! random subset of its segments, and publishes economy, business and first
//! fares for every contiguous run of segments. Longer markets are cheaper
//! per segment, so consolidation has something to find.

use crate::core::cabin::{Cabin, FareTypeDesignator};
use crate::core::fare::{BookingCodeStatus, Fare, FareId, FareRestriction, FareTrip};
use crate::core::geo::{Directionality, GlobalDirection, Location};
use crate::core::itinerary::{
    BookingCode, CarrierCode, CarrierOverride, FareUsage, PassengerType, Segment, SegmentRange,
    SegmentStatus, TripType,
};
use crate::core::market::FareMarket;
use crate::core::sector::CalculationPolicy;
use crate::reference::memory::{MarketCatalog, ReferenceTables};
use crate::reference::DifferentialRow;
use crate::simulation::scenario::Scenario;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

const CITIES: &[(&str, &str, u8)] = &[
    ("LON", "GB", 2),
    ("PAR", "FR", 2),
    ("FRA", "DE", 2),
    ("VIE", "AT", 2),
    ("ROM", "IT", 2),
    ("ATH", "GR", 2),
    ("IST", "TR", 2),
    ("CAI", "EG", 2),
    ("DXB", "AE", 2),
    ("DEL", "IN", 3),
    ("BKK", "TH", 3),
    ("SIN", "SG", 3),
    ("HKG", "HK", 3),
];

/// Parameters of a generated scenario.
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    /// Segments in the fare component; capped by the built-in city chain.
    pub segment_count: usize,
    /// Chance that a segment is booked above economy.
    pub upgrade_probability: f64,
    /// Share of upgraded segments booked in first rather than business.
    pub first_share: f64,
    /// Economy amount of a one-segment market.
    pub base_amount: Decimal,
    /// Fixed seed for reproducible scenarios.
    pub seed: Option<u64>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            segment_count: 4,
            upgrade_probability: 0.4,
            first_share: 0.25,
            base_amount: Decimal::from(150),
            seed: None,
        }
    }
}

/// Largest segment count the city chain supports.
pub fn max_segments() -> usize {
    CITIES.len() - 1
}

pub fn generate_random_scenario(config: &ScenarioConfig) -> Scenario {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let count = config.segment_count.clamp(1, max_segments());
    let carrier = CarrierCode::new("QX");
    let departure = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap_or_default();

    let mut bookings: Vec<Cabin> = (0..count)
        .map(|_| {
            if rng.gen_bool(config.upgrade_probability.clamp(0.0, 1.0)) {
                if rng.gen_bool(config.first_share.clamp(0.0, 1.0)) {
                    Cabin::First
                } else {
                    Cabin::Business
                }
            } else {
                Cabin::Economy
            }
        })
        .collect();
    // An all-upgraded component has nothing left for the through fare.
    if bookings.iter().all(|c| *c != Cabin::Economy) {
        if let Some(last) = bookings.last_mut() {
            *last = Cabin::Economy;
        }
    }
    // Sector tags hold a single run digit.
    let mut streak = 0;
    let mut previous = None;
    for cabin in bookings.iter_mut() {
        streak = if previous == Some(*cabin) { streak + 1 } else { 1 };
        if *cabin != Cabin::Economy && streak > 9 {
            *cabin = Cabin::Economy;
        }
        previous = Some(*cabin);
    }

    let segments: Vec<Segment> = bookings
        .iter()
        .enumerate()
        .map(|(i, cabin)| Segment {
            origin: city(i),
            destination: city(i + 1),
            carrier: carrier.clone(),
            booking_code: BookingCode::new(booking_letter(*cabin)),
            cabin: *cabin,
            departure,
            hidden_stops: Vec::new(),
            rebooked: None,
        })
        .collect();
    let segment_status = bookings
        .iter()
        .map(|cabin| {
            if *cabin == Cabin::Economy {
                SegmentStatus::Pass
            } else {
                SegmentStatus::BookingCodeFail
            }
        })
        .collect();

    let mut markets = MarketCatalog::new();
    for start in 0..count {
        for end in start..count {
            let range = SegmentRange::new(start, end);
            let len = Decimal::from(range.len() as u64);
            let distance = (Decimal::ONE_HUNDRED + Decimal::from(60) * (len - Decimal::ONE))
                / Decimal::ONE_HUNDRED;
            let jitter = Decimal::from(rng.gen_range(90u32..=110)) / Decimal::ONE_HUNDRED;
            let economy = (config.base_amount * distance * jitter).round_dp(2);
            let market = [(Cabin::Economy, 1u32), (Cabin::Business, 3), (Cabin::First, 5)]
                .into_iter()
                .fold(FareMarket::new(range, carrier.clone()), |market, (cabin, factor)| {
                    market.with_fare(fare(&carrier, range, cabin, economy * Decimal::from(factor)))
                });
            markets = markets.with_market(market);
        }
    }

    let full = SegmentRange::new(0, count - 1);
    let mut through_fare = fare(&carrier, full, Cabin::Economy, Decimal::ZERO);
    through_fare.amount = markets
        .markets
        .iter()
        .find(|m| m.range == full)
        .and_then(|m| m.fares.first())
        .map_or(config.base_amount, |f| f.amount);

    let usage = FareUsage {
        through_fare,
        segments,
        segment_status,
        availability: Vec::new(),
        trip_type: TripType::OneWay,
        passenger_type: PassengerType::adult(),
        governing_carrier: carrier.clone(),
        global_direction: GlobalDirection::EH,
        carrier_override: CarrierOverride::default(),
        low_fare_request: false,
        hip_exempt: false,
    };

    let mut scenario = Scenario::new(usage);
    scenario.reference = ReferenceTables::new()
        .with_rows(carrier, vec![DifferentialRow::open(100, CalculationPolicy::Low)]);
    scenario.markets = markets;
    scenario
}

fn city(index: usize) -> Location {
    let (code, nation, area) = CITIES[index % CITIES.len()];
    Location::new(code, nation, area)
}

fn booking_letter(cabin: Cabin) -> &'static str {
    match cabin {
        Cabin::First | Cabin::PremiumFirst => "F",
        Cabin::Business | Cabin::PremiumBusiness => "J",
        Cabin::PremiumEconomy => "W",
        Cabin::Economy => "Y",
    }
}

fn fare(carrier: &CarrierCode, range: SegmentRange, cabin: Cabin, amount: Decimal) -> Fare {
    let letter = booking_letter(cabin);
    Fare {
        id: FareId::new(format!("{letter}{}-{}", range.start + 1, range.end + 1)),
        carrier: carrier.clone(),
        fare_basis: format!("{letter}OW{}", range.len()),
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
        booking_codes: vec![BookingCode::new(letter)],
        booking_code_status: BookingCodeStatus::NotProcessed,
        misc_fare_tag_restricted: false,
    }
}
