//! Builders shared by the pipeline unit tests.

use crate::config::ValidatorConfig;
use crate::core::cabin::{Cabin, FareTypeDesignator};
use crate::core::fare::{BookingCodeStatus, Fare, FareId, FareRestriction, FareTrip};
use crate::core::geo::{Directionality, GlobalDirection, Location};
use crate::core::itinerary::{
    BookingCode, CarrierCode, CarrierOverride, FareUsage, PassengerType, Segment, SegmentRange,
    SegmentStatus, TripType,
};
use crate::core::market::FareMarket;
use crate::core::sector::CalculationPolicy;
use crate::error::DifferentialError;
use crate::reference::memory::{HipSchedule, MarketCatalog, ReferenceTables, RuleOutcomes};
use crate::reference::{CarrierPreference, DifferentialRow, HipCheck};
use crate::validator::context::{Services, ValidationContext};
use chrono::NaiveDate;
use rust_decimal::Decimal;

pub fn carrier() -> CarrierCode {
    CarrierCode::new("BA")
}

pub fn travel_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()
}

pub fn loc(code: &str) -> Location {
    let (nation, area) = match code {
        "LON" => ("GB", 2),
        "PAR" => ("FR", 2),
        "FRA" => ("DE", 2),
        "ROM" => ("IT", 2),
        "ATH" => ("GR", 2),
        "NYC" => ("US", 1),
        _ => ("ZZ", 3),
    };
    Location::new(code, nation, area)
}

pub fn segment(from: &str, to: &str, code: &str, cabin: Cabin) -> Segment {
    Segment {
        origin: loc(from),
        destination: loc(to),
        carrier: carrier(),
        booking_code: BookingCode::new(code),
        cabin,
        departure: travel_date(),
        hidden_stops: Vec::new(),
        rebooked: None,
    }
}

pub fn fare(id: &str, cabin: Cabin, code: &str, amount: Decimal) -> Fare {
    Fare {
        id: FareId::new(id),
        carrier: carrier(),
        fare_basis: id.to_string(),
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

pub fn economy_through() -> Fare {
    fare("YTHRU", Cabin::Economy, "Y", Decimal::new(1000, 0))
}

pub fn market(start: usize, end: usize, fares: Vec<Fare>) -> FareMarket {
    FareMarket {
        range: SegmentRange::new(start, end),
        governing_carrier: carrier(),
        fares,
    }
}

pub fn usage_of(segments: Vec<(Segment, SegmentStatus)>, through_fare: Fare) -> FareUsage {
    let (segments, segment_status) = segments.into_iter().unzip();
    FareUsage {
        through_fare,
        segments,
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

/// Collaborators of one test, with one open `Low` row for the carrier.
pub struct World {
    pub reference: ReferenceTables,
    pub markets: MarketCatalog,
    pub rules: RuleOutcomes,
    pub minimum_fares: HipSchedule,
    pub config: ValidatorConfig,
}

impl World {
    pub fn new() -> Self {
        Self {
            reference: ReferenceTables::new()
                .with_rows(carrier(), vec![DifferentialRow::open(100, CalculationPolicy::Low)]),
            markets: MarketCatalog::new(),
            rules: RuleOutcomes::all_pass(),
            minimum_fares: HipSchedule::none(),
            config: ValidatorConfig::default(),
        }
    }

    pub fn with_rows(mut self, rows: Vec<DifferentialRow>) -> Self {
        self.reference.differential.insert(carrier(), rows);
        self
    }

    pub fn with_preference(mut self, preference: CarrierPreference) -> Self {
        self.reference = self.reference.with_preference(carrier(), preference);
        self
    }

    pub fn with_market(mut self, market: FareMarket) -> Self {
        self.markets = self.markets.with_market(market);
        self
    }

    pub fn with_hip(mut self, fare: &str, check: HipCheck) -> Self {
        self.minimum_fares = self.minimum_fares.with_check(FareId::new(fare), check);
        self
    }

    pub fn services(&self) -> Services<'_> {
        Services {
            reference: &self.reference,
            rules: &self.rules,
            markets: &self.markets,
            minimum_fares: &self.minimum_fares,
        }
    }

    pub fn context<'a>(
        &'a self,
        usage: &'a FareUsage,
    ) -> Result<ValidationContext<'a>, DifferentialError> {
        ValidationContext::new(usage, self.services(), &self.config)
    }
}
