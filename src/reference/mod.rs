//! Read-only collaborators of the differential pipeline.
//!
//! The pipeline never writes through these traits. Implementations must be
//! safe to share between concurrent invocations.

pub mod memory;
pub mod table;

use crate::core::fare::Fare;
use crate::core::geo::GlobalDirection;
use crate::core::itinerary::{CarrierCode, SegmentRange};
use crate::core::market::{FareMarket, MarketKey};
use crate::core::sector::SelectedFare;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

pub use table::{
    CarrierPreference, DifferentialRow, EffectivePeriod, FarePrecedence, FlightApplication,
    IndustryPricingRow, IntermediateGeo, RowDirectionality,
};

/// Differential, industry-pricing and carrier-preference tables.
pub trait ReferenceData: Send + Sync {
    /// Differential rows of `carrier` in force on `date`, in table order.
    fn differential_rows_for(&self, carrier: &CarrierCode, date: NaiveDate) -> Vec<&DifferentialRow>;

    fn industry_pricing_rows_for(
        &self,
        carrier: &CarrierCode,
        direction: GlobalDirection,
        date: NaiveDate,
    ) -> Vec<&IndustryPricingRow>;

    fn carrier_preference(&self, carrier: &CarrierCode, date: NaiveDate) -> CarrierPreference;
}

/// Fare rule categories re-validated for differential fares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleCategory {
    DayTime,
    Seasonal,
    AdvanceReservation,
    Stopovers,
    Transfers,
    Blackouts,
    MiscFareTags,
}

/// Categories checked before a fare may price a differential sector.
pub const DIFFERENTIAL_RULES: &[RuleCategory] = &[
    RuleCategory::DayTime,
    RuleCategory::Seasonal,
    RuleCategory::AdvanceReservation,
    RuleCategory::Stopovers,
    RuleCategory::Transfers,
    RuleCategory::Blackouts,
    RuleCategory::MiscFareTags,
];

/// Portion of travel a rule re-validation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleScope {
    FareComponent,
    Sector(SegmentRange),
}

pub trait RuleValidator: Send + Sync {
    fn revalidate(&self, fare: &Fare, categories: &[RuleCategory], scope: RuleScope) -> bool;
}

/// Fare markets built by the surrounding pricing run.
pub trait FareMarketResolver: Send + Sync {
    fn fare_market_for(&self, range: SegmentRange, carrier: &CarrierCode) -> Option<&FareMarket>;

    /// Build a market on demand when none was cached.
    fn reprice(&self, _range: SegmentRange, _carrier: &CarrierCode) -> Option<FareMarket> {
        None
    }
}

/// Cached market first, then an on-demand reprice.
pub fn resolve_market<'a>(
    resolver: &'a dyn FareMarketResolver,
    key: &MarketKey,
) -> Option<Cow<'a, FareMarket>> {
    resolver
        .fare_market_for(key.range, &key.carrier)
        .map(Cow::Borrowed)
        .or_else(|| resolver.reprice(key.range, &key.carrier).map(Cow::Owned))
}

/// Higher-intermediate-point plus-up found by the minimum fare engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HipPlusUp {
    /// Fare amount after the plus-up.
    pub amount: Decimal,
    pub board: String,
    pub off: String,
    pub cabin: crate::core::cabin::Cabin,
}

/// Minimum fare result for one fare over one sector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HipCheck {
    #[serde(default)]
    pub plus_up: Option<HipPlusUp>,
    /// Mileage surcharge in percent (5, 10, 15, 20 or 25).
    #[serde(default)]
    pub mileage_surcharge_percent: Decimal,
}

impl HipCheck {
    /// `amount` with the mileage surcharge applied.
    pub fn surcharged(&self, amount: Decimal) -> Decimal {
        amount + amount * self.mileage_surcharge_percent / Decimal::ONE_HUNDRED
    }
}

pub trait MinimumFareEngine: Send + Sync {
    fn higher_intermediate_point(&self, fare: &SelectedFare, range: SegmentRange) -> HipCheck;
}
