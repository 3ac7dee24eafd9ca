//! In-memory collaborators, loadable from JSON.
//!
//! Used by the command line tool and by tests; production callers plug in
//! their own cached lookup services.

use crate::core::fare::{Fare, FareId};
use crate::core::geo::GlobalDirection;
use crate::core::itinerary::{CarrierCode, SegmentRange};
use crate::core::market::FareMarket;
use crate::core::sector::SelectedFare;
use crate::reference::{
    CarrierPreference, DifferentialRow, FareMarketResolver, HipCheck, IndustryPricingRow,
    MinimumFareEngine, ReferenceData, RuleCategory, RuleScope, RuleValidator,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Reference tables keyed by carrier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceTables {
    #[serde(default)]
    pub differential: BTreeMap<CarrierCode, Vec<DifferentialRow>>,
    #[serde(default)]
    pub industry_pricing: Vec<IndustryPricingRow>,
    #[serde(default)]
    pub preferences: BTreeMap<CarrierCode, CarrierPreference>,
}

impl ReferenceTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, carrier: CarrierCode, rows: Vec<DifferentialRow>) -> Self {
        self.differential.entry(carrier).or_default().extend(rows);
        self
    }

    pub fn with_preference(mut self, carrier: CarrierCode, preference: CarrierPreference) -> Self {
        self.preferences.insert(carrier, preference);
        self
    }

    pub fn with_industry_row(mut self, row: IndustryPricingRow) -> Self {
        self.industry_pricing.push(row);
        self
    }
}

impl ReferenceData for ReferenceTables {
    fn differential_rows_for(&self, carrier: &CarrierCode, date: NaiveDate) -> Vec<&DifferentialRow> {
        self.differential
            .get(carrier)
            .map(|rows| rows.iter().filter(|r| r.period.is_active(date)).collect())
            .unwrap_or_default()
    }

    fn industry_pricing_rows_for(
        &self,
        carrier: &CarrierCode,
        direction: GlobalDirection,
        date: NaiveDate,
    ) -> Vec<&IndustryPricingRow> {
        self.industry_pricing
            .iter()
            .filter(|r| &r.carrier == carrier)
            .filter(|r| r.global_direction.map_or(true, |gd| gd == direction))
            .filter(|r| r.period.is_active(date))
            .collect()
    }

    fn carrier_preference(&self, carrier: &CarrierCode, _date: NaiveDate) -> CarrierPreference {
        self.preferences.get(carrier).copied().unwrap_or_default()
    }
}

/// Fare markets of one pricing request.
///
/// `repricing` holds markets that are only produced on demand.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketCatalog {
    #[serde(default)]
    pub markets: Vec<FareMarket>,
    #[serde(default)]
    pub repricing: Vec<FareMarket>,
}

impl MarketCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_market(mut self, market: FareMarket) -> Self {
        self.markets.push(market);
        self
    }

    pub fn with_repriced_market(mut self, market: FareMarket) -> Self {
        self.repricing.push(market);
        self
    }

    pub fn all_fares(&self) -> impl Iterator<Item = &Fare> {
        self.markets
            .iter()
            .chain(self.repricing.iter())
            .flat_map(|m| m.fares.iter())
    }
}

impl FareMarketResolver for MarketCatalog {
    fn fare_market_for(&self, range: SegmentRange, carrier: &CarrierCode) -> Option<&FareMarket> {
        self.markets
            .iter()
            .find(|m| m.range == range && &m.governing_carrier == carrier)
    }

    fn reprice(&self, range: SegmentRange, carrier: &CarrierCode) -> Option<FareMarket> {
        self.repricing
            .iter()
            .find(|m| m.range == range && &m.governing_carrier == carrier)
            .cloned()
    }
}

/// Rule re-validation outcomes: every fare passes unless listed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleOutcomes {
    #[serde(default)]
    pub failing: BTreeSet<FareId>,
}

impl RuleOutcomes {
    pub fn all_pass() -> Self {
        Self::default()
    }

    pub fn failing(mut self, fare: FareId) -> Self {
        self.failing.insert(fare);
        self
    }
}

impl RuleValidator for RuleOutcomes {
    fn revalidate(&self, fare: &Fare, _categories: &[RuleCategory], _scope: RuleScope) -> bool {
        !self.failing.contains(&fare.id)
    }
}

/// Minimum fare results per fare; unlisted fares have no plus-up.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HipSchedule {
    #[serde(default)]
    pub checks: BTreeMap<FareId, HipCheck>,
}

impl HipSchedule {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_check(mut self, fare: FareId, check: HipCheck) -> Self {
        self.checks.insert(fare, check);
        self
    }
}

impl MinimumFareEngine for HipSchedule {
    fn higher_intermediate_point(&self, fare: &SelectedFare, _range: SegmentRange) -> HipCheck {
        self.checks.get(&fare.fare_id).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sector::CalculationPolicy;
    use crate::reference::EffectivePeriod;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    #[test]
    fn test_rows_filtered_by_date_in_table_order() {
        let mut early = DifferentialRow::open(10, CalculationPolicy::Low);
        early.period = EffectivePeriod {
            effective: None,
            discontinue: Some(date(3, 31)),
        };
        let late = DifferentialRow::open(20, CalculationPolicy::High);
        let always = DifferentialRow::open(5, CalculationPolicy::Same);
        let tables = ReferenceTables::new()
            .with_rows(CarrierCode::new("AA"), vec![early, late, always]);

        let april: Vec<u32> = tables
            .differential_rows_for(&CarrierCode::new("AA"), date(4, 1))
            .iter()
            .map(|r| r.sequence)
            .collect();
        assert_eq!(april, vec![20, 5]);

        let march = tables.differential_rows_for(&CarrierCode::new("AA"), date(3, 1));
        assert_eq!(march.len(), 3);
        assert!(tables
            .differential_rows_for(&CarrierCode::new("UA"), date(3, 1))
            .is_empty());
    }

    #[test]
    fn test_missing_preference_defaults_closed() {
        let tables = ReferenceTables::new();
        let pref = tables.carrier_preference(&CarrierCode::new("AA"), date(1, 1));
        assert!(!pref.allow_premium_economy_slide);
        assert!(!pref.allow_non_premium_slide);
    }
}
