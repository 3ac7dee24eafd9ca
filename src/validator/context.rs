use crate::config::ValidatorConfig;
use crate::core::cabin::Cabin;
use crate::core::fare::FareId;
use crate::core::itinerary::{FareUsage, Segment, SegmentRange};
use crate::core::market::{resolve_governing_carrier, FareMarket, MarketKey};
use crate::core::sector::{CalculationRecord, SectorArena, SectorId, SectorTag};
use crate::error::DifferentialError;
use crate::reference::{
    resolve_market, CarrierPreference, DifferentialRow, FareMarketResolver, FarePrecedence,
    MinimumFareEngine, ReferenceData, RuleValidator,
};
use chrono::NaiveDate;
use log::error;
use std::borrow::Cow;
use std::collections::BTreeSet;

/// The read-only services one invocation consults.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub reference: &'a dyn ReferenceData,
    pub rules: &'a dyn RuleValidator,
    pub markets: &'a dyn FareMarketResolver,
    pub minimum_fares: &'a dyn MinimumFareEngine,
}

/// Immutable view of one invocation: the fare usage, its services and the
/// reference data resolved for it.
pub struct ValidationContext<'a> {
    pub usage: &'a FareUsage,
    pub services: Services<'a>,
    pub config: &'a ValidatorConfig,
    pub through_cabin: Cabin,
    pub travel_date: NaiveDate,
    /// Governing carrier's differential rows, in table order.
    pub rows: Vec<&'a DifferentialRow>,
    pub preference: CarrierPreference,
}

impl<'a> ValidationContext<'a> {
    /// Check the parallel inputs and resolve per-invocation reference data.
    pub fn new(
        usage: &'a FareUsage,
        services: Services<'a>,
        config: &'a ValidatorConfig,
    ) -> Result<Self, DifferentialError> {
        if usage.segment_status.len() != usage.segments.len() {
            return Err(DifferentialError::structural(format!(
                "{} segment statuses for {} segments",
                usage.segment_status.len(),
                usage.segments.len()
            )));
        }
        let travel_date = usage
            .travel_date()
            .ok_or_else(|| DifferentialError::structural("fare usage has no segments"))?;
        let carrier = &usage.governing_carrier;
        Ok(Self {
            usage,
            services,
            config,
            through_cabin: usage.through_fare.cabin,
            travel_date,
            rows: services.reference.differential_rows_for(carrier, travel_date),
            preference: services.reference.carrier_preference(carrier, travel_date),
        })
    }

    /// Differential rows are only required once a sector exists.
    pub fn require_rows(&self) -> Result<(), DifferentialError> {
        if self.rows.is_empty() {
            error!(
                "no differential rows for {} on {}",
                self.usage.governing_carrier, self.travel_date
            );
            return Err(DifferentialError::ReferenceDataMissing {
                carrier: self.usage.governing_carrier.clone(),
                date: self.travel_date,
            });
        }
        Ok(())
    }

    pub fn low_fare_request(&self) -> bool {
        self.usage.low_fare_request
    }

    pub fn segments(&self, range: &SegmentRange) -> &'a [Segment] {
        self.usage.segments_in(range)
    }

    /// Primary market key for `range`: industry override, explicit override,
    /// then normal governing-carrier determination.
    pub fn market_key_for(&self, range: SegmentRange) -> Result<MarketKey, DifferentialError> {
        let carrier = resolve_governing_carrier(
            self.segments(&range),
            &self.usage.carrier_override,
            &self.config.industry_carrier,
        )
        .ok_or_else(|| {
            DifferentialError::structural(format!("no governing carrier for segments {range}"))
        })?;
        Ok(MarketKey::new(range, carrier))
    }

    /// Current-carrier fallback: the through fare's own carrier, when it
    /// differs from the primary and a market exists for it.
    pub fn fallback_key_for(&self, primary: &MarketKey) -> Option<MarketKey> {
        let carrier = &self.usage.through_fare.carrier;
        if carrier == &primary.carrier {
            return None;
        }
        let key = MarketKey::new(primary.range, carrier.clone());
        self.market(&key).map(|_| key)
    }

    pub fn market(&self, key: &MarketKey) -> Option<Cow<'a, FareMarket>> {
        resolve_market(self.services.markets, key)
    }

    /// Governing-carrier vs. industry fare precedence over `range`.
    pub fn precedence_for(&self, range: &SegmentRange) -> FarePrecedence {
        let segments = self.segments(range);
        let (Some(first), Some(last)) = (segments.first(), segments.last()) else {
            return FarePrecedence::default();
        };
        let board = &first.origin;
        let off = &last.destination;
        self.services
            .reference
            .industry_pricing_rows_for(
                &self.usage.governing_carrier,
                self.usage.global_direction,
                first.departure,
            )
            .into_iter()
            .find(|row| {
                (row.loc1.matches(board) && row.loc2.matches(off))
                    || (row.loc1.matches(off) && row.loc2.matches(board))
            })
            .map_or(FarePrecedence::default(), |row| row.precedence)
    }
}

/// Per-invocation marks on fares that short-circuit repeat evaluation.
#[derive(Debug, Clone, Default)]
pub struct FareMarks {
    lower_cabin_only: BTreeSet<FareId>,
    failed_on_tag: BTreeSet<(FareId, String)>,
}

impl FareMarks {
    pub fn mark_lower_cabin_only(&mut self, fare: &FareId) {
        self.lower_cabin_only.insert(fare.clone());
    }

    pub fn mark_failed_on(&mut self, fare: &FareId, tag: &SectorTag) {
        self.failed_on_tag.insert((fare.clone(), tag.as_str().to_string()));
    }

    pub fn excludes(&self, fare: &FareId, tag: &SectorTag) -> bool {
        self.lower_cabin_only.contains(fare)
            || self
                .failed_on_tag
                .contains(&(fare.clone(), tag.as_str().to_string()))
    }
}

/// Mutable state of one invocation.
#[derive(Debug, Default)]
pub struct PipelineState {
    pub arena: SectorArena,
    /// Atomic sectors in segment order, as built.
    pub atomic: Vec<SectorId>,
    /// Sectors currently pricing the component, in segment order.
    pub top_level: Vec<SectorId>,
    /// Calculation record stamped on the fare usage by the first atomic match.
    pub usage_calculation: Option<CalculationRecord>,
    pub marks: FareMarks,
}

impl PipelineState {
    pub fn new() -> Self {
        Self::default()
    }
}
