//! The differential validation pipeline.
//!
//! One call to [`DifferentialValidator::validate`] runs, in order: sector
//! building, table matching, fare selection, minimum fare adjustment,
//! consolidation and final assembly. Every piece of state lives in the
//! invocation; the validator itself can be shared across threads.

pub mod assembler;
pub mod builder;
pub mod classifier;
pub mod consolidator;
pub mod context;
pub mod hip;
pub mod matcher;
pub mod selector;

#[cfg(test)]
pub(crate) mod fixtures;

use crate::config::ValidatorConfig;
use crate::core::itinerary::FareUsage;
use crate::core::sector::{
    CalculationRecord, DifferentialSector, SectorArena, SectorId, SectorStatus,
};
use crate::error::DifferentialError;
use builder::BuildOutcome;
use context::{FareMarks, PipelineState, Services, ValidationContext};
use hip::HipOutcome;
use log::{debug, info};
use matcher::MatchOutcome;
use rust_decimal::Decimal;
use selector::SelectionOutcome;
use serde::Serialize;
use std::fmt;

/// Why a fare usage failed differential validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FailureReason {
    /// Segments (zero-based) that failed validation and no sector covers.
    SegmentsNotCovered(Vec<usize>),
    /// A segment booked in the through cabin that no neighbour could absorb.
    UnabsorbedSegment(usize),
    /// Differential sectors would replace the whole through fare.
    SectorsSpanComponent,
    /// At least one sector could not be priced.
    SectorsFailed,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::SegmentsNotCovered(segments) => {
                let list: Vec<String> = segments.iter().map(|i| (i + 1).to_string()).collect();
                write!(f, "segments {} fail and need no differential", list.join(","))
            }
            FailureReason::UnabsorbedSegment(index) => {
                write!(f, "segment {} cannot join an adjacent sector", index + 1)
            }
            FailureReason::SectorsSpanComponent => {
                write!(f, "differential sectors cover the whole fare component")
            }
            FailureReason::SectorsFailed => write!(f, "differential sectors failed"),
        }
    }
}

/// Verdict of one validation.
#[derive(Debug, Clone, Serialize)]
pub struct DifferentialOutcome {
    pub passed: bool,
    /// Total differential to add to the through fare. Zero on failure.
    pub amount: Decimal,
    pub failure: Option<FailureReason>,
    /// Calculation recorded on the fare usage by the first matching sector.
    pub calculation: Option<CalculationRecord>,
    /// Every sector created, including consumed ones.
    pub sectors: SectorArena,
    /// Sectors pricing the component, in segment order.
    pub priced: Vec<SectorId>,
}

impl DifferentialOutcome {
    fn no_differential() -> Self {
        Self {
            passed: true,
            amount: Decimal::ZERO,
            failure: None,
            calculation: None,
            sectors: SectorArena::new(),
            priced: Vec::new(),
        }
    }

    fn rejected(reason: FailureReason, sectors: SectorArena) -> Self {
        Self {
            passed: false,
            amount: Decimal::ZERO,
            failure: Some(reason),
            calculation: None,
            sectors,
            priced: Vec::new(),
        }
    }

    pub fn priced_sectors(&self) -> impl Iterator<Item = &DifferentialSector> {
        self.priced.iter().filter_map(|id| self.sectors.get(*id).ok())
    }
}

impl fmt::Display for DifferentialOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.passed {
            writeln!(f, "PASSED  differential {}", self.amount)?;
        } else {
            writeln!(f, "FAILED")?;
        }
        if let Some(reason) = &self.failure {
            writeln!(f, "  reason: {reason}")?;
        }
        if let Some(calc) = &self.calculation {
            if let Some(seq) = calc.sequence {
                writeln!(f, "  table row {seq}: {:?}", calc.policy)?;
            }
        }
        for sector in self.priced_sectors() {
            writeln!(f, "  {sector}")?;
        }
        Ok(())
    }
}

/// Entry point of differential validation.
///
/// # Examples
///
/// ```
/// use cabin_differential::prelude::*;
/// use cabin_differential::reference::memory::{HipSchedule, MarketCatalog, ReferenceTables, RuleOutcomes};
///
/// let reference = ReferenceTables::new();
/// let markets = MarketCatalog::new();
/// let rules = RuleOutcomes::all_pass();
/// let hip = HipSchedule::none();
/// let services = Services {
///     reference: &reference,
///     rules: &rules,
///     markets: &markets,
///     minimum_fares: &hip,
/// };
/// let validator = DifferentialValidator::new(services, ValidatorConfig::default());
/// # let _ = validator;
/// ```
pub struct DifferentialValidator<'a> {
    services: Services<'a>,
    config: ValidatorConfig,
}

impl<'a> DifferentialValidator<'a> {
    pub fn new(services: Services<'a>, config: ValidatorConfig) -> Self {
        Self { services, config }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate `usage` and compute its total differential.
    ///
    /// Structural problems, missing reference data and inconsistent minimum
    /// fare results abort with an error; everything else is a verdict.
    pub fn validate(&self, usage: &FareUsage) -> Result<DifferentialOutcome, DifferentialError> {
        let ctx = ValidationContext::new(usage, self.services, &self.config)?;
        let mut state = PipelineState::new();
        info!(
            "validating {} over {} segments",
            usage.through_fare.fare_basis,
            usage.segment_count()
        );

        match builder::build_sectors(&ctx, &mut state)? {
            BuildOutcome::NoSectors => {
                debug!("no segment booked above the through cabin");
                return Ok(DifferentialOutcome::no_differential());
            }
            BuildOutcome::Rejected(reason) => {
                info!("{}: {reason}", usage.through_fare.fare_basis);
                return Ok(DifferentialOutcome::rejected(reason, state.arena));
            }
            BuildOutcome::Built => {}
        }
        ctx.require_rows()?;

        for id in state.atomic.clone() {
            let mut sector = state.arena.get(id)?.clone();
            if sector.status() == SectorStatus::AdjacentFailed {
                continue;
            }
            price_sector(&ctx, &mut state.marks, &mut sector)?;
            if state.usage_calculation.is_none() && sector.through_number != 0 {
                if let Some(calc) = sector.calculation.as_ref().filter(|c| c.sequence.is_some()) {
                    state.usage_calculation = Some(calc.clone());
                }
            }
            *state.arena.get_mut(id)? = sector;
        }

        if self.config.consolidate {
            consolidator::consolidate(&ctx, &mut state)?;
        }
        assembler::assemble(&ctx, state)
    }
}

/// Match, select and adjust one sector. Returns whether it passed.
pub(crate) fn price_sector(
    ctx: &ValidationContext<'_>,
    marks: &mut FareMarks,
    sector: &mut DifferentialSector,
) -> Result<bool, DifferentialError> {
    if let MatchOutcome::NotPermitted { .. } = matcher::match_sector(ctx, sector)? {
        return Ok(false);
    }
    match selector::select_fares(ctx, marks, sector)? {
        SelectionOutcome::Selected { low, high } => sector.set_fares(low, high),
        SelectionOutcome::NoFareFound { .. } => {
            sector.transition(SectorStatus::Failed)?;
            return Ok(false);
        }
    }
    if hip::adjust(ctx, sector)? == HipOutcome::Rejected {
        sector.transition(SectorStatus::Failed)?;
        return Ok(false);
    }
    sector.transition(SectorStatus::Passed)?;
    Ok(true)
}
