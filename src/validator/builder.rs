use crate::core::cabin::Cabin;
use crate::core::itinerary::{SegmentRange, SegmentStatus};
use crate::core::market::MarketKey;
use crate::core::sector::{DifferentialSector, SectorStatus, SectorTag};
use crate::error::DifferentialError;
use crate::validator::classifier::{classify, CabinComparison, Classification};
use crate::validator::context::{PipelineState, ValidationContext};
use crate::validator::FailureReason;
use log::{debug, info};

/// Result of scanning the fare component for differential sectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Nothing was booked above the through cabin and every segment passed.
    NoSectors,
    /// The component cannot be priced with differentials.
    Rejected(FailureReason),
    /// Atomic sectors were created; see `PipelineState::atomic`.
    Built,
}

/// Outcome of trying to pull an Equal segment into a neighbouring sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Absorption {
    Absorbed,
    /// Absorbed, but no first class fare books both segments.
    AbsorbedFailed,
    NotPossible,
}

/// Run numbering of sector tags.
///
/// Consecutive Higher segments of the same cabin share a run letter and
/// count up the run number. A cabin change moves to the next letter; a Lower
/// segment ends the run, and the letter moves on at the next Higher segment.
struct RunCounter {
    number: u32,
    letter: char,
    letter_used: bool,
    cabin: Option<Cabin>,
}

impl RunCounter {
    fn new() -> Self {
        Self {
            number: 0,
            letter: 'A',
            letter_used: false,
            cabin: None,
        }
    }

    fn break_run(&mut self) {
        self.number = 0;
        self.cabin = None;
    }

    fn next_tag(&mut self, cabin: Cabin) -> Result<SectorTag, DifferentialError> {
        if self.cabin == Some(cabin) {
            self.number += 1;
        } else {
            if self.letter_used {
                self.letter = match self.letter {
                    'A'..='Y' => (self.letter as u8 + 1) as char,
                    last => {
                        return Err(DifferentialError::structural(format!(
                            "no run letter after '{last}' for a {cabin} sector"
                        )))
                    }
                };
            }
            self.number = 1;
        }
        self.letter_used = true;
        self.cabin = Some(cabin);
        SectorTag::atomic(self.number, self.letter, cabin)
    }
}

/// Scan the fare component left to right and create its atomic sectors.
pub fn build_sectors(
    ctx: &ValidationContext<'_>,
    state: &mut PipelineState,
) -> Result<BuildOutcome, DifferentialError> {
    let count = ctx.usage.segment_count();
    let classes: Vec<Classification> = (0..count).map(|i| classify(ctx, i)).collect();
    let mut run = RunCounter::new();
    let mut uncovered = Vec::new();
    let mut pending_equal: Option<usize> = None;
    let mut through_number: u16 = 0;

    for (index, class) in classes.iter().enumerate() {
        match class.comparison {
            CabinComparison::Lower => {
                run.break_run();
                let status = ctx.usage.segment_status[index];
                if status == SegmentStatus::Fail || status.is_booking_code_failure() {
                    uncovered.push(index);
                }
            }
            CabinComparison::Equal => {
                if local_fare_books(ctx, index) {
                    debug!("segment {} priced by a local fare", index + 1);
                    run.break_run();
                    continue;
                }
                if let Some(&previous) = state.atomic.last() {
                    let sector = state.arena.get(previous)?;
                    if sector.range.end + 1 == index && sector.tag.len() == 3 {
                        let mut candidate = sector.clone();
                        let absorption = absorb(ctx, &mut candidate, index, class.cabin)?;
                        if absorption != Absorption::NotPossible {
                            *state.arena.get_mut(previous)? = candidate;
                            continue;
                        }
                    }
                }
                let next_is_higher = classes
                    .get(index + 1)
                    .map_or(false, |c| c.comparison == CabinComparison::Higher);
                if !next_is_higher {
                    info!("segment {} cannot join an adjacent sector", index + 1);
                    return Ok(BuildOutcome::Rejected(FailureReason::UnabsorbedSegment(index)));
                }
                pending_equal = Some(index);
            }
            CabinComparison::Higher => {
                through_number += 1;
                let tag = run.next_tag(class.cabin)?;
                let mut sector = DifferentialSector::new(tag, class.cabin, SegmentRange::single(index));
                sector.through_number = through_number;
                assign_markets(ctx, &mut sector)?;
                if let Some(equal) = pending_equal.take() {
                    let cabin = classes[equal].cabin;
                    if absorb(ctx, &mut sector, equal, cabin)? == Absorption::NotPossible {
                        info!("segment {} cannot join an adjacent sector", equal + 1);
                        return Ok(BuildOutcome::Rejected(FailureReason::UnabsorbedSegment(equal)));
                    }
                }
                debug!("built sector {} over segments {}", sector.tag, sector.range);
                let id = state.arena.insert(sector);
                state.atomic.push(id);
            }
        }
    }

    if state.atomic.is_empty() {
        return Ok(if uncovered.is_empty() {
            BuildOutcome::NoSectors
        } else {
            BuildOutcome::Rejected(FailureReason::SegmentsNotCovered(uncovered))
        });
    }
    if !uncovered.is_empty() {
        return Ok(BuildOutcome::Rejected(FailureReason::SegmentsNotCovered(uncovered)));
    }
    if spans_component(ctx, state)? {
        info!("differential sectors cover the whole fare component");
        return Ok(BuildOutcome::Rejected(FailureReason::SectorsSpanComponent));
    }
    state.top_level = state.atomic.clone();
    Ok(BuildOutcome::Built)
}

/// Primary and fallback markets of a new sector. The primary must exist.
fn assign_markets(
    ctx: &ValidationContext<'_>,
    sector: &mut DifferentialSector,
) -> Result<(), DifferentialError> {
    let key = ctx.market_key_for(sector.range)?;
    if ctx.market(&key).is_none() {
        return Err(DifferentialError::structural(format!(
            "no fare market {key} for sector {}",
            sector.tag
        )));
    }
    sector.fallback_markets = ctx.fallback_key_for(&key).into_iter().collect();
    sector.markets = vec![key];
    Ok(())
}

/// Whether some single-segment fare of the through cabin family books `index`.
fn local_fare_books(ctx: &ValidationContext<'_>, index: usize) -> bool {
    let range = SegmentRange::single(index);
    let segments = ctx.segments(&range);
    let family = ctx.through_cabin.family();
    let mut keys: Vec<MarketKey> = Vec::new();
    if let Ok(key) = ctx.market_key_for(range) {
        keys.push(key);
    }
    for carrier in segments
        .iter()
        .map(|s| s.carrier.clone())
        .chain(std::iter::once(ctx.usage.through_fare.carrier.clone()))
    {
        let key = MarketKey::new(range, carrier);
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys.iter().filter_map(|key| ctx.market(key)).any(|market| {
        market.fares.iter().any(|fare| {
            fare.cabin.family() == family
                && fare.booking_codes_pass(segments, ctx.low_fare_request())
        })
    })
}

/// Extend `sector` over the adjacent segment `index`.
///
/// Not possible when the widened sector would cover the whole component or
/// no market prices it; `sector` is then left untouched. The widened sector
/// stays valid only when a first class fare of its market books every
/// segment, whatever the sector's own cabin.
fn absorb(
    ctx: &ValidationContext<'_>,
    sector: &mut DifferentialSector,
    index: usize,
    absorbed_cabin: Cabin,
) -> Result<Absorption, DifferentialError> {
    let range = sector.range.span(&SegmentRange::single(index));
    if ctx.usage.covers_component(&range) {
        return Ok(Absorption::NotPossible);
    }
    let key = ctx.market_key_for(range)?;
    let Some(market) = ctx.market(&key) else {
        debug!("no market {key} to absorb segment {}", index + 1);
        return Ok(Absorption::NotPossible);
    };
    let segments = ctx.segments(&range);
    let books_both = market
        .fares_in_cabin(Cabin::First)
        .any(|fare| fare.booking_codes_pass(segments, ctx.low_fare_request()));

    sector.tag = sector.tag.absorbing(absorbed_cabin)?;
    sector.range = range;
    sector.absorbed_segment = Some(index);
    sector.fallback_markets = ctx.fallback_key_for(&key).into_iter().collect();
    sector.markets = vec![key];

    if books_both {
        debug!("sector {} absorbed segment {}", sector.tag, index + 1);
        Ok(Absorption::Absorbed)
    } else {
        info!("sector {} absorbed segment {} without a fare", sector.tag, index + 1);
        sector.transition(SectorStatus::AdjacentFailed)?;
        Ok(Absorption::AbsorbedFailed)
    }
}

/// True when the atomic sectors leave no segment of the component uncovered.
fn spans_component(
    ctx: &ValidationContext<'_>,
    state: &PipelineState,
) -> Result<bool, DifferentialError> {
    let mut expected = 0;
    for id in &state.atomic {
        let range = state.arena.get(*id)?.range;
        if range.start != expected {
            return Ok(false);
        }
        expected = range.end + 1;
    }
    Ok(expected == ctx.usage.segment_count())
}
