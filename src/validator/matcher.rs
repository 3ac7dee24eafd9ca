use crate::core::cabin::FareTypeDesignator;
use crate::core::geo::{Directionality, LocSpec, Location};
use crate::core::itinerary::{Segment, SegmentRange};
use crate::core::sector::{
    CalculationPolicy, CalculationRecord, DifferentialSector, IntermediatePair, SectorStatus,
};
use crate::error::DifferentialError;
use crate::reference::{DifferentialRow, FlightApplication, IntermediateGeo, RowDirectionality};
use crate::validator::context::ValidationContext;
use log::{debug, info};

/// Result of matching one sector against the differential table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched(CalculationRecord),
    /// No row matched; fare selection runs with the default policy.
    NotFound,
    /// The first matching row forbids a differential here.
    NotPermitted { sequence: u32 },
}

/// Walk the governing carrier's rows in order and stop at the first match.
///
/// Records the calculation on the sector. A `NotPermitted` row fails the
/// sector unless its sector fare type is generic premium economy, which is
/// priced as `Low`.
pub fn match_sector(
    ctx: &ValidationContext<'_>,
    sector: &mut DifferentialSector,
) -> Result<MatchOutcome, DifferentialError> {
    for row in &ctx.rows {
        if !through_fare_matches(ctx, row) {
            continue;
        }
        let Some(via) = sector_matches(ctx, row, sector) else {
            continue;
        };

        let mut policy = row.calculation;
        if policy == CalculationPolicy::NotPermitted {
            let generic_pe = row
                .intermediate_fare_type
                .map_or(false, |filter| filter.is_generic_premium_economy());
            if !generic_pe {
                info!(
                    "sector {} not permitted by row {}",
                    sector.tag, row.sequence
                );
                sector.calculation = Some(record(row, row.calculation, via));
                sector.transition(SectorStatus::Failed)?;
                return Ok(MatchOutcome::NotPermitted {
                    sequence: row.sequence,
                });
            }
            policy = CalculationPolicy::Low;
        }

        let calculation = record(row, policy, via);
        debug!(
            "sector {} matched row {} ({:?})",
            sector.tag, row.sequence, policy
        );
        sector.calculation = Some(calculation.clone());
        match via {
            Some(IntermediatePair::A) => sector.transition(SectorStatus::MatchedIntermediateA)?,
            Some(IntermediatePair::B) => sector.transition(SectorStatus::MatchedIntermediateB)?,
            None => {}
        }
        return Ok(MatchOutcome::Matched(calculation));
    }

    debug!("sector {} matched no differential row", sector.tag);
    sector.calculation = Some(CalculationRecord::not_found());
    Ok(MatchOutcome::NotFound)
}

fn record(
    row: &DifferentialRow,
    policy: CalculationPolicy,
    via: Option<IntermediatePair>,
) -> CalculationRecord {
    CalculationRecord {
        sequence: Some(row.sequence),
        policy,
        intermediate_fare_type: row.intermediate_fare_type,
        via,
        hip_exempt: row.hip_exempt,
    }
}

/// Row filters applied to the through fare.
fn through_fare_matches(ctx: &ValidationContext<'_>, row: &DifferentialRow) -> bool {
    let usage = ctx.usage;
    let fare = &usage.through_fare;
    let (Some(board), Some(off)) = (usage.board_point(), usage.off_point()) else {
        return false;
    };
    let (from, to) = match fare.directionality {
        Directionality::Outbound => (board, off),
        Directionality::Inbound => (off, board),
    };
    let geography = match row.directionality {
        RowDirectionality::Between => {
            (row.loc1.matches(from) && row.loc2.matches(to))
                || (row.loc1.matches(to) && row.loc2.matches(from))
        }
        RowDirectionality::From => row.loc1.matches(from) && row.loc2.matches(to),
        RowDirectionality::Within => usage
            .segments
            .iter()
            .all(|s| row.loc1.matches(&s.origin) && row.loc1.matches(&s.destination)),
        RowDirectionality::Origin => row.loc1.matches(from) && row.loc2.matches(to),
    };

    geography
        && row
            .global_direction
            .map_or(true, |gd| gd == usage.global_direction)
        && row
            .fare_type
            .map_or(true, |filter| filter.matches(fare.fare_type))
        && row
            .booking_code
            .as_ref()
            .map_or(true, |code| fare.booking_codes.contains(code))
        && row
            .fare_class
            .as_ref()
            .map_or(true, |prefix| fare.fare_basis.starts_with(prefix.as_str()))
}

/// Row filters applied to the sector.
///
/// `None` means the row does not apply. `Some(via)` carries the intermediate
/// pair that matched, if the row has any.
fn sector_matches(
    ctx: &ValidationContext<'_>,
    row: &DifferentialRow,
    sector: &DifferentialSector,
) -> Option<Option<IntermediatePair>> {
    let segments = ctx.segments(&sector.range);
    match row.flight_application {
        FlightApplication::Nonstop if segments.iter().any(|s| !s.hidden_stops.is_empty()) => {
            return None;
        }
        FlightApplication::SameCarrier
            if segments.windows(2).any(|w| w[0].carrier != w[1].carrier) =>
        {
            return None;
        }
        _ => {}
    }

    if !row.has_intermediate_points() {
        return sector_filters_pass(ctx, row, sector, segments).then_some(None);
    }

    let pairs = [
        (IntermediatePair::A, row.intermediate_a.as_ref()),
        (IntermediatePair::B, row.intermediate_b.as_ref()),
    ];
    for (pair, geo) in pairs {
        let Some(geo) = geo else { continue };
        let matched = if row.flight_application == FlightApplication::LastFirst {
            bounded_subrange(ctx, row.directionality, geo, sector.range)
                .map_or(false, |sub| subrange_filters_pass(ctx, row, sub))
        } else {
            let (Some(first), Some(last)) = (segments.first(), segments.last()) else {
                return None;
            };
            points_match(ctx, row.directionality, geo, &first.origin, &last.destination, segments)
                && sector_filters_pass(ctx, row, sector, segments)
        };
        if matched {
            return Some(Some(pair));
        }
    }
    None
}

fn inbound(ctx: &ValidationContext<'_>) -> bool {
    ctx.usage.through_fare.directionality == Directionality::Inbound
}

fn points_match(
    ctx: &ValidationContext<'_>,
    directionality: RowDirectionality,
    geo: &IntermediateGeo,
    board: &Location,
    off: &Location,
    segments: &[Segment],
) -> bool {
    let (l1, l2): (&LocSpec, &LocSpec) = (&geo.loc1, &geo.loc2);
    match directionality {
        RowDirectionality::Between => {
            (l1.matches(board) && l2.matches(off)) || (l1.matches(off) && l2.matches(board))
        }
        RowDirectionality::From if inbound(ctx) => l1.matches(off) && l2.matches(board),
        RowDirectionality::From => l1.matches(board) && l2.matches(off),
        RowDirectionality::Within => segments
            .iter()
            .all(|s| l1.matches(&s.origin) && l1.matches(&s.destination)),
        RowDirectionality::Origin => l1.matches(board),
    }
}

/// Carrier, fare type and booking code filters over a whole sector.
///
/// Only segments booked above the through cabin are held to the booking
/// code; an absorbed segment is not.
fn sector_filters_pass(
    ctx: &ValidationContext<'_>,
    row: &DifferentialRow,
    sector: &DifferentialSector,
    segments: &[Segment],
) -> bool {
    let low_fare = ctx.low_fare_request();
    let carrier_ok = row.intermediate_carrier.as_ref().map_or(true, |carrier| {
        sector.markets.first().map_or(false, |m| &m.carrier == carrier)
            || segments.iter().all(|s| &s.carrier == carrier)
    });
    let fare_type_ok = row
        .intermediate_fare_type
        .map_or(true, |filter| filter.matches(FareTypeDesignator::from(sector.cabin)));
    let booking_ok = row.intermediate_booking_code.as_ref().map_or(true, |code| {
        segments
            .iter()
            .filter(|s| s.effective_cabin(low_fare).is_above(ctx.through_cabin))
            .all(|s| s.effective_booking_code(low_fare) == code)
    });
    carrier_ok && fare_type_ok && booking_ok
}

/// Segment-by-segment filters over a `LastFirst` sub-range.
fn subrange_filters_pass(
    ctx: &ValidationContext<'_>,
    row: &DifferentialRow,
    sub: SegmentRange,
) -> bool {
    let low_fare = ctx.low_fare_request();
    let upgraded: Vec<&Segment> = ctx
        .segments(&sub)
        .iter()
        .filter(|s| s.effective_cabin(low_fare).is_above(ctx.through_cabin))
        .collect();
    !upgraded.is_empty()
        && upgraded.iter().all(|s| {
            row.intermediate_carrier
                .as_ref()
                .map_or(true, |carrier| &s.carrier == carrier)
                && row.intermediate_fare_type.map_or(true, |filter| {
                    filter.matches(FareTypeDesignator::from(s.effective_cabin(low_fare)))
                })
                && row
                    .intermediate_booking_code
                    .as_ref()
                    .map_or(true, |code| s.effective_booking_code(low_fare) == code)
        })
}

/// Sub-range of `within` whose end points are bounded by `geo`.
///
/// The earliest start wins, then the earliest end.
fn bounded_subrange(
    ctx: &ValidationContext<'_>,
    directionality: RowDirectionality,
    geo: &IntermediateGeo,
    within: SegmentRange,
) -> Option<SegmentRange> {
    let segments = &ctx.usage.segments;
    let find = |start_spec: &LocSpec, end_spec: &LocSpec| -> Option<SegmentRange> {
        within.indices().find_map(|s| {
            if !start_spec.matches(&segments.get(s)?.origin) {
                return None;
            }
            (s..=within.end)
                .find(|e| {
                    segments
                        .get(*e)
                        .map_or(false, |seg| end_spec.matches(&seg.destination))
                })
                .map(|e| SegmentRange::new(s, e))
        })
    };
    match directionality {
        RowDirectionality::Between => {
            find(&geo.loc1, &geo.loc2).or_else(|| find(&geo.loc2, &geo.loc1))
        }
        RowDirectionality::From if inbound(ctx) => find(&geo.loc2, &geo.loc1),
        RowDirectionality::From => find(&geo.loc1, &geo.loc2),
        RowDirectionality::Within => find(&geo.loc1, &geo.loc1),
        RowDirectionality::Origin => find(&geo.loc1, &LocSpec::Any),
    }
}
