use crate::core::sector::{SectorId, SectorStatus};
use crate::error::DifferentialError;
use crate::validator::context::{PipelineState, ValidationContext};
use crate::validator::{DifferentialOutcome, FailureReason};
use log::{info, warn};
use rust_decimal::Decimal;
use std::collections::BTreeSet;

/// Final coverage check, verdict and total.
///
/// Consolidated sectors survive only if, together with the atomic sectors
/// that passed on their own, they cover every atomic slot of the component.
/// Otherwise every consolidated pass is demoted.
pub fn assemble(
    ctx: &ValidationContext<'_>,
    mut state: PipelineState,
) -> Result<DifferentialOutcome, DifferentialError> {
    let mut expected = BTreeSet::new();
    for id in &state.atomic {
        expected.insert(state.arena.get(*id)?.through_number);
    }

    let mut covered = BTreeSet::new();
    for id in &state.top_level {
        let sector = state.arena.get(*id)?;
        match sector.status() {
            SectorStatus::ConsolidatedPass if sector.has_both_fares() => {
                covered.extend(state.arena.through_numbers(*id)?);
            }
            SectorStatus::Passed if sector.is_atomic() => {
                covered.insert(sector.through_number);
            }
            _ => {}
        }
    }

    let consolidated: Vec<SectorId> = state
        .top_level
        .iter()
        .copied()
        .filter(|id| {
            state
                .arena
                .get(*id)
                .map_or(false, |s| s.status() == SectorStatus::ConsolidatedPass)
        })
        .collect();
    if covered != expected && !consolidated.is_empty() {
        warn!(
            "consolidated sectors cover {:?} of {:?}, demoting",
            covered, expected
        );
        for id in &consolidated {
            state
                .arena
                .get_mut(*id)?
                .transition(SectorStatus::CombinationFailed)?;
        }
    }

    let consolidated_pass = state.top_level.iter().any(|id| {
        state.arena.get(*id).map_or(false, |s| {
            s.status() == SectorStatus::ConsolidatedPass && s.has_both_fares()
        })
    });
    let passed = consolidated_pass
        || state.arena.iter().all(|s| {
            matches!(
                s.status(),
                SectorStatus::Passed | SectorStatus::ConsolidatedFail
            )
        });

    let amount = if passed {
        let mut total = Decimal::ZERO;
        for id in &state.top_level {
            let sector = state.arena.get(*id)?;
            if sector.status().is_passing() {
                total += sector.effective_amount();
            }
        }
        total
    } else {
        Decimal::ZERO
    };

    info!(
        "{} {}: differential {} over {} sectors",
        ctx.usage.through_fare.fare_basis,
        if passed { "passed" } else { "failed" },
        amount,
        state.top_level.len()
    );
    Ok(DifferentialOutcome {
        passed,
        amount,
        failure: (!passed).then_some(FailureReason::SectorsFailed),
        calculation: state.usage_calculation,
        priced: state.top_level,
        sectors: state.arena,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cabin::Cabin;
    use crate::core::itinerary::SegmentRange;
    use crate::core::itinerary::SegmentStatus::*;
    use crate::core::market::MarketKey;
    use crate::core::sector::{DifferentialSector, SectorTag, SelectedFare};
    use crate::validator::fixtures::*;
    use rust_decimal_macros::dec;

    fn passed_atomic(state: &mut PipelineState, number: u16, index: usize, amount: Decimal) -> SectorId {
        let range = SegmentRange::single(index);
        let key = MarketKey::new(range, carrier());
        let mut sector = DifferentialSector::new(
            SectorTag::atomic(number as u32, 'A', Cabin::Business).unwrap(),
            Cabin::Business,
            range,
        );
        sector.through_number = number;
        sector.set_fares(
            SelectedFare::from_fare(&fare("Y", Cabin::Economy, "Y", dec!(100)), key.clone()),
            SelectedFare::from_fare(&fare("J", Cabin::Business, "J", dec!(100) + amount), key),
        );
        sector.transition(SectorStatus::Passed).unwrap();
        let id = state.arena.insert(sector);
        state.atomic.push(id);
        state.top_level.push(id);
        id
    }

    fn usage() -> crate::core::itinerary::FareUsage {
        usage_of(
            vec![
                (segment("LON", "PAR", "J", Cabin::Business), BookingCodeFail),
                (segment("PAR", "FRA", "J", Cabin::Business), BookingCodeFail),
                (segment("FRA", "ROM", "Y", Cabin::Economy), Pass),
            ],
            economy_through(),
        )
    }

    #[test]
    fn test_all_passed_sums_amounts() {
        let world = World::new();
        let usage = usage();
        let ctx = world.context(&usage).unwrap();
        let mut state = PipelineState::new();
        passed_atomic(&mut state, 1, 0, dec!(120));
        passed_atomic(&mut state, 2, 1, dec!(80));
        let outcome = assemble(&ctx, state).unwrap();
        assert!(outcome.passed);
        assert_eq!(outcome.amount, dec!(200));
    }

    #[test]
    fn test_failed_sector_fails_without_amount() {
        let world = World::new();
        let usage = usage();
        let ctx = world.context(&usage).unwrap();
        let mut state = PipelineState::new();
        passed_atomic(&mut state, 1, 0, dec!(120));
        let mut sector = DifferentialSector::new(
            SectorTag::atomic(2, 'A', Cabin::Business).unwrap(),
            Cabin::Business,
            SegmentRange::single(1),
        );
        sector.through_number = 2;
        sector.transition(SectorStatus::Failed).unwrap();
        let bad = state.arena.insert(sector);
        state.atomic.push(bad);
        state.top_level.push(bad);

        let outcome = assemble(&ctx, state).unwrap();
        assert!(!outcome.passed);
        assert_eq!(outcome.amount, Decimal::ZERO);
        assert_eq!(outcome.failure, Some(FailureReason::SectorsFailed));
    }

    #[test]
    fn test_incomplete_consolidation_is_demoted() {
        let world = World::new();
        let usage = usage();
        let ctx = world.context(&usage).unwrap();
        let mut state = PipelineState::new();
        let a = passed_atomic(&mut state, 1, 0, dec!(100));
        // A merge that claims to replace `a` but whose tree misses slot 2.
        let mut merged = state.arena.get(a).unwrap().clone();
        merged.through_number = 0;
        merged.sub_sectors = vec![a];
        merged.transition(SectorStatus::ConsolidatedPass).unwrap();
        state.arena.get_mut(a).unwrap().transition(SectorStatus::ConsolidatedFail).unwrap();
        let m = state.arena.insert(merged);

        let mut lonely = DifferentialSector::new(
            SectorTag::atomic(2, 'A', Cabin::Business).unwrap(),
            Cabin::Business,
            SegmentRange::single(1),
        );
        lonely.through_number = 2;
        lonely.transition(SectorStatus::Failed).unwrap();
        let b = state.arena.insert(lonely);
        state.atomic.push(b);
        state.top_level = vec![m, b];

        let outcome = assemble(&ctx, state).unwrap();
        assert!(!outcome.passed);
        assert_eq!(
            outcome.sectors.get(m).unwrap().status(),
            SectorStatus::CombinationFailed
        );
    }
}
