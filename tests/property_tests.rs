use cabin_differential::core::sector::SectorStatus;
use cabin_differential::simulation::generator::{generate_random_scenario, max_segments, ScenarioConfig};
use cabin_differential::simulation::scenario::Scenario;
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::BTreeSet;

/// Generate a seeded scenario of 1..=max segments.
fn arb_scenario() -> impl Strategy<Value = Scenario> {
    (any::<u64>(), 1..=max_segments(), prop::sample::select(vec![0.2, 0.5, 0.8])).prop_map(
        |(seed, segment_count, upgrade_probability)| {
            generate_random_scenario(&ScenarioConfig {
                segment_count,
                upgrade_probability,
                seed: Some(seed),
                ..Default::default()
            })
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    // ===================================================================
    // INVARIANT 1: The differential is never negative.
    //
    // A failed usage carries zero; a passed usage carries the sum of
    // non-negative sector amounts.
    // ===================================================================
    #[test]
    fn amount_never_negative(scenario in arb_scenario()) {
        let outcome = scenario.validate().unwrap();
        prop_assert!(
            outcome.amount >= Decimal::ZERO,
            "Differential {} must be ≥ 0",
            outcome.amount
        );
        if !outcome.passed {
            prop_assert_eq!(outcome.amount, Decimal::ZERO);
        }
    }

    // ===================================================================
    // INVARIANT 2: Priced sectors never overlap.
    //
    // The sectors a verdict reports are disjoint runs of segments, each
    // lying inside the fare component, in itinerary order.
    // ===================================================================
    #[test]
    fn priced_sectors_are_disjoint(scenario in arb_scenario()) {
        let outcome = scenario.validate().unwrap();
        let count = scenario.usage.segment_count();
        let sectors: Vec<_> = outcome.priced_sectors().collect();
        for sector in &sectors {
            prop_assert!(sector.range.start <= sector.range.end);
            prop_assert!(sector.range.end < count);
        }
        for pair in sectors.windows(2) {
            prop_assert!(
                pair[0].range.end < pair[1].range.start,
                "Sectors {} and {} overlap",
                pair[0].range,
                pair[1].range
            );
        }
    }

    // ===================================================================
    // INVARIANT 3: Validation is deterministic.
    //
    // Validating the same scenario twice gives the same verdict, the same
    // amount and the same sectors.
    // ===================================================================
    #[test]
    fn validation_is_deterministic(scenario in arb_scenario()) {
        let first = scenario.validate().unwrap();
        let second = scenario.validate().unwrap();
        prop_assert_eq!(first.passed, second.passed);
        prop_assert_eq!(first.amount, second.amount);
        prop_assert_eq!(first.priced, second.priced);
        prop_assert_eq!(first.sectors.len(), second.sectors.len());
    }

    // ===================================================================
    // INVARIANT 4: A passing verdict covers every upgraded slot once.
    //
    // The through numbers reached from the priced sectors equal the set of
    // atomic through numbers, and the amount is their sum.
    // ===================================================================
    #[test]
    fn passing_verdict_covers_all_slots(scenario in arb_scenario()) {
        let outcome = scenario.validate().unwrap();
        prop_assume!(outcome.passed && !outcome.sectors.is_empty());

        let expected: BTreeSet<u16> = outcome
            .sectors
            .iter()
            .filter(|s| s.is_atomic())
            .map(|s| s.through_number)
            .collect();
        let mut covered = BTreeSet::new();
        let mut total = Decimal::ZERO;
        for id in &outcome.priced {
            let sector = outcome.sectors.get(*id).unwrap();
            prop_assert!(sector.status().is_passing());
            for n in outcome.sectors.through_numbers(*id).unwrap() {
                prop_assert!(covered.insert(n), "Slot {} priced twice", n);
            }
            total += sector.effective_amount();
        }
        prop_assert_eq!(covered, expected);
        prop_assert_eq!(total, outcome.amount);
    }

    // ===================================================================
    // INVARIANT 5: Consolidation never raises the differential.
    //
    // Merges are accepted only when strictly cheaper, so a run with
    // consolidation enabled is never dearer than one without.
    // ===================================================================
    #[test]
    fn consolidation_never_increases_amount(scenario in arb_scenario()) {
        let consolidated = scenario.validate().unwrap();
        let mut atomic_only = scenario.clone();
        atomic_only.config.consolidate = false;
        let atomic = atomic_only.validate().unwrap();
        prop_assume!(consolidated.passed && atomic.passed);
        prop_assert!(
            consolidated.amount <= atomic.amount,
            "Consolidated {} must be ≤ atomic {}",
            consolidated.amount,
            atomic.amount
        );
    }

    // ===================================================================
    // INVARIANT 6: Merged sectors are built only from replaced parts.
    //
    // Every sub-sector of a consolidated pass is marked consolidated-fail.
    // ===================================================================
    #[test]
    fn merged_parts_are_retired(scenario in arb_scenario()) {
        let outcome = scenario.validate().unwrap();
        for sector in outcome.sectors.iter() {
            if sector.status() == SectorStatus::ConsolidatedPass {
                for part in &sector.sub_sectors {
                    prop_assert_eq!(
                        outcome.sectors.get(*part).unwrap().status(),
                        SectorStatus::ConsolidatedFail
                    );
                }
            }
        }
    }
}
