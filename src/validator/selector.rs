use crate::core::cabin::Cabin;
use crate::core::fare::Fare;
use crate::core::itinerary::CarrierCode;
use crate::core::market::MarketKey;
use crate::core::sector::{DifferentialSector, SelectedFare};
use crate::error::DifferentialError;
use crate::reference::{CarrierPreference, FarePrecedence, RuleScope, DIFFERENTIAL_RULES};
use crate::validator::context::{FareMarks, ValidationContext};
use log::{debug, warn};
use std::cmp::Ordering;

/// Result of the fare search for one sector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    Selected { low: SelectedFare, high: SelectedFare },
    NoFareFound { low_found: bool, high_found: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    /// Dearest eligible fare of the through cabin (or one below).
    Low,
    /// Cheapest eligible fare of the booked cabin (or a permitted slide).
    High,
}

#[derive(Default)]
struct Search {
    low: Option<SelectedFare>,
    high: Option<SelectedFare>,
}

impl Search {
    fn complete(&self) -> bool {
        self.low.is_some() && self.high.is_some()
    }
}

/// Whether the carrier lets a fare search move from `from` to `to`.
pub fn slide_permitted(preference: &CarrierPreference, from: Cabin, to: Cabin) -> bool {
    if from == Cabin::PremiumEconomy || to == Cabin::PremiumEconomy {
        preference.allow_premium_economy_slide
    } else if from.is_premium() || to.is_premium() {
        preference.allow_premium_business_slide
    } else {
        preference.allow_non_premium_slide
    }
}

/// Find the high and low fares of `sector`.
///
/// Primary markets are searched first; the through carrier's fallback
/// markets only when the primary search leaves a side empty. When the
/// policy requires the through fare's restriction class and nothing is
/// found, the search runs once more without it.
///
/// Low-fare requests search the high side only, against the rebooked
/// booking codes; the through fare stands as the low side.
pub fn select_fares(
    ctx: &ValidationContext<'_>,
    marks: &mut FareMarks,
    sector: &DifferentialSector,
) -> Result<SelectionOutcome, DifferentialError> {
    if sector.markets.is_empty() && sector.fallback_markets.is_empty() {
        return Err(DifferentialError::structural(format!(
            "sector {} has no fare markets",
            sector.tag
        )));
    }
    let precedence = ctx.precedence_for(&sector.range);
    let same_restriction = sector.policy().requires_same_restriction();
    let through_low = if ctx.low_fare_request() {
        through_fare_as_low(ctx, sector)
    } else {
        None
    };

    let mut search = run_search(ctx, marks, sector, precedence, same_restriction, through_low.as_ref());
    if !search.complete() && same_restriction && ctx.config.relax_restriction_on_retry {
        debug!("sector {}: retrying without restriction match", sector.tag);
        search = run_search(ctx, marks, sector, precedence, false, through_low.as_ref());
    }

    Ok(match search {
        Search {
            low: Some(low),
            high: Some(high),
        } => {
            debug!(
                "sector {}: high {} {} low {} {}",
                sector.tag, high.fare_basis, high.amount, low.fare_basis, low.amount
            );
            SelectionOutcome::Selected { low, high }
        }
        Search { low, high } => {
            debug!("sector {}: no differential fares", sector.tag);
            SelectionOutcome::NoFareFound {
                low_found: low.is_some(),
                high_found: high.is_some(),
            }
        }
    })
}

/// The through fare priced in the sector's primary market.
fn through_fare_as_low(ctx: &ValidationContext<'_>, sector: &DifferentialSector) -> Option<SelectedFare> {
    let key = sector.markets.first().or_else(|| sector.fallback_markets.first())?;
    debug!(
        "sector {}: low-fare request, through fare {} is the low side",
        sector.tag, ctx.usage.through_fare.fare_basis
    );
    Some(SelectedFare::from_fare(&ctx.usage.through_fare, key.clone()))
}

fn run_search(
    ctx: &ValidationContext<'_>,
    marks: &mut FareMarks,
    sector: &DifferentialSector,
    precedence: FarePrecedence,
    same_restriction: bool,
    fixed_low: Option<&SelectedFare>,
) -> Search {
    let mut search = Search {
        low: fixed_low.cloned(),
        high: None,
    };
    let industry = &ctx.config.industry_carrier;
    for group in [&sector.markets, &sector.fallback_markets] {
        for key in group {
            let Some(market) = ctx.market(key) else {
                warn!("market {key} vanished while pricing sector {}", sector.tag);
                continue;
            };
            let governing = &market.governing_carrier;
            if fixed_low.is_none() {
                let low = pick(ctx, marks, sector, &market.fares, key, Side::Low, precedence, same_restriction);
                search.low = better(search.low.take(), low, Side::Low, precedence, governing, industry);
            }
            let high = pick(ctx, marks, sector, &market.fares, key, Side::High, precedence, same_restriction);
            search.high = better(search.high.take(), high, Side::High, precedence, governing, industry);
        }
        if search.complete() {
            break;
        }
    }
    search
}

/// Cabins searched for one side, in order; the first cabin yielding a fare wins.
fn cabins_for(ctx: &ValidationContext<'_>, sector: &DifferentialSector, side: Side) -> Vec<Cabin> {
    let through = ctx.through_cabin;
    match side {
        Side::Low => {
            let mut cabins = vec![through];
            if sector.policy().allows_low_slide() {
                if let Some(lower) = through.next_lower() {
                    if slide_permitted(&ctx.preference, through, lower) {
                        cabins.push(lower);
                    }
                }
            }
            cabins
        }
        Side::High => {
            let mut cabins = vec![sector.cabin];
            let mut current = sector.cabin;
            while let Some(next) = current.next_lower() {
                if !next.is_above(through) || !slide_permitted(&ctx.preference, current, next) {
                    break;
                }
                cabins.push(next);
                current = next;
            }
            cabins
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn pick(
    ctx: &ValidationContext<'_>,
    marks: &mut FareMarks,
    sector: &DifferentialSector,
    fares: &[Fare],
    key: &MarketKey,
    side: Side,
    precedence: FarePrecedence,
    same_restriction: bool,
) -> Option<SelectedFare> {
    for cabin in cabins_for(ctx, sector, side) {
        let mut best: Option<SelectedFare> = None;
        for fare in fares.iter().filter(|f| f.cabin == cabin) {
            if !eligible(ctx, marks, sector, fare, &key.carrier, precedence, same_restriction) {
                continue;
            }
            if side == Side::High && !high_side_valid(ctx, marks, sector, fare) {
                continue;
            }
            let candidate = SelectedFare::from_fare(fare, key.clone());
            best = better(
                best,
                Some(candidate),
                side,
                precedence,
                &key.carrier,
                &ctx.config.industry_carrier,
            );
        }
        if best.is_some() {
            return best;
        }
    }
    None
}

/// Filters shared by both sides.
fn eligible(
    ctx: &ValidationContext<'_>,
    marks: &FareMarks,
    sector: &DifferentialSector,
    fare: &Fare,
    governing: &CarrierCode,
    precedence: FarePrecedence,
    same_restriction: bool,
) -> bool {
    let through = &ctx.usage.through_fare;
    let carrier_ok = &fare.carrier == governing
        || (fare.carrier == ctx.config.industry_carrier && precedence.allows_industry());
    fare.normal
        && !fare.fare_by_rule
        && !fare.private_tariff
        && !fare.misc_fare_tag_restricted
        && carrier_ok
        && fare.directionality == through.directionality
        && fare.trip.allows(ctx.usage.trip_type)
        && fare.applies_to(&ctx.usage.passenger_type)
        && (!same_restriction || fare.restriction == through.restriction)
        && !marks.excludes(&fare.id, &sector.tag)
        && ctx
            .services
            .rules
            .revalidate(fare, DIFFERENTIAL_RULES, RuleScope::Sector(sector.range))
}

/// Premium economy compatibility and booking codes of a high-side fare.
///
/// Failures are remembered so later sectors skip the fare.
fn high_side_valid(
    ctx: &ValidationContext<'_>,
    marks: &mut FareMarks,
    sector: &DifferentialSector,
    fare: &Fare,
) -> bool {
    let pe_filter = sector
        .calculation
        .as_ref()
        .and_then(|c| c.intermediate_fare_type)
        .filter(|f| f.targets_premium_economy());
    if let Some(filter) = pe_filter {
        if !(fare.fare_type.is_premium_economy() && filter.matches(fare.fare_type)) {
            debug!("fare {} limited to lower cabins", fare.id);
            marks.mark_lower_cabin_only(&fare.id);
            return false;
        }
    }
    if !fare.booking_codes_pass(ctx.segments(&sector.range), ctx.low_fare_request()) {
        debug!("fare {} fails booking codes on {}", fare.id, sector.tag);
        marks.mark_failed_on(&fare.id, &sector.tag);
        return false;
    }
    true
}

/// Keep the cheaper high (dearer low). On equal amounts under
/// `PreferCarrier`, a carrier fare replaces an industry one.
fn better(
    current: Option<SelectedFare>,
    candidate: Option<SelectedFare>,
    side: Side,
    precedence: FarePrecedence,
    governing: &CarrierCode,
    industry: &CarrierCode,
) -> Option<SelectedFare> {
    let (current, candidate) = match (current, candidate) {
        (None, c) => return c,
        (c, None) => return c,
        (Some(a), Some(b)) => (a, b),
    };
    let order = match side {
        Side::High => candidate.amount.cmp(&current.amount),
        Side::Low => current.amount.cmp(&candidate.amount),
    };
    match order {
        Ordering::Less => Some(candidate),
        Ordering::Greater => Some(current),
        Ordering::Equal => {
            let prefer = precedence == FarePrecedence::PreferCarrier
                && &current.carrier == industry
                && &candidate.carrier == governing;
            Some(if prefer { candidate } else { current })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cabin::FareTypeFilter;
    use crate::core::fare::{FareId, FareRestriction};
    use crate::core::itinerary::{BookingCode, Rebooking, SegmentRange, SegmentStatus::*};
    use crate::core::sector::{CalculationPolicy, CalculationRecord, SectorTag};
    use crate::reference::{IndustryPricingRow, EffectivePeriod};
    use crate::core::geo::LocSpec;
    use crate::validator::fixtures::*;
    use rust_decimal_macros::dec;

    fn sector_with(policy: CalculationPolicy) -> DifferentialSector {
        let range = SegmentRange::single(0);
        let mut sector = DifferentialSector::new(
            SectorTag::atomic(1, 'A', Cabin::Business).unwrap(),
            Cabin::Business,
            range,
        );
        sector.markets = vec![MarketKey::new(range, carrier())];
        sector.calculation = Some(CalculationRecord {
            policy,
            ..CalculationRecord::not_found()
        });
        sector
    }

    fn usage() -> crate::core::itinerary::FareUsage {
        usage_of(
            vec![
                (segment("LON", "PAR", "J", Cabin::Business), BookingCodeFail),
                (segment("PAR", "FRA", "Y", Cabin::Economy), Pass),
            ],
            economy_through(),
        )
    }

    #[test]
    fn test_cheapest_high_and_dearest_low() {
        let world = World::new().with_market(market(
            0,
            0,
            vec![
                fare("J1", Cabin::Business, "J", dec!(900)),
                fare("J2", Cabin::Business, "J", dec!(700)),
                fare("Y1", Cabin::Economy, "Y", dec!(200)),
                fare("Y2", Cabin::Economy, "Y", dec!(300)),
            ],
        ));
        let usage = usage();
        let ctx = world.context(&usage).unwrap();
        let mut marks = FareMarks::default();
        let outcome = select_fares(&ctx, &mut marks, &sector_with(CalculationPolicy::Low)).unwrap();
        let SelectionOutcome::Selected { low, high } = outcome else {
            panic!("expected fares, got {outcome:?}");
        };
        assert_eq!(high.fare_id, FareId::new("J2"));
        assert_eq!(low.fare_id, FareId::new("Y2"));
    }

    #[test]
    fn test_high_fare_must_book_the_sector() {
        let world = World::new().with_market(market(
            0,
            0,
            vec![
                fare("D1", Cabin::Business, "D", dec!(500)),
                fare("J1", Cabin::Business, "J", dec!(900)),
                fare("Y1", Cabin::Economy, "Y", dec!(200)),
            ],
        ));
        let usage = usage();
        let ctx = world.context(&usage).unwrap();
        let mut marks = FareMarks::default();
        let sector = sector_with(CalculationPolicy::Low);
        let outcome = select_fares(&ctx, &mut marks, &sector).unwrap();
        assert!(matches!(outcome, SelectionOutcome::Selected { ref high, .. } if high.fare_id == FareId::new("J1")));
        assert!(marks.excludes(&FareId::new("D1"), &sector.tag));
    }

    #[test]
    fn test_restriction_relaxed_on_retry() {
        let mut restricted = fare("J1", Cabin::Business, "J", dec!(900));
        restricted.restriction = FareRestriction::Restricted;
        let world = World::new().with_market(market(
            0,
            0,
            vec![restricted, fare("Y1", Cabin::Economy, "Y", dec!(200))],
        ));
        let usage = usage();
        let ctx = world.context(&usage).unwrap();
        let mut marks = FareMarks::default();
        let sector = sector_with(CalculationPolicy::Same);
        assert!(matches!(
            select_fares(&ctx, &mut marks, &sector).unwrap(),
            SelectionOutcome::Selected { .. }
        ));

        let mut strict = World::new().with_market(market(
            0,
            0,
            vec![
                {
                    let mut f = fare("J1", Cabin::Business, "J", dec!(900));
                    f.restriction = FareRestriction::Restricted;
                    f
                },
                fare("Y1", Cabin::Economy, "Y", dec!(200)),
            ],
        ));
        strict.config.relax_restriction_on_retry = false;
        let ctx = strict.context(&usage).unwrap();
        assert_eq!(
            select_fares(&ctx, &mut marks, &sector).unwrap(),
            SelectionOutcome::NoFareFound {
                low_found: true,
                high_found: false
            }
        );
    }

    #[test]
    fn test_low_side_slides_only_when_permitted() {
        let usage = usage_of(
            vec![
                (segment("LON", "PAR", "F", Cabin::First), BookingCodeFail),
                (segment("PAR", "FRA", "C", Cabin::Business), Pass),
            ],
            fare("CTHRU", Cabin::Business, "C", dec!(2000)),
        );
        let range = SegmentRange::single(0);
        let mut sector = DifferentialSector::new(
            SectorTag::atomic(1, 'A', Cabin::First).unwrap(),
            Cabin::First,
            range,
        );
        sector.markets = vec![MarketKey::new(range, carrier())];
        let fares = vec![
            fare("F1", Cabin::First, "F", dec!(1500)),
            fare("W1", Cabin::PremiumEconomy, "W", dec!(400)),
        ];

        let closed = World::new().with_market(market(0, 0, fares.clone()));
        let ctx = closed.context(&usage).unwrap();
        let mut marks = FareMarks::default();
        assert!(matches!(
            select_fares(&ctx, &mut marks, &sector).unwrap(),
            SelectionOutcome::NoFareFound { low_found: false, .. }
        ));

        let open = World::new()
            .with_market(market(0, 0, fares))
            .with_preference(CarrierPreference {
                allow_premium_economy_slide: true,
                ..CarrierPreference::default()
            });
        let ctx = open.context(&usage).unwrap();
        assert!(matches!(
            select_fares(&ctx, &mut marks, &sector).unwrap(),
            SelectionOutcome::Selected { ref low, .. } if low.fare_id == FareId::new("W1")
        ));
    }

    #[test]
    fn test_premium_economy_filter_marks_incompatible_fares() {
        let usage = usage_of(
            vec![
                (segment("LON", "PAR", "W", Cabin::PremiumEconomy), BookingCodeFail),
                (segment("PAR", "FRA", "Y", Cabin::Economy), Pass),
            ],
            economy_through(),
        );
        let range = SegmentRange::single(0);
        let mut sector = DifferentialSector::new(
            SectorTag::atomic(1, 'A', Cabin::PremiumEconomy).unwrap(),
            Cabin::PremiumEconomy,
            range,
        );
        sector.markets = vec![MarketKey::new(range, carrier())];
        sector.calculation = Some(CalculationRecord {
            policy: CalculationPolicy::Low,
            intermediate_fare_type: Some(FareTypeFilter::Exact(crate::core::cabin::FareTypeDesignator::new('Z'))),
            ..CalculationRecord::not_found()
        });
        let world = World::new().with_market(market(
            0,
            0,
            vec![
                fare("W1", Cabin::PremiumEconomy, "W", dec!(300)),
                fare("Y1", Cabin::Economy, "Y", dec!(200)),
            ],
        ));
        let ctx = world.context(&usage).unwrap();
        let mut marks = FareMarks::default();
        assert!(matches!(
            select_fares(&ctx, &mut marks, &sector).unwrap(),
            SelectionOutcome::NoFareFound { high_found: false, .. }
        ));
        assert!(marks.excludes(&FareId::new("W1"), &sector.tag));
    }

    #[test]
    fn test_prefer_carrier_breaks_ties() {
        let mut industry = fare("JYY", Cabin::Business, "J", dec!(700));
        industry.carrier = CarrierCode::industry();
        let world = World::new().with_market(market(
            0,
            0,
            vec![
                industry,
                fare("JBA", Cabin::Business, "J", dec!(700)),
                fare("Y1", Cabin::Economy, "Y", dec!(200)),
            ],
        ));
        let mut world = world;
        world.reference = world.reference.clone().with_industry_row(IndustryPricingRow {
            carrier: carrier(),
            global_direction: None,
            loc1: LocSpec::Any,
            loc2: LocSpec::Any,
            precedence: FarePrecedence::PreferCarrier,
            period: EffectivePeriod::default(),
        });
        let usage = usage();
        let ctx = world.context(&usage).unwrap();
        let mut marks = FareMarks::default();
        let outcome = select_fares(&ctx, &mut marks, &sector_with(CalculationPolicy::Low)).unwrap();
        assert!(matches!(outcome, SelectionOutcome::Selected { ref high, .. } if high.fare_id == FareId::new("JBA")));
    }

    #[test]
    fn test_configured_industry_carrier_is_eligible() {
        let mut configured = fare("JXX", Cabin::Business, "J", dec!(600));
        configured.carrier = CarrierCode::new("XX");
        let mut default_industry = fare("JYY", Cabin::Business, "J", dec!(500));
        default_industry.carrier = CarrierCode::industry();
        let mut world = World::new().with_market(market(
            0,
            0,
            vec![
                configured,
                default_industry,
                fare("JBA", Cabin::Business, "J", dec!(700)),
                fare("Y1", Cabin::Economy, "Y", dec!(200)),
            ],
        ));
        world.config.industry_carrier = CarrierCode::new("XX");
        let usage = usage();
        let ctx = world.context(&usage).unwrap();
        let mut marks = FareMarks::default();
        let outcome = select_fares(&ctx, &mut marks, &sector_with(CalculationPolicy::Low)).unwrap();
        assert!(matches!(outcome, SelectionOutcome::Selected { ref high, .. } if high.fare_id == FareId::new("JXX")));
    }

    #[test]
    fn test_low_fare_request_prices_high_side_only() {
        let mut rebooked = segment("LON", "PAR", "Y", Cabin::Economy);
        rebooked.rebooked = Some(Rebooking {
            booking_code: BookingCode::new("J"),
            cabin: Cabin::Business,
        });
        let mut usage = usage_of(
            vec![
                (rebooked, BookingCodeFail),
                (segment("PAR", "FRA", "Y", Cabin::Economy), Pass),
            ],
            economy_through(),
        );
        usage.low_fare_request = true;
        let world = World::new().with_market(market(
            0,
            0,
            vec![
                fare("JY1", Cabin::Business, "Y", dec!(400)),
                fare("J1", Cabin::Business, "J", dec!(900)),
            ],
        ));
        let ctx = world.context(&usage).unwrap();
        let mut marks = FareMarks::default();
        let sector = sector_with(CalculationPolicy::Low);
        let outcome = select_fares(&ctx, &mut marks, &sector).unwrap();
        let SelectionOutcome::Selected { low, high } = outcome else {
            panic!("expected fares, got {outcome:?}");
        };
        assert_eq!(high.fare_id, FareId::new("J1"));
        assert_eq!(low.fare_id, FareId::new("YTHRU"));
        assert_eq!(low.market, sector.markets[0]);
        assert!(marks.excludes(&FareId::new("JY1"), &sector.tag));

        usage.low_fare_request = false;
        let ctx = world.context(&usage).unwrap();
        let mut marks = FareMarks::default();
        assert!(matches!(
            select_fares(&ctx, &mut marks, &sector).unwrap(),
            SelectionOutcome::NoFareFound { low_found: false, .. }
        ));
    }

    #[test]
    fn test_rule_failures_are_skipped() {
        let mut world = World::new().with_market(market(
            0,
            0,
            vec![
                fare("J1", Cabin::Business, "J", dec!(600)),
                fare("J2", Cabin::Business, "J", dec!(800)),
                fare("Y1", Cabin::Economy, "Y", dec!(200)),
            ],
        ));
        world.rules = world.rules.clone().failing(FareId::new("J1"));
        let usage = usage();
        let ctx = world.context(&usage).unwrap();
        let mut marks = FareMarks::default();
        let outcome = select_fares(&ctx, &mut marks, &sector_with(CalculationPolicy::Low)).unwrap();
        assert!(matches!(outcome, SelectionOutcome::Selected { ref high, .. } if high.fare_id == FareId::new("J2")));
    }
}
