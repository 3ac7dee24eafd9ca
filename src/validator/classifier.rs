use crate::core::cabin::Cabin;
use crate::validator::context::ValidationContext;
use log::{debug, warn};

/// Booked cabin of a segment relative to the through fare's cabin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CabinComparison {
    Lower,
    Equal,
    Higher,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub comparison: CabinComparison,
    /// Cabin the segment counts as booked in.
    pub cabin: Cabin,
}

impl Classification {
    fn lower(cabin: Cabin) -> Self {
        Self {
            comparison: CabinComparison::Lower,
            cabin,
        }
    }
}

/// Classify segment `index` against the through fare's cabin.
///
/// Only segments that failed booking-code validation can be Equal or Higher.
/// Low-fare requests on economy fares count a segment as premium economy
/// when premium inventory is open and the carrier allows the slide.
pub fn classify(ctx: &ValidationContext<'_>, index: usize) -> Classification {
    let usage = ctx.usage;
    let (Some(segment), Some(status)) = (usage.segments.get(index), usage.segment_status.get(index))
    else {
        warn!("segment {} outside the fare component, classed lower", index + 1);
        return Classification::lower(ctx.through_cabin);
    };
    let low_fare = ctx.low_fare_request();
    let mut booked = segment.effective_cabin(low_fare);

    if !status.is_booking_code_failure() {
        return Classification::lower(booked);
    }

    if low_fare && ctx.through_cabin == Cabin::Economy && booked == Cabin::Economy {
        if usage.availability.len() != usage.segments.len() {
            warn!(
                "{} availability entries for {} segments, segment {} classed lower",
                usage.availability.len(),
                usage.segments.len(),
                index + 1
            );
            return Classification::lower(booked);
        }
        let premium_open = usage.availability[index]
            .iter()
            .any(|seat| seat.seats > 0 && seat.cabin.is_above(Cabin::Economy));
        if premium_open && ctx.preference.allow_premium_economy_slide {
            debug!("segment {} counted as premium economy", index + 1);
            booked = Cabin::PremiumEconomy;
        }
    }

    let comparison = if booked.is_above(ctx.through_cabin) {
        CabinComparison::Higher
    } else if booked == ctx.through_cabin {
        CabinComparison::Equal
    } else {
        CabinComparison::Lower
    };
    Classification {
        comparison,
        cabin: booked,
    }
}
