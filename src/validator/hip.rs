use crate::core::sector::DifferentialSector;
use crate::error::DifferentialError;
use crate::validator::context::ValidationContext;
use log::{debug, error, info};
use rust_decimal::Decimal;

/// Result of the higher-intermediate-point adjustment of one sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HipOutcome {
    /// The fare usage or the matched row is exempt.
    Exempt,
    /// No plus-up and no surcharge applied.
    Unchanged,
    Adjusted,
    /// A one-sided plus-up left nothing to charge; the sector fails.
    Rejected,
}

/// Recompute the sector amount from minimum fare plus-ups.
///
/// With no plus-up on either side the mileage surcharges are applied to
/// both fares. A plus-up on one side is set against the other side's plain
/// fare and must leave a positive amount. Plus-ups on both sides must not
/// invert; when they were found between different points, the cabins of
/// the plus-up fares are kept on the sector. Whenever a plus-up applies the
/// sector is charged the cheaper of the plus-up and the direct spread.
pub fn adjust(
    ctx: &ValidationContext<'_>,
    sector: &mut DifferentialSector,
) -> Result<HipOutcome, DifferentialError> {
    let row_exempt = sector.calculation.as_ref().map_or(false, |c| c.hip_exempt);
    if !ctx.config.apply_hip || ctx.usage.hip_exempt || row_exempt {
        return Ok(HipOutcome::Exempt);
    }
    let (Some(low), Some(high)) = (sector.low.clone(), sector.high.clone()) else {
        return Err(DifferentialError::structural(format!(
            "sector {} reached minimum fare check without fares",
            sector.tag
        )));
    };
    let engine = ctx.services.minimum_fares;
    let low_check = engine.higher_intermediate_point(&low, sector.range);
    let high_check = engine.higher_intermediate_point(&high, sector.range);

    match (&low_check.plus_up, &high_check.plus_up) {
        (None, None) => {
            if low_check.mileage_surcharge_percent.is_zero()
                && high_check.mileage_surcharge_percent.is_zero()
            {
                return Ok(HipOutcome::Unchanged);
            }
            let low_amount = low_check.surcharged(low.amount);
            let high_amount = high_check.surcharged(high.amount);
            sector.hip_low_amount = Some(low_amount);
            sector.hip_high_amount = Some(high_amount);
            sector.hip_amount = Some((high_amount - low_amount).max(Decimal::ZERO));
        }
        (Some(low_hip), None) => {
            let amount = high.amount - low_hip.amount;
            if amount <= Decimal::ZERO {
                info!("sector {}: low plus-up {} absorbs the differential", sector.tag, low_hip.amount);
                return Ok(HipOutcome::Rejected);
            }
            sector.hip_low_amount = Some(low_hip.amount);
            sector.hip_high_amount = Some(high.amount);
            sector.hip_low_cabin = Some(low_hip.cabin);
            sector.hip_amount = Some(cheaper_of(sector, amount));
        }
        (None, Some(high_hip)) => {
            let amount = high_hip.amount - low.amount;
            if amount <= Decimal::ZERO {
                info!("sector {}: high plus-up {} leaves no differential", sector.tag, high_hip.amount);
                return Ok(HipOutcome::Rejected);
            }
            sector.hip_low_amount = Some(low.amount);
            sector.hip_high_amount = Some(high_hip.amount);
            sector.hip_high_cabin = Some(high_hip.cabin);
            sector.hip_amount = Some(cheaper_of(sector, amount));
        }
        (Some(low_hip), Some(high_hip)) => {
            let amount = high_hip.amount - low_hip.amount;
            if amount < Decimal::ZERO {
                error!(
                    "sector {}: HIP low {} exceeds HIP high {}",
                    sector.tag, low_hip.amount, high_hip.amount
                );
                return Err(DifferentialError::MinFareInconsistency {
                    tag: sector.tag.to_string(),
                    high: high_hip.amount,
                    low: low_hip.amount,
                });
            }
            if low_hip.board != high_hip.board || low_hip.off != high_hip.off {
                sector.hip_low_cabin = Some(low_hip.cabin);
                sector.hip_high_cabin = Some(high_hip.cabin);
            }
            sector.hip_low_amount = Some(low_hip.amount);
            sector.hip_high_amount = Some(high_hip.amount);
            sector.hip_amount = Some(cheaper_of(sector, amount));
        }
    }
    debug!(
        "sector {}: minimum fare amount {}",
        sector.tag,
        sector.effective_amount()
    );
    Ok(HipOutcome::Adjusted)
}

/// Plus-up amount capped at the direct high minus low spread.
fn cheaper_of(sector: &DifferentialSector, hip_amount: Decimal) -> Decimal {
    if hip_amount > sector.amount {
        debug!(
            "sector {}: direct amount {} below minimum fare amount {}",
            sector.tag, sector.amount, hip_amount
        );
        sector.amount
    } else {
        hip_amount
    }
}
