//! Merging of adjacent sectors into cheaper wider sectors.
//!
//! The first sweep grows windows inside each run (sectors sharing a run
//! letter). The second sweep merges neighbours across runs, pair by pair,
//! until nothing changes. A merge is accepted only when its amount is
//! strictly below the sum of the parts; the parts then become
//! `ConsolidatedFail` and stay reachable as sub-sectors of the merge.

use crate::core::cabin::Cabin;
use crate::core::sector::{DifferentialSector, SectorId, SectorStatus, SectorTag};
use crate::error::DifferentialError;
use crate::validator::context::{PipelineState, ValidationContext};
use crate::validator::price_sector;
use log::{debug, info};
use rust_decimal::Decimal;

/// Verdict on one merge candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeDecision {
    Accepted { merged: DifferentialSector, saving: Decimal },
    /// `merged` is `None` when the candidate could not be priced.
    Rejected {
        merged: Option<Decimal>,
        parts: Decimal,
    },
}

/// Run both sweeps over `state.top_level`.
pub fn consolidate(
    ctx: &ValidationContext<'_>,
    state: &mut PipelineState,
) -> Result<(), DifferentialError> {
    check_atomic(state)?;
    let mut level = state.top_level.clone();
    sweep_runs(ctx, state, &mut level)?;
    if ctx.config.cross_run_widening {
        widen_across_runs(ctx, state, &mut level)?;
    }
    state.top_level = level;
    Ok(())
}

fn check_atomic(state: &PipelineState) -> Result<(), DifferentialError> {
    for id in &state.atomic {
        let sector = state.arena.get(*id)?;
        if !sector.tag.is_well_formed_atomic() {
            return Err(DifferentialError::structural(format!(
                "malformed sector tag '{}'",
                sector.tag
            )));
        }
        if sector.markets.is_empty() && sector.status() != SectorStatus::AdjacentFailed {
            return Err(DifferentialError::structural(format!(
                "sector {} has no fare market",
                sector.tag
            )));
        }
    }
    Ok(())
}

fn contiguous(state: &PipelineState, a: SectorId, b: SectorId) -> Result<bool, DifferentialError> {
    Ok(state.arena.get(a)?.range.precedes(&state.arena.get(b)?.range))
}

/// Last index of the run starting at `start`: same run letter, contiguous,
/// and not failed by an adjacent search.
fn run_end(state: &PipelineState, level: &[SectorId], start: usize) -> Result<usize, DifferentialError> {
    let letter = state.arena.get(level[start])?.tag.run_letter();
    let mut end = start;
    while end + 1 < level.len() {
        let next = state.arena.get(level[end + 1])?;
        if next.tag.run_letter() != letter
            || next.status().is_terminal_failure()
            || !contiguous(state, level[end], level[end + 1])?
        {
            break;
        }
        end += 1;
    }
    Ok(end)
}

fn sweep_runs(
    ctx: &ValidationContext<'_>,
    state: &mut PipelineState,
    level: &mut Vec<SectorId>,
) -> Result<(), DifferentialError> {
    let mut i = 0;
    while i < level.len() {
        if state.arena.get(level[i])?.status().is_terminal_failure() {
            i += 1;
            continue;
        }
        let end = run_end(state, level, i)?;
        let mut best: Option<(usize, DifferentialSector, Decimal)> = None;
        for k in i + 1..=end {
            if let MergeDecision::Accepted { merged, saving } = try_merge(ctx, state, &level[i..=k])? {
                if best.as_ref().map_or(true, |(_, _, s)| saving > *s) {
                    best = Some((k, merged, saving));
                }
            }
        }
        if let Some((k, merged, _)) = best {
            commit(state, level, i, k, merged)?;
        }
        i += 1;
    }
    Ok(())
}

fn widen_across_runs(
    ctx: &ValidationContext<'_>,
    state: &mut PipelineState,
    level: &mut Vec<SectorId>,
) -> Result<(), DifferentialError> {
    for pass in 0..ctx.config.max_widening_passes {
        let mut changed = false;
        let mut i = 0;
        while i + 1 < level.len() {
            let (a, b) = (level[i], level[i + 1]);
            let crosses_runs =
                state.arena.get(a)?.tag.last_run_letter() != state.arena.get(b)?.tag.run_letter();
            if crosses_runs && contiguous(state, a, b)? {
                if let MergeDecision::Accepted { merged, .. } = try_merge(ctx, state, &[a, b])? {
                    commit(state, level, i, i + 1, merged)?;
                    changed = true;
                    continue;
                }
            }
            i += 1;
        }
        if !changed {
            debug!("cross-run widening settled after {} passes", pass + 1);
            break;
        }
    }
    Ok(())
}

/// Price the merge of `parts` and decide whether it replaces them.
pub fn try_merge(
    ctx: &ValidationContext<'_>,
    state: &mut PipelineState,
    parts: &[SectorId],
) -> Result<MergeDecision, DifferentialError> {
    let sectors = parts
        .iter()
        .map(|id| state.arena.get(*id))
        .collect::<Result<Vec<_>, _>>()?;
    let (Some(first), Some(last)) = (sectors.first(), sectors.last()) else {
        return Err(DifferentialError::structural("empty merge window"));
    };
    let parts_sum: Decimal = sectors.iter().map(|s| s.effective_amount()).sum();
    if !sectors.iter().all(|s| s.status().is_passing()) {
        return Ok(MergeDecision::Rejected {
            merged: None,
            parts: parts_sum,
        });
    }

    let range = first.range.span(&last.range);
    if ctx.usage.covers_component(&range) {
        return Err(DifferentialError::structural(format!(
            "merge of {} through {} covers the whole fare component",
            first.tag, last.tag
        )));
    }
    let cabin = sectors
        .iter()
        .map(|s| s.cabin)
        .min_by_key(|c| c.rank())
        .unwrap_or(Cabin::Economy);
    let tag = SectorTag::consolidated(&first.tag, &last.tag, cabin);
    let mut merged = DifferentialSector::new(tag, cabin, range);
    merged.sub_sectors = parts.to_vec();

    let key = ctx.market_key_for(range)?;
    if ctx.market(&key).is_none() {
        debug!("no market {key} for merge {}", merged.tag);
        return Ok(MergeDecision::Rejected {
            merged: None,
            parts: parts_sum,
        });
    }
    merged.fallback_markets = ctx.fallback_key_for(&key).into_iter().collect();
    merged.markets = vec![key];

    if !price_sector(ctx, &mut state.marks, &mut merged)? {
        return Ok(MergeDecision::Rejected {
            merged: None,
            parts: parts_sum,
        });
    }
    let amount = merged.effective_amount();
    if amount < parts_sum {
        debug!("merge {} at {} beats parts at {}", merged.tag, amount, parts_sum);
        Ok(MergeDecision::Accepted {
            merged,
            saving: parts_sum - amount,
        })
    } else {
        debug!("merge {} at {} does not beat parts at {}", merged.tag, amount, parts_sum);
        Ok(MergeDecision::Rejected {
            merged: Some(amount),
            parts: parts_sum,
        })
    }
}

/// Replace `level[start..=end]` by `merged`.
fn commit(
    state: &mut PipelineState,
    level: &mut Vec<SectorId>,
    start: usize,
    end: usize,
    mut merged: DifferentialSector,
) -> Result<(), DifferentialError> {
    for id in &level[start..=end] {
        state.arena.get_mut(*id)?.transition(SectorStatus::ConsolidatedFail)?;
    }
    merged.transition(SectorStatus::ConsolidatedPass)?;
    info!(
        "consolidated {} over segments {} at {}",
        merged.tag,
        merged.range,
        merged.effective_amount()
    );
    let id = state.arena.insert(merged);
    level.splice(start..=end, [id]);
    Ok(())
}
