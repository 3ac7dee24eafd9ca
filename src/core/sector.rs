use crate::core::cabin::{Cabin, FareTypeDesignator, FareTypeFilter};
use crate::core::fare::{Fare, FareId};
use crate::core::itinerary::{CarrierCode, SegmentRange};
use crate::core::market::MarketKey;
use crate::error::DifferentialError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Index of a sector in its [`SectorArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectorId(usize);

impl SectorId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Processing state of a differential sector.
///
/// States only move forward; see [`SectorStatus::can_become`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectorStatus {
    Unprocessed,
    MatchedIntermediateA,
    MatchedIntermediateB,
    Passed,
    Failed,
    AdjacentFailed,
    ConsolidatedPass,
    ConsolidatedFail,
    CombinationFailed,
}

impl SectorStatus {
    fn stage(self) -> u8 {
        match self {
            SectorStatus::Unprocessed => 0,
            SectorStatus::MatchedIntermediateA | SectorStatus::MatchedIntermediateB => 1,
            SectorStatus::Passed | SectorStatus::Failed => 2,
            SectorStatus::ConsolidatedPass | SectorStatus::ConsolidatedFail => 3,
            SectorStatus::CombinationFailed => 4,
            SectorStatus::AdjacentFailed => 5,
        }
    }

    /// Whether a sector in this state may move to `next`.
    pub fn can_become(self, next: SectorStatus) -> bool {
        if self == next {
            return true;
        }
        match (self, next) {
            (SectorStatus::AdjacentFailed, _) => false,
            (SectorStatus::Unprocessed, SectorStatus::AdjacentFailed) => true,
            (_, SectorStatus::AdjacentFailed) => false,
            (SectorStatus::Failed, SectorStatus::ConsolidatedPass)
            | (SectorStatus::Failed, SectorStatus::ConsolidatedFail) => false,
            (SectorStatus::ConsolidatedPass, SectorStatus::ConsolidatedFail) => true,
            (SectorStatus::ConsolidatedFail, SectorStatus::CombinationFailed) => false,
            (SectorStatus::Unprocessed, SectorStatus::CombinationFailed) => false,
            _ => next.stage() > self.stage(),
        }
    }

    pub fn is_passing(self) -> bool {
        matches!(self, SectorStatus::Passed | SectorStatus::ConsolidatedPass)
    }

    pub fn is_terminal_failure(self) -> bool {
        matches!(
            self,
            SectorStatus::AdjacentFailed | SectorStatus::CombinationFailed
        )
    }
}

impl fmt::Display for SectorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SectorStatus::Unprocessed => "UNPROCESSED",
            SectorStatus::MatchedIntermediateA => "MATCHED-A",
            SectorStatus::MatchedIntermediateB => "MATCHED-B",
            SectorStatus::Passed => "PASSED",
            SectorStatus::Failed => "FAILED",
            SectorStatus::AdjacentFailed => "ADJACENT-FAILED",
            SectorStatus::ConsolidatedPass => "CONSOLIDATED-PASS",
            SectorStatus::ConsolidatedFail => "CONSOLIDATED-FAIL",
            SectorStatus::CombinationFailed => "COMBINATION-FAILED",
        };
        f.pad(label)
    }
}

/// Sector tag: run digit, run letter, cabin letter, and for atomic sectors
/// that absorbed a neighbour, the absorbed segment's cabin letter.
///
/// Consolidated sectors carry the run prefixes of their first and last
/// parts followed by the cabin letter, e.g. `1A2AC`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectorTag(String);

impl SectorTag {
    pub fn atomic(run_number: u32, run_letter: char, cabin: Cabin) -> Result<Self, DifferentialError> {
        let digit = char::from_digit(run_number, 10)
            .filter(|_| run_number > 0)
            .ok_or_else(|| {
                DifferentialError::structural(format!("run number {run_number} does not fit a tag"))
            })?;
        if !run_letter.is_ascii_uppercase() {
            return Err(DifferentialError::structural(format!(
                "run letter '{run_letter}' out of range"
            )));
        }
        Ok(Self(format!("{digit}{run_letter}{}", cabin.code())))
    }

    /// Tag after absorbing an adjacent segment booked in `absorbed`.
    pub fn absorbing(&self, absorbed: Cabin) -> Result<Self, DifferentialError> {
        if self.0.len() != 3 {
            return Err(DifferentialError::structural(format!(
                "tag '{}' cannot absorb another segment",
                self.0
            )));
        }
        Ok(Self(format!("{}{}", self.0, absorbed.code())))
    }

    pub fn consolidated(first: &SectorTag, last: &SectorTag, cabin: Cabin) -> Self {
        Self(format!(
            "{}{}{}",
            first.run_prefix(),
            last.last_run_prefix(),
            cabin.code()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Run digit and letter of the first part.
    pub fn run_prefix(&self) -> &str {
        self.0.get(..2).unwrap_or(&self.0)
    }

    /// Run digit and letter of the last part.
    fn last_run_prefix(&self) -> &str {
        if self.0.len() == 5 {
            self.0.get(2..4).unwrap_or(&self.0)
        } else {
            self.run_prefix()
        }
    }

    pub fn run_letter(&self) -> Option<char> {
        self.0.chars().nth(1)
    }

    pub fn last_run_letter(&self) -> Option<char> {
        self.last_run_prefix().chars().nth(1)
    }

    pub fn is_well_formed_atomic(&self) -> bool {
        let chars: Vec<char> = self.0.chars().collect();
        (chars.len() == 3 || chars.len() == 4)
            && chars[0].is_ascii_digit()
            && chars[1].is_ascii_uppercase()
            && chars[2..].iter().all(|c| Cabin::from_code(*c).is_some())
    }
}

impl fmt::Display for SectorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Calculation policy from the differential table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalculationPolicy {
    Same,
    Low,
    High,
    NotFound,
    NotPermitted,
}

impl CalculationPolicy {
    /// Whether both sides must share the through fare's restriction class.
    pub fn requires_same_restriction(self) -> bool {
        matches!(self, CalculationPolicy::Same | CalculationPolicy::NotFound)
    }

    /// Whether the low side may slide one cabin down after a failed attempt.
    pub fn allows_low_slide(self) -> bool {
        matches!(
            self,
            CalculationPolicy::Same | CalculationPolicy::Low | CalculationPolicy::NotFound
        )
    }
}

/// Which intermediate geography pair of a table row matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntermediatePair {
    A,
    B,
}

/// The table row outcome recorded on a sector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationRecord {
    /// Sequence number of the matching row; `None` when no row matched.
    pub sequence: Option<u32>,
    pub policy: CalculationPolicy,
    pub intermediate_fare_type: Option<FareTypeFilter>,
    pub via: Option<IntermediatePair>,
    pub hip_exempt: bool,
}

impl CalculationRecord {
    pub fn not_found() -> Self {
        Self {
            sequence: None,
            policy: CalculationPolicy::NotFound,
            intermediate_fare_type: None,
            via: None,
            hip_exempt: false,
        }
    }
}

/// Snapshot of a fare chosen as the high or low side of a sector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedFare {
    pub fare_id: FareId,
    pub carrier: CarrierCode,
    pub fare_basis: String,
    pub cabin: Cabin,
    pub fare_type: FareTypeDesignator,
    pub amount: Decimal,
    pub market: MarketKey,
}

impl SelectedFare {
    pub fn from_fare(fare: &Fare, market: MarketKey) -> Self {
        Self {
            fare_id: fare.id.clone(),
            carrier: fare.carrier.clone(),
            fare_basis: fare.fare_basis.clone(),
            cabin: fare.cabin,
            fare_type: fare.fare_type,
            amount: fare.amount,
            market,
        }
    }
}

/// A contiguous run of segments booked above the through fare's cabin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifferentialSector {
    pub id: SectorId,
    pub tag: SectorTag,
    pub cabin: Cabin,
    pub range: SegmentRange,
    pub markets: Vec<MarketKey>,
    pub fallback_markets: Vec<MarketKey>,
    status: SectorStatus,
    pub calculation: Option<CalculationRecord>,
    pub low: Option<SelectedFare>,
    pub high: Option<SelectedFare>,
    pub amount: Decimal,
    pub hip_amount: Option<Decimal>,
    pub hip_low_amount: Option<Decimal>,
    pub hip_high_amount: Option<Decimal>,
    pub hip_low_cabin: Option<Cabin>,
    pub hip_high_cabin: Option<Cabin>,
    /// Slot of the through component; zero for consolidated sectors.
    pub through_number: u16,
    pub sub_sectors: Vec<SectorId>,
    /// Segment pulled in by an adjacent search, if any.
    pub absorbed_segment: Option<usize>,
}

impl DifferentialSector {
    pub fn new(tag: SectorTag, cabin: Cabin, range: SegmentRange) -> Self {
        Self {
            id: SectorId(usize::MAX),
            tag,
            cabin,
            range,
            markets: Vec::new(),
            fallback_markets: Vec::new(),
            status: SectorStatus::Unprocessed,
            calculation: None,
            low: None,
            high: None,
            amount: Decimal::ZERO,
            hip_amount: None,
            hip_low_amount: None,
            hip_high_amount: None,
            hip_low_cabin: None,
            hip_high_cabin: None,
            through_number: 0,
            sub_sectors: Vec::new(),
            absorbed_segment: None,
        }
    }

    pub fn status(&self) -> SectorStatus {
        self.status
    }

    /// Move to `next`, refusing backward transitions.
    pub fn transition(&mut self, next: SectorStatus) -> Result<(), DifferentialError> {
        if !self.status.can_become(next) {
            return Err(DifferentialError::structural(format!(
                "sector {} cannot move from {} to {}",
                self.tag, self.status, next
            )));
        }
        self.status = next;
        Ok(())
    }

    pub fn is_atomic(&self) -> bool {
        self.sub_sectors.is_empty()
    }

    /// Record the selected fares and the floored spread.
    pub fn set_fares(&mut self, low: SelectedFare, high: SelectedFare) {
        self.amount = (high.amount - low.amount).max(Decimal::ZERO);
        self.low = Some(low);
        self.high = Some(high);
        self.hip_amount = None;
        self.hip_low_amount = None;
        self.hip_high_amount = None;
    }

    pub fn has_both_fares(&self) -> bool {
        self.low.is_some() && self.high.is_some()
    }

    /// Amount used for totals: the HIP amount supersedes the plain spread.
    pub fn effective_amount(&self) -> Decimal {
        self.hip_amount.unwrap_or(self.amount)
    }

    pub fn policy(&self) -> CalculationPolicy {
        self.calculation
            .as_ref()
            .map_or(CalculationPolicy::NotFound, |c| c.policy)
    }
}

impl fmt::Display for DifferentialSector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<6} seg {:<5} {:<18} amount {}",
            self.tag,
            self.range,
            self.status,
            self.effective_amount()
        )?;
        if let (Some(low), Some(high)) = (&self.low, &self.high) {
            write!(f, " (high {} {} / low {} {})", high.fare_basis, high.amount, low.fare_basis, low.amount)?;
        }
        Ok(())
    }
}

/// Owner of every sector created during one invocation.
///
/// Sectors are never removed; consumed sectors stay reachable through the
/// `sub_sectors` of the sector that replaced them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectorArena {
    sectors: Vec<DifferentialSector>,
}

impl SectorArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mut sector: DifferentialSector) -> SectorId {
        let id = SectorId(self.sectors.len());
        sector.id = id;
        self.sectors.push(sector);
        id
    }

    pub fn get(&self, id: SectorId) -> Result<&DifferentialSector, DifferentialError> {
        self.sectors
            .get(id.0)
            .ok_or_else(|| DifferentialError::structural(format!("unknown sector {id}")))
    }

    pub fn get_mut(&mut self, id: SectorId) -> Result<&mut DifferentialSector, DifferentialError> {
        self.sectors
            .get_mut(id.0)
            .ok_or_else(|| DifferentialError::structural(format!("unknown sector {id}")))
    }

    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DifferentialSector> {
        self.sectors.iter()
    }

    /// Depth-first pre-order walk of `root` and everything it consolidated.
    pub fn walk(&self, root: SectorId) -> Result<Vec<SectorId>, DifferentialError> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let sector = self.get(id)?;
            order.push(id);
            if order.len() > self.sectors.len() {
                return Err(DifferentialError::structural(format!(
                    "sector {root} consolidation tree revisits a node"
                )));
            }
            stack.extend(sector.sub_sectors.iter().rev().copied());
        }
        Ok(order)
    }

    /// Atomic through numbers covered by `root`, directly or via consolidation.
    pub fn through_numbers(&self, root: SectorId) -> Result<BTreeSet<u16>, DifferentialError> {
        let mut numbers = BTreeSet::new();
        for id in self.walk(root)? {
            let sector = self.get(id)?;
            if sector.is_atomic() && sector.through_number != 0 {
                numbers.insert(sector.through_number);
            }
        }
        Ok(numbers)
    }
}
