use crate::core::itinerary::CarrierCode;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Conditions that abort a differential invocation.
///
/// Anything that only affects one sector or one candidate (a table row that
/// does not match, a sector without fares, a rejected merge) is reported
/// through the outcome types of the pipeline phases instead.
#[derive(Debug, Error)]
pub enum DifferentialError {
    /// Inconsistent input or internal bookkeeping: parallel vectors of
    /// different sizes, unresolvable fare markets, malformed tags.
    #[error("structural error: {0}")]
    Structural(String),
    #[error("no differential table rows for carrier {carrier} on {date}")]
    ReferenceDataMissing { carrier: CarrierCode, date: NaiveDate },
    #[error("minimum fare inconsistency on sector {tag}: HIP low {low} exceeds HIP high {high}")]
    MinFareInconsistency {
        tag: String,
        high: Decimal,
        low: Decimal,
    },
}

impl DifferentialError {
    pub fn structural(message: impl Into<String>) -> Self {
        Self::Structural(message.into())
    }
}
