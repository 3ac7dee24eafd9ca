use crate::core::itinerary::CarrierCode;
use serde::{Deserialize, Serialize};

/// Tunables of the differential pipeline.
///
/// Every field has a default, so an empty JSON object is a valid config.
///
/// # Examples
///
/// ```
/// use cabin_differential::config::ValidatorConfig;
///
/// let config: ValidatorConfig = serde_json::from_str("{}").unwrap();
/// assert!(config.consolidate);
/// assert_eq!(config.industry_carrier.as_str(), "YY");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Carrier code under which industry fares are filed.
    pub industry_carrier: CarrierCode,
    /// Try merging adjacent sectors.
    pub consolidate: bool,
    /// Try merges across run boundaries once single-run merges settle.
    pub cross_run_widening: bool,
    /// Upper bound on cross-run sweeps.
    pub max_widening_passes: usize,
    /// Apply minimum fare (HIP) adjustment to sector amounts.
    pub apply_hip: bool,
    /// Retry fare selection without the restriction-class match when the
    /// first pass finds nothing.
    pub relax_restriction_on_retry: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            industry_carrier: CarrierCode::industry(),
            consolidate: true,
            cross_run_widening: true,
            max_widening_passes: 16,
            apply_hip: true,
            relax_restriction_on_retry: true,
        }
    }
}
