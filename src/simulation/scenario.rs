//! A self-contained validation input: one fare usage plus every
//! collaborator it needs, as a single JSON document.

use crate::config::ValidatorConfig;
use crate::core::itinerary::FareUsage;
use crate::error::DifferentialError;
use crate::reference::memory::{HipSchedule, MarketCatalog, ReferenceTables, RuleOutcomes};
use crate::validator::context::Services;
use crate::validator::{DifferentialOutcome, DifferentialValidator};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub usage: FareUsage,
    #[serde(default)]
    pub reference: ReferenceTables,
    #[serde(default)]
    pub markets: MarketCatalog,
    #[serde(default)]
    pub rules: RuleOutcomes,
    #[serde(default)]
    pub minimum_fares: HipSchedule,
    #[serde(default)]
    pub config: ValidatorConfig,
}

impl Scenario {
    pub fn new(usage: FareUsage) -> Self {
        Self {
            usage,
            reference: ReferenceTables::default(),
            markets: MarketCatalog::default(),
            rules: RuleOutcomes::default(),
            minimum_fares: HipSchedule::default(),
            config: ValidatorConfig::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn services(&self) -> Services<'_> {
        Services {
            reference: &self.reference,
            rules: &self.rules,
            markets: &self.markets,
            minimum_fares: &self.minimum_fares,
        }
    }

    /// Run differential validation with this scenario's own config.
    pub fn validate(&self) -> Result<DifferentialOutcome, DifferentialError> {
        DifferentialValidator::new(self.services(), self.config.clone()).validate(&self.usage)
    }
}
