//! # cabin-differential
//!
//! Cabin differential validation for airline fare pricing.
//!
//! When segments of a fare component are booked in a higher cabin than the
//! through fare allows, the fare may still be sold by charging the
//! difference between a higher-cabin fare and a through-cabin fare over
//! those segments. This crate finds those sectors, prices them against the
//! carrier's differential table and the fare markets of the request, and
//! returns a verdict with the total to add.
//!
//! ## Architecture
//!
//! - **core** — Cabins, geography, itineraries, fares, markets and sectors
//! - **reference** — Read-only collaborators: tables, markets, rules, minimum fares
//! - **validator** — The pipeline: build, match, select, adjust, consolidate, assemble
//! - **simulation** — Scenario documents and random scenario generation

pub mod config;
pub mod core;
pub mod error;
pub mod reference;
pub mod simulation;
pub mod validator;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::config::ValidatorConfig;
    pub use crate::core::cabin::{Cabin, FareTypeDesignator, FareTypeFilter};
    pub use crate::core::fare::{Fare, FareId};
    pub use crate::core::itinerary::{FareUsage, Segment, SegmentRange, SegmentStatus};
    pub use crate::core::market::{FareMarket, MarketKey};
    pub use crate::core::sector::{DifferentialSector, SectorStatus, SectorTag};
    pub use crate::error::DifferentialError;
    pub use crate::simulation::scenario::Scenario;
    pub use crate::validator::context::Services;
    pub use crate::validator::{DifferentialOutcome, DifferentialValidator, FailureReason};
}
