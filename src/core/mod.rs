pub mod cabin;
pub mod fare;
pub mod geo;
pub mod itinerary;
pub mod market;
pub mod sector;
