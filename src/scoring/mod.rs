//! Vehicle risk scoring and fleet aggregation.
//!
//! Pure scoring functions (risk, weather, service, fuel, priority) plus the
//! async [`aggregate::FleetAggregator`] that runs them for a whole roster.

pub mod aggregate;
pub mod fuel;
pub mod level;
pub mod priority;
pub mod risk;
pub mod service;
pub mod types;
pub mod utility;
pub mod weather;
