//! Concrete collaborators behind the [`crate::services::telemetry_api`] traits.

pub mod fixture;
pub mod telemetry;
pub mod weather;
