//! Business logic services

pub mod chat;
pub mod conditions;
pub mod distance;
pub mod estimator;
pub mod geocoding;
pub mod history;
pub mod nominatim;
pub mod orders;
pub mod resilience;
pub mod route_optimizer;
pub mod snapshot;
