//! Business logic services

pub mod directions;
pub mod export;
pub mod geo;
pub mod geocoding;
pub mod leg_cache;
pub mod multi_pit;
pub mod schedule;
pub mod trip_planner;
