//! Haul Planner - simulates a haulage vehicle's shift between base, pit and
//! dump, and summarizes it into a day schedule with revenue.

pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod services;
pub mod types;

pub use error::{PlanError, PlanResult};
