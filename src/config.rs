//! Configuration management

use anyhow::{self, Context, Result};
use chrono::NaiveTime;

use crate::defaults::{
    hard_cutoff, DEFAULT_HTTP_TIMEOUT_SECS, GOOGLE_MAPS_API_BASE_URL, LOADING_TIME_MINUTES,
    OVERTIME_ALLOWANCE_MINUTES, UNLOADING_TIME_MINUTES,
};
use crate::services::trip_planner::PlannerSettings;

/// Google Maps Platform client configuration
#[derive(Debug, Clone)]
pub struct GoogleMapsConfig {
    pub api_key: String,
    /// e.g. "https://maps.googleapis.com/maps/api"
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl GoogleMapsConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: GOOGLE_MAPS_API_BASE_URL.to_string(),
            timeout_seconds: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Google Maps access; mock services are used when absent
    pub google: Option<GoogleMapsConfig>,

    /// Timing constants for the trip planner
    pub planner: PlannerSettings,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup (env, map in tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout_seconds = parse_or(&lookup, "HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;

        let google = lookup("GOOGLE_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .map(|api_key| GoogleMapsConfig {
                api_key,
                base_url: lookup("GOOGLE_MAPS_BASE_URL")
                    .unwrap_or_else(|| GOOGLE_MAPS_API_BASE_URL.to_string()),
                timeout_seconds,
            });

        let hard_cutoff = match lookup("HARD_CUTOFF") {
            Some(value) => NaiveTime::parse_from_str(value.trim(), "%H:%M")
                .with_context(|| format!("HARD_CUTOFF must be HH:MM, got '{}'", value))?,
            None => hard_cutoff(),
        };

        let planner = PlannerSettings {
            loading_minutes: parse_or(&lookup, "LOADING_TIME_MINUTES", LOADING_TIME_MINUTES)?,
            unloading_minutes: parse_or(&lookup, "UNLOADING_TIME_MINUTES", UNLOADING_TIME_MINUTES)?,
            overtime_allowance_minutes: parse_or(
                &lookup,
                "OVERTIME_ALLOWANCE_MINUTES",
                OVERTIME_ALLOWANCE_MINUTES,
            )?,
            hard_cutoff,
        };

        if planner.loading_minutes + planner.unloading_minutes == 0 {
            anyhow::bail!("LOADING_TIME_MINUTES and UNLOADING_TIME_MINUTES cannot both be 0");
        }

        Ok(Self { google, planner })
    }
}

fn parse_or<F>(lookup: &F, key: &str, default: u64) -> Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} must be a non-negative integer, got '{}'", key, value)),
        None => Ok(default),
    }
}
