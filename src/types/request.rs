//! Multi-pit planning request and report types

use serde::{Deserialize, Serialize};

use super::{ResolvedLocation, ScheduleRows, SimulationResult};
use crate::defaults::DEFAULT_WORK_HOURS;

fn default_work_hours() -> f64 {
    DEFAULT_WORK_HOURS
}

/// Plan one vehicle's day for each candidate pit against a shared base and dump
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiPitRequest {
    /// Base location reference (maps URL, place name, or `lat,lng`)
    pub start_url: String,
    /// Shift start, HH:MM
    pub start_time: String,
    pub dump_url: String,
    /// Job/package name used as the dump label in reports
    #[serde(default)]
    pub package: String,
    pub pit_urls: Vec<String>,
    #[serde(default)]
    pub pit_materials: Vec<String>,
    #[serde(default)]
    pub pit_tonnes: Vec<f64>,
    #[serde(default = "default_work_hours")]
    pub work_hours: f64,
    #[serde(default)]
    pub adjust_time: u32,
    pub pit_load_sizes: Vec<f64>,
    pub pit_rates: Vec<f64>,
}

/// Planning outcome for a single pit
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PitReport {
    /// 1-based
    pub pit_index: usize,
    pub pit_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<ResolvedLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<PitPlan>,
    /// Set when this pit failed; other pits are unaffected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PitReport {
    pub fn is_success(&self) -> bool {
        self.plan.is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PitPlan {
    pub simulation: SimulationResult,
    pub schedule: ScheduleRows,
}

/// Report for a whole multi-pit request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiPitReport {
    pub package: String,
    pub start: ResolvedLocation,
    pub dump: ResolvedLocation,
    pub pits: Vec<PitReport>,
}
