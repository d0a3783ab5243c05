//! Trip types produced by the trip planner

use chrono::NaiveDateTime;
use serde::Serialize;

use super::{clock, Coordinates};

/// One Directions lookup between two coordinates.
///
/// Fetched once per distinct directional pair and reused for every simulated
/// cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionLeg {
    pub duration_seconds: u64,
    /// e.g. "25 mins"
    pub duration_text: String,
    /// Kilometres, rounded to one decimal
    pub distance_km: f64,
    /// Upstream distance text, e.g. "18.4 km"
    pub distance_text: String,
    /// Duration as HH:MM
    pub time_format: String,
    pub route_url: String,
}

impl DirectionLeg {
    /// Build a leg from raw measurements. Display fields are derived here so
    /// every `DirectionsService` formats them identically.
    pub fn from_measurement(
        origin: Coordinates,
        destination: Coordinates,
        duration_seconds: u64,
        distance_meters: u64,
        distance_text: Option<String>,
    ) -> Self {
        let minutes = duration_seconds / 60;
        let distance_km = (distance_meters as f64 / 100.0).round() / 10.0;

        Self {
            duration_seconds,
            duration_text: format!("{} mins", minutes),
            distance_km,
            distance_text: distance_text.unwrap_or_else(|| format!("{:.1} km", distance_km)),
            time_format: format!("{:02}:{:02}", minutes / 60, minutes % 60),
            route_url: route_url(origin, destination),
        }
    }
}

/// Google Maps driving directions link between two points
pub fn route_url(origin: Coordinates, destination: Coordinates) -> String {
    format!(
        "https://www.google.com/maps/dir/?api=1&origin={}&destination={}&travelmode=driving",
        origin.as_query(),
        destination.as_query()
    )
}

/// What a step does. Carried as data so consumers never match on labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    TravelToPit,
    Load,
    TravelToDump,
    Unload,
    ReturnToPit,
    ReturnToBase,
}

impl StepKind {
    pub const fn is_travel(self) -> bool {
        !matches!(self, StepKind::Load | StepKind::Unload)
    }

    /// Display label; `pit_name` falls back to "Pit Site" when empty
    pub fn label(self, pit_name: &str) -> String {
        let pit = if pit_name.trim().is_empty() { "Pit Site" } else { pit_name };
        match self {
            StepKind::TravelToPit => format!("Travel to {}", pit),
            StepKind::Load => format!("Load at {}", pit),
            StepKind::TravelToDump => "Travel to Dump Site".to_string(),
            StepKind::Unload => "Unload at Dump Site".to_string(),
            StepKind::ReturnToPit => format!("Return to {}", pit),
            StepKind::ReturnToBase => "Return to Base".to_string(),
        }
    }
}

/// A single timed activity within a trip
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub kind: StepKind,
    pub action: String,
    /// Duration before the adjust-time buffer
    pub raw_seconds: u64,
    /// Duration the clock actually advanced by
    pub duration_seconds: u64,
    #[serde(with = "clock")]
    pub arrival_time: NaiveDateTime,
    /// Present on travel steps only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leg: Option<DirectionLeg>,
}

impl Step {
    pub fn buffer_seconds(&self) -> u64 {
        self.duration_seconds - self.raw_seconds
    }
}

/// Trip shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TripKind {
    /// base/pit -> pit -> dump -> pit, vehicle ends at the pit
    WorkCycle,
    /// pit -> dump -> base, ends the shift
    FinalTrip,
    /// straight back to base, no load
    ReturnToBase,
}

impl TripKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            TripKind::WorkCycle => "work_cycle",
            TripKind::FinalTrip => "final_trip",
            TripKind::ReturnToBase => "return_to_base",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, TripKind::WorkCycle)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    /// 1-based position in the shift
    pub trip: usize,
    #[serde(rename = "type")]
    pub kind: TripKind,
    pub steps: Vec<Step>,
}

impl Trip {
    /// First step of the given kind
    pub fn step(&self, kind: StepKind) -> Option<&Step> {
        self.steps.iter().find(|s| s.kind == kind)
    }

    pub fn duration_seconds(&self) -> u64 {
        self.steps.iter().fold(0, |acc, s| acc.saturating_add(s.duration_seconds))
    }

    pub fn delivers_load(&self) -> bool {
        self.step(StepKind::Unload).is_some()
    }
}

/// The four fixed legs of the pit/dump/base triangle, absent where the
/// endpoints coincide
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouteSummary {
    pub start_to_pit: Option<DirectionLeg>,
    pub pit_to_dump: Option<DirectionLeg>,
    pub dump_to_pit: Option<DirectionLeg>,
    pub dump_to_start: Option<DirectionLeg>,
}

/// Outcome of one planning run for a single pit
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub pit_name: String,
    pub routes: Vec<Trip>,
    #[serde(with = "clock")]
    pub start_time: NaiveDateTime,
    #[serde(with = "clock")]
    pub scheduled_end_time: NaiveDateTime,
    #[serde(with = "clock")]
    pub max_end_time: NaiveDateTime,
    #[serde(with = "clock")]
    pub actual_end_time: NaiveDateTime,
    pub overtime_minutes: i64,
    pub total_trips: usize,
    pub adjust_time_pct: u32,
    pub route_info: RouteSummary,
}

impl SimulationResult {
    pub fn terminal_trip(&self) -> Option<&Trip> {
        self.routes.last()
    }

    /// Trips that actually deliver a load to the dump
    pub fn loads_delivered(&self) -> usize {
        self.routes.iter().filter(|t| t.delivers_load()).count()
    }
}
