//! Day schedule rows produced by the schedule summarizer

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::clock;

/// Per-pit economics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEconomics {
    /// Tonnes carried per load
    pub load_size: f64,
    pub rate_per_tonne: f64,
}

impl ScheduleEconomics {
    pub fn revenue_per_load(&self) -> f64 {
        self.load_size * self.rate_per_tonne
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    StartOfDay,
    LoadSite,
    DumpSite,
    EndOfDay,
    Total,
    HourlyRate,
}

impl RowKind {
    pub const fn location(self) -> &'static str {
        match self {
            RowKind::StartOfDay => "Start of Day",
            RowKind::LoadSite => "Load Site -Clean Pit",
            RowKind::DumpSite => "Dump Site",
            RowKind::EndOfDay => "End of Day",
            RowKind::Total => "TOTAL",
            RowKind::HourlyRate => "Hourly Rate",
        }
    }

    pub const fn activity(self) -> &'static str {
        match self {
            RowKind::LoadSite => "Load",
            RowKind::DumpSite => "Dump",
            _ => "",
        }
    }
}

/// One line of the day schedule
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRow {
    pub kind: RowKind,
    /// Trip the row belongs to (none for start/total rows)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trip: Option<usize>,
    /// Unbuffered minutes for the grouped steps
    pub minutes: u64,
    /// Adjust-time buffer on top of `minutes`
    pub buffer_minutes: u64,
    /// Running clock after this row (not set on the hourly rate row)
    #[serde(with = "clock::option", skip_serializing_if = "Option::is_none")]
    pub clock: Option<NaiveDateTime>,
    /// e.g. "(LOAD --> DUMP)"
    pub next_stop: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tonnes: Option<f64>,
}

impl ScheduleRow {
    /// `minutes` as H:MM
    pub fn duration_display(&self) -> String {
        format_minutes(self.minutes)
    }
}

/// Full day schedule including TOTAL and Hourly Rate rows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRows {
    pub rows: Vec<ScheduleRow>,
    pub total_minutes: u64,
    pub total_revenue: f64,
    pub hourly_rate: f64,
}

impl ScheduleRows {
    pub fn row(&self, kind: RowKind) -> Option<&ScheduleRow> {
        self.rows.iter().find(|r| r.kind == kind)
    }

    pub fn rows_of(&self, kind: RowKind) -> impl Iterator<Item = &ScheduleRow> {
        self.rows.iter().filter(move |r| r.kind == kind)
    }
}

/// Minutes as H:MM (hours are not wrapped)
pub fn format_minutes(minutes: u64) -> String {
    format!("{}:{:02}", minutes / 60, minutes % 60)
}
