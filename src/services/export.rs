//! Report export (CSV sheet, JSON report)
//!
//! The CSV sheet has three sections per planned pit, each opened by a
//! `<pit>,<section>` title record and its own header: Locations, Routes and
//! Schedule.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::warn;

use crate::types::{
    DirectionLeg, MultiPitReport, PitReport, ResolvedLocation, RouteSummary, ScheduleRow, ScheduleRows,
};

const LOCATION_HEADERS: [&str; 5] = ["Site", "Reference", "Address", "Coordinates", "Map"];
const ROUTE_HEADERS: [&str; 5] = ["Route", "Distance (km)", "Distance", "Time", "Link"];
const SCHEDULE_HEADERS: [&str; 9] = [
    "Location", "Trip", "Duration", "Buffer", "Time", "Activity", "Next Stop", "Revenue", "Tonnes",
];

#[derive(Debug, Serialize)]
struct CsvLocationRow<'a> {
    site: &'static str,
    reference: &'a str,
    address: &'a str,
    coordinates: String,
    map: String,
}

impl<'a> CsvLocationRow<'a> {
    fn new(site: &'static str, location: &'a ResolvedLocation) -> Self {
        Self {
            site,
            reference: &location.reference,
            address: &location.address,
            coordinates: location.coordinates.to_string(),
            map: location.coordinates.maps_link(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CsvRouteRow<'a> {
    route: &'static str,
    distance_km: f64,
    distance: &'a str,
    time: &'a str,
    link: &'a str,
}

/// One CSV line of the schedule section
#[derive(Debug, Serialize)]
struct CsvScheduleRow {
    location: &'static str,
    trip: Option<usize>,
    duration: String,
    buffer_minutes: u64,
    time: String,
    activity: &'static str,
    next_stop: &'static str,
    revenue: Option<String>,
    tonnes: Option<f64>,
}

impl CsvScheduleRow {
    fn new(row: &ScheduleRow) -> Self {
        Self {
            location: row.kind.location(),
            trip: row.trip,
            duration: row.duration_display(),
            buffer_minutes: row.buffer_minutes,
            time: row.clock.map(|c| c.format("%H:%M").to_string()).unwrap_or_default(),
            activity: row.kind.activity(),
            next_stop: row.next_stop,
            revenue: row.revenue.map(|r| format!("{:.2}", r)),
            tonnes: row.tonnes,
        }
    }
}

/// Triangle legs in sheet order, labelled like the schedule's next stops
fn labelled_legs(routes: &RouteSummary) -> [(&'static str, Option<&DirectionLeg>); 4] {
    [
        ("START --> LOAD", routes.start_to_pit.as_ref()),
        ("LOAD --> DUMP", routes.pit_to_dump.as_ref()),
        ("DUMP --> LOAD", routes.dump_to_pit.as_ref()),
        ("DUMP --> END", routes.dump_to_start.as_ref()),
    ]
}

fn write_section<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    pit: &str,
    section: &str,
    headers: &[&str],
) -> Result<()> {
    writer
        .write_record([pit, section])
        .and_then(|_| writer.write_record(headers))
        .with_context(|| format!("Failed to write {} header for {}", section, pit))
}

fn write_pit<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    report: &MultiPitReport,
    pit: &PitReport,
    pit_location: &ResolvedLocation,
    schedule: &ScheduleRows,
    routes: &RouteSummary,
) -> Result<()> {
    let name = pit.pit_name.as_str();

    write_section(writer, name, "Locations", &LOCATION_HEADERS)?;
    for (site, location) in [("Start", &report.start), ("Load Site", pit_location), ("Dump Site", &report.dump)] {
        writer
            .serialize(CsvLocationRow::new(site, location))
            .with_context(|| format!("Failed to write {} location for {}", site, name))?;
    }

    write_section(writer, name, "Routes", &ROUTE_HEADERS)?;
    for (route, leg) in labelled_legs(routes) {
        let Some(leg) = leg else { continue };
        writer
            .serialize(CsvRouteRow {
                route,
                distance_km: leg.distance_km,
                distance: &leg.distance_text,
                time: &leg.time_format,
                link: &leg.route_url,
            })
            .with_context(|| format!("Failed to write {} route for {}", route, name))?;
    }

    write_section(writer, name, "Schedule", &SCHEDULE_HEADERS)?;
    for row in &schedule.rows {
        writer
            .serialize(CsvScheduleRow::new(row))
            .with_context(|| format!("Failed to write schedule row for {}", name))?;
    }
    Ok(())
}

/// Every planned pit's sheet sections; failed pits are skipped
pub fn report_to_csv(report: &MultiPitReport) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_writer(Vec::new());

    for pit in &report.pits {
        match (&pit.plan, &pit.location) {
            (Some(plan), Some(location)) => write_pit(
                &mut writer,
                report,
                pit,
                location,
                &plan.schedule,
                &plan.simulation.route_info,
            )?,
            _ => warn!(
                "Skipping {} in CSV export: {}",
                pit.pit_name,
                pit.error.as_deref().unwrap_or("no plan")
            ),
        }
    }

    let bytes = writer.into_inner().context("Failed to flush CSV")?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

pub fn report_to_json(report: &MultiPitReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize report")
}
