//! Day schedule summary for a planned shift.
//!
//! Groups the planner's steps into the rows a dispatcher reads: one Load Site
//! row and one Dump Site row per load, bracketed by Start of Day and End of
//! Day, followed by TOTAL and Hourly Rate. Durations are already inflated by
//! the planner; rows only regroup them, so the running clock always lands on
//! the planner's actual end.

use chrono::{Duration, NaiveDateTime};
use tracing::debug;

use crate::types::{
    RowKind, ScheduleEconomics, ScheduleRow, ScheduleRows, SimulationResult, Step, StepKind, Trip,
    TripKind,
};

const START_TO_LOAD: &str = "(START --> LOAD)";
const LOAD_TO_DUMP: &str = "(LOAD --> DUMP)";
const DUMP_TO_LOAD: &str = "(DUMP --> LOAD)";
const DUMP_TO_END: &str = "(DUMP --> END)";

/// Build the day schedule for one pit.
///
/// TOTAL revenue is `load_size * rate_per_tonne * total_trips`, counting
/// every trip of the result including the terminal one.
pub fn summarize(result: &SimulationResult, economics: &ScheduleEconomics) -> ScheduleRows {
    let mut builder = RowBuilder::new(result.start_time);
    builder.rows.push(ScheduleRow {
        kind: RowKind::StartOfDay,
        trip: None,
        minutes: 0,
        buffer_minutes: 0,
        clock: Some(result.start_time),
        next_stop: START_TO_LOAD,
        revenue: None,
        tonnes: None,
    });

    // Return-to-pit of the previous cycle, billed to whatever comes next
    let mut carried: Option<&Step> = None;

    for trip in &result.routes {
        match trip.kind {
            TripKind::WorkCycle | TripKind::FinalTrip => {
                let approach = trip.step(StepKind::TravelToPit).or(carried.take());
                builder.push(
                    RowKind::LoadSite,
                    trip,
                    &[approach, trip.step(StepKind::Load)],
                    LOAD_TO_DUMP,
                    |row| row.tonnes = Some(economics.load_size),
                );

                let next_stop = if trip.kind == TripKind::WorkCycle { DUMP_TO_LOAD } else { DUMP_TO_END };
                builder.push(
                    RowKind::DumpSite,
                    trip,
                    &[trip.step(StepKind::TravelToDump), trip.step(StepKind::Unload)],
                    next_stop,
                    |row| row.revenue = Some(economics.revenue_per_load()),
                );

                if trip.kind == TripKind::WorkCycle {
                    carried = trip.step(StepKind::ReturnToPit);
                } else {
                    builder.push(
                        RowKind::EndOfDay,
                        trip,
                        &[trip.step(StepKind::ReturnToBase)],
                        DUMP_TO_END,
                        |_| {},
                    );
                }
            }
            TripKind::ReturnToBase => {
                builder.push(
                    RowKind::EndOfDay,
                    trip,
                    &[carried.take(), trip.step(StepKind::ReturnToBase)],
                    DUMP_TO_END,
                    |_| {},
                );
            }
        }
    }

    builder.finish(result, economics)
}

/// Accumulates rows and the running clock
struct RowBuilder {
    rows: Vec<ScheduleRow>,
    clock: NaiveDateTime,
    total_seconds: u64,
    buffer_seconds: u64,
}

impl RowBuilder {
    fn new(start: NaiveDateTime) -> Self {
        Self {
            rows: Vec::new(),
            clock: start,
            total_seconds: 0,
            buffer_seconds: 0,
        }
    }

    fn push(
        &mut self,
        kind: RowKind,
        trip: &Trip,
        steps: &[Option<&Step>],
        next_stop: &'static str,
        decorate: impl FnOnce(&mut ScheduleRow),
    ) {
        let (raw, elapsed) = steps
            .iter()
            .flatten()
            .fold((0, 0), |(raw, elapsed), s| (raw + s.raw_seconds, elapsed + s.duration_seconds));
        let buffer = elapsed - raw;

        self.clock += Duration::seconds(elapsed as i64);
        self.total_seconds += elapsed;
        self.buffer_seconds += buffer;

        let mut row = ScheduleRow {
            kind,
            trip: Some(trip.trip),
            minutes: raw / 60,
            buffer_minutes: buffer / 60,
            clock: Some(self.clock),
            next_stop,
            revenue: None,
            tonnes: None,
        };
        decorate(&mut row);
        self.rows.push(row);
    }

    fn finish(mut self, result: &SimulationResult, economics: &ScheduleEconomics) -> ScheduleRows {
        let total_minutes = self.total_seconds / 60;
        let total_revenue = economics.revenue_per_load() * result.total_trips as f64;
        let hourly_rate = if total_minutes == 0 {
            0.0
        } else {
            total_revenue / (total_minutes as f64 / 60.0)
        };

        debug!(
            "{}: {} rows, {} min, revenue {:.2}, hourly {:.2}",
            result.pit_name,
            self.rows.len(),
            total_minutes,
            total_revenue,
            hourly_rate
        );

        self.rows.push(ScheduleRow {
            kind: RowKind::Total,
            trip: None,
            minutes: total_minutes,
            buffer_minutes: self.buffer_seconds / 60,
            clock: Some(self.clock),
            next_stop: "",
            revenue: Some(total_revenue),
            tonnes: None,
        });
        self.rows.push(ScheduleRow {
            kind: RowKind::HourlyRate,
            trip: None,
            minutes: 0,
            buffer_minutes: 0,
            clock: None,
            next_stop: "",
            revenue: Some(hourly_rate),
            tonnes: None,
        });

        ScheduleRows {
            rows: self.rows,
            total_minutes,
            total_revenue,
            hourly_rate,
        }
    }
}
