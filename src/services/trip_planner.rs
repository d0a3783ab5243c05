//! Trip planning simulation for a single vehicle's shift.
//!
//! The vehicle leaves base, then repeats pit → dump → pit work cycles while a
//! full cycle plus the drive home still fits before the max end time. When it
//! no longer fits it tries a half cycle (pit → dump → base), and failing that
//! drives straight home.
//!
//! Directions are fetched once into a [`LegCache`]; [`simulate`] itself is a
//! pure function over that cache.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{debug, info};

use crate::defaults::{hard_cutoff, LOADING_TIME_MINUTES, OVERTIME_ALLOWANCE_MINUTES, UNLOADING_TIME_MINUTES};
use crate::error::{PlanError, PlanResult};
use crate::services::directions::DirectionsService;
use crate::services::leg_cache::LegCache;
use crate::types::{
    Coordinates, DirectionLeg, RouteSummary, SimulationResult, Step, StepKind, Trip, TripKind,
};

/// Timing constants shared by every planning run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannerSettings {
    pub loading_minutes: u64,
    pub unloading_minutes: u64,
    pub overtime_allowance_minutes: u64,
    /// Scheduled end never falls after this time of day
    pub hard_cutoff: NaiveTime,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            loading_minutes: LOADING_TIME_MINUTES,
            unloading_minutes: UNLOADING_TIME_MINUTES,
            overtime_allowance_minutes: OVERTIME_ALLOWANCE_MINUTES,
            hard_cutoff: hard_cutoff(),
        }
    }
}

/// Everything needed to plan one pit
#[derive(Debug, Clone, PartialEq)]
pub struct TripPlanRequest {
    /// Start and end of the shift
    pub base: Coordinates,
    pub pit: Coordinates,
    pub dump: Coordinates,
    pub start_time: NaiveTime,
    pub work_hours: f64,
    pub pit_name: String,
    /// Percentage added to every duration
    pub adjust_time_pct: u32,
}

impl TripPlanRequest {
    pub fn validate(&self) -> PlanResult<()> {
        for (name, coords) in [("base", self.base), ("pit", self.pit), ("dump", self.dump)] {
            if !coords.is_valid() {
                return Err(PlanError::invalid(format!("{} coordinates {} are not valid", name, coords)));
            }
        }
        validate_work_hours(self.work_hours)
    }

    /// Directional legs the simulation may need
    pub fn required_legs(&self) -> [(Coordinates, Coordinates); 5] {
        [
            (self.base, self.pit),
            (self.pit, self.dump),
            (self.dump, self.pit),
            (self.dump, self.base),
            (self.pit, self.base),
        ]
    }
}

pub fn validate_work_hours(work_hours: f64) -> PlanResult<()> {
    if !work_hours.is_finite() || work_hours < 0.0 {
        return Err(PlanError::invalid(format!(
            "work hours must be a non-negative number, got {}",
            work_hours
        )));
    }
    Ok(())
}

/// Parse a shift start time, `HH:MM` or `HH:MM:SS`
pub fn parse_start_time(value: &str) -> PlanResult<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| PlanError::invalid(format!("start time must be HH:MM, got '{}'", value)))
}

/// `seconds + floor(seconds * pct / 100)`, saturating at `u64::MAX`
pub fn inflate(seconds: u64, adjust_time_pct: u32) -> u64 {
    seconds.saturating_add(seconds.saturating_mul(u64::from(adjust_time_pct)) / 100)
}

fn total(parts: &[u64]) -> u64 {
    parts.iter().fold(0, |acc, &s| acc.saturating_add(s))
}

/// Whole minutes past the scheduled end, truncated
pub fn overtime_minutes(actual_end: NaiveDateTime, scheduled_end: NaiveDateTime) -> i64 {
    if actual_end > scheduled_end {
        (actual_end - scheduled_end).num_seconds() / 60
    } else {
        0
    }
}

/// Shift clock anchored on an arbitrary fixed day
fn shift_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 3).expect("valid static shift day")
}

/// `None` once the clock leaves chrono's representable range
fn advance(time: NaiveDateTime, seconds: u64) -> Option<NaiveDateTime> {
    let seconds = i64::try_from(seconds).ok()?;
    time.checked_add_signed(Duration::try_seconds(seconds)?)
}

fn after(time: NaiveDateTime, seconds: u64) -> PlanResult<NaiveDateTime> {
    advance(time, seconds).ok_or_else(|| {
        PlanError::invalid(format!(
            "adding {} s to {} overflows the shift clock",
            seconds,
            time.format("%H:%M")
        ))
    })
}

/// Whether `seconds` from `clock` still ends by `limit`
fn fits(clock: NaiveDateTime, seconds: u64, limit: NaiveDateTime) -> bool {
    advance(clock, seconds).is_some_and(|end| end <= limit)
}

/// Start, scheduled end and max end of one shift
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftWindow {
    pub start: NaiveDateTime,
    /// Earlier of start + work hours and the hard cutoff
    pub scheduled_end: NaiveDateTime,
    /// Scheduled end plus the overtime allowance
    pub max_end: NaiveDateTime,
}

impl ShiftWindow {
    /// The scheduled end may fall before the start when the shift begins
    /// after the cutoff; the overtime allowance still applies from it.
    pub fn new(start_time: NaiveTime, work_hours: f64, settings: &PlannerSettings) -> PlanResult<Self> {
        let day = shift_day();
        let start = day.and_time(start_time);
        let cutoff = day.and_time(settings.hard_cutoff);
        // f64 → u64 saturates, and an unrepresentable end is past the cutoff anyway
        let nominal_end = advance(start, (work_hours * 3600.0).round() as u64);

        let scheduled_end = match nominal_end {
            Some(end) if end <= cutoff => end,
            _ => {
                debug!(
                    "Using hard cutoff {} instead of calculated end time ({} h from {})",
                    cutoff.format("%H:%M"),
                    work_hours,
                    start.format("%H:%M")
                );
                cutoff
            }
        };

        Ok(Self {
            start,
            scheduled_end,
            max_end: after(scheduled_end, settings.overtime_allowance_minutes.saturating_mul(60))?,
        })
    }
}

/// Where the vehicle is between trips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Base,
    Pit,
}

/// The five legs of the base/pit/dump triangle; `None` where endpoints coincide
struct TriangleLegs<'a> {
    base_to_pit: Option<&'a DirectionLeg>,
    pit_to_dump: Option<&'a DirectionLeg>,
    dump_to_pit: Option<&'a DirectionLeg>,
    dump_to_base: Option<&'a DirectionLeg>,
    pit_to_base: Option<&'a DirectionLeg>,
}

impl<'a> TriangleLegs<'a> {
    fn from_cache(cache: &'a LegCache, request: &TripPlanRequest) -> PlanResult<Self> {
        Ok(Self {
            base_to_pit: cache.lookup(request.base, request.pit)?,
            pit_to_dump: cache.lookup(request.pit, request.dump)?,
            dump_to_pit: cache.lookup(request.dump, request.pit)?,
            dump_to_base: cache.lookup(request.dump, request.base)?,
            pit_to_base: cache.lookup(request.pit, request.base)?,
        })
    }

    fn to_pit(&self, position: Position) -> Option<&'a DirectionLeg> {
        match position {
            Position::Base => self.base_to_pit,
            Position::Pit => None,
        }
    }

    fn to_base(&self, position: Position) -> Option<&'a DirectionLeg> {
        match position {
            Position::Base => None,
            Position::Pit => self.pit_to_base,
        }
    }
}

/// Appends steps while advancing the trip clock
struct TripBuilder<'a> {
    clock: NaiveDateTime,
    adjust_time_pct: u32,
    pit_name: &'a str,
    steps: Vec<Step>,
}

impl<'a> TripBuilder<'a> {
    fn new(clock: NaiveDateTime, adjust_time_pct: u32, pit_name: &'a str) -> Self {
        Self {
            clock,
            adjust_time_pct,
            pit_name,
            steps: Vec::with_capacity(5),
        }
    }

    /// No step for a zero-length leg
    fn travel(&mut self, kind: StepKind, leg: Option<&DirectionLeg>) -> PlanResult<()> {
        match leg {
            Some(leg) => self.push(kind, leg.duration_seconds, Some(leg.clone())),
            None => Ok(()),
        }
    }

    fn work(&mut self, kind: StepKind, raw_seconds: u64) -> PlanResult<()> {
        self.push(kind, raw_seconds, None)
    }

    fn push(&mut self, kind: StepKind, raw_seconds: u64, leg: Option<DirectionLeg>) -> PlanResult<()> {
        let duration_seconds = inflate(raw_seconds, self.adjust_time_pct);
        self.clock = after(self.clock, duration_seconds)?;
        self.steps.push(Step {
            kind,
            action: kind.label(self.pit_name),
            raw_seconds,
            duration_seconds,
            arrival_time: self.clock,
            leg,
        });
        Ok(())
    }

    fn finish(self, number: usize, kind: TripKind) -> (Trip, NaiveDateTime) {
        let trip = Trip {
            trip: number,
            kind,
            steps: self.steps,
        };
        debug!(
            "Trip {}: {}, {} steps, {} s",
            trip.trip,
            trip.kind.as_str(),
            trip.steps.len(),
            trip.duration_seconds()
        );
        (trip, self.clock)
    }
}

/// Run the shift simulation over already-fetched legs
pub fn simulate(
    request: &TripPlanRequest,
    cache: &LegCache,
    settings: &PlannerSettings,
) -> PlanResult<SimulationResult> {
    request.validate()?;

    let legs = TriangleLegs::from_cache(cache, request)?;
    let window = ShiftWindow::new(request.start_time, request.work_hours, settings)?;
    let pct = request.adjust_time_pct;

    let loading_seconds = settings.loading_minutes.saturating_mul(60);
    let unloading_seconds = settings.unloading_minutes.saturating_mul(60);
    let adjusted = |leg: Option<&DirectionLeg>| leg.map_or(0, |l| inflate(l.duration_seconds, pct));
    let load_and_dump = total(&[
        inflate(loading_seconds, pct),
        adjusted(legs.pit_to_dump),
        inflate(unloading_seconds, pct),
    ]);

    if total(&[load_and_dump, adjusted(legs.dump_to_pit)]) == 0 {
        return Err(PlanError::invalid("a work cycle takes no time, the shift would never end"));
    }

    debug!(
        "Start time: {}, scheduled end: {}, max end with overtime: {}",
        window.start.format("%H:%M"),
        window.scheduled_end.format("%H:%M"),
        window.max_end.format("%H:%M")
    );

    let mut trips: Vec<Trip> = Vec::new();
    let mut clock = window.start;
    let mut position = Position::Base;

    loop {
        let number = trips.len() + 1;
        let to_pit = legs.to_pit(position);
        let mut builder = TripBuilder::new(clock, pct, &request.pit_name);

        let full_cycle = total(&[adjusted(to_pit), load_and_dump, adjusted(legs.dump_to_pit)]);
        let return_from_pit = adjusted(legs.pit_to_base);

        debug!(
            "Trip {}: full cycle {} s plus {} s home, max allowed {}",
            number,
            full_cycle,
            return_from_pit,
            window.max_end.format("%H:%M")
        );

        if fits(clock, total(&[full_cycle, return_from_pit]), window.max_end) {
            builder.travel(StepKind::TravelToPit, to_pit)?;
            builder.work(StepKind::Load, loading_seconds)?;
            builder.travel(StepKind::TravelToDump, legs.pit_to_dump)?;
            builder.work(StepKind::Unload, unloading_seconds)?;
            builder.travel(StepKind::ReturnToPit, legs.dump_to_pit)?;

            let (trip, end) = builder.finish(number, TripKind::WorkCycle);
            trips.push(trip);
            clock = end;
            position = Position::Pit;
            continue;
        }

        let half_cycle = total(&[adjusted(to_pit), load_and_dump, adjusted(legs.dump_to_base)]);
        let (trip, end) = if fits(clock, half_cycle, window.max_end) {
            debug!("Trip {}: half cycle of {} s fits, final trip", number, half_cycle);
            builder.travel(StepKind::TravelToPit, to_pit)?;
            builder.work(StepKind::Load, loading_seconds)?;
            builder.travel(StepKind::TravelToDump, legs.pit_to_dump)?;
            builder.work(StepKind::Unload, unloading_seconds)?;
            builder.travel(StepKind::ReturnToBase, legs.dump_to_base)?;
            builder.finish(number, TripKind::FinalTrip)
        } else {
            debug!("Trip {}: half cycle exceeds max time, returning to base", number);
            builder.travel(StepKind::ReturnToBase, legs.to_base(position))?;
            builder.finish(number, TripKind::ReturnToBase)
        };

        trips.push(trip);
        clock = end;
        break;
    }

    let overtime = overtime_minutes(clock, window.scheduled_end);
    let result = SimulationResult {
        pit_name: request.pit_name.clone(),
        total_trips: trips.len(),
        routes: trips,
        start_time: window.start,
        scheduled_end_time: window.scheduled_end,
        max_end_time: window.max_end,
        actual_end_time: clock,
        overtime_minutes: overtime,
        adjust_time_pct: pct,
        route_info: RouteSummary {
            start_to_pit: legs.base_to_pit.cloned(),
            pit_to_dump: legs.pit_to_dump.cloned(),
            dump_to_pit: legs.dump_to_pit.cloned(),
            dump_to_start: legs.dump_to_base.cloned(),
        },
    };

    info!(
        "Planned {} trips ({} loads) for {}, back at base {} ({} min overtime)",
        result.total_trips,
        result.loads_delivered(),
        if request.pit_name.is_empty() { "pit" } else { request.pit_name.as_str() },
        clock.format("%H:%M"),
        overtime
    );

    Ok(result)
}

/// Plans single-pit shifts against a directions backend
#[derive(Clone)]
pub struct TripPlanner {
    directions: Arc<dyn DirectionsService>,
    settings: PlannerSettings,
}

impl TripPlanner {
    pub fn new(directions: Arc<dyn DirectionsService>, settings: PlannerSettings) -> Self {
        Self { directions, settings }
    }

    /// Fetch the triangle legs, then simulate. Fails as a whole; never
    /// returns a partial plan.
    pub async fn plan(&self, request: &TripPlanRequest) -> PlanResult<SimulationResult> {
        request.validate()?;
        let cache = LegCache::populate(self.directions.as_ref(), &request.required_legs()).await?;
        simulate(request, &cache, &self.settings)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::services::directions::testing::{FixedDirections, UnavailableDirections};

    pub(crate) fn base() -> Coordinates {
        Coordinates::new(-33.80, 151.00)
    }

    pub(crate) fn pit() -> Coordinates {
        Coordinates::new(-33.70, 150.90)
    }

    pub(crate) fn dump() -> Coordinates {
        Coordinates::new(-33.90, 150.95)
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        shift_day().and_time(hm(h, m))
    }

    pub(crate) fn request(start: NaiveTime, work_hours: f64) -> TripPlanRequest {
        TripPlanRequest {
            base: base(),
            pit: pit(),
            dump: dump(),
            start_time: start,
            work_hours,
            pit_name: "Pit 1".to_string(),
            adjust_time_pct: 0,
        }
    }

    /// Plan with every leg taking `leg_seconds`
    pub(crate) fn plan_uniform(request: &TripPlanRequest, leg_seconds: u64) -> SimulationResult {
        let planner = TripPlanner::new(Arc::new(FixedDirections::uniform(leg_seconds)), PlannerSettings::default());
        tokio_test::block_on(planner.plan(request)).unwrap()
    }

    fn kinds(trip: &Trip) -> Vec<StepKind> {
        trip.steps.iter().map(|s| s.kind).collect()
    }

    fn assert_well_formed(result: &SimulationResult) {
        assert_eq!(result.total_trips, result.routes.len());

        let (last, rest) = result.routes.split_last().expect("at least one trip");
        assert!(last.kind.is_terminal());
        assert!(rest.iter().all(|t| t.kind == TripKind::WorkCycle));

        let mut clock = result.start_time;
        for (i, trip) in result.routes.iter().enumerate() {
            assert_eq!(trip.trip, i + 1);
            for step in &trip.steps {
                assert_eq!(step.arrival_time, after(clock, step.duration_seconds).unwrap());
                clock = step.arrival_time;
            }
        }
        assert_eq!(clock, result.actual_end_time);
        assert!(result.overtime_minutes >= 0);
    }

    #[test]
    fn inflate_is_floor_percentage() {
        assert_eq!(inflate(1200, 0), 1200);
        assert_eq!(inflate(1200, 50), 1800);
        assert_eq!(inflate(1000, 15), 1150);
        assert_eq!(inflate(59, 10), 64); // 5.9 floors to 5
        assert_eq!(inflate(0, 80), 0);
        assert_eq!(inflate(u64::MAX / 2, u32::MAX), u64::MAX);
    }

    #[test]
    fn clock_overflow_is_an_error_not_a_panic() {
        assert!(matches!(after(at(7, 0), u64::MAX), Err(PlanError::InvalidInput(_))));
        assert!(matches!(after(at(7, 0), i64::MAX as u64), Err(PlanError::InvalidInput(_))));
        assert!(!fits(at(7, 0), u64::MAX, at(17, 50)));
        assert!(fits(at(7, 0), 3000, at(7, 50)));
        assert!(!fits(at(7, 0), 3001, at(7, 50)));
    }

    #[test]
    fn parse_start_time_formats() {
        assert_eq!(parse_start_time("07:00").unwrap(), hm(7, 0));
        assert_eq!(parse_start_time(" 6:30 ").unwrap(), hm(6, 30));
        assert_eq!(parse_start_time("07:00:30").unwrap(), NaiveTime::from_hms_opt(7, 0, 30).unwrap());
        assert!(matches!(parse_start_time("25:00"), Err(PlanError::InvalidInput(_))));
        assert!(matches!(parse_start_time("7am"), Err(PlanError::InvalidInput(_))));
    }

    #[test]
    fn shift_window_respects_hard_cutoff() {
        let settings = PlannerSettings::default();

        let window = ShiftWindow::new(hm(7, 0), 10.0, &settings).unwrap();
        assert_eq!(window.scheduled_end, at(17, 0));
        assert_eq!(window.max_end, at(17, 50));

        let window = ShiftWindow::new(hm(8, 0), 10.0, &settings).unwrap();
        assert_eq!(window.scheduled_end, at(17, 20));
        assert_eq!(window.max_end, at(18, 10));

        let window = ShiftWindow::new(hm(7, 0), 7.5, &settings).unwrap();
        assert_eq!(window.scheduled_end, at(14, 30));

        // longer than a day still clamps to the cutoff
        let window = ShiftWindow::new(hm(7, 0), 25.0, &settings).unwrap();
        assert_eq!(window.scheduled_end, at(17, 20));
        let window = ShiftWindow::new(hm(7, 0), 1e12, &settings).unwrap();
        assert_eq!(window.max_end, at(18, 10));

        // a start after the cutoff keeps the cutoff as scheduled end
        let window = ShiftWindow::new(hm(17, 25), 10.0, &settings).unwrap();
        assert_eq!(window.start, at(17, 25));
        assert_eq!(window.scheduled_end, at(17, 20));
        assert_eq!(window.max_end, at(18, 10));
    }

    #[test]
    fn overtime_truncates_to_whole_minutes() {
        let scheduled = at(17, 0);
        assert_eq!(overtime_minutes(at(16, 59), scheduled), 0);
        assert_eq!(overtime_minutes(scheduled, scheduled), 0);
        assert_eq!(overtime_minutes(after(scheduled, 59).unwrap(), scheduled), 0);
        assert_eq!(overtime_minutes(after(scheduled, 119).unwrap(), scheduled), 1);
        assert_eq!(overtime_minutes(at(17, 40), scheduled), 40);
    }

    #[test]
    fn ten_hour_shift_with_twenty_minute_legs() {
        // First cycle 100 min from base, then 80 min cycles from the pit.
        // Cycles end 08:40, 10:00 ... 16:40; from 16:40 neither a full
        // (18:20) nor a half cycle (18:00) fits before 17:50.
        let result = plan_uniform(&request(hm(7, 0), 10.0), 1200);
        assert_well_formed(&result);

        assert_eq!(result.scheduled_end_time, at(17, 0));
        assert_eq!(result.max_end_time, at(17, 50));
        assert_eq!(result.total_trips, 8);

        let first = &result.routes[0];
        assert_eq!(
            kinds(first),
            vec![
                StepKind::TravelToPit,
                StepKind::Load,
                StepKind::TravelToDump,
                StepKind::Unload,
                StepKind::ReturnToPit,
            ]
        );
        assert_eq!(first.steps[4].arrival_time, at(8, 40));
        assert_eq!(first.steps[0].action, "Travel to Pit 1");

        // later cycles start at the pit
        assert_eq!(result.routes[1].steps[0].kind, StepKind::Load);
        assert_eq!(result.routes[6].steps.last().unwrap().arrival_time, at(16, 40));

        let last = result.terminal_trip().unwrap();
        assert_eq!(last.kind, TripKind::ReturnToBase);
        assert_eq!(kinds(last), vec![StepKind::ReturnToBase]);
        assert_eq!(result.actual_end_time, at(17, 0));
        assert!(result.actual_end_time <= result.max_end_time);
        assert_eq!(result.overtime_minutes, 0);
    }

    #[test]
    fn nine_hour_shift_ends_with_final_trip() {
        // max end 16:50; from the pit at 15:20 a full cycle would end 17:00
        // but the half cycle ends 16:40.
        let result = plan_uniform(&request(hm(7, 0), 9.0), 1200);
        assert_well_formed(&result);

        assert_eq!(result.total_trips, 7);
        let last = result.terminal_trip().unwrap();
        assert_eq!(last.kind, TripKind::FinalTrip);
        assert_eq!(
            kinds(last),
            vec![StepKind::Load, StepKind::TravelToDump, StepKind::Unload, StepKind::ReturnToBase]
        );
        assert_eq!(result.actual_end_time, at(16, 40));
        assert_eq!(result.overtime_minutes, 40);
        assert_eq!(result.loads_delivered(), 7);
    }

    #[test]
    fn adjust_time_inflates_every_step() {
        let mut req = request(hm(7, 0), 10.0);
        req.adjust_time_pct = 50;
        let result = plan_uniform(&req, 1200);
        assert_well_formed(&result);

        let first = &result.routes[0];
        for step in &first.steps {
            assert_eq!(step.raw_seconds, 1200);
            assert_eq!(step.duration_seconds, 1800);
            assert_eq!(step.buffer_seconds(), 600);
        }
        // 5 steps × 30 min
        assert_eq!(first.steps.last().unwrap().arrival_time, at(9, 30));
        assert_eq!(result.adjust_time_pct, 50);
    }

    #[test]
    fn zero_adjust_matches_raw_durations() {
        let result = plan_uniform(&request(hm(7, 0), 10.0), 1337);
        for trip in &result.routes {
            for step in &trip.steps {
                assert_eq!(step.duration_seconds, step.raw_seconds);
            }
        }
    }

    #[test]
    fn pit_at_base_skips_base_legs() {
        let mut req = request(hm(7, 0), 10.0);
        req.pit = req.base;
        let result = plan_uniform(&req, 1200);
        assert_well_formed(&result);

        for trip in &result.routes {
            for step in &trip.steps {
                assert_ne!(step.kind, StepKind::TravelToPit);
            }
        }
        let travel: Vec<StepKind> = result.routes[0]
            .steps
            .iter()
            .filter(|s| s.kind.is_travel())
            .map(|s| s.kind)
            .collect();
        assert_eq!(travel, vec![StepKind::TravelToDump, StepKind::ReturnToPit]);

        assert!(result.route_info.start_to_pit.is_none());
        assert!(result.route_info.pit_to_dump.is_some());

        // 80 min cycles from 07:00; the one starting 16:20 ends 17:40, after
        // which neither a full nor a half cycle (both 19:00) fits before 17:50
        assert_eq!(result.total_trips, 9);
        assert_eq!(result.routes[7].kind, TripKind::WorkCycle);
        assert_eq!(result.routes[7].steps.last().unwrap().arrival_time, at(17, 40));

        // vehicle is already home: the terminal return carries no step
        let last = result.terminal_trip().unwrap();
        assert_eq!(last.kind, TripKind::ReturnToBase);
        assert!(last.steps.is_empty());
        assert_eq!(result.actual_end_time, at(17, 40));
        assert_eq!(result.overtime_minutes, 40);
    }

    #[test]
    fn dump_at_base_final_trip_has_no_drive_home() {
        let mut req = request(hm(7, 0), 9.0);
        req.dump = req.base;
        let result = plan_uniform(&req, 1200);
        assert_well_formed(&result);

        assert!(result.route_info.dump_to_start.is_none());

        // same cycles as the 9 h day; from 15:20 the half cycle is
        // load, haul and unload only, ending 16:20
        assert_eq!(result.total_trips, 7);
        let last = result.terminal_trip().unwrap();
        assert_eq!(last.kind, TripKind::FinalTrip);
        assert_eq!(kinds(last), vec![StepKind::Load, StepKind::TravelToDump, StepKind::Unload]);
        assert!(last.step(StepKind::ReturnToBase).is_none());
        assert!(last.delivers_load());
        assert_eq!(result.actual_end_time, at(16, 20));
        assert_eq!(result.overtime_minutes, 20);
    }

    #[test]
    fn all_sites_coincide_only_load_and_unload() {
        let mut req = request(hm(7, 0), 10.0);
        req.pit = req.base;
        req.dump = req.base;

        let directions = FixedDirections::uniform(1200);
        let planner = TripPlanner::new(Arc::new(directions), PlannerSettings::default());
        let result = tokio_test::block_on(planner.plan(&req)).unwrap();
        assert_well_formed(&result);

        for trip in &result.routes {
            assert!(trip.steps.iter().all(|s| !s.kind.is_travel()));
        }
        // 40 min cycles from 07:00, the last one starting 17:00 ends 17:40
        let cycles = result.routes.iter().filter(|t| t.kind == TripKind::WorkCycle).count();
        assert_eq!(cycles, 16);
        let last = result.terminal_trip().unwrap();
        assert_eq!(last.kind, TripKind::ReturnToBase);
        assert!(last.steps.is_empty());
        assert_eq!(result.actual_end_time, at(17, 40));
        assert_eq!(result.overtime_minutes, 40);
    }

    #[test]
    fn no_time_for_anything_returns_empty_trip() {
        let result = plan_uniform(&request(hm(7, 0), 0.0), 1200);
        assert_well_formed(&result);

        // max end 07:50: full cycle 07:00 + 120 and half cycle + 100 both miss
        assert_eq!(result.total_trips, 1);
        let only = &result.routes[0];
        assert_eq!(only.kind, TripKind::ReturnToBase);
        assert!(only.steps.is_empty());
        assert_eq!(result.actual_end_time, at(7, 0));
        assert_eq!(result.overtime_minutes, 0);
    }

    #[test]
    fn first_iteration_half_cycle() {
        // max end 08:50: full 07:00+120 misses, half 07:00+100 fits
        let result = plan_uniform(&request(hm(7, 0), 1.0), 1200);
        assert_well_formed(&result);

        assert_eq!(result.total_trips, 1);
        let only = &result.routes[0];
        assert_eq!(only.kind, TripKind::FinalTrip);
        assert_eq!(only.steps[0].kind, StepKind::TravelToPit);
        assert_eq!(result.actual_end_time, at(8, 40));
        assert_eq!(result.overtime_minutes, 40);
    }

    #[test]
    fn asymmetric_legs_use_their_own_direction() {
        let directions = FixedDirections::uniform(1200)
            .with_leg(dump(), pit(), 600)
            .with_leg(dump(), base(), 900);
        let planner = TripPlanner::new(Arc::new(directions), PlannerSettings::default());
        let result = tokio_test::block_on(planner.plan(&request(hm(7, 0), 9.0))).unwrap();
        assert_well_formed(&result);

        let first = &result.routes[0];
        assert_eq!(first.step(StepKind::ReturnToPit).unwrap().duration_seconds, 600);
        assert_eq!(first.steps.last().unwrap().arrival_time, at(8, 30));
        assert_eq!(result.route_info.dump_to_pit.as_ref().unwrap().duration_seconds, 600);
        assert_eq!(result.route_info.dump_to_start.as_ref().unwrap().duration_seconds, 900);

        // 70 min cycles from the pit; at 15:30 a full cycle plus the drive
        // home ends 17:00, the half cycle home via the dump 16:45
        assert_eq!(result.total_trips, 8);
        let last = result.terminal_trip().unwrap();
        assert_eq!(last.kind, TripKind::FinalTrip);
        let home = last.step(StepKind::ReturnToBase).unwrap();
        assert_eq!(home.duration_seconds, 900);
        assert_eq!(home.leg.as_ref().unwrap().duration_seconds, 900);
        assert_eq!(result.actual_end_time, at(16, 45));
        assert_eq!(result.overtime_minutes, 45);
    }

    #[test]
    fn legs_are_fetched_once_per_plan() {
        let directions = Arc::new(FixedDirections::uniform(1200));
        let planner = TripPlanner::new(directions.clone(), PlannerSettings::default());
        let result = tokio_test::block_on(planner.plan(&request(hm(7, 0), 10.0))).unwrap();

        assert!(result.total_trips > 2);
        assert_eq!(directions.call_count(), 5);
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let mut req = request(hm(7, 0), -1.0);
        assert!(matches!(req.validate(), Err(PlanError::InvalidInput(_))));

        req.work_hours = f64::NAN;
        assert!(matches!(req.validate(), Err(PlanError::InvalidInput(_))));

        req.work_hours = f64::INFINITY;
        assert!(matches!(req.validate(), Err(PlanError::InvalidInput(_))));

        let mut req = request(hm(7, 0), 10.0);
        req.pit = Coordinates::new(f64::NAN, 150.0);
        assert!(matches!(req.validate(), Err(PlanError::InvalidInput(_))));
    }

    #[test]
    fn start_after_cutoff_still_plans_into_overtime() {
        // scheduled end clamps to 17:20, max end 18:10; a 40 min cycle
        // from 17:25 ends 18:05
        let mut req = request(hm(17, 25), 10.0);
        req.pit = req.base;
        req.dump = req.base;
        let result = plan_uniform(&req, 1200);
        assert_well_formed(&result);

        assert_eq!(result.scheduled_end_time, at(17, 20));
        assert_eq!(result.max_end_time, at(18, 10));
        assert_eq!(result.total_trips, 2);
        assert_eq!(result.routes[0].kind, TripKind::WorkCycle);
        assert_eq!(kinds(&result.routes[0]), vec![StepKind::Load, StepKind::Unload]);
        assert_eq!(result.routes[1].kind, TripKind::ReturnToBase);
        assert_eq!(result.actual_end_time, at(18, 5));
        assert_eq!(result.overtime_minutes, 45);
    }

    #[test]
    fn long_work_hours_clamp_to_cutoff() {
        let result = plan_uniform(&request(hm(7, 0), 25.0), 1200);
        assert_well_formed(&result);

        assert_eq!(result.scheduled_end_time, at(17, 20));
        assert_eq!(result.max_end_time, at(18, 10));
    }

    #[test]
    fn huge_adjust_percentage_returns_home_without_panicking() {
        let mut req = request(hm(7, 0), 10.0);
        req.adjust_time_pct = u32::MAX;
        let result = plan_uniform(&req, 100_000);
        assert_well_formed(&result);

        assert_eq!(result.total_trips, 1);
        assert_eq!(result.routes[0].kind, TripKind::ReturnToBase);
        assert!(result.routes[0].steps.is_empty());
        assert_eq!(result.actual_end_time, at(7, 0));
    }

    #[test]
    fn zero_length_cycle_is_rejected() {
        let settings = PlannerSettings {
            loading_minutes: 0,
            unloading_minutes: 0,
            ..PlannerSettings::default()
        };
        let mut req = request(hm(7, 0), 10.0);
        req.pit = req.base;
        req.dump = req.base;

        let err = simulate(&req, &LegCache::new(), &settings).unwrap_err();
        assert!(matches!(err, PlanError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn upstream_failure_aborts_plan() {
        let planner = TripPlanner::new(Arc::new(UnavailableDirections), PlannerSettings::default());
        let err = planner.plan(&request(hm(7, 0), 10.0)).await.unwrap_err();
        assert!(matches!(err, PlanError::UpstreamUnavailable { .. }));
    }
}
