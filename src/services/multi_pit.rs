//! Multi-pit planning
//!
//! Resolves the shared base and dump once, then resolves and plans every pit
//! concurrently. A pit that fails only marks its own report; the request as a
//! whole fails only for request-level problems (bad lists, unresolvable base
//! or dump, bad start time).

use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use crate::error::{PlanError, PlanResult};
use crate::services::geocoding::{resolve_location, Geocoder};
use crate::services::schedule::summarize;
use crate::services::trip_planner::{parse_start_time, validate_work_hours, TripPlanRequest, TripPlanner};
use crate::types::{
    Coordinates, MultiPitReport, MultiPitRequest, PitPlan, PitReport, ResolvedLocation,
    ScheduleEconomics,
};

/// Shared inputs for every pit of one request
struct Shift {
    base: Coordinates,
    dump: Coordinates,
    start_time: chrono::NaiveTime,
    work_hours: f64,
    adjust_time_pct: u32,
}

pub struct MultiPitPlanner {
    geocoder: Arc<dyn Geocoder>,
    planner: TripPlanner,
}

impl MultiPitPlanner {
    pub fn new(geocoder: Arc<dyn Geocoder>, planner: TripPlanner) -> Self {
        Self { geocoder, planner }
    }

    pub async fn plan(&self, request: &MultiPitRequest) -> PlanResult<MultiPitReport> {
        validate_request(request)?;
        let start_time = parse_start_time(&request.start_time)?;

        let (start, dump) = futures::try_join!(
            resolve_location(self.geocoder.as_ref(), &request.start_url),
            resolve_location(self.geocoder.as_ref(), &request.dump_url),
        )?;

        let shift = Shift {
            base: start.coordinates,
            dump: dump.coordinates,
            start_time,
            work_hours: request.work_hours,
            adjust_time_pct: request.adjust_time,
        };

        info!(
            "Planning {} pits from {} to {}",
            request.pit_urls.len(),
            start.address,
            dump.address
        );

        let jobs = request
            .pit_urls
            .iter()
            .enumerate()
            .map(|(index, reference)| self.plan_pit(request, &shift, index, reference));
        let pits = join_all(jobs).await;

        let failed = pits.iter().filter(|p| !p.is_success()).count();
        if failed > 0 {
            warn!("{} of {} pits could not be planned", failed, pits.len());
        }

        Ok(MultiPitReport {
            package: request.package.clone(),
            start,
            dump,
            pits,
        })
    }

    async fn plan_pit(
        &self,
        request: &MultiPitRequest,
        shift: &Shift,
        index: usize,
        reference: &str,
    ) -> PitReport {
        let pit_name = format!("Pit {}", index + 1);
        let mut report = PitReport {
            pit_index: index + 1,
            pit_name: pit_name.clone(),
            material: request.pit_materials.get(index).cloned().filter(|m| !m.is_empty()),
            location: None,
            plan: None,
            error: None,
        };

        let economics = ScheduleEconomics {
            load_size: request.pit_load_sizes[index],
            rate_per_tonne: request.pit_rates[index],
        };

        match self.plan_resolved(shift, pit_name, reference, &economics).await {
            Ok((location, plan)) => {
                report.location = Some(location);
                report.plan = Some(plan);
            }
            Err(e) => {
                warn!("{} failed: {}", report.pit_name, e);
                report.error = Some(e.to_string());
            }
        }
        report
    }

    async fn plan_resolved(
        &self,
        shift: &Shift,
        pit_name: String,
        reference: &str,
        economics: &ScheduleEconomics,
    ) -> PlanResult<(ResolvedLocation, PitPlan)> {
        let location = resolve_location(self.geocoder.as_ref(), reference).await?;

        let trip_request = TripPlanRequest {
            base: shift.base,
            pit: location.coordinates,
            dump: shift.dump,
            start_time: shift.start_time,
            work_hours: shift.work_hours,
            pit_name,
            adjust_time_pct: shift.adjust_time_pct,
        };

        let simulation = self.planner.plan(&trip_request).await?;
        let schedule = summarize(&simulation, economics);

        Ok((location, PitPlan { simulation, schedule }))
    }
}

fn validate_request(request: &MultiPitRequest) -> PlanResult<()> {
    let pits = request.pit_urls.len();
    if pits == 0 {
        return Err(PlanError::invalid("at least one pit is required"));
    }

    let required = [
        ("pitLoadSizes", request.pit_load_sizes.len()),
        ("pitRates", request.pit_rates.len()),
    ];
    for (name, len) in required {
        if len != pits {
            return Err(PlanError::invalid(format!("{} has {} entries for {} pits", name, len, pits)));
        }
    }

    // optional lists: empty or one entry per pit
    let optional = [
        ("pitMaterials", request.pit_materials.len()),
        ("pitTonnes", request.pit_tonnes.len()),
    ];
    for (name, len) in optional {
        if len != 0 && len != pits {
            return Err(PlanError::invalid(format!("{} has {} entries for {} pits", name, len, pits)));
        }
    }

    let mut amounts = request.pit_load_sizes.iter().chain(&request.pit_rates).chain(&request.pit_tonnes);
    if amounts.any(|v| !v.is_finite() || *v < 0.0) {
        return Err(PlanError::invalid("load sizes, rates and tonnes must be non-negative numbers"));
    }

    validate_work_hours(request.work_hours)
}
