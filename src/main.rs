//! Haul Planner - command line entry point
//!
//! Plans a haulage shift for each pit of a request and prints the report.

use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{error, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use haul_planner::cli::{Cli, Command, OutputFormat};
use haul_planner::config::Config;
use haul_planner::services::directions::{create_directions_service, DirectionsService};
use haul_planner::services::export;
use haul_planner::services::geocoding::{create_geocoder, resolve_location, Geocoder};
use haul_planner::services::multi_pit::MultiPitPlanner;
use haul_planner::services::trip_planner::TripPlanner;
use haul_planner::types::{DirectionLeg, MultiPitRequest, ResolvedLocation};
use haul_planner::PlanError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs directory - use LOGS_DIR env var or default to ./logs
    let logs_dir = std::env::var("LOGS_DIR").unwrap_or_else(|_| "./logs".to_string());
    std::fs::create_dir_all(&logs_dir).ok();

    // File appender for persistent logs (daily rotation)
    let file_appender = RollingFileAppender::new(Rotation::DAILY, &logs_dir, "haul-planner.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // stdout carries the report, so console logs go to stderr
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,haul_planner=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    let config = Config::from_env()?;
    info!("Configuration loaded");

    let directions: Arc<dyn DirectionsService> = Arc::from(create_directions_service(config.google.as_ref())?);
    let geocoder: Arc<dyn Geocoder> = Arc::from(create_geocoder(config.google.as_ref())?);

    let result = match cli.command {
        Command::Plan { request, format, output } => {
            let planner = MultiPitPlanner::new(geocoder, TripPlanner::new(directions, config.planner));
            run_plan(&planner, &request, format, output.as_deref()).await
        }
        Command::Leg { from, to } => run_leg(geocoder.as_ref(), directions.as_ref(), &from, &to).await,
    };

    if let Err(e) = &result {
        match e.downcast_ref::<PlanError>() {
            Some(plan_err) => error!(code = plan_err.code(), "{:#}", e),
            None => error!("{:#}", e),
        }
    }
    result
}

async fn run_plan(
    planner: &MultiPitPlanner,
    request_path: &Path,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let raw = if request_path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).context("Failed to read request from stdin")?;
        buf
    } else {
        std::fs::read_to_string(request_path)
            .with_context(|| format!("Failed to read request {}", request_path.display()))?
    };
    let request: MultiPitRequest = serde_json::from_str(&raw).context("Invalid request JSON")?;

    let report = planner.plan(&request).await?;
    let succeeded = report.pits.iter().filter(|p| p.is_success()).count();
    info!("Planned {}/{} pits", succeeded, report.pits.len());

    let rendered = match format {
        OutputFormat::Json => export::report_to_json(&report)?,
        OutputFormat::Csv => export::report_to_csv(&report)?,
    };
    emit(&rendered, output)
}

#[derive(Serialize)]
struct LegReport {
    from: ResolvedLocation,
    to: ResolvedLocation,
    leg: DirectionLeg,
}

async fn run_leg(
    geocoder: &dyn Geocoder,
    directions: &dyn DirectionsService,
    from: &str,
    to: &str,
) -> Result<()> {
    let from = resolve_location(geocoder, from).await?;
    let to = resolve_location(geocoder, to).await?;
    let leg = directions
        .get_directions(from.coordinates, to.coordinates)
        .await
        .with_context(|| format!("No route from {} to {} via {}", from.coordinates, to.coordinates, directions.name()))?;

    let rendered = serde_json::to_string_pretty(&LegReport { from, to, leg })?;
    emit(&rendered, None)
}

fn emit(rendered: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, rendered).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}
