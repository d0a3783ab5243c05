//! Directions service for point-to-point travel time and distance
//!
//! Uses the Google Directions API for production, mock for tests and offline runs.

mod google;

pub use google::GoogleDirectionsClient;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::GoogleMapsConfig;
use crate::services::geo::estimate_leg;
use crate::types::{Coordinates, DirectionLeg};

/// Directions service trait for abstraction (Google, mock, etc.)
#[async_trait]
pub trait DirectionsService: Send + Sync {
    /// Driving directions from `origin` to `destination`.
    /// Fails when the upstream has no route or answers with an error payload.
    async fn get_directions(&self, origin: Coordinates, destination: Coordinates) -> Result<DirectionLeg>;

    /// Get service name for logging
    fn name(&self) -> &str;
}

/// Mock directions service.
/// Uses Haversine distance × coefficient at a fixed average speed.
pub struct MockDirectionsService {
    road_coefficient: f64,
    average_speed_kmh: f64,
}

impl Default for MockDirectionsService {
    fn default() -> Self {
        Self {
            road_coefficient: 1.3,
            average_speed_kmh: 50.0,
        }
    }
}

impl MockDirectionsService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(road_coefficient: f64, average_speed_kmh: f64) -> Self {
        Self {
            road_coefficient,
            average_speed_kmh,
        }
    }
}

#[async_trait]
impl DirectionsService for MockDirectionsService {
    async fn get_directions(&self, origin: Coordinates, destination: Coordinates) -> Result<DirectionLeg> {
        let (meters, seconds) = estimate_leg(
            &origin,
            &destination,
            self.road_coefficient,
            self.average_speed_kmh,
        );
        Ok(DirectionLeg::from_measurement(origin, destination, seconds, meters, None))
    }

    fn name(&self) -> &str {
        "MockDirections"
    }
}

/// Pick the directions backend: Google when an API key is configured,
/// otherwise the mock.
pub fn create_directions_service(config: Option<&GoogleMapsConfig>) -> Result<Box<dyn DirectionsService>> {
    match config {
        Some(cfg) => {
            info!("Using Google Directions API at {}", cfg.base_url);
            Ok(Box::new(GoogleDirectionsClient::new(cfg.clone())?))
        }
        None => {
            warn!("GOOGLE_API_KEY not set, using mock directions (straight-line estimates)");
            Ok(Box::new(MockDirectionsService::new()))
        }
    }
}
