//! Geocoding abstraction layer
//!
//! Turns whatever the user pasted (maps link, short link, place name, or raw
//! `lat,lng`) into coordinates plus a display address.
//!
//! Backends:
//! - `GoogleGeocoder` when `GOOGLE_API_KEY` is configured
//! - `MockGeocoder` otherwise (deterministic, no network)

mod google;
pub mod maps_url;

pub use google::GoogleGeocoder;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::GoogleMapsConfig;
use crate::error::{PlanError, PlanResult};
use crate::types::{Coordinates, ResolvedLocation};
use maps_url::LocationHint;

/// Address shown when reverse geocoding finds nothing
pub const UNKNOWN_LOCATION: &str = "Unknown location";

/// Geocoder trait - abstraction for all geocoding implementations
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Place name to coordinates; `None` when nothing matches
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>>;

    /// Coordinates to a formatted address; `None` when nothing matches
    async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<Option<String>>;

    /// Follow a short link to the full maps URL
    async fn expand_url(&self, url: &str) -> Result<String> {
        Ok(url.to_string())
    }

    /// Get the name of this geocoder implementation
    fn name(&self) -> &'static str;
}

/// Resolve a location reference to coordinates and an address.
///
/// Unresolvable references are input errors; backend failures are upstream
/// errors.
pub async fn resolve_location(geocoder: &dyn Geocoder, reference: &str) -> PlanResult<ResolvedLocation> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(PlanError::invalid("empty location reference"));
    }

    let hint = if let Some(coords) = maps_url::parse_coordinate_pair(reference) {
        LocationHint::Coordinates(coords)
    } else if maps_url::is_url(reference) {
        let full_url = if maps_url::is_full_maps_url(reference) {
            reference.to_string()
        } else {
            debug!("Expanding short link {}", reference);
            geocoder
                .expand_url(reference)
                .await
                .map_err(|e| PlanError::upstream("geocoding", e))?
        };
        maps_url::extract_location(&full_url).ok_or_else(|| {
            PlanError::invalid(format!("could not extract coordinates from '{}'", reference))
        })?
    } else {
        LocationHint::Query(reference.to_string())
    };

    let coordinates = match hint {
        LocationHint::Coordinates(coords) => coords,
        LocationHint::Query(query) => geocoder
            .geocode(&query)
            .await
            .map_err(|e| PlanError::upstream("geocoding", e))?
            .ok_or_else(|| PlanError::invalid(format!("could not find coordinates for '{}'", query)))?,
    };

    let address = match geocoder.reverse_geocode(coordinates).await {
        Ok(Some(address)) => address,
        Ok(None) => {
            warn!("Could not reverse geocode {}", coordinates);
            UNKNOWN_LOCATION.to_string()
        }
        Err(e) => return Err(PlanError::upstream("geocoding", e)),
    };

    debug!("Resolved '{}' to {} ({})", reference, coordinates, address);

    Ok(ResolvedLocation {
        reference: reference.to_string(),
        coordinates,
        address,
    })
}

/// Pick the geocoding backend: Google when configured, otherwise the mock.
pub fn create_geocoder(config: Option<&GoogleMapsConfig>) -> Result<Box<dyn Geocoder>> {
    match config {
        Some(cfg) => {
            info!("Using Google Geocoding API at {}", cfg.base_url);
            Ok(Box::new(GoogleGeocoder::new(cfg.clone())?))
        }
        None => {
            warn!("GOOGLE_API_KEY not set, using mock geocoder");
            Ok(Box::new(MockGeocoder::new()))
        }
    }
}

// ==========================================================================
// MockGeocoder Implementation
// ==========================================================================

/// Mock geocoder - returns deterministic fake coordinates
pub struct MockGeocoder;

impl MockGeocoder {
    pub fn new() -> Self {
        Self
    }

    /// Deterministic coordinates from the query hash, inside a box around
    /// the Sydney basin so mock legs stay drivable-length
    fn hash_to_coordinates(query: &str) -> Coordinates {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        query.trim().to_lowercase().hash(&mut hasher);
        let hash = hasher.finish();

        const LAT_MIN: f64 = -34.2;
        const LAT_MAX: f64 = -33.5;
        const LNG_MIN: f64 = 150.6;
        const LNG_MAX: f64 = 151.3;

        let lat_normalized = ((hash >> 32) as f64) / (u32::MAX as f64);
        let lng_normalized = ((hash & 0xFFFF_FFFF) as f64) / (u32::MAX as f64);

        Coordinates {
            lat: LAT_MIN + lat_normalized * (LAT_MAX - LAT_MIN),
            lng: LNG_MIN + lng_normalized * (LNG_MAX - LNG_MIN),
        }
    }
}

impl Default for MockGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>> {
        Ok(Some(Self::hash_to_coordinates(query)))
    }

    async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<Option<String>> {
        Ok(Some(format!("Mock address near {:.4}, {:.4}", coordinates.lat, coordinates.lng)))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
