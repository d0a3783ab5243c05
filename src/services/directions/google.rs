//! Google Directions API client
//!
//! API documentation:
//! https://developers.google.com/maps/documentation/directions/get-directions

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};

use super::DirectionsService;
use crate::config::GoogleMapsConfig;
use crate::types::{Coordinates, DirectionLeg};

/// Google Directions client (driving, avoiding tolls and ferries)
pub struct GoogleDirectionsClient {
    client: Client,
    config: GoogleMapsConfig,
}

impl GoogleDirectionsClient {
    pub fn new(config: GoogleMapsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    fn directions_url(&self, origin: Coordinates, destination: Coordinates) -> String {
        format!(
            "{}/directions/json?origin={}&destination={}&mode=driving&avoid={}&key={}",
            self.config.base_url,
            urlencoding::encode(&origin.as_query()),
            urlencoding::encode(&destination.as_query()),
            urlencoding::encode("tolls|ferries"),
            urlencoding::encode(&self.config.api_key),
        )
    }
}

#[async_trait]
impl DirectionsService for GoogleDirectionsClient {
    async fn get_directions(&self, origin: Coordinates, destination: Coordinates) -> Result<DirectionLeg> {
        debug!("Getting directions from {} to {}", origin, destination);

        let response = self.client
            .get(self.directions_url(origin, destination))
            .send()
            .await
            .context("Failed to send request to Google Directions")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Google Directions returned error {}: {}", status, body);
        }

        let payload: DirectionsResponse = response
            .json()
            .await
            .context("Failed to parse Google Directions response")?;

        let leg = first_leg(payload).inspect_err(|e| error!("Could not get directions: {}", e))?;

        debug!(
            "Directions {} -> {}: {}s, {}",
            origin, destination, leg.duration.value, leg.distance.text
        );

        Ok(DirectionLeg::from_measurement(
            origin,
            destination,
            leg.duration.value,
            leg.distance.value,
            Some(leg.distance.text),
        ))
    }

    fn name(&self) -> &str {
        "GoogleDirections"
    }
}

fn first_leg(payload: DirectionsResponse) -> Result<ApiLeg> {
    let status = payload.status;
    let error_message = payload.error_message;

    payload
        .routes
        .into_iter()
        .next()
        .and_then(|route| route.legs.into_iter().next())
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Directions API error: {}",
                error_message.unwrap_or_else(|| status.unwrap_or_else(|| "Unknown error".to_string()))
            )
        })
}

// Google API types

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<ApiRoute>,
    status: Option<String>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiRoute {
    #[serde(default)]
    legs: Vec<ApiLeg>,
}

#[derive(Debug, Deserialize)]
struct ApiLeg {
    duration: TextValue,
    distance: TextValue,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    text: String,
    /// seconds for durations, meters for distances
    value: u64,
}
