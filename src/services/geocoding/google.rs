//! Google Geocoding API client

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::Geocoder;
use crate::config::GoogleMapsConfig;
use crate::types::Coordinates;

/// Short links sometimes fail on the first request
const EXPAND_ATTEMPTS: u32 = 3;
const EXPAND_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Run `op` up to `attempts` times, sleeping `delay` between failures
async fn with_retries<T, F, Fut>(what: &str, attempts: u32, delay: Duration, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                warn!("Attempt {}/{} to {} failed: {:#}", attempt, attempts, what, e);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e.context(format!("{} failed after {} attempts", what, attempt))),
        }
    }
}

/// Google geocoding client; also expands maps short links
pub struct GoogleGeocoder {
    client: Client,
    config: GoogleMapsConfig,
}

impl GoogleGeocoder {
    pub fn new(config: GoogleMapsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    fn geocode_url(&self, query: &str) -> String {
        format!(
            "{}/geocode/json?address={}&key={}",
            self.config.base_url,
            urlencoding::encode(query),
            urlencoding::encode(&self.config.api_key),
        )
    }

    fn reverse_geocode_url(&self, coordinates: Coordinates) -> String {
        format!(
            "{}/geocode/json?latlng={}&key={}",
            self.config.base_url,
            urlencoding::encode(&coordinates.as_query()),
            urlencoding::encode(&self.config.api_key),
        )
    }

    async fn fetch(&self, url: String) -> Result<GeocodeResponse> {
        let response = self.client
            .get(url)
            .send()
            .await
            .context("Failed to send geocoding request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Google Geocoding returned error {}: {}", status, body);
        }

        let payload: GeocodeResponse = response
            .json()
            .await
            .context("Failed to parse geocoding response")?;

        payload.check_status()?;
        Ok(payload)
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>> {
        debug!("Getting coordinates for place: {}", query);

        let payload = self.fetch(self.geocode_url(query)).await?;
        let coordinates = payload.results.first().map(|r| Coordinates {
            lat: r.geometry.location.lat,
            lng: r.geometry.location.lng,
        });

        if coordinates.is_none() {
            warn!("Could not get coordinates for place: {}", query);
        }
        Ok(coordinates)
    }

    async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<Option<String>> {
        debug!("Getting address for coordinates: {}", coordinates);

        let payload = self.fetch(self.reverse_geocode_url(coordinates)).await?;
        Ok(payload.results.into_iter().next().map(|r| r.formatted_address))
    }

    async fn expand_url(&self, url: &str) -> Result<String> {
        let what = format!("expand short link {}", url);
        let expanded = with_retries(&what, EXPAND_ATTEMPTS, EXPAND_RETRY_DELAY, || async {
            let response = self.client.get(url).send().await?;
            Ok(response.url().to_string())
        })
        .await?;

        debug!("Expanded {} to {}", url, expanded);
        Ok(expanded)
    }

    fn name(&self) -> &'static str {
        "google"
    }
}

// Google API types

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
    status: String,
    error_message: Option<String>,
}

impl GeocodeResponse {
    /// OK and ZERO_RESULTS are answers; everything else is a failure
    fn check_status(&self) -> Result<()> {
        match self.status.as_str() {
            "OK" | "ZERO_RESULTS" => Ok(()),
            other => anyhow::bail!(
                "Geocoding API error {}: {}",
                other,
                self.error_message.as_deref().unwrap_or("no message")
            ),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted_address: String,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}
