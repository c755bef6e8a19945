//! Nominatim geocoding client
//!
//! Converts structured street addresses to coordinates using the
//! [Nominatim](https://nominatim.openstreetmap.org) search API (OpenStreetMap).
//!
//! A client performs exactly one request per lookup. Spacing requests and
//! retrying throttled ones is left to [`RateLimitedQueue`](crate::RateLimitedQueue)
//! and [`Geocoder`](crate::Geocoder).

use async_trait::async_trait;
use domain::{Address, BoundingRegion, GeoLocation, GeocodeResult};
#[cfg(test)]
use mockall::automock;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::config::GeocodingConfig;
use crate::error::GeocodingError;

/// Whether a coordinate pair lies inside the service region
///
/// Usable on its own for coordinates obtained from other sources.
#[must_use]
pub fn is_within_region(region: &BoundingRegion, latitude: f64, longitude: f64) -> bool {
    region.contains(latitude, longitude)
}

/// A single-attempt address lookup
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GeocodeLookup: Send + Sync {
    /// Resolve an address, making at most one outbound request
    async fn lookup(&self, address: &Address) -> Result<GeocodeResult, GeocodingError>;
}

/// Nominatim-based geocoding client
#[derive(Debug)]
pub struct NominatimGeocodeClient {
    client: Client,
    config: GeocodingConfig,
}

impl NominatimGeocodeClient {
    /// Create a new Nominatim geocoding client
    ///
    /// # Errors
    ///
    /// Returns `GeocodingError::Configuration` if the configuration is invalid
    /// (including a missing User-Agent identity) or the HTTP client cannot be
    /// initialized.
    pub fn new(config: &GeocodingConfig) -> Result<Self, GeocodingError> {
        config.validate()?;

        let mut builder = Client::builder().user_agent(config.user_agent_header());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| GeocodingError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Free-text query sent to the provider
    pub fn build_query(&self, address: &Address) -> String {
        format!("{}, {}", address, self.config.country_qualifier)
    }

    /// Turn the first search hit into an in-region result
    fn interpret(
        &self,
        address: &Address,
        results: Vec<NominatimResult>,
    ) -> Result<GeocodeResult, GeocodingError> {
        let result = results
            .into_iter()
            .next()
            .ok_or_else(|| GeocodingError::NotFound(address.to_string()))?;

        let lat: f64 = result
            .lat
            .trim()
            .parse()
            .map_err(|_| GeocodingError::transport(format!("invalid latitude {:?}", result.lat)))?;
        let lon: f64 = result
            .lon
            .trim()
            .parse()
            .map_err(|_| GeocodingError::transport(format!("invalid longitude {:?}", result.lon)))?;

        if !is_within_region(&self.config.region, lat, lon) {
            warn!(%address, %lat, %lon, "Geocoded point outside service region");
            return Err(GeocodingError::OutOfRegion {
                latitude: lat,
                longitude: lon,
                address: address.clone(),
            });
        }

        let location =
            GeoLocation::new(lat, lon).map_err(|e| GeocodingError::transport(e.to_string()))?;
        let formatted = result.display_name.unwrap_or_else(|| address.to_string());

        Ok(GeocodeResult::new(location, formatted))
    }
}

#[async_trait]
impl GeocodeLookup for NominatimGeocodeClient {
    #[instrument(skip(self), fields(address = %address))]
    async fn lookup(&self, address: &Address) -> Result<GeocodeResult, GeocodingError> {
        let url = format!("{}/search", self.config.base_url.trim_end_matches('/'));
        let params = [
            ("q", self.build_query(address)),
            ("format", "json".to_string()),
            ("limit", "1".to_string()),
            ("countrycodes", self.config.country_code.clone()),
            ("addressdetails", "1".to_string()),
        ];

        debug!("Geocoding address");

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| GeocodingError::transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok());
            debug!(?retry_after_secs, "Geocoding provider throttled request");
            return Err(GeocodingError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            return Err(GeocodingError::status(
                status.as_u16(),
                status.canonical_reason().unwrap_or("unexpected status"),
            ));
        }

        let results: Vec<NominatimResult> = response
            .json()
            .await
            .map_err(|e| GeocodingError::transport(format!("invalid response body: {e}")))?;

        let result = self.interpret(address, results)?;
        debug!(
            lat = result.latitude(),
            lon = result.longitude(),
            "Geocoded address"
        );
        Ok(result)
    }
}

/// Raw Nominatim search hit
#[derive(Debug, Deserialize)]
struct NominatimResult {
    lat: String,
    lon: String,
    display_name: Option<String>,
}
