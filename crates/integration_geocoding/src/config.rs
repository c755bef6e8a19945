//! Geocoding service configuration

use std::path::Path;
use std::time::Duration;

use domain::BoundingRegion;
use serde::{Deserialize, Serialize};

use crate::error::GeocodingError;

/// Identity sent in the `User-Agent` header
///
/// Nominatim's usage policy requires every client to identify itself with an
/// application name and a contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAgentConfig {
    #[serde(default = "default_product")]
    pub product: String,

    #[serde(default = "default_version")]
    pub version: String,

    /// Contact URL or email address
    #[serde(default = "default_contact")]
    pub contact: String,
}

fn default_product() -> String {
    "PawPal".to_string()
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_contact() -> String {
    "support@pawpal.app".to_string()
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            product: default_product(),
            version: default_version(),
            contact: default_contact(),
        }
    }
}

impl UserAgentConfig {
    /// Render as `<product>/<version> (<contact>)`
    #[must_use]
    pub fn header_value(&self) -> String {
        format!("{}/{} ({})", self.product, self.version, self.contact)
    }
}

/// Configuration for the geocoding client, queue and retry facade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Base URL for the Nominatim API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds (unset: no timeout beyond the transport's own)
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// ISO 3166-1 country code sent as `countrycodes`
    #[serde(default = "default_country_code")]
    pub country_code: String,

    /// Country name appended to every free-text query
    #[serde(default = "default_country_qualifier")]
    pub country_qualifier: String,

    /// Minimum spacing between outbound requests in milliseconds
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,

    /// Attempts made for a rate-limited lookup before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff unit in milliseconds; attempt `n` waits `2^n` units
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Results outside this region are rejected
    #[serde(default)]
    pub region: BoundingRegion,

    #[serde(default)]
    pub user_agent: UserAgentConfig,
}

fn default_base_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_country_code() -> String {
    "us".to_string()
}

fn default_country_qualifier() -> String {
    "USA".to_string()
}

const fn default_min_interval_ms() -> u64 {
    1100
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_backoff_base_ms() -> u64 {
    1000
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
            country_code: default_country_code(),
            country_qualifier: default_country_qualifier(),
            min_interval_ms: default_min_interval_ms(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            region: BoundingRegion::default(),
            user_agent: UserAgentConfig::default(),
        }
    }
}

impl GeocodingConfig {
    /// Environment variable prefix, e.g. `PAWPAL_GEOCODING__BASE_URL`
    pub const ENV_PREFIX: &'static str = "PAWPAL_GEOCODING";

    /// Create a configuration suitable for testing
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            timeout_secs: Some(5),
            ..Default::default()
        }
    }

    /// Load configuration from defaults, an optional TOML file, and the environment
    ///
    /// Environment variables override file values and use `__` to separate
    /// nested keys (`PAWPAL_GEOCODING__REGION__NORTH=41.0`).
    ///
    /// # Errors
    ///
    /// Returns `GeocodingError::Configuration` if a source cannot be read or
    /// the merged result fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self, GeocodingError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: Self = builder
            .add_source(
                config::Environment::with_prefix(Self::ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|merged| merged.try_deserialize())
            .map_err(|e| GeocodingError::Configuration(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the client cannot work with
    ///
    /// # Errors
    ///
    /// Returns `GeocodingError::Configuration` describing the first problem.
    pub fn validate(&self) -> Result<(), GeocodingError> {
        if self.base_url.trim().is_empty() {
            return Err(GeocodingError::Configuration(
                "base_url must not be empty".to_string(),
            ));
        }

        let agent = &self.user_agent;
        for (field, value) in [
            ("user_agent.product", &agent.product),
            ("user_agent.version", &agent.version),
            ("user_agent.contact", &agent.contact),
        ] {
            if value.trim().is_empty() {
                return Err(GeocodingError::Configuration(format!(
                    "{field} must not be empty; the provider rejects anonymous clients"
                )));
            }
        }

        self.region
            .validate()
            .map_err(|e| GeocodingError::Configuration(e.to_string()))
    }

    #[must_use]
    pub const fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    #[must_use]
    pub const fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    #[must_use]
    pub fn user_agent_header(&self) -> String {
        self.user_agent.header_value()
    }
}
