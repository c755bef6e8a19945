//! Resolved geocode value object

use serde::{Deserialize, Serialize};

use super::GeoLocation;

/// Coordinates for an address together with the provider's formatted name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    location: GeoLocation,
    formatted_address: String,
}

impl GeocodeResult {
    #[must_use]
    pub fn new(location: GeoLocation, formatted_address: impl Into<String>) -> Self {
        Self {
            location,
            formatted_address: formatted_address.into(),
        }
    }

    #[must_use]
    pub const fn location(&self) -> GeoLocation {
        self.location
    }

    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.location.latitude()
    }

    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.location.longitude()
    }

    /// Display name as returned by the geocoding provider
    pub fn formatted_address(&self) -> &str {
        &self.formatted_address
    }
}
