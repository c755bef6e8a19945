//! Geocoding error types

use domain::Address;
use thiserror::Error;

/// Errors that can occur while geocoding an address
#[derive(Debug, Clone, Error)]
pub enum GeocodingError {
    /// Provider answered 429; retry later
    #[error("Geocoding rate limit exceeded, retry after {retry_after_secs:?} seconds")]
    RateLimited {
        /// Seconds to wait before retrying (if provided by the API)
        retry_after_secs: Option<u64>,
    },

    /// Provider returned no results for the query
    #[error("Address not found: {0}")]
    NotFound(String),

    /// Non-2xx response, network failure, or an unreadable response body
    #[error("Geocoding request failed{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    TransportFailure {
        /// HTTP status, if a response was received
        status: Option<u16>,
        /// Failure description
        message: String,
    },

    /// Result lies outside the service region
    #[error("Geocoded point ({latitude}, {longitude}) for \"{address}\" is outside the service region")]
    OutOfRegion {
        /// Latitude the provider returned
        latitude: f64,
        /// Longitude the provider returned
        longitude: f64,
        /// Address that was looked up
        address: Address,
    },

    /// Client was constructed with an unusable configuration
    #[error("Geocoding configuration error: {0}")]
    Configuration(String),
}

/// Coarse classification of a [`GeocodingError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    RateLimited,
    NotFound,
    TransportFailure,
    OutOfRegion,
    Configuration,
}

impl GeocodingError {
    /// Build a transport failure from an HTTP status
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::TransportFailure {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Build a transport failure that never produced an HTTP status
    pub fn transport(message: impl Into<String>) -> Self {
        Self::TransportFailure {
            status: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::TransportFailure { .. } => ErrorKind::TransportFailure,
            Self::OutOfRegion { .. } => ErrorKind::OutOfRegion,
            Self::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// Returns true if this error is retryable
    ///
    /// Only provider throttling is retried; repeating any other failure
    /// would give the same answer.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}
