//! Retrying geocoder facade
//!
//! [`Geocoder`] is the entry point for callers: it routes every lookup through
//! the shared [`RateLimitedQueue`] and retries provider throttling with
//! exponential backoff. Any other failure is returned on the first attempt.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain::Address;
//! use integration_geocoding::{Geocoder, GeocodingConfig};
//!
//! let geocoder = Geocoder::from_config(&GeocodingConfig::default())?;
//! let address = Address::new("123 Main St", "Colorado Springs", "CO")?;
//!
//! // Strict: propagates the final failure
//! let result = geocoder.geocode(&address).await?;
//!
//! // Best effort: "could not verify address" instead of an error
//! if geocoder.geocode_or_none(&address).await.is_none() {
//!     // show a soft warning in the form
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use domain::{Address, GeocodeResult};
use tracing::{debug, instrument, warn};

use crate::client::{GeocodeLookup, NominatimGeocodeClient};
use crate::clock::{Clock, TokioClock};
use crate::config::GeocodingConfig;
use crate::error::GeocodingError;
use crate::queue::RateLimitedQueue;

/// Exponential backoff schedule for throttled lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Attempts made before giving up (values below 1 mean one attempt)
    pub max_retries: u32,
    /// Unit delay; attempt `n` (from 1) is followed by `2^n` units
    pub base_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl BackoffPolicy {
    #[must_use]
    pub fn from_config(config: &GeocodingConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.backoff_base(),
        }
    }

    /// Delay after the given failed attempt (1-indexed)
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor)
    }
}

/// Geocoding entry point: paced, serialized, retried on throttling
#[derive(Debug, Clone)]
pub struct Geocoder {
    queue: RateLimitedQueue,
    clock: Arc<dyn Clock>,
    backoff: BackoffPolicy,
}

impl Geocoder {
    /// Build on an existing queue; backoff sleeps on the queue's clock
    pub fn new(queue: RateLimitedQueue, backoff: BackoffPolicy) -> Self {
        Self {
            clock: queue.clock(),
            queue,
            backoff,
        }
    }

    /// Build a queue over `lookup` and wrap it
    pub fn with_lookup(
        lookup: Arc<dyn GeocodeLookup>,
        clock: Arc<dyn Clock>,
        config: &GeocodingConfig,
    ) -> Self {
        let queue = RateLimitedQueue::new(lookup, clock, config.min_interval());
        Self::new(queue, BackoffPolicy::from_config(config))
    }

    /// Production stack: Nominatim client, wall clock, configured pacing and backoff
    ///
    /// # Errors
    ///
    /// Returns `GeocodingError::Configuration` if the client cannot be built.
    pub fn from_config(config: &GeocodingConfig) -> Result<Self, GeocodingError> {
        let client = NominatimGeocodeClient::new(config)?;
        Ok(Self::with_lookup(
            Arc::new(client),
            Arc::new(TokioClock),
            config,
        ))
    }

    pub const fn backoff(&self) -> BackoffPolicy {
        self.backoff
    }

    pub fn queue(&self) -> &RateLimitedQueue {
        &self.queue
    }

    /// Geocode with the configured retry bound
    ///
    /// # Errors
    ///
    /// Returns the first non-throttling failure, or `RateLimited` once every
    /// attempt has been throttled.
    pub async fn geocode(&self, address: &Address) -> Result<GeocodeResult, GeocodingError> {
        self.geocode_with_retries(address, self.backoff.max_retries)
            .await
    }

    /// Geocode, making at most `max_retries` attempts
    ///
    /// # Errors
    ///
    /// See [`geocode`](Self::geocode).
    #[instrument(skip(self), fields(address = %address))]
    pub async fn geocode_with_retries(
        &self,
        address: &Address,
        max_retries: u32,
    ) -> Result<GeocodeResult, GeocodingError> {
        let max_attempts = max_retries.max(1);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.queue.enqueue(address.clone()).await {
                Ok(result) => {
                    if attempt > 1 {
                        debug!(attempts = attempt, "Geocoding succeeded after retries");
                    }
                    return Ok(result);
                },
                Err(err) if !err.is_retryable() => {
                    debug!(attempts = attempt, error = %err, "Geocoding failed with non-retryable error");
                    return Err(err);
                },
                Err(err) if attempt >= max_attempts => {
                    warn!(attempts = attempt, error = %err, "Geocoding still throttled after max retries");
                    return Err(err);
                },
                Err(err) => {
                    let delay = self.backoff.delay_for_attempt(attempt);
                    warn!(
                        attempt,
                        max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "Geocoding throttled, retrying"
                    );
                    self.clock.sleep(delay).await;
                },
            }
        }
    }

    /// Best-effort geocode: every failure becomes `None`
    pub async fn geocode_or_none(&self, address: &Address) -> Option<GeocodeResult> {
        match self.geocode(address).await {
            Ok(result) => Some(result),
            Err(err) => {
                warn!(%address, kind = ?err.kind(), error = %err, "Could not verify address");
                None
            },
        }
    }
}
