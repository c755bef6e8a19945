//! Address geocoding for PawPal
//!
//! Resolves customer street addresses to coordinates via
//! [Nominatim/OpenStreetMap](https://nominatim.openstreetmap.org) and rejects
//! anything outside the service region.
//!
//! # Architecture
//!
//! Requests flow through three layers:
//!
//! - [`GeocodeLookup`] performs a single request. [`NominatimGeocodeClient`]
//!   classifies the response and applies the region check.
//! - [`RateLimitedQueue`] serializes lookups through one consumer and spaces
//!   them at least `min_interval` apart (1.1 s by default).
//! - [`Geocoder`] retries throttled lookups with exponential backoff and
//!   offers a best-effort variant that never fails.
//!
//! Time is read and slept through the [`Clock`] trait so pacing and backoff
//! can be driven by [`ManualClock`] in tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain::Address;
//! use integration_geocoding::{Geocoder, GeocodingConfig};
//!
//! let geocoder = Geocoder::from_config(&GeocodingConfig::default())?;
//! let address = Address::new("123 Main St", "Colorado Springs", "CO")?;
//! let result = geocoder.geocode(&address).await?;
//! println!("{}, {}", result.latitude(), result.longitude());
//! ```

mod client;
mod clock;
mod config;
mod error;
mod geocoder;
mod queue;
pub mod telemetry;

pub use client::{GeocodeLookup, NominatimGeocodeClient, is_within_region};
pub use clock::{Clock, ManualClock, TokioClock};
pub use config::{GeocodingConfig, UserAgentConfig};
pub use error::{ErrorKind, GeocodingError};
pub use geocoder::{BackoffPolicy, Geocoder};
pub use queue::RateLimitedQueue;
