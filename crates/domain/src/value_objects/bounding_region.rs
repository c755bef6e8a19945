//! Geographic bounding region
//!
//! A latitude/longitude rectangle used to accept or reject geocoded points.
//! The service area is a single rectangle; points outside it are not
//! bookable addresses.

use serde::{Deserialize, Serialize};

use super::GeoLocation;
use crate::errors::DomainError;

/// A rectangular region bounded by two parallels and two meridians
///
/// Edges are inclusive. Regions crossing the antimeridian are not supported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingRegion {
    /// Southern edge (minimum latitude)
    pub south: f64,
    /// Northern edge (maximum latitude)
    pub north: f64,
    /// Western edge (minimum longitude)
    pub west: f64,
    /// Eastern edge (maximum longitude)
    pub east: f64,
}

impl BoundingRegion {
    /// Create a region, checking that its edges are ordered and on the globe
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ValidationError` if `south > north`, `west > east`,
    /// or any edge lies outside valid coordinate ranges.
    pub fn new(south: f64, north: f64, west: f64, east: f64) -> Result<Self, DomainError> {
        let region = Self {
            south,
            north,
            west,
            east,
        };
        region.validate()?;
        Ok(region)
    }

    /// The state of Colorado, USA
    #[must_use]
    pub const fn colorado() -> Self {
        Self {
            south: 36.993_076,
            north: 41.003_444,
            west: -109.060_253,
            east: -102.041_524,
        }
    }

    /// Check edge ordering and ranges
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ValidationError` describing the first problem found.
    pub fn validate(&self) -> Result<(), DomainError> {
        GeoLocation::new(self.south, self.west)
            .and_then(|_| GeoLocation::new(self.north, self.east))
            .map_err(|e| DomainError::ValidationError(format!("region edge: {e}")))?;

        if self.south > self.north {
            return Err(DomainError::ValidationError(format!(
                "region south edge {} is north of north edge {}",
                self.south, self.north
            )));
        }
        if self.west > self.east {
            return Err(DomainError::ValidationError(format!(
                "region west edge {} is east of east edge {}",
                self.west, self.east
            )));
        }
        Ok(())
    }

    /// Whether the point lies inside the region
    ///
    /// NaN coordinates are never inside.
    #[must_use]
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.south..=self.north).contains(&latitude) && (self.west..=self.east).contains(&longitude)
    }

    /// Whether the location lies inside the region
    #[must_use]
    pub fn contains_location(&self, location: &GeoLocation) -> bool {
        self.contains(location.latitude(), location.longitude())
    }
}

impl Default for BoundingRegion {
    fn default() -> Self {
        Self::colorado()
    }
}
