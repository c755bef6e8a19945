//! Value Objects - Immutable, identity-less domain primitives

mod address;
mod bounding_region;
mod geo_location;
mod geocode_result;

pub use address::Address;
pub use bounding_region::BoundingRegion;
pub use geo_location::GeoLocation;
pub use geocode_result::GeocodeResult;
