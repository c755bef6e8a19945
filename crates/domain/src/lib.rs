//! Domain layer for PawPal geocoding
//!
//! Contains the value objects shared by the geocoding integration: street
//! addresses, coordinates, the bookable service region, and resolved geocodes.
//! This layer performs no I/O.

pub mod errors;
pub mod value_objects;

pub use errors::DomainError;
pub use value_objects::*;
