//! Postal address value object
//!
//! A structured US street address as entered by a customer when booking a
//! sitter or walker. Addresses are plain values: two addresses with the same
//! parts are the same address.
//!
//! # Examples
//!
//! ```
//! use domain::Address;
//!
//! let address = Address::new("123 Main St", "Colorado Springs", "CO")
//!     .unwrap()
//!     .with_apartment("Apt 4")
//!     .with_postal_code("80903");
//!
//! assert_eq!(address.to_string(), "123 Main St Apt 4, Colorado Springs, CO 80903");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::DomainError;

/// A structured street address
///
/// Deserialization goes through [`Address::new`], so parts are trimmed and
/// checked the same way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Validate)]
#[serde(try_from = "AddressParts")]
pub struct Address {
    #[validate(length(min = 1, message = "street must not be empty"))]
    street: String,
    apartment: Option<String>,
    #[validate(length(min = 1, message = "city must not be empty"))]
    city: String,
    #[validate(length(min = 1, message = "state must not be empty"))]
    state: String,
    postal_code: Option<String>,
}

impl Address {
    /// Create a new address from its required parts
    ///
    /// Surrounding whitespace is trimmed from every part.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ValidationError` if street, city or state is blank.
    pub fn new(
        street: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let candidate = Self {
            street: street.into().trim().to_string(),
            apartment: None,
            city: city.into().trim().to_string(),
            state: state.into().trim().to_string(),
            postal_code: None,
        };

        candidate
            .validate()
            .map_err(|e| DomainError::ValidationError(e.to_string()))?;

        Ok(candidate)
    }

    /// Set the apartment or unit; blank values are ignored
    #[must_use]
    pub fn with_apartment(mut self, apartment: impl Into<String>) -> Self {
        self.apartment = non_blank(apartment.into());
        self
    }

    /// Set the postal code; blank values are ignored
    #[must_use]
    pub fn with_postal_code(mut self, postal_code: impl Into<String>) -> Self {
        self.postal_code = non_blank(postal_code.into());
        self
    }

    pub fn street(&self) -> &str {
        &self.street
    }

    pub fn apartment(&self) -> Option<&str> {
        self.apartment.as_deref()
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn postal_code(&self) -> Option<&str> {
        self.postal_code.as_deref()
    }

    /// Street line including the apartment, if any
    pub fn street_line(&self) -> String {
        match &self.apartment {
            Some(apartment) => format!("{} {apartment}", self.street),
            None => self.street.clone(),
        }
    }

    /// State followed by the postal code, if any
    pub fn state_line(&self) -> String {
        match &self.postal_code {
            Some(postal_code) => format!("{} {postal_code}", self.state),
            None => self.state.clone(),
        }
    }
}

/// Unchecked wire form of an [`Address`]
#[derive(Deserialize)]
struct AddressParts {
    street: String,
    #[serde(default)]
    apartment: Option<String>,
    city: String,
    state: String,
    #[serde(default)]
    postal_code: Option<String>,
}

impl TryFrom<AddressParts> for Address {
    type Error = DomainError;

    fn try_from(parts: AddressParts) -> Result<Self, Self::Error> {
        let mut address = Self::new(parts.street, parts.city, parts.state)?;
        if let Some(apartment) = parts.apartment {
            address = address.with_apartment(apartment);
        }
        if let Some(postal_code) = parts.postal_code {
            address = address.with_postal_code(postal_code);
        }
        Ok(address)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}",
            self.street_line(),
            self.city,
            self.state_line()
        )
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
