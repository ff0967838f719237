//! Facility records as seen by the proximity engine.

use crate::Coordinate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque facility identity, as assigned by the persistence backend.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacilityId(String);

impl FacilityId {
    /// Wraps a backend identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FacilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FacilityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for FacilityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A facility the observer can be guided to.
///
/// Read-only to the engine; only the persistence collaborator creates or
/// edits these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    /// Backend identity, used to break distance ties
    pub id: FacilityId,
    /// Display name, searched case-insensitively
    pub name: String,
    /// Location of the facility entrance
    pub coordinate: Coordinate,
    /// Phone number or other contact string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    /// Postal address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Facility {
    /// Creates a facility without contact or address.
    pub fn new(id: impl Into<FacilityId>, name: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            coordinate,
            contact: None,
            address: None,
        }
    }

    /// Builder-style method to set the contact string
    #[must_use]
    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = Some(contact.into());
        self
    }

    /// Builder-style method to set the address
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

/// A facility with its distance from one observer fix.
///
/// Only meaningful for the fix it was computed against; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedFacility {
    /// The facility
    #[serde(flatten)]
    pub facility: Facility,
    /// Great-circle distance from the observer in kilometers
    pub distance_km: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let facility = Facility::new("f1", "Meenakshi Mission", Coordinate::new(9.93, 78.125))
            .with_contact("+91 452 258 8741")
            .with_address("Lake Area, Melur Road");

        assert_eq!(facility.id.as_str(), "f1");
        assert_eq!(facility.contact.as_deref(), Some("+91 452 258 8741"));
        assert!(facility.address.is_some());
    }

    #[test]
    fn test_ids_order_lexically() {
        assert!(FacilityId::new("a") < FacilityId::new("b"));
    }

    #[test]
    fn test_id_conversions_agree() {
        let owned: FacilityId = String::from("h1").into();
        assert_eq!(owned, FacilityId::from("h1"));
        assert_eq!(owned.to_string(), "h1");
    }

    #[test]
    fn test_annotated_serializes_flat() {
        let annotated = AnnotatedFacility {
            facility: Facility::new("f1", "City Hospital", Coordinate::new(9.93, 78.125)),
            distance_km: 0.78,
        };

        let json = serde_json::to_value(&annotated).unwrap();
        assert_eq!(json["id"], "f1");
        assert_eq!(json["name"], "City Hospital");
        assert_eq!(json["distance_km"], 0.78);
        assert!(json.get("contact").is_none());
    }
}
