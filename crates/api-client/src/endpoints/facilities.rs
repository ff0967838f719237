//! Facility backend endpoints
//!
//! The backend stores facilities as loosely typed documents: coordinates
//! sometimes arrive as strings and addresses as empty strings. Records are
//! normalised here, and any record whose coordinates are not a valid point
//! on Earth is dropped before it reaches the proximity engine.

use crate::client::{PulsePointClient, Service};
use crate::error::ApiResult;
use pulsepoint_geo::{AnnotatedFacility, Coordinate, Facility, GeoError};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// A number the backend may have serialized as a string
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum LenientNumber {
    /// Proper JSON number
    Number(f64),
    /// Number encoded as a string
    Text(String),
}

impl LenientNumber {
    /// Numeric value, `NaN` when the text does not parse
    #[must_use]
    pub fn value(&self) -> f64 {
        match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse().unwrap_or(f64::NAN),
        }
    }
}

/// Facility document as returned by `/hospitals`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityRecord {
    /// Backend document id
    #[serde(rename = "_id")]
    pub id: String,
    /// Display name
    pub name: String,
    /// Latitude in degrees
    pub latitude: LenientNumber,
    /// Longitude in degrees
    pub longitude: LenientNumber,
    /// Postal address
    #[serde(default)]
    pub address: Option<String>,
    /// Contact phone
    #[serde(default)]
    pub phone: Option<String>,
    /// Distance computed server-side by `/hospitals/nearby`
    #[serde(default)]
    pub distance: Option<f64>,
}

impl FacilityRecord {
    /// Convert into an engine facility, validating the coordinate
    pub fn into_facility(self) -> Result<Facility, GeoError> {
        let coordinate = Coordinate::validated(self.latitude.value(), self.longitude.value())?;

        let mut facility = Facility::new(self.id, self.name, coordinate);
        facility.address = non_blank(self.address);
        facility.contact = non_blank(self.phone);
        Ok(facility)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Convert records, logging and skipping the ones with bad coordinates
fn keep_valid<T>(
    records: Vec<FacilityRecord>,
    mut convert: impl FnMut(Facility, Option<f64>) -> T,
) -> Vec<T> {
    let total = records.len();
    let kept: Vec<T> = records
        .into_iter()
        .filter_map(|record| {
            let id = record.id.clone();
            let distance = record.distance;
            match record.into_facility() {
                Ok(facility) => Some(convert(facility, distance)),
                Err(e) => {
                    warn!(facility_id = %id, error = %e, "Dropping facility record");
                    None
                }
            }
        })
        .collect();

    debug!(total, kept = kept.len(), "Parsed facility records");
    kept
}

/// Parse a `/hospitals` response body
pub fn parse_facilities(records: Vec<FacilityRecord>) -> Vec<Facility> {
    keep_valid(records, |facility, _| facility)
}

/// Parse a `/hospitals/nearby` response body
///
/// The backend's own distance is used when present, otherwise the distance
/// is computed locally from `observer`. The result is sorted like
/// [`pulsepoint_geo::annotate`] output.
pub fn parse_nearby(records: Vec<FacilityRecord>, observer: &Coordinate) -> Vec<AnnotatedFacility> {
    let mut annotated = keep_valid(records, |facility, distance| AnnotatedFacility {
        distance_km: distance
            .filter(|d| d.is_finite())
            .unwrap_or_else(|| pulsepoint_geo::distance_km(observer, &facility.coordinate)),
        facility,
    });

    annotated.sort_by(|a, b| {
        a.distance_km
            .total_cmp(&b.distance_km)
            .then_with(|| a.facility.id.cmp(&b.facility.id))
    });
    annotated
}

/// Facility API endpoints
pub struct FacilitiesApi {
    client: PulsePointClient,
}

impl FacilitiesApi {
    pub(crate) fn new(client: PulsePointClient) -> Self {
        Self { client }
    }

    /// Fetch every known facility
    #[instrument(skip(self))]
    pub async fn list(&self) -> ApiResult<Vec<Facility>> {
        let url = format!("{}/hospitals", self.client.config().api_url);
        let records: Vec<FacilityRecord> = self.client.get_url(Service::Backend, &url, &[]).await?;
        Ok(parse_facilities(records))
    }

    /// Ask the backend for facilities within `radius_km` of `observer`
    #[instrument(skip(self))]
    pub async fn nearby(
        &self,
        observer: &Coordinate,
        radius_km: f64,
    ) -> ApiResult<Vec<AnnotatedFacility>> {
        let url = format!("{}/hospitals/nearby", self.client.config().api_url);
        let query = [
            ("latitude", observer.latitude.to_string()),
            ("longitude", observer.longitude.to_string()),
            ("radius", radius_km.to_string()),
        ];

        let records: Vec<FacilityRecord> =
            self.client.get_url(Service::Backend, &url, &query).await?;
        Ok(parse_nearby(records, observer))
    }
}
