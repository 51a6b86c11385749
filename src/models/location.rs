//! Geographic point model and form-input parsing

use haversine::{Location as HaversineLocation, Units, distance};
use serde::{Deserialize, Serialize};

use crate::{DrivoError, Result};

/// Two points closer than this (in degrees, per axis) are the same point.
pub const COORDINATE_EPSILON: f64 = 1e-6;

/// A validated WGS84 coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPoint")]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawPoint {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawPoint> for GeoPoint {
    type Error = DrivoError;

    fn try_from(raw: RawPoint) -> Result<Self> {
        GeoPoint::new(raw.latitude, raw.longitude)
    }
}

impl GeoPoint {
    /// Create a point, rejecting NaN and out-of-range coordinates
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(DrivoError::invalid_request(format!(
                "Latitude must be between -90 and 90, got: {latitude}"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(DrivoError::invalid_request(format!(
                "Longitude must be between -180 and 180, got: {longitude}"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// True when both axes differ by less than `epsilon` degrees
    #[must_use]
    pub fn approx_eq(&self, other: &GeoPoint, epsilon: f64) -> bool {
        (self.latitude - other.latitude).abs() < epsilon
            && (self.longitude - other.longitude).abs() < epsilon
    }

    /// Great-circle distance in kilometers
    #[must_use]
    pub fn straight_line_km(&self, other: &GeoPoint) -> f64 {
        let from = HaversineLocation {
            latitude: self.latitude,
            longitude: self.longitude,
        };
        let to = HaversineLocation {
            latitude: other.latitude,
            longitude: other.longitude,
        };
        distance(from, to, Units::Kilometers)
    }

    /// Format point as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// What the user typed into a pickup or drop-off field
#[derive(Debug, Clone, PartialEq)]
pub enum LocationInput {
    /// Coordinates picked on the map or typed as "lat,lon"
    Coordinates(GeoPoint),
    /// Free-text address to be geocoded
    Address(String),
}

pub struct LocationParser;

impl LocationParser {
    /// Parse location input: coordinates if it looks like a valid "lat,lon", an address otherwise
    pub fn parse(input: &str) -> Result<LocationInput> {
        let input = input.trim();
        if input.is_empty() {
            return Err(DrivoError::invalid_request("Location cannot be empty"));
        }

        if let Some(point) = Self::parse_coordinates(input) {
            return Ok(LocationInput::Coordinates(point));
        }

        Ok(LocationInput::Address(input.to_string()))
    }

    /// Parse coordinates from string like "31.5204,74.3587" or "31.5204 74.3587"
    fn parse_coordinates(input: &str) -> Option<GeoPoint> {
        let parts: Vec<&str> = input
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect();

        if parts.len() != 2 {
            return None;
        }

        let lat = parts[0].parse::<f64>().ok()?;
        let lon = parts[1].parse::<f64>().ok()?;
        GeoPoint::new(lat, lon).ok()
    }
}
