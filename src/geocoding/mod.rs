//! Address and region lookup
//!
//! This module handles resolving ride-form location input (map picks or
//! typed addresses) into [`GeoPoint`]s, and reverse-resolving points to a
//! country-level [`Region`] for the cross-border check.

pub mod nominatim;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::models::{GeoPoint, LocationInput};
use crate::{DrivoError, Result};

pub use nominatim::NominatimClient;

/// Where a resolved place came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaceSource {
    /// The user supplied coordinates directly
    Input,
    /// Forward geocoding
    Geocoder,
    /// The caller's default-coordinates table, after the geocoder was unavailable
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodedPlace {
    pub point: GeoPoint,
    pub display_name: String,
    pub source: PlaceSource,
}

/// Coarse administrative region of a point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub region_name: String,
    pub country_name: String,
    /// ISO 3166-1 alpha-2, when the provider reports it
    pub country_code: Option<String>,
}

impl Region {
    /// Compare by country code when both sides have one, by country name otherwise
    #[must_use]
    pub fn same_country(&self, other: &Region) -> bool {
        match (&self.country_code, &other.country_code) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            _ => self
                .country_name
                .trim()
                .eq_ignore_ascii_case(other.country_name.trim()),
        }
    }
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Free text to candidate places, best match first
    async fn forward(&self, query: &str) -> Result<Vec<GeocodedPlace>>;

    /// Point to region; `None` when the provider knows no address there
    async fn reverse(&self, point: GeoPoint) -> Result<Option<Region>>;
}

/// Caller-supplied coordinates for well-known place names, consulted only
/// when the geocoder is unavailable.
#[derive(Debug, Clone, Default)]
pub struct DefaultCoordinates {
    entries: HashMap<String, GeoPoint>,
}

impl DefaultCoordinates {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, point: GeoPoint) {
        self.entries.insert(normalize(name), point);
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<GeoPoint> {
        self.entries.get(&normalize(name)).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, GeoPoint)> for DefaultCoordinates {
    fn from_iter<I: IntoIterator<Item = (String, GeoPoint)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (name, point) in iter {
            table.insert(&name, point);
        }
        table
    }
}

fn normalize(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Service for resolving pickup/drop-off input into places
pub struct AddressResolver {
    geocoder: Arc<dyn Geocoder>,
    fallback: Option<DefaultCoordinates>,
}

impl AddressResolver {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            geocoder,
            fallback: None,
        }
    }

    /// Consult `table` when the geocoder is unavailable. An empty table disables the fallback.
    #[must_use]
    pub fn with_fallback(mut self, table: DefaultCoordinates) -> Self {
        self.fallback = (!table.is_empty()).then_some(table);
        self
    }

    #[instrument(skip(self))]
    pub async fn resolve(&self, input: &LocationInput) -> Result<GeocodedPlace> {
        match input {
            LocationInput::Coordinates(point) => Ok(GeocodedPlace {
                point: *point,
                display_name: point.format_coordinates(),
                source: PlaceSource::Input,
            }),
            LocationInput::Address(query) => self.resolve_address(query).await,
        }
    }

    async fn resolve_address(&self, query: &str) -> Result<GeocodedPlace> {
        let query = query.trim();
        if query.is_empty() {
            return Err(DrivoError::invalid_request("Address cannot be empty"));
        }

        debug!("Geocoding address: {}", query);
        match self.geocoder.forward(query).await {
            Ok(results) => results
                .into_iter()
                .next()
                .inspect(|place| {
                    debug!(
                        "Found location: {} ({})",
                        place.display_name,
                        place.point.format_coordinates()
                    );
                })
                .ok_or_else(|| DrivoError::address_not_found(query)),
            Err(err @ DrivoError::ProviderUnavailable { .. }) => {
                let Some(point) = self.fallback.as_ref().and_then(|t| t.lookup(query)) else {
                    return Err(err);
                };
                warn!(
                    "Geocoder unavailable ({}), using default coordinates for '{}'",
                    err, query
                );
                Ok(GeocodedPlace {
                    point,
                    display_name: query.to_string(),
                    source: PlaceSource::Fallback,
                })
            }
            Err(err) => Err(err),
        }
    }
}
