use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::{GeocodedPlace, Geocoder, PlaceSource, Region};
use crate::config::GeocodingConfig;
use crate::http;
use crate::models::GeoPoint;
use crate::{DrivoError, Result};

/// Nominatim (OpenStreetMap) geocoding client
pub struct NominatimClient {
    client: ClientWithMiddleware,
    base_url: String,
    accept_language: String,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    lat: String,
    lon: String,
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    error: Option<String>,
    address: Option<ReverseAddress>,
}

#[derive(Debug, Deserialize)]
struct ReverseAddress {
    state: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
}

impl NominatimClient {
    pub fn new(config: &GeocodingConfig) -> Result<Self> {
        let client = http::build_client(
            Duration::from_secs(config.timeout_seconds.into()),
            config.max_retries,
            &config.user_agent,
        )?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            accept_language: config.accept_language.clone(),
        })
    }

    fn search_url(&self, query: &str) -> String {
        format!(
            "{}/search?format=json&limit=5&q={}",
            self.base_url,
            urlencoding::encode(query)
        )
    }

    fn reverse_url(&self, point: GeoPoint) -> String {
        format!(
            "{}/reverse?format=json&zoom=3&addressdetails=1&lat={}&lon={}",
            self.base_url,
            point.latitude(),
            point.longitude()
        )
    }

    async fn get_text(&self, url: &str) -> Result<(StatusCode, String)> {
        let response = self
            .client
            .get(url)
            .header("Accept-Language", &self.accept_language)
            .send()
            .await
            .map_err(|e| http::transport_error("Nominatim", &e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            DrivoError::provider_unavailable(format!("Failed to read Nominatim response: {e}"))
        })?;
        Ok((status, body))
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    #[instrument(name = "nominatim_search", skip(self))]
    async fn forward(&self, query: &str) -> Result<Vec<GeocodedPlace>> {
        let (status, body) = self.get_text(&self.search_url(query)).await?;
        let places = parse_search(status, &body)?;

        if places.is_empty() {
            warn!("No results found for '{}'", query);
        } else {
            info!("Found {} geocoding results for '{}'", places.len(), query);
        }
        Ok(places)
    }

    #[instrument(name = "nominatim_reverse", skip(self), fields(point = %point.format_coordinates()))]
    async fn reverse(&self, point: GeoPoint) -> Result<Option<Region>> {
        let (status, body) = self.get_text(&self.reverse_url(point)).await?;
        let region = parse_reverse(status, &body)?;
        debug!("Reverse geocoded to {:?}", region);
        Ok(region)
    }
}

fn check_status(status: StatusCode) -> Result<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(DrivoError::provider_unavailable(format!(
            "Nominatim returned HTTP {status}"
        )))
    }
}

fn parse_search(status: StatusCode, body: &str) -> Result<Vec<GeocodedPlace>> {
    check_status(status)?;
    let results: Vec<SearchResult> = serde_json::from_str(body).map_err(|e| {
        DrivoError::provider_unavailable(format!("Malformed Nominatim search response: {e}"))
    })?;

    results
        .into_iter()
        .map(|result| {
            let lat = result.lat.parse::<f64>();
            let lon = result.lon.parse::<f64>();
            let point = match (lat, lon) {
                (Ok(lat), Ok(lon)) => GeoPoint::new(lat, lon).ok(),
                _ => None,
            }
            .ok_or_else(|| {
                DrivoError::provider_unavailable(format!(
                    "Nominatim returned invalid coordinates '{}', '{}'",
                    result.lat, result.lon
                ))
            })?;
            Ok(GeocodedPlace {
                point,
                display_name: result.display_name,
                source: PlaceSource::Geocoder,
            })
        })
        .collect()
}

fn parse_reverse(status: StatusCode, body: &str) -> Result<Option<Region>> {
    check_status(status)?;
    let response: ReverseResponse = serde_json::from_str(body).map_err(|e| {
        DrivoError::provider_unavailable(format!("Malformed Nominatim reverse response: {e}"))
    })?;

    if let Some(error) = response.error {
        debug!("Nominatim has no address here: {}", error);
        return Ok(None);
    }

    Ok(response.address.and_then(|address| {
        let country_name = address.country?;
        Some(Region {
            region_name: address.state.unwrap_or_else(|| country_name.clone()),
            country_name,
            country_code: address.country_code,
        })
    }))
}
