//! OSRM routing provider
//!
//! Talks to the OSRM HTTP route service (`/route/v1/{profile}/..`) and
//! converts its answer into validated [`Route`] candidates. The service is
//! treated as untrusted: anything malformed becomes `ProviderUnavailable`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::{RouteRequest, RoutingProvider};
use crate::config::RoutingConfig;
use crate::http::{self, USER_AGENT};
use crate::models::{GeoPoint, Route};
use crate::{DrivoError, Result};

pub struct OsrmClient {
    client: ClientWithMiddleware,
    base_url: String,
    profile: String,
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    message: Option<String>,
    routes: Option<Vec<OsrmRoute>>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64, // metres
    duration: f64, // seconds
    geometry: OsrmGeometry,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<Vec<f64>>, // [lon, lat]
}

impl OsrmClient {
    pub fn new(config: &RoutingConfig) -> Result<Self> {
        let client = http::build_client(
            Duration::from_secs(config.timeout_seconds.into()),
            config.max_retries,
            USER_AGENT,
        )?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            profile: config.profile.clone(),
        })
    }

    fn route_url(&self, request: &RouteRequest) -> String {
        format!(
            "{}/route/v1/{}/{},{};{},{}?overview=full&geometries=geojson&alternatives={}",
            self.base_url,
            self.profile,
            request.origin.longitude(),
            request.origin.latitude(),
            request.destination.longitude(),
            request.destination.latitude(),
            request.alternatives,
        )
    }
}

#[async_trait]
impl RoutingProvider for OsrmClient {
    #[instrument(name = "osrm_route", skip(self), fields(alternatives = request.alternatives))]
    async fn fetch_routes(&self, request: &RouteRequest) -> Result<Vec<Route>> {
        let url = self.route_url(request);
        debug!("OSRM request URL: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| http::transport_error("OSRM", &e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DrivoError::provider_unavailable(format!("Failed to read OSRM response: {e}")))?;

        parse_response(status, &body)
    }
}

/// Convert an OSRM answer into route candidates, in provider order.
fn parse_response(status: StatusCode, body: &str) -> Result<Vec<Route>> {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        warn!("OSRM returned HTTP {}", status);
        return Err(DrivoError::provider_unavailable(format!(
            "OSRM returned HTTP {status}"
        )));
    }

    let response: OsrmResponse = serde_json::from_str(body).map_err(|e| {
        DrivoError::provider_unavailable(format!("Malformed OSRM response (HTTP {status}): {e}"))
    })?;
    let message = response.message.unwrap_or_default();

    match response.code.as_str() {
        "Ok" => {}
        "NoRoute" | "NoSegment" => {
            debug!("OSRM found no route: {}", message);
            return Ok(Vec::new());
        }
        "InvalidQuery" | "InvalidValue" | "InvalidOptions" | "InvalidUrl" => {
            return Err(DrivoError::invalid_request(format!(
                "OSRM rejected the request ({}): {message}",
                response.code
            )));
        }
        other => {
            return Err(DrivoError::provider_unavailable(format!(
                "OSRM error {other}: {message}"
            )));
        }
    }

    response
        .routes
        .unwrap_or_default()
        .into_iter()
        .map(OsrmRoute::into_route)
        .collect()
}

impl OsrmRoute {
    fn into_route(self) -> Result<Route> {
        let points = self
            .geometry
            .coordinates
            .iter()
            .map(|pair| match pair.as_slice() {
                [lon, lat, ..] => GeoPoint::new(*lat, *lon),
                _ => Err(DrivoError::invalid_request("coordinate pair needs lon and lat")),
            })
            .collect::<Result<Vec<_>>>()
            .and_then(|points| Route::new(points, self.distance, self.duration));

        points.map_err(|e| DrivoError::provider_unavailable(format!("Malformed OSRM route: {e}")))
    }
}
