//! Route resolution
//!
//! [`RouteResolver`] turns two [`GeoPoint`]s into an ordered [`RouteSet`]
//! using a pluggable [`RoutingProvider`]. Each call issues one provider
//! request (plus two reverse lookups when the region check is on), applies
//! the configured timeout, and keeps no state. Dropping the returned future
//! cancels the outbound request.

pub mod osrm;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use crate::config::DrivoConfig;
use crate::geocoding::{Geocoder, nominatim::NominatimClient};
use crate::models::{COORDINATE_EPSILON, GeoPoint, Route, RouteSet};
use crate::{DrivoError, Result};

pub use osrm::OsrmClient;

/// Default time budget for one resolution, matching the backend's timeout convention
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// What is sent to a routing provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteRequest {
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    /// Ask for alternative candidates besides the best route
    pub alternatives: bool,
}

/// A driving-route backend. Implementations must be `Send + Sync` so a
/// resolver can be shared between concurrent quote requests.
#[async_trait]
pub trait RoutingProvider: Send + Sync {
    /// Candidate routes in provider order. An empty list means "no route".
    async fn fetch_routes(&self, request: &RouteRequest) -> Result<Vec<Route>>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    pub want_alternatives: bool,
}

pub struct RouteResolver {
    provider: Arc<dyn RoutingProvider>,
    region_geocoder: Option<Arc<dyn Geocoder>>,
    timeout: Duration,
}

impl RouteResolver {
    pub fn new(provider: Arc<dyn RoutingProvider>) -> Self {
        Self {
            provider,
            region_geocoder: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Build an OSRM-backed resolver, with a Nominatim region check when enabled
    pub fn from_config(config: &DrivoConfig) -> Result<Self> {
        let provider = Arc::new(OsrmClient::new(&config.routing)?);
        let mut resolver = Self::new(provider)
            .with_timeout(Duration::from_secs(config.routing.timeout_seconds.into()));
        if config.geocoding.region_check {
            resolver = resolver.with_region_check(Arc::new(NominatimClient::new(&config.geocoding)?));
        }
        Ok(resolver)
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reverse-resolve both endpoints to a country and flag trips that cross a border
    #[must_use]
    pub fn with_region_check(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        self.region_geocoder = Some(geocoder);
        self
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve a driving route between two points.
    ///
    /// Fails with `InvalidRequest` when the points coincide, `NoRouteFound`
    /// when the provider has no candidate, and `ProviderUnavailable` on
    /// transport errors, malformed answers or timeout.
    #[instrument(
        skip(self),
        fields(origin = %origin.format_coordinates(), destination = %destination.format_coordinates())
    )]
    pub async fn resolve(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
        options: ResolveOptions,
    ) -> Result<RouteSet> {
        if origin.approx_eq(&destination, COORDINATE_EPSILON) {
            return Err(DrivoError::invalid_request(
                "Pickup and drop-off must be different locations",
            ));
        }

        let request = RouteRequest {
            origin,
            destination,
            alternatives: options.want_alternatives,
        };

        let candidates = tokio::time::timeout(self.timeout, self.provider.fetch_routes(&request))
            .await
            .map_err(|_| {
                warn!("Routing provider timed out after {:?}", self.timeout);
                DrivoError::provider_unavailable(format!(
                    "Routing provider timed out after {}s",
                    self.timeout.as_secs_f64()
                ))
            })??;

        debug!("Provider returned {} candidate(s)", candidates.len());
        let mut routes = RouteSet::from_candidates(candidates)?;

        let straight_km = origin.straight_line_km(&destination);
        let route_km = routes.recommended().distance_meters() / 1000.0;
        if route_km < straight_km * 0.99 {
            warn!(
                "Recommended route ({:.2} km) is shorter than the straight-line distance ({:.2} km)",
                route_km, straight_km
            );
        }

        if let Some(geocoder) = &self.region_geocoder {
            let crosses = self.crosses_region(geocoder.as_ref(), origin, destination).await?;
            routes = routes.with_region_boundary(crosses);
        }

        info!(
            "Resolved {} route(s), recommended {:.2} km",
            routes.len(),
            route_km
        );
        Ok(routes)
    }

    async fn crosses_region(
        &self,
        geocoder: &dyn Geocoder,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> Result<bool> {
        let lookups = futures::future::try_join(geocoder.reverse(origin), geocoder.reverse(destination));
        let (from, to) = tokio::time::timeout(self.timeout, lookups)
            .await
            .map_err(|_| DrivoError::provider_unavailable("Region lookup timed out"))??;

        Ok(match (from, to) {
            (Some(from), Some(to)) => {
                let crosses = !from.same_country(&to);
                debug!(
                    "Origin in {}, destination in {} (crosses: {})",
                    from.country_name, to.country_name, crosses
                );
                crosses
            }
            _ => {
                warn!("Could not resolve a region for one of the endpoints; not flagging boundary crossing");
                false
            }
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::geocoding::{GeocodedPlace, Region};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider returning a fixed answer and recording what it was asked
    pub(crate) struct FakeProvider {
        pub answer: Mutex<Option<Result<Vec<Route>>>>,
        pub requests: Mutex<Vec<RouteRequest>>,
        pub delay: Option<Duration>,
    }

    impl FakeProvider {
        pub(crate) fn returning(routes: Vec<Route>) -> Self {
            Self {
                answer: Mutex::new(Some(Ok(routes))),
                requests: Mutex::new(Vec::new()),
                delay: None,
            }
        }

        pub(crate) fn failing(err: DrivoError) -> Self {
            Self {
                answer: Mutex::new(Some(Err(err))),
                requests: Mutex::new(Vec::new()),
                delay: None,
            }
        }
    }

    #[async_trait]
    impl RoutingProvider for FakeProvider {
        async fn fetch_routes(&self, request: &RouteRequest) -> Result<Vec<Route>> {
            self.requests.lock().unwrap().push(*request);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.answer
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    struct CountryGeocoder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Geocoder for CountryGeocoder {
        async fn forward(&self, _query: &str) -> Result<Vec<GeocodedPlace>> {
            Ok(Vec::new())
        }

        async fn reverse(&self, point: GeoPoint) -> Result<Option<Region>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // west of 70°E is "Iran", the rest "Pakistan"; the ocean has no region
            if point.latitude() < 0.0 {
                return Ok(None);
            }
            let (name, code) = if point.longitude() < 70.0 {
                ("Iran", "ir")
            } else {
                ("Pakistan", "pk")
            };
            Ok(Some(Region {
                region_name: name.to_string(),
                country_name: name.to_string(),
                country_code: Some(code.to_string()),
            }))
        }
    }

    pub(crate) fn lahore() -> GeoPoint {
        GeoPoint::new(31.5204, 74.3587).unwrap()
    }

    pub(crate) fn karachi() -> GeoPoint {
        GeoPoint::new(24.8607, 67.0011).unwrap()
    }

    pub(crate) fn route_between(from: GeoPoint, to: GeoPoint, distance: f64, duration: f64) -> Route {
        Route::new(vec![from, to], distance, duration).unwrap()
    }

    #[tokio::test]
    async fn test_identical_points_rejected_without_provider_call() {
        let provider = Arc::new(FakeProvider::returning(Vec::new()));
        let resolver = RouteResolver::new(provider.clone());

        let err = resolver
            .resolve(lahore(), lahore(), ResolveOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DrivoError::InvalidRequest { .. }));
        assert!(provider.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_nearly_identical_points_rejected() {
        let resolver = RouteResolver::new(Arc::new(FakeProvider::returning(Vec::new())));
        let nudged = GeoPoint::new(31.520_400_4, 74.358_699_8).unwrap();
        let err = resolver
            .resolve(lahore(), nudged, ResolveOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DrivoError::InvalidRequest { .. }));
    }

    #[tokio::test]
    async fn test_alternatives_flag_is_forwarded() {
        let provider = Arc::new(FakeProvider::returning(vec![route_between(
            lahore(),
            karachi(),
            1_200_000.0,
            43_200.0,
        )]));
        let resolver = RouteResolver::new(provider.clone());

        resolver
            .resolve(lahore(), karachi(), ResolveOptions { want_alternatives: true })
            .await
            .unwrap();

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].alternatives);
        assert_eq!(requests[0].origin, lahore());
    }

    #[tokio::test]
    async fn test_candidates_are_ordered() {
        let provider = Arc::new(FakeProvider::returning(vec![
            route_between(lahore(), karachi(), 1_300_000.0, 40_000.0),
            route_between(lahore(), karachi(), 1_200_000.0, 43_200.0),
            route_between(lahore(), karachi(), 1_250_000.0, 41_000.0),
        ]));
        let resolver = RouteResolver::new(provider);

        let routes = resolver
            .resolve(lahore(), karachi(), ResolveOptions { want_alternatives: true })
            .await
            .unwrap();

        let distances: Vec<f64> = routes.iter().map(Route::distance_meters).collect();
        assert_eq!(distances, vec![1_200_000.0, 1_250_000.0, 1_300_000.0]);
        assert!(!routes.crosses_region_boundary());
    }

    #[tokio::test]
    async fn test_empty_answer_is_no_route() {
        let resolver = RouteResolver::new(Arc::new(FakeProvider::returning(Vec::new())));
        let err = resolver
            .resolve(lahore(), karachi(), ResolveOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DrivoError::NoRouteFound { .. }));
    }

    #[tokio::test]
    async fn test_provider_errors_propagate() {
        let resolver = RouteResolver::new(Arc::new(FakeProvider::failing(
            DrivoError::provider_unavailable("HTTP 503"),
        )));
        let err = resolver
            .resolve(lahore(), karachi(), ResolveOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DrivoError::ProviderUnavailable { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_times_out() {
        let provider = FakeProvider {
            delay: Some(Duration::from_secs(60)),
            ..FakeProvider::returning(vec![route_between(lahore(), karachi(), 1000.0, 60.0)])
        };
        let resolver = RouteResolver::new(Arc::new(provider)).with_timeout(Duration::from_secs(10));

        let err = resolver
            .resolve(lahore(), karachi(), ResolveOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DrivoError::ProviderUnavailable { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_can_be_aborted() {
        use futures::future::{AbortHandle, Abortable};

        let provider = FakeProvider {
            delay: Some(Duration::from_secs(5)),
            ..FakeProvider::returning(vec![route_between(lahore(), karachi(), 1000.0, 60.0)])
        };
        let resolver = Arc::new(RouteResolver::new(Arc::new(provider)));

        let (handle, registration) = AbortHandle::new_pair();
        let task = {
            let resolver = resolver.clone();
            tokio::spawn(Abortable::new(
                async move {
                    resolver
                        .resolve(lahore(), karachi(), ResolveOptions::default())
                        .await
                },
                registration,
            ))
        };

        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.abort();
        assert!(task.await.unwrap().is_err());
    }

    #[tokio::test]
    async fn test_region_check_flags_border_crossing() {
        let geocoder = Arc::new(CountryGeocoder {
            calls: AtomicUsize::new(0),
        });
        let zahedan = GeoPoint::new(29.4963, 60.8629).unwrap();
        let provider = Arc::new(FakeProvider::returning(vec![route_between(
            lahore(),
            zahedan,
            1_600_000.0,
            70_000.0,
        )]));
        let resolver = RouteResolver::new(provider).with_region_check(geocoder.clone());

        let routes = resolver
            .resolve(lahore(), zahedan, ResolveOptions::default())
            .await
            .unwrap();
        assert!(routes.crosses_region_boundary());
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_region_check_same_country() {
        let geocoder = Arc::new(CountryGeocoder {
            calls: AtomicUsize::new(0),
        });
        let islamabad = GeoPoint::new(33.6844, 73.0479).unwrap();
        let provider = Arc::new(FakeProvider::returning(vec![route_between(
            lahore(),
            islamabad,
            380_000.0,
            16_000.0,
        )]));
        let resolver = RouteResolver::new(provider).with_region_check(geocoder);

        let routes = resolver
            .resolve(lahore(), islamabad, ResolveOptions::default())
            .await
            .unwrap();
        assert!(!routes.crosses_region_boundary());
    }

    #[tokio::test]
    async fn test_unresolvable_region_does_not_flag() {
        let geocoder = Arc::new(CountryGeocoder {
            calls: AtomicUsize::new(0),
        });
        let at_sea = GeoPoint::new(-10.0, 60.0).unwrap();
        let provider = Arc::new(FakeProvider::returning(vec![route_between(
            lahore(),
            at_sea,
            5_000_000.0,
            200_000.0,
        )]));
        let resolver = RouteResolver::new(provider).with_region_check(geocoder);

        let routes = resolver
            .resolve(lahore(), at_sea, ResolveOptions::default())
            .await
            .unwrap();
        assert!(!routes.crosses_region_boundary());
    }
}
