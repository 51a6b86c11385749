//! Integration tests for Drivo quoting and the CLI

use std::collections::HashMap;
use std::process::Command;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveTime;
use drivo::geocoding::PlaceSource;
use drivo::{
    AddressResolver, CrossRegionPolicy, DefaultCoordinates, DrivoError, FuelType, GeoPoint,
    GeocodedPlace, Geocoder, LocationInput, NightSurcharge, QuoteOptions, QuoteRequest,
    QuoteService, Region,
    ResolveOptions, Route, RouteRequest, RouteResolver, RoutingProvider, TariffTable, TripConfig,
    TripType, VehicleType,
};
use rstest::rstest;

/// Router that answers from a table keyed by destination latitude
struct TableRouter {
    distances: Vec<(f64, Vec<f64>)>,
    calls: AtomicUsize,
}

impl TableRouter {
    fn new(distances: Vec<(f64, Vec<f64>)>) -> Self {
        Self {
            distances,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl RoutingProvider for TableRouter {
    async fn fetch_routes(&self, request: &RouteRequest) -> drivo::Result<Vec<Route>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let Some((_, meters)) = self
            .distances
            .iter()
            .find(|(lat, _)| (lat - request.destination.latitude()).abs() < 1e-9)
        else {
            return Ok(Vec::new());
        };
        let take = if request.alternatives { meters.len() } else { 1 };
        meters
            .iter()
            .take(take)
            .map(|&m| Route::new(vec![request.origin, request.destination], m, m / 25.0))
            .collect()
    }
}

/// Reverse geocoder with a country per latitude band
struct BandGeocoder;

#[async_trait]
impl Geocoder for BandGeocoder {
    async fn forward(&self, _query: &str) -> drivo::Result<Vec<GeocodedPlace>> {
        Err(DrivoError::provider_unavailable("HTTP 503"))
    }

    async fn reverse(&self, point: GeoPoint) -> drivo::Result<Option<Region>> {
        let (name, code) = if point.latitude() > 35.0 {
            ("China", "cn")
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

fn lahore() -> GeoPoint {
    GeoPoint::new(31.5204, 74.3587).unwrap()
}

fn karachi() -> GeoPoint {
    GeoPoint::new(24.8607, 67.0011).unwrap()
}

fn islamabad() -> GeoPoint {
    GeoPoint::new(33.6844, 73.0479).unwrap()
}

fn kashgar() -> GeoPoint {
    GeoPoint::new(39.4704, 75.9898).unwrap()
}

fn router() -> TableRouter {
    TableRouter::new(vec![
        (karachi().latitude(), vec![1_200_000.0, 1_300_000.0, 1_250_000.0]),
        (islamabad().latitude(), vec![380_000.0]),
        (kashgar().latitude(), vec![1_450_000.0]),
    ])
}

fn trip(vehicle: VehicleType, fuel: FuelType, hour: u32, minute: u32, trip_type: TripType) -> TripConfig {
    TripConfig::new(
        vehicle,
        fuel,
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap(),
        trip_type,
    )
}

fn service(router: TableRouter) -> QuoteService {
    service_with(router, TariffTable::default())
}

fn service_with(router: TableRouter, tariff: TariffTable) -> QuoteService {
    QuoteService::new(RouteResolver::new(Arc::new(router)), tariff).unwrap()
}

fn night_tariff() -> TariffTable {
    TariffTable {
        night_surcharge: Some(NightSurcharge::new(
            NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
            1.25,
        )),
        ..TariffTable::default()
    }
}

#[tokio::test]
async fn test_alternatives_are_ordered_shortest_first() {
    let resolver = RouteResolver::new(Arc::new(router()));
    let routes = resolver
        .resolve(
            lahore(),
            karachi(),
            ResolveOptions {
                want_alternatives: true,
            },
        )
        .await
        .unwrap();

    let distances: Vec<f64> = routes.iter().map(Route::distance_meters).collect();
    assert_eq!(distances, vec![1_200_000.0, 1_250_000.0, 1_300_000.0]);
    assert_eq!(routes.recommended().distance_meters(), 1_200_000.0);
    assert_eq!(routes.longest().distance_meters(), 1_300_000.0);
    assert!(!routes.crosses_region_boundary());
}

#[rstest]
#[case(14, 0, TripType::OneWay, 403_200, 282_240)]
#[case(23, 0, TripType::OneWay, 504_000, 352_800)]
#[case(21, 0, TripType::OneWay, 504_000, 352_800)]
#[case(20, 59, TripType::OneWay, 403_200, 282_240)]
#[case(20, 59, TripType::TwoWay, 806_400, 564_480)]
#[tokio::test]
async fn test_lahore_karachi_quotes(
    #[case] hour: u32,
    #[case] minute: u32,
    #[case] trip_type: TripType,
    #[case] total: u64,
    #[case] payout: u64,
) {
    let quote = service_with(router(), night_tariff())
        .quote(
            lahore(),
            karachi(),
            &trip(VehicleType::Car, FuelType::Petrol, hour, minute, trip_type),
            QuoteOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(quote.routes.len(), 1);
    let fare = quote.recommended_fare();
    assert_eq!(fare.distance_km, 1200.0);
    assert_eq!(fare.total_fare, total);
    assert_eq!(fare.driver_payout_share, payout);
    assert_eq!(fare.tariff_version, "default");
}

#[tokio::test]
async fn test_identical_points_never_reach_the_provider() {
    let router = Arc::new(router());
    let resolver = RouteResolver::new(router.clone());
    let err = resolver
        .resolve(lahore(), lahore(), ResolveOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, DrivoError::InvalidRequest { .. }));
    assert_eq!(router.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unreachable_destination() {
    let nowhere = GeoPoint::new(0.0, 0.0).unwrap();
    let err = service(router())
        .quote(
            lahore(),
            nowhere,
            &trip(VehicleType::Car, FuelType::Petrol, 10, 0, TripType::OneWay),
            QuoteOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DrivoError::NoRouteFound { .. }));
}

#[tokio::test]
async fn test_cross_region_policy() {
    let resolver = RouteResolver::new(Arc::new(router())).with_region_check(Arc::new(BandGeocoder));
    let service = QuoteService::new(resolver, TariffTable::default()).unwrap();
    let config = trip(VehicleType::Car, FuelType::Diesel, 10, 0, TripType::OneWay);

    let allowed = service
        .quote(lahore(), kashgar(), &config, QuoteOptions::default())
        .await
        .unwrap();
    assert!(allowed.routes.crosses_region_boundary());

    let rejected = service
        .quote(
            lahore(),
            kashgar(),
            &config,
            QuoteOptions {
                cross_region: CrossRegionPolicy::Reject,
                ..QuoteOptions::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(rejected, DrivoError::InvalidRequest { .. }));

    let domestic = service
        .quote(
            lahore(),
            islamabad(),
            &config,
            QuoteOptions {
                cross_region: CrossRegionPolicy::Reject,
                ..QuoteOptions::default()
            },
        )
        .await
        .unwrap();
    assert!(!domestic.routes.crosses_region_boundary());
    // 380 km * 265 * 1.2
    assert_eq!(domestic.recommended_fare().total_fare, 120_840);
}

#[tokio::test]
async fn test_quote_many_keeps_request_order() {
    let service = service(router());
    let config = trip(VehicleType::Bike, FuelType::Electric, 10, 0, TripType::OneWay);
    let request = |destination: GeoPoint| QuoteRequest {
        origin: lahore(),
        destination,
        config,
        options: QuoteOptions::default(),
    };

    let results = service
        .quote_many(&[request(islamabad()), request(lahore()), request(karachi())])
        .await;

    assert_eq!(results.len(), 3);
    // 380 km * 20 * 0.6
    assert_eq!(results[0].as_ref().unwrap().recommended_fare().total_fare, 4_560);
    assert!(matches!(results[1], Err(DrivoError::InvalidRequest { .. })));
    // 1200 km * 20 * 0.6
    assert_eq!(results[2].as_ref().unwrap().recommended_fare().total_fare, 14_400);
}

#[tokio::test]
async fn test_fallback_coordinates_feed_a_quote() {
    let table: DefaultCoordinates = HashMap::from([
        ("Lahore".to_string(), lahore()),
        ("Karachi".to_string(), karachi()),
    ])
    .into_iter()
    .collect();
    let addresses = AddressResolver::new(Arc::new(BandGeocoder)).with_fallback(table);

    let pickup = addresses
        .resolve(&LocationInput::Address("Lahore".to_string()))
        .await
        .unwrap();
    let dropoff = addresses
        .resolve(&LocationInput::Address("karachi".to_string()))
        .await
        .unwrap();
    assert_eq!(pickup.source, PlaceSource::Fallback);

    let quote = service(router())
        .quote(
            pickup.point,
            dropoff.point,
            &trip(VehicleType::Rickshaw, FuelType::Petrol, 12, 0, TripType::OneWay),
            QuoteOptions::default(),
        )
        .await
        .unwrap();
    // 1200 km * 280 * 0.9
    assert_eq!(quote.recommended_fare().total_fare, 302_400);
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_drivo"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Resolve driving routes"));
    assert!(stdout.contains("quote"));
}

/// Test that an unknown vehicle is rejected before any network call
#[test]
fn test_cli_rejects_unknown_vehicle() {
    let output = Command::new(env!("CARGO_BIN_EXE_drivo"))
        .args(["quote", "--from", "31.52,74.35", "--to", "24.86,67.0", "--vehicle", "hovercraft"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error"));
}
