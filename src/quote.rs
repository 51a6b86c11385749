//! Ride quotes
//!
//! Glues the resolver and the estimator together the way the ride-entry
//! flow uses them: resolve a route set, price every candidate, and hand the
//! result back. Also builds the payload the caller posts to the backend's
//! ride-creation endpoint.

use chrono::{NaiveDate, NaiveDateTime};
use futures::future::join_all;
use serde::Serialize;
use tracing::{info, instrument};

use crate::fare::FareEstimator;
use crate::models::{
    FareBreakdown, FuelType, GeoPoint, RouteSet, TripConfig, TripType, VehicleType,
};
use crate::routing::{ResolveOptions, RouteResolver};
use crate::tariff::TariffTable;
use crate::{DrivoError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CrossRegionPolicy {
    #[default]
    Allow,
    /// Refuse to quote trips whose endpoints are in different countries
    Reject,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuoteOptions {
    pub want_alternatives: bool,
    pub cross_region: CrossRegionPolicy,
}

/// One independent quote request, for batch quoting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuoteRequest {
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    pub config: TripConfig,
    pub options: QuoteOptions,
}

/// Candidate routes with a fare for each, in the same order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RideQuote {
    pub routes: RouteSet,
    pub fares: Vec<FareBreakdown>,
}

impl RideQuote {
    /// Fare of the recommended (shortest) route
    #[must_use]
    pub fn recommended_fare(&self) -> &FareBreakdown {
        &self.fares[0]
    }

    #[must_use]
    pub fn longest_fare(&self) -> &FareBreakdown {
        &self.fares[self.fares.len() - 1]
    }
}

pub struct QuoteService {
    resolver: RouteResolver,
    tariff: TariffTable,
}

impl QuoteService {
    /// Create a service; the tariff is validated once up front
    pub fn new(resolver: RouteResolver, tariff: TariffTable) -> Result<Self> {
        tariff.validate()?;
        Ok(Self { resolver, tariff })
    }

    #[must_use]
    pub fn tariff(&self) -> &TariffTable {
        &self.tariff
    }

    #[instrument(skip(self, config), fields(vehicle = %config.vehicle_type, fuel = %config.fuel_type))]
    pub async fn quote(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
        config: &TripConfig,
        options: QuoteOptions,
    ) -> Result<RideQuote> {
        let routes = self
            .resolver
            .resolve(
                origin,
                destination,
                ResolveOptions {
                    want_alternatives: options.want_alternatives,
                },
            )
            .await?;

        if options.cross_region == CrossRegionPolicy::Reject && routes.crosses_region_boundary() {
            return Err(DrivoError::invalid_request(
                "Pickup and drop-off are in different countries",
            ));
        }

        let fares = routes
            .iter()
            .map(|route| FareEstimator::estimate(route, config, &self.tariff))
            .collect::<Result<Vec<_>>>()?;

        info!(
            "Quoted {} route(s), recommended fare {}",
            fares.len(),
            fares[0].total_fare
        );
        Ok(RideQuote { routes, fares })
    }

    /// Quote independent requests concurrently. Results come back in request order.
    pub async fn quote_many(&self, requests: &[QuoteRequest]) -> Vec<Result<RideQuote>> {
        join_all(requests.iter().map(|request| {
            self.quote(
                request.origin,
                request.destination,
                &request.config,
                request.options,
            )
        }))
        .await
    }
}

/// Body for the backend's ride-creation endpoint. The core only builds it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RideRequest {
    pub pickup_location: String,
    pub dropoff_location: String,
    pub pickup_latitude: f64,
    pub pickup_longitude: f64,
    pub dropoff_latitude: f64,
    pub dropoff_longitude: f64,
    pub scheduled_datetime: NaiveDateTime,
    pub vehicle_type: VehicleType,
    pub fuel_type: FuelType,
    pub trip_type: TripType,
    pub fare: Option<u64>,
}

impl RideRequest {
    /// Build the payload; addresses must be non-empty and different
    pub fn new(
        pickup: (&str, GeoPoint),
        dropoff: (&str, GeoPoint),
        date: NaiveDate,
        config: &TripConfig,
        fare: Option<&FareBreakdown>,
    ) -> Result<Self> {
        let (pickup_address, pickup_point) = pickup;
        let (dropoff_address, dropoff_point) = dropoff;
        let pickup_address = pickup_address.trim();
        let dropoff_address = dropoff_address.trim();

        if pickup_address.is_empty() || dropoff_address.is_empty() {
            return Err(DrivoError::invalid_request(
                "Please enter both source & destination",
            ));
        }
        if pickup_address.eq_ignore_ascii_case(dropoff_address) {
            return Err(DrivoError::invalid_request(
                "Source and destination must be different",
            ));
        }

        Ok(Self {
            pickup_location: pickup_address.to_string(),
            dropoff_location: dropoff_address.to_string(),
            pickup_latitude: pickup_point.latitude(),
            pickup_longitude: pickup_point.longitude(),
            dropoff_latitude: dropoff_point.latitude(),
            dropoff_longitude: dropoff_point.longitude(),
            scheduled_datetime: date.and_time(config.departure_time),
            vehicle_type: config.vehicle_type,
            fuel_type: config.fuel_type,
            trip_type: config.trip_type,
            fare: fare.map(|f| f.total_fare),
        })
    }
}
