//! `Drivo` - Ride fare estimation and route selection
//!
//! This library resolves driving routes between two points, prices each
//! candidate route against a tariff table, and builds the ride request
//! the booking backend expects.

pub mod config;
pub mod error;
pub mod fare;
pub mod geocoding;
pub mod http;
pub mod models;
pub mod quote;
pub mod routing;
pub mod tariff;
pub mod telemetry;

// Re-export core types for public API
pub use config::DrivoConfig;
pub use error::DrivoError;
pub use fare::FareEstimator;
pub use geocoding::{AddressResolver, DefaultCoordinates, GeocodedPlace, Geocoder, NominatimClient, Region};
pub use models::{
    FareBreakdown, FuelType, GeoPoint, LocationInput, LocationParser, Route, RouteSet, TripConfig,
    TripType, VehicleType,
};
pub use quote::{CrossRegionPolicy, QuoteOptions, QuoteRequest, QuoteService, RideQuote, RideRequest};
pub use routing::{OsrmClient, ResolveOptions, RouteRequest, RouteResolver, RoutingProvider};
pub use tariff::{NightSurcharge, TariffTable};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, DrivoError>;
