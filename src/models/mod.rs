//! Data models for the Drivo fare core
//!
//! This module contains the core domain models organized by concern:
//! - Location: validated geographic points and form-input parsing
//! - Route: provider routes and ordered route sets
//! - Trip: rider-selected vehicle, fuel, time and trip type
//! - Fare: the itemized fare result

pub mod fare;
pub mod location;
pub mod route;
pub mod trip;

// Re-export all public types for convenient access
pub use fare::FareBreakdown;
pub use location::{COORDINATE_EPSILON, GeoPoint, LocationInput, LocationParser};
pub use route::{Route, RouteSet};
pub use trip::{FuelType, TripConfig, TripType, VehicleType, parse_departure_time};
