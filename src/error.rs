//! Error types and handling for the Drivo fare core

use thiserror::Error;

use crate::models::{FuelType, VehicleType};

/// Main error type for routing, geocoding and fare estimation
#[derive(Error, Debug)]
pub enum DrivoError {
    /// Malformed input, out-of-range or identical coordinates
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// The routing provider answered but had no route between the points
    #[error("No route found: {message}")]
    NoRouteFound { message: String },

    /// Network, timeout, 5xx or malformed answer from a provider
    #[error("Provider unavailable: {message}")]
    ProviderUnavailable { message: String },

    /// Forward geocoding returned no match for the query
    #[error("Address not found: {query}")]
    AddressNotFound { query: String },

    /// The tariff has no base rate for this fuel type
    #[error("Unknown fuel type: {fuel_type}")]
    UnknownFuelType { fuel_type: FuelType },

    /// The tariff has no multiplier for this vehicle type
    #[error("Unknown vehicle type: {vehicle_type}")]
    UnknownVehicleType { vehicle_type: VehicleType },

    /// Negative or non-finite pricing input
    #[error("Invalid tariff: {message}")]
    InvalidTariff { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl DrivoError {
    /// Create a new invalid request error
    pub fn invalid_request<S: Into<String>>(message: S) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a new no-route error
    pub fn no_route<S: Into<String>>(message: S) -> Self {
        Self::NoRouteFound {
            message: message.into(),
        }
    }

    /// Create a new provider error
    pub fn provider_unavailable<S: Into<String>>(message: S) -> Self {
        Self::ProviderUnavailable {
            message: message.into(),
        }
    }

    /// Create a new address lookup error
    pub fn address_not_found<S: Into<String>>(query: S) -> Self {
        Self::AddressNotFound {
            query: query.into(),
        }
    }

    /// Create a new tariff error
    pub fn invalid_tariff<S: Into<String>>(message: S) -> Self {
        Self::InvalidTariff {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether a caller-side retry can reasonably succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, DrivoError::ProviderUnavailable { .. })
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            DrivoError::InvalidRequest { message } => format!("Invalid input: {message}"),
            DrivoError::NoRouteFound { .. } => {
                "No drivable route was found between pickup and drop-off.".to_string()
            }
            DrivoError::ProviderUnavailable { .. } => {
                "Unable to reach the routing service. Please check your internet connection and try again."
                    .to_string()
            }
            DrivoError::AddressNotFound { query } => {
                format!("Could not find a location matching '{query}'.")
            }
            DrivoError::UnknownFuelType { fuel_type } => {
                format!("{fuel_type} rides are not priced yet.")
            }
            DrivoError::UnknownVehicleType { vehicle_type } => {
                format!("{vehicle_type} rides are not priced yet.")
            }
            DrivoError::InvalidTariff { .. } => {
                "The fare could not be calculated. Please contact support.".to_string()
            }
            DrivoError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            DrivoError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}
