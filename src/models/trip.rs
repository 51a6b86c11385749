//! Rider-selected trip parameters

use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::{DrivoError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Car,
    Bike,
    Rickshaw,
    Van,
    Truck,
    Suv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuelType {
    Petrol,
    Diesel,
    Electric,
    Cng,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TripType {
    #[serde(rename = "one-way")]
    OneWay,
    #[serde(rename = "round-trip", alias = "two-way")]
    TwoWay,
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VehicleType::Car => "Car",
            VehicleType::Bike => "Bike",
            VehicleType::Rickshaw => "Rickshaw",
            VehicleType::Van => "Van",
            VehicleType::Truck => "Truck",
            VehicleType::Suv => "SUV",
        };
        f.write_str(name)
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FuelType::Petrol => "Petrol",
            FuelType::Diesel => "Diesel",
            FuelType::Electric => "Electric",
            FuelType::Cng => "CNG",
        };
        f.write_str(name)
    }
}

impl fmt::Display for TripType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TripType::OneWay => f.write_str("One Way"),
            TripType::TwoWay => f.write_str("Round Trip"),
        }
    }
}

impl FromStr for VehicleType {
    type Err = DrivoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "car" => Ok(VehicleType::Car),
            "bike" | "motorbike" => Ok(VehicleType::Bike),
            "rickshaw" => Ok(VehicleType::Rickshaw),
            "van" => Ok(VehicleType::Van),
            "truck" => Ok(VehicleType::Truck),
            "suv" => Ok(VehicleType::Suv),
            other => Err(DrivoError::invalid_request(format!(
                "Unsupported vehicle type '{other}'"
            ))),
        }
    }
}

impl FromStr for FuelType {
    type Err = DrivoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "petrol" => Ok(FuelType::Petrol),
            "diesel" => Ok(FuelType::Diesel),
            "electric" => Ok(FuelType::Electric),
            "cng" => Ok(FuelType::Cng),
            other => Err(DrivoError::invalid_request(format!(
                "Unsupported fuel type '{other}'"
            ))),
        }
    }
}

impl FromStr for TripType {
    type Err = DrivoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "one-way" | "1-way" | "oneway" | "one way" => Ok(TripType::OneWay),
            "two-way" | "2-way" | "twoway" | "round-trip" | "roundtrip" | "round trip" => {
                Ok(TripType::TwoWay)
            }
            other => Err(DrivoError::invalid_request(format!(
                "Unsupported trip type '{other}'"
            ))),
        }
    }
}

/// Parse a departure time typed as "14:00", "14:00:00" or "2:00 PM".
pub fn parse_departure_time(input: &str) -> Result<NaiveTime> {
    let normalized = input.trim().to_ascii_uppercase();
    ["%H:%M", "%H:%M:%S", "%I:%M %p", "%I:%M%p"]
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(&normalized, format).ok())
        .ok_or_else(|| {
            DrivoError::invalid_request(format!(
                "Invalid time '{}'. Use HH:MM or HH:MM AM/PM",
                input.trim()
            ))
        })
}

/// Trip parameters chosen on the ride-entry form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripConfig {
    pub vehicle_type: VehicleType,
    pub fuel_type: FuelType,
    /// Local wall-clock time of departure
    pub departure_time: NaiveTime,
    pub trip_type: TripType,
}

impl TripConfig {
    #[must_use]
    pub fn new(
        vehicle_type: VehicleType,
        fuel_type: FuelType,
        departure_time: NaiveTime,
        trip_type: TripType,
    ) -> Self {
        Self {
            vehicle_type,
            fuel_type,
            departure_time,
            trip_type,
        }
    }

    /// Build a config from the raw strings of the ride-entry form
    pub fn parse(vehicle: &str, fuel: &str, time: &str, trip: &str) -> Result<Self> {
        Ok(Self {
            vehicle_type: vehicle.parse()?,
            fuel_type: fuel.parse()?,
            departure_time: parse_departure_time(time)?,
            trip_type: trip.parse()?,
        })
    }
}
