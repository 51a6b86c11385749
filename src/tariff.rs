//! Pricing configuration
//!
//! A `TariffTable` is the single source of rates, multipliers, the night
//! surcharge window and the driver share. It is plain configuration data,
//! loaded with the rest of [`crate::config::DrivoConfig`] and passed to
//! [`crate::fare::FareEstimator`] explicitly.

use std::collections::BTreeMap;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::models::{FuelType, VehicleType};
use crate::{DrivoError, Result};

/// Surcharge applied to departures inside `[start, end)`; wraps past midnight when `start > end`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NightSurcharge {
    #[serde(with = "wall_clock")]
    pub start: NaiveTime,
    #[serde(with = "wall_clock")]
    pub end: NaiveTime,
    pub factor: f64,
}

impl NightSurcharge {
    #[must_use]
    pub fn new(start: NaiveTime, end: NaiveTime, factor: f64) -> Self {
        Self { start, end, factor }
    }

    /// Whether `time` falls in the window. A window with `start == end` is empty.
    #[must_use]
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.start <= self.end {
            self.start <= time && time < self.end
        } else {
            time >= self.start || time < self.end
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffTable {
    /// Identifies the pricing revision; copied into every fare
    #[serde(default = "default_version")]
    pub version: String,
    /// Base rate per kilometer by fuel type
    pub fuel_rates: BTreeMap<FuelType, f64>,
    /// Multiplicative factor by vehicle type
    pub vehicle_multipliers: BTreeMap<VehicleType, f64>,
    #[serde(default)]
    pub night_surcharge: Option<NightSurcharge>,
    /// Fraction of the total paid to the driver, in `[0, 1]`
    #[serde(default = "default_driver_share")]
    pub driver_share: f64,
}

fn default_version() -> String {
    "default".to_string()
}

fn default_driver_share() -> f64 {
    0.7
}

impl Default for TariffTable {
    fn default() -> Self {
        Self {
            version: default_version(),
            fuel_rates: BTreeMap::from([
                (FuelType::Petrol, 280.0),
                (FuelType::Diesel, 265.0),
                (FuelType::Electric, 20.0),
            ]),
            vehicle_multipliers: BTreeMap::from([
                (VehicleType::Car, 1.2),
                (VehicleType::Bike, 0.6),
                (VehicleType::Rickshaw, 0.9),
            ]),
            night_surcharge: None,
            driver_share: default_driver_share(),
        }
    }
}

impl TariffTable {
    pub fn base_rate(&self, fuel_type: FuelType) -> Result<f64> {
        self.fuel_rates
            .get(&fuel_type)
            .copied()
            .ok_or(DrivoError::UnknownFuelType { fuel_type })
    }

    pub fn vehicle_multiplier(&self, vehicle_type: VehicleType) -> Result<f64> {
        self.vehicle_multipliers
            .get(&vehicle_type)
            .copied()
            .ok_or(DrivoError::UnknownVehicleType { vehicle_type })
    }

    /// Surcharge factor for a departure time, 1.0 outside the window
    #[must_use]
    pub fn night_factor(&self, departure: NaiveTime) -> f64 {
        match &self.night_surcharge {
            Some(window) if window.contains(departure) => window.factor,
            _ => 1.0,
        }
    }

    /// Check every rate, multiplier and factor is finite and non-negative
    pub fn validate(&self) -> Result<()> {
        for (fuel, rate) in &self.fuel_rates {
            check_non_negative(&format!("fuel rate for {fuel}"), *rate)?;
        }
        for (vehicle, multiplier) in &self.vehicle_multipliers {
            check_non_negative(&format!("multiplier for {vehicle}"), *multiplier)?;
        }
        if let Some(window) = &self.night_surcharge {
            check_non_negative("night surcharge factor", window.factor)?;
        }
        if !self.driver_share.is_finite() || !(0.0..=1.0).contains(&self.driver_share) {
            return Err(DrivoError::invalid_tariff(format!(
                "Driver share must be between 0 and 1, got {}",
                self.driver_share
            )));
        }
        Ok(())
    }
}

pub(crate) fn check_non_negative(what: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(DrivoError::invalid_tariff(format!(
            "{what} must be non-negative, got {value}"
        )))
    }
}

/// Serde helper: wall-clock times as "HH:MM" or "HH:MM:SS".
mod wall_clock {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(time: &NaiveTime, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(de)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(|_| de::Error::custom(format!("invalid time '{raw}', expected HH:MM")))
    }
}
