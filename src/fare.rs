//! Fare estimation
//!
//! Prices a single [`Route`] for a [`TripConfig`] against an explicit
//! [`TariffTable`]. Estimation is a pure function of its three inputs: no
//! I/O, no shared state, and identical inputs always give an identical
//! [`FareBreakdown`].

use tracing::trace;

use crate::models::{FareBreakdown, Route, TripConfig, TripType};
use crate::tariff::{TariffTable, check_non_negative};
use crate::{DrivoError, Result};

pub struct FareEstimator;

impl FareEstimator {
    /// Estimate the fare for `route` under `config` and `tariff`.
    ///
    /// `fare = km × base rate × vehicle multiplier × night factor`, doubled
    /// for round trips, rounded half-up to whole currency units. The
    /// driver payout is the floor of the driver's share of that total.
    /// Duration is reported but never doubled.
    pub fn estimate(route: &Route, config: &TripConfig, tariff: &TariffTable) -> Result<FareBreakdown> {
        let distance_km = route.distance_meters() / 1000.0;
        let duration_minutes = route.duration_seconds() / 60.0;

        let base_rate_per_km = tariff.base_rate(config.fuel_type)?;
        let vehicle_multiplier = tariff.vehicle_multiplier(config.vehicle_type)?;
        let night_surcharge_factor = tariff.night_factor(config.departure_time);

        check_non_negative("distance", distance_km)?;
        check_non_negative("duration", duration_minutes)?;
        check_non_negative("base rate", base_rate_per_km)?;
        check_non_negative("vehicle multiplier", vehicle_multiplier)?;
        check_non_negative("night surcharge factor", night_surcharge_factor)?;
        if let Some(window) = &tariff.night_surcharge {
            check_non_negative("night surcharge factor", window.factor)?;
        }

        let mut raw_fare = distance_km * base_rate_per_km * vehicle_multiplier * night_surcharge_factor;
        if config.trip_type == TripType::TwoWay {
            raw_fare *= 2.0;
        }

        let total_fare = round_half_up(raw_fare);
        let driver_payout_share = driver_payout(total_fare, tariff)?;

        trace!(
            distance_km,
            raw_fare,
            total_fare,
            driver_payout_share,
            "Estimated fare"
        );

        Ok(FareBreakdown {
            distance_km,
            duration_minutes,
            base_rate_per_km,
            vehicle_multiplier,
            night_surcharge_factor,
            total_fare,
            driver_payout_share,
            tariff_version: tariff.version.clone(),
        })
    }
}

fn round_half_up(value: f64) -> u64 {
    // value is finite and non-negative here, so round() is half-up
    value.round() as u64
}

fn driver_payout(total_fare: u64, tariff: &TariffTable) -> Result<u64> {
    if !tariff.driver_share.is_finite() || !(0.0..=1.0).contains(&tariff.driver_share) {
        return Err(DrivoError::invalid_tariff(format!(
            "Driver share must be between 0 and 1, got {}",
            tariff.driver_share
        )));
    }
    // floor(total × share); the relative nudge absorbs products such as
    // 403200 × 0.7 landing one ulp below the exact integer
    let exact = total_fare as f64 * tariff.driver_share;
    let payout = (exact * (1.0 + PAYOUT_EPSILON)).floor() as u64;
    Ok(payout.min(total_fare))
}

const PAYOUT_EPSILON: f64 = 1e-12;
