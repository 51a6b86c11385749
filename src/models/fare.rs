//! Itemized fare result

use serde::{Deserialize, Serialize};

/// Computed price for one route/config/tariff combination.
/// Recomputed for every estimate, never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FareBreakdown {
    pub distance_km: f64,
    pub duration_minutes: f64,
    pub base_rate_per_km: f64,
    pub vehicle_multiplier: f64,
    /// 1.0 outside the night window
    pub night_surcharge_factor: f64,
    /// Whole currency units, rounded half-up
    pub total_fare: u64,
    pub driver_payout_share: u64,
    /// Version of the tariff that produced this fare
    pub tariff_version: String,
}

impl FareBreakdown {
    /// Platform's share of the fare
    #[must_use]
    pub fn platform_share(&self) -> u64 {
        self.total_fare.saturating_sub(self.driver_payout_share)
    }

    #[must_use]
    pub fn format_total(&self, currency: &str) -> String {
        format!("{currency} {}", self.total_fare)
    }
}
