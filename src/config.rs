//! Configuration management for Drivo
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::DrivoError;
use crate::geocoding::DefaultCoordinates;
use crate::models::GeoPoint;
use crate::tariff::TariffTable;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DrivoConfig {
    /// Routing provider configuration
    #[serde(default)]
    pub routing: RoutingConfig,
    /// Geocoding provider configuration
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    /// Pricing table
    #[serde(default)]
    pub tariff: TariffTable,
    /// Known place names used only when geocoding is unavailable
    #[serde(default)]
    pub fallback_coordinates: BTreeMap<String, FallbackPoint>,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Routing provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Base URL of the OSRM service
    #[serde(default = "default_routing_base_url")]
    pub base_url: String,
    /// OSRM profile
    #[serde(default = "default_routing_profile")]
    pub profile: String,
    /// Time budget for one resolution, in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Transient-error retries; 0 leaves retrying to the caller
    #[serde(default)]
    pub max_retries: u32,
    /// Request alternative routes by default
    #[serde(default)]
    pub alternatives: bool,
}

/// Geocoding provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Base URL of the Nominatim service
    #[serde(default = "default_geocoding_base_url")]
    pub base_url: String,
    /// Nominatim's usage policy requires an identifying user agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_accept_language")]
    pub accept_language: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    #[serde(default)]
    pub max_retries: u32,
    /// Flag routes whose endpoints are in different countries
    #[serde(default)]
    pub region_check: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FallbackPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_routing_base_url() -> String {
    "https://router.project-osrm.org".to_string()
}

fn default_routing_profile() -> String {
    "driving".to_string()
}

fn default_geocoding_base_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_user_agent() -> String {
    "DrivoApp/1.0".to_string()
}

fn default_accept_language() -> String {
    "en".to_string()
}

fn default_timeout() -> u32 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            base_url: default_routing_base_url(),
            profile: default_routing_profile(),
            timeout_seconds: default_timeout(),
            max_retries: 0,
            alternatives: false,
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_base_url(),
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
            timeout_seconds: default_timeout(),
            max_retries: 0,
            region_check: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl DrivoConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. DRIVO_ROUTING__TIMEOUT_SECONDS=5
        builder = builder.add_source(
            Environment::with_prefix("DRIVO")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: DrivoConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("drivo").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.routing.base_url.is_empty() {
            self.routing.base_url = default_routing_base_url();
        }
        if self.routing.profile.is_empty() {
            self.routing.profile = default_routing_profile();
        }
        if self.routing.timeout_seconds == 0 {
            self.routing.timeout_seconds = default_timeout();
        }
        if self.geocoding.base_url.is_empty() {
            self.geocoding.base_url = default_geocoding_base_url();
        }
        if self.geocoding.user_agent.is_empty() {
            self.geocoding.user_agent = default_user_agent();
        }
        if self.geocoding.timeout_seconds == 0 {
            self.geocoding.timeout_seconds = default_timeout();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        self.tariff
            .validate()
            .with_context(|| format!("Tariff '{}' is invalid", self.tariff.version))?;
        self.default_coordinates()?;
        Ok(())
    }

    /// Build the fallback table, validating every point
    pub fn default_coordinates(&self) -> Result<DefaultCoordinates> {
        self.fallback_coordinates
            .iter()
            .map(|(name, point)| {
                GeoPoint::new(point.latitude, point.longitude)
                    .map(|p| (name.clone(), p))
                    .with_context(|| format!("Invalid fallback coordinates for '{name}'"))
            })
            .collect()
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        for (name, timeout) in [
            ("Routing", self.routing.timeout_seconds),
            ("Geocoding", self.geocoding.timeout_seconds),
        ] {
            if timeout == 0 {
                return Err(
                    DrivoError::config(format!("{name} timeout must be at least 1 second")).into(),
                );
            }
            if timeout > 300 {
                return Err(DrivoError::config(format!(
                    "{name} timeout cannot exceed 300 seconds"
                ))
                .into());
            }
        }

        for (name, retries) in [
            ("Routing", self.routing.max_retries),
            ("Geocoding", self.geocoding.max_retries),
        ] {
            if retries > 10 {
                return Err(
                    DrivoError::config(format!("{name} max retries cannot exceed 10")).into(),
                );
            }
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(DrivoError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(DrivoError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("Routing", &self.routing.base_url),
            ("Geocoding", &self.geocoding.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(DrivoError::config(format!(
                    "{name} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}
