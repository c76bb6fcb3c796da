//! Cache configuration.
//!
//! ```rust
//! use fogmap::Config;
//! use std::time::Duration;
//!
//! let config = Config::default()
//!     .with_flush_interval(Duration::from_secs(10))
//!     .with_resolution_meters(3.0);
//! assert!(config.validate().is_ok());
//! ```

use crate::error::{FogmapError, Result};
use crate::point::{DEFAULT_RESOLUTION_DEGREES, GridResolution, METERS_PER_DEGREE};
use serde::de::Error;
use std::time::Duration;

/// Visited-area cache configuration
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Milliseconds between scheduled flushes of the dirty buffer
    #[serde(default = "Config::default_flush_interval_ms")]
    pub flush_interval_ms: u64,

    /// Deduplication cell size in degrees
    #[serde(default = "Config::default_resolution_degrees")]
    pub resolution_degrees: f64,

    /// Whether `destroy` writes pending points before discarding them
    #[serde(default = "Config::default_final_flush_on_destroy")]
    pub final_flush_on_destroy: bool,
}

impl Config {
    const fn default_flush_interval_ms() -> u64 {
        30_000
    }

    const fn default_resolution_degrees() -> f64 {
        DEFAULT_RESOLUTION_DEGREES
    }

    const fn default_final_flush_on_destroy() -> bool {
        true
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub fn resolution(&self) -> Result<GridResolution> {
        GridResolution::new(self.resolution_degrees)
    }

    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        assert!(!interval.is_zero(), "Flush interval must be greater than zero");
        self.flush_interval_ms = interval.as_millis().max(1) as u64;
        self
    }

    pub fn with_resolution_degrees(mut self, degrees: f64) -> Self {
        self.resolution_degrees = degrees;
        self
    }

    pub fn with_resolution_meters(mut self, meters: f64) -> Self {
        self.resolution_degrees = meters / METERS_PER_DEGREE;
        self
    }

    pub fn with_final_flush_on_destroy(mut self, enabled: bool) -> Self {
        self.final_flush_on_destroy = enabled;
        self
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.flush_interval_ms == 0 {
            return Err("Flush interval must be greater than zero".to_string());
        }

        if !self.resolution_degrees.is_finite() || self.resolution_degrees <= 0.0 {
            return Err(format!(
                "Resolution must be a positive number of degrees, got {}",
                self.resolution_degrees
            ));
        }

        if self.resolution_degrees > 1.0 {
            log::warn!(
                "Resolution of {} degrees merges points more than 100 km apart",
                self.resolution_degrees
            );
        }

        Ok(())
    }

    /// Validates and converts a failure into the crate error type.
    pub(crate) fn check(&self) -> Result<()> {
        self.validate().map_err(FogmapError::Config)
    }

    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            flush_interval_ms: Self::default_flush_interval_ms(),
            resolution_degrees: Self::default_resolution_degrees(),
            final_flush_on_destroy: Self::default_final_flush_on_destroy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.flush_interval(), Duration::from_secs(30));
        assert_eq!(config.resolution_degrees, DEFAULT_RESOLUTION_DEGREES);
        assert!(config.final_flush_on_destroy);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_resolution_is_a_few_meters() {
        let meters = Config::default().resolution().unwrap().meters();
        assert!((2.0..=3.0).contains(&meters), "cell is {} m", meters);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default()
            .with_flush_interval(Duration::from_secs(5))
            .with_resolution_degrees(0.0001)
            .with_final_flush_on_destroy(false);

        let json = config.to_json().unwrap();
        let deserialized = Config::from_json(&json).unwrap();
        assert_eq!(deserialized, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = Config::from_json(r#"{ "flush_interval_ms": 1000 }"#).unwrap();
        assert_eq!(config.flush_interval(), Duration::from_secs(1));
        assert_eq!(config.resolution_degrees, DEFAULT_RESOLUTION_DEGREES);
    }

    #[test]
    fn test_invalid_json_rejected() {
        assert!(Config::from_json(r#"{ "flush_interval_ms": 0 }"#).is_err());
        assert!(Config::from_json(r#"{ "resolution_degrees": -1.0 }"#).is_err());
        assert!(Config::from_json(r#"{ "unknown": true }"#).is_err());
    }

    #[test]
    #[should_panic(expected = "Flush interval must be greater than zero")]
    fn test_zero_interval_panics() {
        let _ = Config::default().with_flush_interval(Duration::ZERO);
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_config_toml_roundtrip() {
        let config = Config::default().with_resolution_meters(5.0);
        let text = config.to_toml().unwrap();
        assert_eq!(Config::from_toml(&text).unwrap(), config);
    }
}
