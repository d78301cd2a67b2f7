//! Geocoding service configuration.
//!
//! The default provider is defined in `services/mapbox.toml` and
//! embedded at compile time. A TOML file with the same shape can be
//! loaded at runtime to point at a different endpoint or retune the
//! batch budget. The access token is never stored in TOML; it is read
//! from the environment variable named by `access_token_env`.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::GeocodeError;

/// A geocoding service configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingService {
    /// Unique identifier (e.g., `"mapbox"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Environment variable holding the access token.
    #[serde(default = "default_token_env")]
    pub access_token_env: String,
    /// Provider endpoint configuration.
    pub provider: MapboxConfig,
    /// Concurrency and pacing against the provider.
    #[serde(default)]
    pub batch: BatchConfig,
    /// Fallback placement tuning.
    #[serde(default)]
    pub fallback: FallbackConfig,
}

/// Endpoint settings for a Mapbox-compatible forward geocoder.
#[derive(Debug, Clone, Deserialize)]
pub struct MapboxConfig {
    /// API base URL; the encoded query is appended as a path segment.
    pub base_url: String,
    /// ISO country code filter.
    #[serde(default = "default_country")]
    pub country: String,
    /// Maximum number of features requested.
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl MapboxConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Batch size and inter-batch delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BatchConfig {
    /// Unique addresses geocoded concurrently per batch.
    pub size: usize,
    /// Pause between consecutive batches in milliseconds.
    pub delay_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            size: 8,
            delay_ms: 800,
        }
    }
}

impl BatchConfig {
    #[must_use]
    pub const fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Fallback jitter settings.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct FallbackConfig {
    /// Width of the uniform offset window in degrees.
    pub jitter_span: f64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self { jitter_span: 0.05 }
    }
}

fn default_token_env() -> String {
    "MAPBOX_ACCESS_TOKEN".to_string()
}

fn default_country() -> String {
    "US".to_string()
}

const fn default_limit() -> u32 {
    1
}

const fn default_timeout_secs() -> u64 {
    10
}

const MAPBOX_TOML: &str = include_str!("../services/mapbox.toml");

impl GeocodingService {
    /// Parses a service definition from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Config`] if the TOML is malformed or the
    /// batch size is zero.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, GeocodeError> {
        let service: Self = toml::de::from_str(toml_str).map_err(|e| GeocodeError::Config {
            message: format!("invalid geocoding service TOML: {e}"),
        })?;
        service.validate()?;
        Ok(service)
    }

    /// Reads and parses a service definition from disk.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the file cannot be read or parsed.
    pub fn load_from_path(path: &Path) -> Result<Self, GeocodeError> {
        let text = std::fs::read_to_string(path)?;
        log::info!("Loaded geocoding service config from {}", path.display());
        Self::from_toml_str(&text)
    }

    /// Reads the access token from the configured environment variable.
    ///
    /// Returns `None` when the variable is unset or empty.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        std::env::var(&self.access_token_env)
            .ok()
            .filter(|token| !token.trim().is_empty())
    }

    fn validate(&self) -> Result<(), GeocodeError> {
        if self.batch.size == 0 {
            return Err(GeocodeError::Config {
                message: format!("service '{}' has batch.size = 0", self.id),
            });
        }
        if self.provider.base_url.trim().is_empty() {
            return Err(GeocodeError::Config {
                message: format!("service '{}' has an empty base_url", self.id),
            });
        }
        Ok(())
    }
}

/// Returns the embedded default service (Mapbox).
///
/// # Panics
///
/// Panics if the embedded TOML is malformed (this is a compile-time
/// guarantee since the config is embedded).
#[must_use]
pub fn default_service() -> GeocodingService {
    GeocodingService::from_toml_str(MAPBOX_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse embedded geocoding service: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_default_service() {
        let service = default_service();
        assert_eq!(service.id, "mapbox");
        assert!(!service.name.is_empty());
        assert!(!service.provider.base_url.is_empty());
        assert_eq!(service.provider.country, "US");
        assert_eq!(service.provider.limit, 1);
        assert_eq!(service.access_token_env, "MAPBOX_ACCESS_TOKEN");
    }

    #[test]
    fn default_batch_budget() {
        let service = default_service();
        assert_eq!(service.batch.size, 8);
        assert_eq!(service.batch.delay(), Duration::from_millis(800));
        assert!((service.fallback.jitter_span - 0.05).abs() < 1e-12);
    }

    #[test]
    fn optional_sections_use_defaults() {
        let service = GeocodingService::from_toml_str(
            r#"
            id = "local"
            name = "Local test geocoder"

            [provider]
            base_url = "http://127.0.0.1:4000/geocode"
            "#,
        )
        .unwrap();
        assert_eq!(service.batch, BatchConfig::default());
        assert_eq!(service.provider.timeout(), Duration::from_secs(10));
        assert_eq!(service.access_token_env, "MAPBOX_ACCESS_TOKEN");
    }

    #[test]
    fn rejects_zero_batch_size() {
        let err = GeocodingService::from_toml_str(
            r#"
            id = "broken"
            name = "Broken"

            [provider]
            base_url = "http://127.0.0.1:4000/geocode"

            [batch]
            size = 0
            delay_ms = 0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, GeocodeError::Config { .. }));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(GeocodingService::from_toml_str("id = ").is_err());
    }
}
