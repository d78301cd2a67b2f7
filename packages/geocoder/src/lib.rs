#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geocoding for locator address data.
//!
//! Converts street addresses to latitude/longitude coordinates:
//!
//! 1. **Mapbox Geocoding v5** ([`mapbox`]) — one HTTP request per unique
//!    address, configured via the TOML file in `services/`.
//! 2. **Regional fallback** ([`fallback`]) — when the provider has no
//!    match or fails, the address is placed at its state's centroid
//!    with a small random offset.
//!
//! The [`Geocoder`] trait is the seam the batch scheduler drives; it
//! never fails, it only reports whether it found a match.

pub mod address;
pub mod fallback;
pub mod mapbox;
pub mod service_registry;

use std::future::Future;

use locator_ingest_models::Coordinates;
use thiserror::Error;

/// A geocoding result with coordinates and metadata.
#[derive(Debug, Clone)]
pub struct GeocodedAddress {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// The matched/canonical place name returned by the provider.
    pub matched_address: Option<String>,
    /// Provider relevance score in `0.0..=1.0`, if reported.
    pub relevance: Option<f64>,
}

impl GeocodedAddress {
    #[must_use]
    pub const fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// An address to be geocoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodeRequest {
    /// Street line 1, with line 2 appended when present.
    pub full_address: String,
    /// City name.
    pub city: String,
    /// Two-letter state abbreviation.
    pub state: String,
}

/// Errors from geocoding operations.
///
/// These never escape a [`Geocoder`]; they are logged and the address is
/// treated as unresolved.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed (connect, timeout, body decode).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status.
    #[error("HTTP Error {status}")]
    Status {
        /// The HTTP status code.
        status: u16,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Service configuration is missing or invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem.
        message: String,
    },

    /// Reading a configuration file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolves a single address to coordinates.
///
/// Implementations perform exactly one lookup and never retry. `None`
/// means the address could not be resolved and the caller should fall
/// back to an approximate location.
pub trait Geocoder: Send + Sync {
    /// Looks up `request`, returning its coordinates on a match.
    fn geocode(&self, request: &GeocodeRequest) -> impl Future<Output = Option<Coordinates>> + Send;
}
