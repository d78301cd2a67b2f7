//! Mapbox Geocoding v5 client.
//!
//! Issues one forward-geocoding request per address:
//! `GET {base_url}/{query}.json?access_token=…&country=US&limit=1`.
//! The response is a `GeoJSON` `FeatureCollection`; the first feature's
//! `center` is a `[longitude, latitude]` pair.
//!
//! The provider is rate limited. This client performs no retries and no
//! pacing of its own; the batch scheduler bounds how many requests are
//! in flight and how quickly batches follow each other.
//!
//! See <https://docs.mapbox.com/api/search/geocoding-v5/>

use locator_ingest_models::Coordinates;

use crate::service_registry::{GeocodingService, MapboxConfig};
use crate::{GeocodeError, GeocodeRequest, GeocodedAddress, Geocoder};

/// A [`Geocoder`] backed by a Mapbox-compatible HTTP endpoint.
#[derive(Debug, Clone)]
pub struct MapboxGeocoder {
    client: reqwest::Client,
    config: MapboxConfig,
    access_token: String,
}

impl MapboxGeocoder {
    /// Creates a geocoder with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn new(
        config: MapboxConfig,
        access_token: impl Into<String>,
    ) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            client,
            config,
            access_token: access_token.into(),
        })
    }

    /// Creates a geocoder from a service definition, reading the access
    /// token from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Config`] if the token variable is unset, or
    /// [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn from_service(service: &GeocodingService) -> Result<Self, GeocodeError> {
        let token = service.access_token().ok_or_else(|| GeocodeError::Config {
            message: format!(
                "{} is not set; it is required by geocoding service '{}'",
                service.access_token_env, service.id
            ),
        })?;
        Self::new(service.provider.clone(), token)
    }
}

impl Geocoder for MapboxGeocoder {
    async fn geocode(&self, request: &GeocodeRequest) -> Option<Coordinates> {
        let query = request.search_text();

        match geocode_single(&self.client, &self.config, &self.access_token, &query).await {
            Ok(Some(geocoded)) => {
                log::debug!(
                    "Geocoded '{query}' -> ({}, {}) [{}, relevance {}]",
                    geocoded.latitude,
                    geocoded.longitude,
                    geocoded.matched_address.as_deref().unwrap_or("?"),
                    geocoded
                        .relevance
                        .map_or_else(|| "?".to_string(), |r| format!("{r:.2}"))
                );
                Some(geocoded.coordinates())
            }
            Ok(None) => {
                log::warn!("No results for: {query}");
                None
            }
            Err(GeocodeError::RateLimited) => {
                log::warn!("Rate limited by geocoding provider for: {query}");
                None
            }
            Err(e) => {
                log::warn!("Error geocoding {query}: {e}");
                None
            }
        }
    }
}

/// Geocodes a single free-text query.
///
/// Returns `Ok(None)` when the provider answers successfully but with no
/// features.
///
/// # Errors
///
/// Returns [`GeocodeError`] if the HTTP request fails, the provider
/// answers with a non-success status, or the body cannot be parsed.
pub async fn geocode_single(
    client: &reqwest::Client,
    config: &MapboxConfig,
    access_token: &str,
    query: &str,
) -> Result<Option<GeocodedAddress>, GeocodeError> {
    let url = request_url(&config.base_url, query)?;
    let limit = config.limit.to_string();

    let resp = client
        .get(url)
        .query(&[
            ("access_token", access_token),
            ("country", config.country.as_str()),
            ("limit", limit.as_str()),
        ])
        .send()
        .await?;

    if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(GeocodeError::RateLimited);
    }

    if !resp.status().is_success() {
        return Err(GeocodeError::Status {
            status: resp.status().as_u16(),
        });
    }

    let body: serde_json::Value = resp.json().await?;
    parse_response(&body)
}

/// Appends `{query}.json` to `base_url` as a single percent-encoded path
/// segment.
fn request_url(base_url: &str, query: &str) -> Result<reqwest::Url, GeocodeError> {
    let mut url = reqwest::Url::parse(base_url).map_err(|e| GeocodeError::Config {
        message: format!("invalid geocoder base URL '{base_url}': {e}"),
    })?;

    url.path_segments_mut()
        .map_err(|()| GeocodeError::Config {
            message: format!("geocoder base URL '{base_url}' cannot take a path"),
        })?
        .pop_if_empty()
        .push(&format!("{query}.json"));

    Ok(url)
}

/// Parses a Mapbox `FeatureCollection` response.
fn parse_response(body: &serde_json::Value) -> Result<Option<GeocodedAddress>, GeocodeError> {
    let features = body
        .get("features")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| GeocodeError::Parse {
            message: "response missing 'features' array".to_string(),
        })?;

    let Some(first) = features.first() else {
        return Ok(None);
    };

    let center = first
        .get("center")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| GeocodeError::Parse {
            message: "feature missing 'center'".to_string(),
        })?;

    if center.len() < 2 {
        return Err(GeocodeError::Parse {
            message: "center has fewer than 2 elements".to_string(),
        });
    }

    let lng = center[0].as_f64().ok_or_else(|| GeocodeError::Parse {
        message: "longitude is not a number".to_string(),
    })?;
    let lat = center[1].as_f64().ok_or_else(|| GeocodeError::Parse {
        message: "latitude is not a number".to_string(),
    })?;

    Ok(Some(GeocodedAddress {
        latitude: lat,
        longitude: lng,
        matched_address: first
            .get("place_name")
            .and_then(serde_json::Value::as_str)
            .map(String::from),
        relevance: first.get("relevance").and_then(serde_json::Value::as_f64),
    }))
}
