//! Address string composition for geocoding queries.
//!
//! Source rows split a street address across `Address` and `Address 2`.
//! The provider is queried with a single free-text line built from the
//! street, city, state, and country.

use locator_ingest_models::UniqueAddress;

use crate::GeocodeRequest;

/// Country suffix appended to every free-text query.
const COUNTRY_SUFFIX: &str = "USA";

/// Joins the two street lines: `"100 Main St, Suite 4"`.
///
/// An empty (or whitespace-only) second line is omitted.
#[must_use]
pub fn compose_full_address(line1: &str, line2: &str) -> String {
    let line1 = line1.trim();
    let line2 = line2.trim();
    if line2.is_empty() {
        line1.to_string()
    } else {
        format!("{line1}, {line2}")
    }
}

/// Builds the one-line query sent to the provider.
#[must_use]
pub fn build_search_text(street: &str, city: &str, state: &str) -> String {
    format!("{street}, {city}, {state}, {COUNTRY_SUFFIX}")
}

impl GeocodeRequest {
    /// The free-text query for this request.
    #[must_use]
    pub fn search_text(&self) -> String {
        build_search_text(&self.full_address, &self.city, &self.state)
    }
}

impl From<&UniqueAddress> for GeocodeRequest {
    fn from(unique: &UniqueAddress) -> Self {
        Self {
            full_address: unique.full_address.clone(),
            city: unique.city.clone(),
            state: unique.state.clone(),
        }
    }
}
