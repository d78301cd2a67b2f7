#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Address record, geocode outcome, and load progress types.
//!
//! These are the values that flow through the locator pipeline:
//! [`AddressRecord`] rows come out of the CSV parser, get grouped into
//! [`UniqueAddress`] entries, each of which is resolved to a
//! [`GeocodeOutcome`], and finally fanned back out into one
//! [`CoordinatedRecord`] per source row.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Well-known column names in the source CSV.
pub mod columns {
    /// Row identifier.
    pub const ID: &str = "ID";
    /// Street address, line 1.
    pub const ADDRESS: &str = "Address";
    /// Street address, line 2 (suite, unit, building).
    pub const ADDRESS_2: &str = "Address 2";
    /// City name.
    pub const CITY: &str = "City";
    /// Two-letter state abbreviation.
    pub const STATE: &str = "State";
    /// Free-form region label.
    pub const REGION: &str = "Region";
}

/// One parsed source row.
///
/// Every column is kept verbatim (after trimming) so that descriptive
/// fields pass through the pipeline untouched. Missing columns read as
/// the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressRecord {
    fields: BTreeMap<String, String>,
}

impl AddressRecord {
    /// Wraps a column → value map.
    #[must_use]
    pub const fn new(fields: BTreeMap<String, String>) -> Self {
        Self { fields }
    }

    /// Builds a record from `(column, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Returns the value of `column`, or `""` when the column is absent.
    #[must_use]
    pub fn get(&self, column: &str) -> &str {
        self.fields.get(column).map_or("", String::as_str)
    }

    /// All columns of this row.
    #[must_use]
    pub const fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    #[must_use]
    pub fn id(&self) -> &str {
        self.get(columns::ID)
    }

    #[must_use]
    pub fn address(&self) -> &str {
        self.get(columns::ADDRESS)
    }

    #[must_use]
    pub fn address2(&self) -> &str {
        self.get(columns::ADDRESS_2)
    }

    #[must_use]
    pub fn city(&self) -> &str {
        self.get(columns::CITY)
    }

    #[must_use]
    pub fn state(&self) -> &str {
        self.get(columns::STATE)
    }

    #[must_use]
    pub fn region(&self) -> &str {
        self.get(columns::REGION)
    }

    /// Whether this row has both a city and a state.
    ///
    /// Rows failing this check are dropped by the parser.
    #[must_use]
    pub fn is_admissible(&self) -> bool {
        !self.city().trim().is_empty() && !self.state().trim().is_empty()
    }
}

/// A WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Deduplication key: trimmed, case-sensitive `(address, city, state)`.
///
/// `Address 2` and `Region` are intentionally excluded, so different
/// suites in the same building share one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AddressKey {
    pub address: String,
    pub city: String,
    pub state: String,
}

impl AddressKey {
    #[must_use]
    pub fn from_record(record: &AddressRecord) -> Self {
        Self {
            address: record.address().trim().to_string(),
            city: record.city().trim().to_string(),
            state: record.state().trim().to_string(),
        }
    }
}

impl fmt::Display for AddressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.address, self.city, self.state)
    }
}

/// One distinct address and every source row that shares it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueAddress {
    /// The key all member records share.
    pub key: AddressKey,
    /// Street line 1, plus `, <line 2>` when the first member has one.
    pub full_address: String,
    pub city: String,
    pub state: String,
    pub region: String,
    /// Member rows in input order. Never empty.
    pub records: Vec<AddressRecord>,
}

/// Result of resolving one [`UniqueAddress`].
///
/// Either the coordinates came from the geocoding provider
/// (`resolved == true`) or they are a jittered regional fallback
/// (`resolved == false`). There is no partially populated state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeocodeOutcome {
    coordinates: Coordinates,
    resolved: bool,
}

impl GeocodeOutcome {
    /// An outcome backed by a provider match.
    #[must_use]
    pub const fn resolved(coordinates: Coordinates) -> Self {
        Self {
            coordinates,
            resolved: true,
        }
    }

    /// An outcome backed by the regional fallback table.
    #[must_use]
    pub const fn fallback(coordinates: Coordinates) -> Self {
        Self {
            coordinates,
            resolved: false,
        }
    }

    #[must_use]
    pub const fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    /// `true` when the provider resolved the address.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.resolved
    }
}

/// A source row annotated with its resolved location.
///
/// Serializes as a flat object: the original columns plus `lat`, `lng`
/// and `geocoded`. Source columns with those names are replaced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinatedRecord {
    #[serde(flatten)]
    pub record: AddressRecord,
    pub lat: f64,
    pub lng: f64,
    pub geocoded: bool,
}

impl CoordinatedRecord {
    /// Keys written alongside the source columns.
    pub const OUTPUT_KEYS: [&'static str; 3] = ["lat", "lng", "geocoded"];

    #[must_use]
    pub fn new(mut record: AddressRecord, outcome: &GeocodeOutcome) -> Self {
        for key in Self::OUTPUT_KEYS {
            record.fields.remove(key);
        }
        Self {
            record,
            lat: outcome.coordinates.latitude,
            lng: outcome.coordinates.longitude,
            geocoded: outcome.resolved,
        }
    }
}

/// Geocoding progress, updated once per completed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// Unique addresses attempted so far.
    pub processed: u64,
    /// Unique addresses in the run.
    pub total: u64,
}

impl Progress {
    #[must_use]
    pub const fn new(processed: u64, total: u64) -> Self {
        Self { processed, total }
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.processed >= self.total
    }

    /// Fraction complete in `0.0..=1.0`. An empty run counts as complete.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.processed as f64 / self.total as f64
        }
    }
}

/// Final output of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadResult {
    /// One entry per admitted source row (fewer if the run was cancelled).
    pub records: Vec<CoordinatedRecord>,
    /// Progress at the last completed batch.
    pub progress: Progress,
    /// Unique addresses resolved by the provider.
    pub geocoded: u64,
    /// Unique addresses placed with the regional fallback.
    pub fallback: u64,
    /// Whether the run stopped early on cancellation.
    pub cancelled: bool,
}

/// Observable state of a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "phase", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadState {
    /// Nothing has happened yet.
    #[default]
    NotStarted,
    /// Geocoding is underway.
    InProgress(Progress),
    /// The run finished (possibly cancelled; see [`LoadResult::cancelled`]).
    Complete(LoadResult),
    /// The input could not be loaded or parsed.
    Failed {
        /// User-facing description of the failure.
        message: String,
    },
}
