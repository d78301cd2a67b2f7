#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Address loading pipeline.
//!
//! Reads a CSV of program locations, groups rows by street address,
//! geocodes each unique address in paced batches, and returns every row
//! annotated with coordinates:
//!
//! 1. [`parser`] — CSV text → [`AddressRecord`]s (rows without a city and
//!    state are dropped).
//! 2. [`dedup`] — records → [`UniqueAddress`] groups.
//! 3. [`scheduler`] — groups → [`CoordinatedRecord`]s, via the
//!    configured [`Geocoder`] with a regional fallback for misses.
//!
//! Only input problems (unreadable source, empty or invalid CSV) fail a
//! run. Individual geocoding failures are absorbed and show up as
//! `geocoded = false` on the affected records.
//!
//! [`AddressRecord`]: locator_ingest_models::AddressRecord
//! [`UniqueAddress`]: locator_ingest_models::UniqueAddress
//! [`CoordinatedRecord`]: locator_ingest_models::CoordinatedRecord

pub mod dedup;
pub mod parser;
pub mod progress;
pub mod scheduler;

#[cfg(test)]
mod test_support;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use locator_geocoder::Geocoder;
use locator_geocoder::fallback::Jitter;
use locator_geocoder::service_registry::GeocodingService;
use locator_ingest_models::{LoadResult, LoadState};
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::parser::ParseError;
use crate::progress::{ProgressCallback, WatchProgress};
use crate::scheduler::ScheduleConfig;

/// Errors that abort a pipeline run. No partial output is produced.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input file could not be read.
    #[error("Could not read {}: {source}", path.display())]
    Read {
        /// The path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The input URL could not be fetched.
    #[error("Could not load {url}: {source}")]
    Fetch {
        /// The URL that failed.
        url: String,
        /// Underlying HTTP error.
        source: reqwest::Error,
    },

    /// The input URL answered with a non-success status.
    #[error("Could not load {url}: {status}")]
    Status {
        /// The URL that failed.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The CSV was empty or had no usable rows.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Where the address CSV comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// A file on disk.
    Path(PathBuf),
    /// An `http://` or `https://` URL.
    Url(String),
    /// CSV text already in memory.
    Text(String),
}

impl InputSource {
    /// Interprets a command-line location as a URL or a file path.
    #[must_use]
    pub fn from_location(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            Self::Url(location.to_string())
        } else {
            Self::Path(PathBuf::from(location))
        }
    }

    /// Reads the full CSV text.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if the file is missing/unreadable or the
    /// URL cannot be fetched.
    pub async fn read(&self, client: &reqwest::Client) -> Result<String, PipelineError> {
        let text = match self {
            Self::Path(path) => {
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| PipelineError::Read {
                        path: path.clone(),
                        source,
                    })?
            }
            Self::Url(url) => {
                let fetch_err = |source| PipelineError::Fetch {
                    url: url.clone(),
                    source,
                };
                let resp = client.get(url).send().await.map_err(fetch_err)?;
                if !resp.status().is_success() {
                    return Err(PipelineError::Status {
                        url: url.clone(),
                        status: resp.status().as_u16(),
                    });
                }
                resp.text().await.map_err(fetch_err)?
            }
            Self::Text(text) => text.clone(),
        };

        log::info!("CSV loaded from {self}, size: {} characters", text.len());

        Ok(text)
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
            Self::Text(_) => f.write_str("<inline>"),
        }
    }
}

/// Parse → deduplicate → geocode, with observable [`LoadState`].
///
/// Each call to [`Pipeline::run`] resets the state to
/// [`LoadState::NotStarted`], moves through [`LoadState::InProgress`] once
/// per batch, and ends in [`LoadState::Complete`] or
/// [`LoadState::Failed`].
pub struct Pipeline<G> {
    geocoder: G,
    schedule: ScheduleConfig,
    jitter_span: f64,
    seed: Option<u64>,
    client: reqwest::Client,
    state: watch::Sender<LoadState>,
}

impl<G: Geocoder> Pipeline<G> {
    /// Creates a pipeline with the default batch budget and jitter.
    #[must_use]
    pub fn new(geocoder: G) -> Self {
        let (state, _) = watch::channel(LoadState::NotStarted);
        Self {
            geocoder,
            schedule: ScheduleConfig::default(),
            jitter_span: locator_geocoder::service_registry::FallbackConfig::default().jitter_span,
            seed: None,
            client: reqwest::Client::new(),
            state,
        }
    }

    /// Creates a pipeline using the batch budget and jitter of `service`.
    #[must_use]
    pub fn for_service(geocoder: G, service: &GeocodingService) -> Self {
        Self::new(geocoder)
            .with_schedule(service.batch.into())
            .with_jitter_span(service.fallback.jitter_span)
    }

    #[must_use]
    pub const fn with_schedule(mut self, schedule: ScheduleConfig) -> Self {
        self.schedule = schedule;
        self
    }

    #[must_use]
    pub const fn with_jitter_span(mut self, span: f64) -> Self {
        self.jitter_span = span;
        self
    }

    /// Seeds the fallback jitter so runs are reproducible.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// HTTP client used to fetch [`InputSource::Url`] inputs.
    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// The active batch budget.
    #[must_use]
    pub const fn schedule(&self) -> &ScheduleConfig {
        &self.schedule
    }

    /// Subscribes to [`LoadState`] changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<LoadState> {
        self.state.subscribe()
    }

    /// Snapshot of the current [`LoadState`].
    #[must_use]
    pub fn state(&self) -> LoadState {
        self.state.borrow().clone()
    }

    /// Runs the whole pipeline against `source`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if the input cannot be read or contains
    /// no admissible rows. Geocoding failures never produce an error.
    pub async fn run(
        &self,
        source: &InputSource,
        progress: Arc<dyn ProgressCallback>,
        cancel: &CancellationToken,
    ) -> Result<LoadResult, PipelineError> {
        self.state.send_replace(LoadState::NotStarted);
        log::info!("Starting data load from {source}");

        match self.run_inner(source, progress.clone(), cancel).await {
            Ok(result) => {
                log::info!(
                    "Loaded {} records ({} addresses geocoded, {} fallback)",
                    result.records.len(),
                    result.geocoded,
                    result.fallback
                );
                self.state.send_replace(LoadState::Complete(result.clone()));
                Ok(result)
            }
            Err(e) => {
                log::error!("Error loading locations: {e}");
                progress.finish_and_clear();
                self.state.send_replace(LoadState::Failed {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn run_inner(
        &self,
        source: &InputSource,
        progress: Arc<dyn ProgressCallback>,
        cancel: &CancellationToken,
    ) -> Result<LoadResult, PipelineError> {
        let text = source.read(&self.client).await?;
        let records = parser::parse_records(&text)?;
        let unique = dedup::deduplicate(records);

        let mut jitter = self.seed.map_or_else(
            || Jitter::new(self.jitter_span),
            |seed| Jitter::with_seed(self.jitter_span, seed),
        );
        let progress = WatchProgress::new(progress, self.state.clone());

        Ok(scheduler::geocode_all(
            &self.geocoder,
            &unique,
            &self.schedule,
            &mut jitter,
            &progress,
            cancel,
        )
        .await)
    }
}
