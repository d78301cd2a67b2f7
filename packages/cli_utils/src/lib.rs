#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal output for the `locator` binary.
//!
//! [`GeocodeBar`] renders pipeline progress: a spinner while the CSV is
//! loaded, then a bar over unique addresses whose message carries the
//! running matched/fallback counts reported by the scheduler.
//! [`init_logger`] routes `log` output through the same [`MultiProgress`]
//! so log lines never tear the bar.

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use locator_ingest::progress::ProgressCallback;

pub use indicatif::MultiProgress;

const LOADING_TEMPLATE: &str = "{spinner:.cyan} {prefix:.bold} {msg}";
const GEOCODING_TEMPLATE: &str =
    "{spinner:.cyan} {prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} {msg} ({eta})";

/// Progress for one geocoding run.
pub struct GeocodeBar {
    bar: ProgressBar,
}

impl GeocodeBar {
    /// Adds a loading spinner labelled `prefix` to `multi`.
    #[must_use]
    pub fn new(multi: &MultiProgress, prefix: &str) -> Self {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.set_style(style(LOADING_TEMPLATE));
        bar.set_prefix(prefix.to_string());
        bar.set_message("loading addresses");
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    /// Shares the bar as a pipeline progress sink.
    #[must_use]
    pub fn into_callback(self) -> Arc<dyn ProgressCallback> {
        Arc::new(self)
    }

    /// Current position in unique addresses.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Length once the total is known.
    #[must_use]
    pub fn length(&self) -> Option<u64> {
        self.bar.length()
    }
}

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

impl ProgressCallback for GeocodeBar {
    fn set_total(&self, total: u64) {
        self.bar.set_style(style(GEOCODING_TEMPLATE));
        self.bar.set_length(total);
        self.bar.reset();
    }

    fn set_position(&self, pos: u64) {
        self.bar.set_position(pos);
    }

    fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    fn set_message(&self, msg: String) {
        self.bar.set_message(msg);
    }

    fn finish(&self, msg: String) {
        self.bar.disable_steady_tick();
        self.bar.finish_with_message(msg);
    }

    fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

/// Installs `pretty_env_logger` behind `indicatif-log-bridge`.
///
/// `default_filter` applies when `RUST_LOG` is unset; directives in
/// `RUST_LOG` override it per module.
#[must_use]
pub fn init_logger(default_filter: &str) -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .parse_filters(default_filter)
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    if indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .is_ok()
    {
        log::set_max_level(level);
    }

    multi
}
