//! Batched, rate-limited geocoding of unique addresses.
//!
//! Unique addresses are split into fixed-size batches. Every lookup in a
//! batch runs concurrently and the scheduler waits for all of them to
//! settle before doing anything else, so at most one batch of requests
//! is ever in flight. Unresolved addresses then get a jittered state
//! fallback, progress moves forward by the batch size, and the scheduler
//! sleeps for the configured delay before the next batch.
//!
//! Cancellation is cooperative: a cancelled token stops the next batch
//! from starting (or cuts the inter-batch delay short) but never
//! abandons a batch that is already in flight.

use std::time::Duration;

use futures::future::join_all;
use locator_geocoder::fallback::{Jitter, fallback_coordinates};
use locator_geocoder::service_registry::BatchConfig;
use locator_geocoder::{GeocodeRequest, Geocoder};
use locator_ingest_models::{
    CoordinatedRecord, GeocodeOutcome, LoadResult, Progress, UniqueAddress,
};
use tokio_util::sync::CancellationToken;

use crate::dedup::total_records;
use crate::progress::ProgressCallback;

/// Batch size and pacing for a geocoding run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// Unique addresses geocoded concurrently per batch. Zero is treated
    /// as one.
    pub batch_size: usize,
    /// Pause between consecutive batches.
    pub batch_delay: Duration,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        BatchConfig::default().into()
    }
}

impl From<BatchConfig> for ScheduleConfig {
    fn from(batch: BatchConfig) -> Self {
        Self {
            batch_size: batch.size,
            batch_delay: batch.delay(),
        }
    }
}

/// Resolves every unique address and fans the outcomes back out to one
/// [`CoordinatedRecord`] per source row, in batch order.
///
/// Progress is reported once per completed batch. The returned
/// [`LoadResult`] always covers every address attempted; on cancellation
/// that is a prefix of `unique` and `cancelled` is set.
pub async fn geocode_all<G: Geocoder>(
    geocoder: &G,
    unique: &[UniqueAddress],
    config: &ScheduleConfig,
    jitter: &mut Jitter,
    progress: &dyn ProgressCallback,
    cancel: &CancellationToken,
) -> LoadResult {
    let batch_size = config.batch_size.max(1);
    let batch_count = unique.len().div_ceil(batch_size);
    let total = unique.len() as u64;

    progress.set_total(total);

    let mut records = Vec::with_capacity(total_records(unique));
    let mut processed = 0u64;
    let mut matched = 0u64;
    let mut fallbacks = 0u64;
    let mut cancelled = false;

    for (batch_idx, batch) in unique.chunks(batch_size).enumerate() {
        if cancel.is_cancelled() {
            log::info!(
                "Geocoding cancelled before batch {}/{batch_count}",
                batch_idx + 1
            );
            cancelled = true;
            break;
        }

        log::debug!(
            "Geocoding batch {}/{batch_count} ({} addresses)",
            batch_idx + 1,
            batch.len()
        );
        progress.set_message(format!(
            "Batch {}/{batch_count} ({matched} matched, {fallbacks} fallback)",
            batch_idx + 1
        ));

        let lookups = batch.iter().map(|address| async move {
            let request = GeocodeRequest::from(address);
            geocoder.geocode(&request).await
        });
        let results = join_all(lookups).await;

        for (address, result) in batch.iter().zip(results) {
            let outcome = result.map_or_else(
                || {
                    log::warn!(
                        "Using fallback for: {}, {}, {} [{}]",
                        address.full_address,
                        address.city,
                        address.state,
                        address.region
                    );
                    GeocodeOutcome::fallback(fallback_coordinates(&address.state, jitter))
                },
                GeocodeOutcome::resolved,
            );
            if outcome.is_resolved() {
                matched += 1;
            } else {
                fallbacks += 1;
            }

            records.extend(
                address
                    .records
                    .iter()
                    .cloned()
                    .map(|record| CoordinatedRecord::new(record, &outcome)),
            );
        }

        processed += batch.len() as u64;
        progress.inc(batch.len() as u64);
        log::debug!(
            "Geocoding {:.0}% complete",
            Progress::new(processed, total).fraction() * 100.0
        );

        let is_last = batch_idx + 1 == batch_count;
        if !is_last && !config.batch_delay.is_zero() {
            tokio::select! {
                () = tokio::time::sleep(config.batch_delay) => {}
                () = cancel.cancelled() => {
                    log::info!("Geocoding cancelled after batch {}/{batch_count}", batch_idx + 1);
                    cancelled = true;
                    break;
                }
            }
        }
    }

    if cancelled {
        progress.finish(format!("Geocoding cancelled at {processed}/{total}"));
    } else {
        progress.finish(format!(
            "Geocoded {total} addresses ({matched} matched, {fallbacks} fallback)"
        ));
    }

    LoadResult {
        records,
        progress: Progress::new(processed, total),
        geocoded: matched,
        fallback: fallbacks,
        cancelled,
    }
}
