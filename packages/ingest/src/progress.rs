//! Progress reporting for the geocoding pipeline.
//!
//! [`ProgressCallback`] decouples progress reporting from any rendering
//! backend (an `indicatif` bar, log-only reporting, or silence). The
//! batch scheduler sets the total once deduplication is done and advances
//! the position once per completed batch, never mid-batch.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use locator_ingest_models::{LoadState, Progress};
use tokio::sync::watch;

/// Trait for reporting progress from long-running operations.
///
/// Implementations must be `Send + Sync` so they can be shared behind an
/// `Arc` across tasks.
pub trait ProgressCallback: Send + Sync {
    /// Set the total expected units of work (enables percentage/ETA).
    fn set_total(&self, total: u64);

    /// Set the current position (absolute, not delta).
    fn set_position(&self, pos: u64);

    /// Advance progress by `delta` units.
    fn inc(&self, delta: u64);

    /// Update the message displayed alongside the progress indicator.
    fn set_message(&self, msg: String);

    /// Mark progress as complete with a final message.
    fn finish(&self, msg: String);

    /// Mark progress as complete and remove the progress indicator.
    fn finish_and_clear(&self);
}

/// A no-op [`ProgressCallback`].
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn set_position(&self, _pos: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
    fn finish_and_clear(&self) {}
}

/// Returns a shared [`NullProgress`] instance for convenient use.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}

/// Forwards progress to an inner callback and mirrors it as
/// [`LoadState::InProgress`] on a watch channel.
pub struct WatchProgress {
    inner: Arc<dyn ProgressCallback>,
    state: watch::Sender<LoadState>,
    position: AtomicU64,
    total: AtomicU64,
}

impl WatchProgress {
    #[must_use]
    pub const fn new(inner: Arc<dyn ProgressCallback>, state: watch::Sender<LoadState>) -> Self {
        Self {
            inner,
            state,
            position: AtomicU64::new(0),
            total: AtomicU64::new(0),
        }
    }

    fn publish(&self, processed: u64) {
        let total = self.total.load(Ordering::Relaxed);
        self.state
            .send_replace(LoadState::InProgress(Progress::new(processed, total)));
    }
}

impl ProgressCallback for WatchProgress {
    fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
        self.position.store(0, Ordering::Relaxed);
        self.publish(0);
        self.inner.set_total(total);
    }

    fn set_position(&self, pos: u64) {
        self.position.store(pos, Ordering::Relaxed);
        self.publish(pos);
        self.inner.set_position(pos);
    }

    fn inc(&self, delta: u64) {
        let pos = self.position.fetch_add(delta, Ordering::Relaxed) + delta;
        self.publish(pos);
        self.inner.inc(delta);
    }

    fn set_message(&self, msg: String) {
        self.inner.set_message(msg);
    }

    fn finish(&self, msg: String) {
        self.inner.finish(msg);
    }

    fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }
}
