//! In-memory geocoder and progress recorder for pipeline tests.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use locator_geocoder::{GeocodeRequest, Geocoder};
use locator_ingest_models::Coordinates;

use crate::progress::ProgressCallback;

/// Resolves only the street addresses it was given; everything else is a
/// miss. Tracks how many lookups were in flight at once.
#[derive(Default)]
pub struct ScriptedGeocoder {
    known: BTreeMap<String, Coordinates>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, full_address: &str, latitude: f64, longitude: f64) -> Self {
        self.known.insert(
            full_address.to_string(),
            Coordinates::new(latitude, longitude),
        );
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Geocoder for ScriptedGeocoder {
    async fn geocode(&self, request: &GeocodeRequest) -> Option<Coordinates> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::task::yield_now().await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.known.get(&request.full_address).copied()
    }
}

/// Records every progress update.
#[derive(Default)]
pub struct RecordingProgress {
    total: AtomicU64,
    positions: Mutex<Vec<u64>>,
    messages: Mutex<Vec<String>>,
    finished: Mutex<Option<String>>,
    cleared: AtomicBool,
}

impl RecordingProgress {
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }

    pub fn positions(&self) -> Vec<u64> {
        self.positions.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn finished(&self) -> Option<String> {
        self.finished.lock().unwrap().clone()
    }

    pub fn cleared(&self) -> bool {
        self.cleared.load(Ordering::SeqCst)
    }
}

impl ProgressCallback for RecordingProgress {
    fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::SeqCst);
    }

    fn set_position(&self, pos: u64) {
        self.positions.lock().unwrap().push(pos);
    }

    fn inc(&self, delta: u64) {
        let mut positions = self.positions.lock().unwrap();
        let last = positions.last().copied().unwrap_or_default();
        positions.push(last + delta);
    }

    fn set_message(&self, msg: String) {
        self.messages.lock().unwrap().push(msg);
    }

    fn finish(&self, msg: String) {
        *self.finished.lock().unwrap() = Some(msg);
    }

    fn finish_and_clear(&self) {
        self.cleared.store(true, Ordering::SeqCst);
    }
}
