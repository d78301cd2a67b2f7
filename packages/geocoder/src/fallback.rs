//! Approximate placement for addresses the provider could not resolve.
//!
//! [`state_centroid`] maps a state code to a fixed centroid. Callers
//! offset that centroid with a [`Jitter`] once per unresolved address so
//! that several fallbacks in the same state do not render as a single
//! overlapping point.

use locator_ingest_models::Coordinates;
use rand::{Rng as _, SeedableRng as _};
use rand_xoshiro::Xoshiro256PlusPlus;

/// Geographic center of the contiguous United States, used for state
/// codes absent from [`STATE_CENTROIDS`].
pub const CONTINENTAL_DEFAULT: Coordinates = Coordinates::new(39.8283, -98.5795);

/// Fallback centroids keyed by upper-case state code.
pub const STATE_CENTROIDS: &[(&str, Coordinates)] = &[
    ("VA", Coordinates::new(37.4316, -78.6569)),
    ("NJ", Coordinates::new(40.0583, -74.4057)),
    ("PA", Coordinates::new(40.2732, -76.8867)),
    ("NC", Coordinates::new(35.7596, -79.0193)),
    ("NY", Coordinates::new(40.7128, -74.006)),
    ("DC", Coordinates::new(38.9072, -77.0369)),
    ("MD", Coordinates::new(39.0458, -76.6413)),
    ("NV", Coordinates::new(39.1638, -119.7674)),
    ("CA", Coordinates::new(36.7783, -119.4179)),
    ("FL", Coordinates::new(27.7663, -82.6404)),
    ("TX", Coordinates::new(31.9686, -99.9018)),
    ("IL", Coordinates::new(40.6331, -89.3985)),
    ("GA", Coordinates::new(32.1656, -82.9001)),
    ("OH", Coordinates::new(40.4173, -82.9071)),
    ("MI", Coordinates::new(44.3148, -85.6024)),
    ("WA", Coordinates::new(47.7511, -120.7401)),
    ("OR", Coordinates::new(43.8041, -120.5542)),
    ("CO", Coordinates::new(39.5501, -105.7821)),
];

/// Returns the un-jittered fallback centroid for `state`.
///
/// Lookup trims and upper-cases the code; unknown codes map to
/// [`CONTINENTAL_DEFAULT`].
#[must_use]
pub fn state_centroid(state: &str) -> Coordinates {
    let code = state.trim().to_uppercase();
    STATE_CENTROIDS
        .iter()
        .find(|(s, _)| *s == code)
        .map_or(CONTINENTAL_DEFAULT, |(_, c)| *c)
}

/// Uniform random offset applied to fallback coordinates.
///
/// Each call to [`Jitter::apply`] moves latitude and longitude
/// independently by up to `span / 2` degrees in either direction.
#[derive(Debug, Clone)]
pub struct Jitter {
    rng: Xoshiro256PlusPlus,
    span: f64,
}

impl Jitter {
    /// Creates a jitter source seeded from the OS.
    #[must_use]
    pub fn new(span: f64) -> Self {
        Self {
            rng: Xoshiro256PlusPlus::from_entropy(),
            span,
        }
    }

    /// Creates a reproducible jitter source.
    #[must_use]
    pub fn with_seed(span: f64, seed: u64) -> Self {
        Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
            span,
        }
    }

    /// Total width of the offset window, in degrees.
    #[must_use]
    pub const fn span(&self) -> f64 {
        self.span
    }

    /// Largest offset [`Jitter::apply`] can produce on either axis.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.span.abs() / 2.0
    }

    /// Offsets `point` by a fresh random amount.
    pub fn apply(&mut self, point: Coordinates) -> Coordinates {
        let lat_offset = (self.rng.r#gen::<f64>() - 0.5) * self.span;
        let lng_offset = (self.rng.r#gen::<f64>() - 0.5) * self.span;
        Coordinates::new(point.latitude + lat_offset, point.longitude + lng_offset)
    }
}

/// Jittered fallback location for an address in `state`.
pub fn fallback_coordinates(state: &str, jitter: &mut Jitter) -> Coordinates {
    jitter.apply(state_centroid(state))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn within(point: Coordinates, center: Coordinates, radius: f64) -> bool {
        (point.latitude - center.latitude).abs() <= radius + 1e-9
            && (point.longitude - center.longitude).abs() <= radius + 1e-9
    }

    #[test]
    fn new_york_centroid() {
        assert_eq!(state_centroid("NY"), Coordinates::new(40.7128, -74.006));
    }

    #[test]
    fn lookup_is_trimmed_and_case_insensitive() {
        assert_eq!(state_centroid(" ny "), state_centroid("NY"));
        assert_eq!(state_centroid("va"), Coordinates::new(37.4316, -78.6569));
    }

    #[test]
    fn unknown_state_uses_continental_default() {
        assert_eq!(state_centroid("ZZ"), CONTINENTAL_DEFAULT);
        assert_eq!(state_centroid(""), CONTINENTAL_DEFAULT);
    }

    #[test]
    fn state_codes_are_unique() {
        let mut seen = std::collections::BTreeSet::new();
        for (code, _) in STATE_CENTROIDS {
            assert!(seen.insert(*code), "Duplicate state code: {code}");
        }
    }

    #[test]
    fn jitter_stays_within_radius() {
        let mut jitter = Jitter::with_seed(0.05, 7);
        let center = state_centroid("NY");
        for _ in 0..1_000 {
            let point = fallback_coordinates("NY", &mut jitter);
            assert!(within(point, center, jitter.radius()), "{point:?}");
        }
    }

    #[test]
    fn repeated_fallbacks_diverge() {
        let mut jitter = Jitter::with_seed(0.05, 7);
        let a = fallback_coordinates("NY", &mut jitter);
        let b = fallback_coordinates("NY", &mut jitter);
        assert_ne!(a, b);
    }

    #[test]
    fn seeded_jitter_is_reproducible() {
        let mut a = Jitter::with_seed(0.05, 42);
        let mut b = Jitter::with_seed(0.05, 42);
        let center = state_centroid("CA");
        assert_eq!(a.apply(center), b.apply(center));
    }

    #[test]
    fn zero_span_leaves_centroid_untouched() {
        let mut jitter = Jitter::with_seed(0.0, 1);
        assert_eq!(fallback_coordinates("TX", &mut jitter), state_centroid("TX"));
    }
}
