//! District-based crime risk with grid-cell memoization.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use log::{debug, info};
use saferoute_core::{Cache, Coordinate, CrimeDistrictRecord, MemoryCache};

/// Risk assigned to points covered by no district.
///
/// Absence of data is not absence of risk: uncovered points get this neutral
/// mid-band default rather than zero.
pub const NEUTRAL_POINT_RISK: f64 = 30.0;

/// A coordinate rounded to the 0.01-degree cache grid (cells of roughly
/// 1.1 km at the equator).
///
/// Two coordinates within the same cell produce the same key and therefore
/// the identical cached risk value.
///
/// # Examples
/// ```
/// use saferoute_core::Coordinate;
/// use saferoute_scorer::GridKey;
///
/// let a = Coordinate::new(13.0821, 80.2703)?;
/// let b = Coordinate::new(13.0839, 80.2698)?;
/// assert_eq!(GridKey::for_coordinate(a), GridKey::for_coordinate(b));
/// # Ok::<(), saferoute_core::CoordinateError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridKey {
    lat_centi: i32,
    lng_centi: i32,
}

impl GridKey {
    /// Grid cell containing `coordinate`.
    #[must_use]
    pub fn for_coordinate(coordinate: Coordinate) -> Self {
        // Bounded by the coordinate ranges, so the i32 casts cannot overflow.
        let lat_centi = (coordinate.latitude() * 100.0).round() as i32;
        let lng_centi = (coordinate.longitude() * 100.0).round() as i32;
        Self {
            lat_centi,
            lng_centi,
        }
    }
}

/// Cache hit/miss counters for observability and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the grid cache.
    pub hits: u64,
    /// Lookups that paid the full district aggregation.
    pub misses: u64,
}

/// Precomputed per-district risk plus a grid-keyed cache of point scores.
///
/// District data is read-mostly shared state: lookups take a snapshot
/// reference, and [`CrimeRiskCache::reload`] swaps in a fresh district set
/// and rebuilds the cell cache without a restart. Cell inserts are
/// idempotent (first write wins), so concurrent requests racing on the same
/// cell are harmless.
#[derive(Debug)]
pub struct CrimeRiskCache {
    districts: RwLock<Arc<Vec<CrimeDistrictRecord>>>,
    cells: MemoryCache<GridKey, f64>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CrimeRiskCache {
    /// Build a cache over the given reference districts.
    #[must_use]
    pub fn new(districts: Vec<CrimeDistrictRecord>) -> Self {
        Self {
            districts: RwLock::new(Arc::new(districts)),
            cells: MemoryCache::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Risk score for a point, in `[0, 100]`.
    ///
    /// The first lookup for a grid cell aggregates over all covering
    /// districts; subsequent lookups in the same cell are cache hits.
    pub fn score_point(&self, coordinate: Coordinate) -> f64 {
        let key = GridKey::for_coordinate(coordinate);
        if let Some(cached) = self.cells.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return cached;
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let districts = self.snapshot();
        let score = aggregate_risk(&districts, coordinate);
        debug!(
            "computed risk {score:.1} for cell ({}, {})",
            coordinate.latitude(),
            coordinate.longitude()
        );
        self.cells.put(key, score);
        score
    }

    /// Replace the district reference data and rebuild the cell cache.
    pub fn reload(&self, districts: Vec<CrimeDistrictRecord>) {
        let count = districts.len();
        *self
            .districts
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(districts);
        self.cells.clear();
        info!("reloaded crime districts ({count} records); cell cache rebuilt");
    }

    /// Number of grid cells currently cached.
    #[must_use]
    pub fn cached_cells(&self) -> usize {
        self.cells.len()
    }

    /// Hit/miss counters since construction.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn snapshot(&self) -> Arc<Vec<CrimeDistrictRecord>> {
        self.districts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Influence weight at `distance` from a district centroid.
///
/// Linear falloff: 1 at the centroid, 0 at the influence boundary.
fn linear_decay(distance_meters: f64, radius_meters: f64) -> f64 {
    (1.0 - distance_meters / radius_meters).max(0.0)
}

fn aggregate_risk(districts: &[CrimeDistrictRecord], coordinate: Coordinate) -> f64 {
    let mut covered = false;
    let mut total = 0.0;
    for district in districts {
        let distance = coordinate.distance_meters(&district.centroid());
        if distance <= district.radius_meters() {
            covered = true;
            total += district.risk_score() * linear_decay(distance, district.radius_meters());
        }
    }
    if covered {
        total.clamp(0.0, 100.0)
    } else {
        NEUTRAL_POINT_RISK
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use saferoute_core::DistrictError;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).expect("valid coordinate")
    }

    fn district(
        name: &str,
        lat: f64,
        lng: f64,
        radius: f64,
        risk: f64,
    ) -> Result<CrimeDistrictRecord, DistrictError> {
        CrimeDistrictRecord::new(name, coord(lat, lng), radius, 10, risk)
    }

    #[fixture]
    fn cache() -> CrimeRiskCache {
        CrimeRiskCache::new(vec![
            district("hotspot", 13.0800, 80.2700, 2_000.0, 80.0).expect("valid"),
            district("quiet", 13.2000, 80.3000, 1_000.0, 10.0).expect("valid"),
        ])
    }

    #[rstest]
    fn centroid_scores_full_risk(cache: CrimeRiskCache) {
        let score = cache.score_point(coord(13.0800, 80.2700));
        assert!((score - 80.0).abs() < 1e-9, "got {score}");
    }

    #[rstest]
    fn risk_decays_with_distance(cache: CrimeRiskCache) {
        let near = cache.score_point(coord(13.0800, 80.2700));
        // ~1.1 km east, still inside the 2 km radius but in another cell.
        let far = cache.score_point(coord(13.0800, 80.2800));
        assert!(far < near, "expected decay: near {near}, far {far}");
        assert!(far > 0.0);
    }

    #[rstest]
    fn uncovered_points_get_neutral_default(cache: CrimeRiskCache) {
        let score = cache.score_point(coord(12.5000, 79.5000));
        assert!((score - NEUTRAL_POINT_RISK).abs() < 1e-9);
    }

    #[rstest]
    fn same_cell_returns_identical_cached_value(cache: CrimeRiskCache) {
        let first = cache.score_point(coord(13.0801, 80.2702));
        let second = cache.score_point(coord(13.0799, 80.2698));

        assert_eq!(first, second);
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(cache.cached_cells(), 1);
    }

    #[rstest]
    fn overlapping_districts_clamp_to_one_hundred() {
        let cache = CrimeRiskCache::new(vec![
            district("a", 13.00, 80.00, 5_000.0, 90.0).expect("valid"),
            district("b", 13.00, 80.00, 5_000.0, 90.0).expect("valid"),
        ]);
        let score = cache.score_point(coord(13.00, 80.00));
        assert!((score - 100.0).abs() < 1e-9, "got {score}");
    }

    #[rstest]
    fn reload_rebuilds_cell_cache(cache: CrimeRiskCache) {
        let before = cache.score_point(coord(13.0800, 80.2700));
        assert!(before > NEUTRAL_POINT_RISK);

        cache.reload(Vec::new());

        assert_eq!(cache.cached_cells(), 0);
        let after = cache.score_point(coord(13.0800, 80.2700));
        assert!((after - NEUTRAL_POINT_RISK).abs() < 1e-9);
    }

    #[rstest]
    #[case(0.0, 1.0)]
    #[case(500.0, 0.5)]
    #[case(1_000.0, 0.0)]
    #[case(1_500.0, 0.0)]
    fn decay_is_linear_and_bounded(#[case] distance: f64, #[case] expected: f64) {
        assert!((linear_decay(distance, 1_000.0) - expected).abs() < 1e-9);
    }
}
