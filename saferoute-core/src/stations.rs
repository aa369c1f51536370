//! Nearest police/safety-station lookups backed by an R*-tree.

use rstar::RTree;
use rstar::primitives::GeomWithData;
use serde::{Deserialize, Serialize};

use crate::Coordinate;

/// How many degree-space neighbours to re-rank by haversine distance.
///
/// The tree indexes raw lon/lat, where nearest-by-degrees and
/// nearest-by-metres can disagree slightly away from the equator; probing a
/// handful of neighbours and re-measuring keeps the answer exact.
const NEAREST_PROBE: usize = 4;

/// A known police or safety station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Display name.
    pub name: String,
    /// Station position.
    pub coordinate: Coordinate,
}

/// Static read-only index of stations supporting nearest lookups.
#[derive(Debug)]
pub struct StationIndex {
    tree: RTree<GeomWithData<[f64; 2], usize>>,
    stations: Vec<Station>,
}

impl StationIndex {
    /// Build an index over the given stations.
    #[must_use]
    pub fn build(stations: Vec<Station>) -> Self {
        let entries = stations
            .iter()
            .enumerate()
            .map(|(index, station)| {
                GeomWithData::new(
                    [
                        station.coordinate.longitude(),
                        station.coordinate.latitude(),
                    ],
                    index,
                )
            })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
            stations,
        }
    }

    /// Nearest station to `coordinate` and its distance in metres.
    ///
    /// Returns `None` when the index is empty.
    #[must_use]
    pub fn nearest(&self, coordinate: Coordinate) -> Option<(&Station, f64)> {
        let query = [coordinate.longitude(), coordinate.latitude()];
        self.tree
            .nearest_neighbor_iter(&query)
            .take(NEAREST_PROBE)
            .filter_map(|entry| {
                let station = self.stations.get(entry.data)?;
                let metres = coordinate.distance_meters(&station.coordinate);
                Some((station, metres))
            })
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
    }

    /// Number of indexed stations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    /// Whether the index holds no stations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).expect("valid coordinate")
    }

    #[fixture]
    fn chennai_stations() -> StationIndex {
        StationIndex::build(vec![
            Station {
                name: "Egmore".to_owned(),
                coordinate: coord(13.0732, 80.2609),
            },
            Station {
                name: "Guindy".to_owned(),
                coordinate: coord(13.0069, 80.2206),
            },
            Station {
                name: "Adyar".to_owned(),
                coordinate: coord(13.0012, 80.2565),
            },
        ])
    }

    #[rstest]
    fn empty_index_returns_none() {
        let index = StationIndex::build(Vec::new());
        assert!(index.nearest(coord(13.0, 80.2)).is_none());
        assert!(index.is_empty());
    }

    #[rstest]
    fn finds_closest_station(chennai_stations: StationIndex) {
        let (station, metres) = chennai_stations
            .nearest(coord(13.0710, 80.2600))
            .expect("non-empty index");
        assert_eq!(station.name, "Egmore");
        assert!(metres < 500.0, "expected a short distance, got {metres}");
    }

    #[rstest]
    fn distance_is_measured_in_metres(chennai_stations: StationIndex) {
        // Query from Guindy railway station, about 200 m from the Guindy entry.
        let (station, metres) = chennai_stations
            .nearest(coord(13.0055, 80.2210))
            .expect("non-empty index");
        assert_eq!(station.name, "Guindy");
        assert!(metres > 10.0 && metres < 1_000.0, "got {metres}");
    }
}
