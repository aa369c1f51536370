//! Candidate paths returned by routing providers.

use serde::{Deserialize, Serialize};

use crate::Coordinate;

/// A single proposed path for one leg, produced by one provider.
///
/// Candidates are owned by the maps orchestrator until consumed by scoring.
/// The `id` is assigned by the provider adapter (`"<provider>-<index>"`) and
/// is the handle external re-rankers refer to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteCandidate {
    /// Identifier unique within one leg's candidate set.
    pub id: String,
    /// Name of the provider that produced this candidate.
    pub provider: String,
    /// Ordered path geometry.
    pub path: Vec<Coordinate>,
    /// Total length in metres.
    pub distance_meters: f64,
    /// Estimated travel time in seconds.
    pub duration_seconds: f64,
    /// Short textual summary (usually the main road names).
    pub summary: String,
    /// Step-by-step instructions when the provider supplies them.
    #[serde(default)]
    pub instructions: Vec<String>,
}

impl RouteCandidate {
    /// Candidate identifier for the `index`-th candidate of `provider`.
    #[must_use]
    pub fn id_for(provider: &str, index: usize) -> String {
        format!("{provider}-{index}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_embed_provider_and_position() {
        assert_eq!(RouteCandidate::id_for("osrm", 0), "osrm-0");
        assert_eq!(RouteCandidate::id_for("mapbox", 2), "mapbox-2");
    }
}
