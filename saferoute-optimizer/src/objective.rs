//! Caller objectives and the weights derived from them.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A named optimization objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Objective {
    /// Prefer faster candidates.
    Time,
    /// Prefer safer candidates.
    Safety,
    /// Prefer shorter candidates.
    Distance,
}

/// Error returned when parsing an unknown objective name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown objective {0:?}; expected time, safety, or distance")]
pub struct ParseObjectiveError(String);

impl FromStr for Objective {
    type Err = ParseObjectiveError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "time" => Ok(Self::Time),
            "safety" => Ok(Self::Safety),
            "distance" => Ok(Self::Distance),
            other => Err(ParseObjectiveError(other.to_owned())),
        }
    }
}

/// Relative weights over the three objectives, summing to 1.
///
/// Objectives the caller did not name get zero weight; an empty objective
/// list defaults to an equal split across time and safety.
///
/// # Examples
/// ```
/// use saferoute_optimizer::{Objective, ObjectiveWeights};
///
/// let weights = ObjectiveWeights::from_objectives(&[Objective::Time]);
/// assert_eq!(weights.time, 1.0);
/// assert_eq!(weights.safety, 0.0);
///
/// let default = ObjectiveWeights::from_objectives(&[]);
/// assert_eq!(default.time, 0.5);
/// assert_eq!(default.safety, 0.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectiveWeights {
    /// Weight on the normalized duration component.
    pub time: f64,
    /// Weight on the safety deficit component.
    pub safety: f64,
    /// Weight on the normalized distance component.
    pub distance: f64,
}

impl ObjectiveWeights {
    /// Derive weights from the caller's objective set.
    #[must_use]
    pub fn from_objectives(objectives: &[Objective]) -> Self {
        if objectives.is_empty() {
            return Self {
                time: 0.5,
                safety: 0.5,
                distance: 0.0,
            };
        }
        let time = objectives.contains(&Objective::Time);
        let safety = objectives.contains(&Objective::Safety);
        let distance = objectives.contains(&Objective::Distance);
        let named = [time, safety, distance].iter().filter(|named| **named).count();
        let share = 1.0 / named as f64;
        Self {
            time: if time { share } else { 0.0 },
            safety: if safety { share } else { 0.0 },
            distance: if distance { share } else { 0.0 },
        }
    }

    /// Scalar cost for one candidate; lower is better.
    ///
    /// Time and distance are normalized against the best candidate in the
    /// set (so the fastest candidate contributes exactly its weight), and
    /// safety enters as a deficit from a perfect score.
    #[must_use]
    pub fn cost(
        &self,
        duration_seconds: f64,
        distance_meters: f64,
        safety_score: f64,
        fastest_seconds: f64,
        shortest_meters: f64,
    ) -> f64 {
        self.time * (duration_seconds / fastest_seconds.max(1.0))
            + self.distance * (distance_meters / shortest_meters.max(1.0))
            + self.safety * (1.0 - safety_score / 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("time", Objective::Time)]
    #[case(" Safety ", Objective::Safety)]
    #[case("DISTANCE", Objective::Distance)]
    fn parses_known_names(#[case] raw: &str, #[case] expected: Objective) {
        assert_eq!(raw.parse::<Objective>().expect("parses"), expected);
    }

    #[rstest]
    fn rejects_unknown_names() {
        assert!("speed".parse::<Objective>().is_err());
    }

    #[rstest]
    fn named_objectives_share_weight_equally() {
        let weights = ObjectiveWeights::from_objectives(&[
            Objective::Time,
            Objective::Safety,
        ]);
        assert_eq!(weights.time, 0.5);
        assert_eq!(weights.safety, 0.5);
        assert_eq!(weights.distance, 0.0);
    }

    #[rstest]
    fn duplicate_objectives_do_not_skew_weights() {
        let weights =
            ObjectiveWeights::from_objectives(&[Objective::Time, Objective::Time]);
        assert_eq!(weights.time, 1.0);
    }

    #[rstest]
    fn fastest_candidate_costs_its_weight_under_time() {
        let weights = ObjectiveWeights::from_objectives(&[Objective::Time]);
        let cost = weights.cost(600.0, 5_000.0, 50.0, 600.0, 5_000.0);
        assert!((cost - 1.0).abs() < 1e-9);
    }

    #[rstest]
    fn safer_candidates_cost_less_under_safety() {
        let weights = ObjectiveWeights::from_objectives(&[Objective::Safety]);
        let safer = weights.cost(900.0, 7_000.0, 85.0, 600.0, 5_000.0);
        let riskier = weights.cost(600.0, 5_000.0, 40.0, 600.0, 5_000.0);
        assert!(safer < riskier);
    }
}
