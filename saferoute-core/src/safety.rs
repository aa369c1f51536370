//! Safety scores, factor breakdowns, and risk buckets.

use serde::{Deserialize, Serialize};

/// One named contribution to a safety score.
///
/// A list of factors accompanies every score so callers can audit which
/// signal dominated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyFactor {
    /// Stable factor name, e.g. `police_proximity`.
    pub name: String,
    /// Signed contribution to the final score.
    pub contribution: f64,
    /// Human-readable explanation of the contribution.
    pub explanation: String,
}

impl SafetyFactor {
    /// Construct a factor.
    #[must_use]
    pub fn new(name: impl Into<String>, contribution: f64, explanation: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contribution,
            explanation: explanation.into(),
        }
    }
}

/// Discrete risk bucket derived from an averaged route score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Average score of 70 or above.
    Low,
    /// Average score in `[40, 70)`.
    Medium,
    /// Average score below 40.
    High,
}

impl RiskLevel {
    /// Bucket a `[0, 100]` safety score.
    ///
    /// # Examples
    /// ```
    /// use saferoute_core::RiskLevel;
    ///
    /// assert_eq!(RiskLevel::from_score(82.0), RiskLevel::Low);
    /// assert_eq!(RiskLevel::from_score(55.0), RiskLevel::Medium);
    /// assert_eq!(RiskLevel::from_score(12.0), RiskLevel::High);
    /// ```
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 70.0 {
            Self::Low
        } else if score >= 40.0 {
            Self::Medium
        } else {
            Self::High
        }
    }

    /// Lowercase label used in serialized output.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Result of scoring a single location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationAssessment {
    /// Safety score in `[0, 100]`; higher is safer.
    pub score: f64,
    /// Ordered factor breakdown.
    pub factors: Vec<SafetyFactor>,
}

/// Result of scoring a path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSafety {
    /// Mean safety score over the sampled points, in `[0, 100]`.
    pub route_safety_score: f64,
    /// Bucketed risk level for the mean score.
    pub risk_level: RiskLevel,
    /// Factor contributions averaged over the sampled points.
    pub factors: Vec<SafetyFactor>,
}
