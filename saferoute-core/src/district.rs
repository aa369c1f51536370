//! Crime district reference records.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Coordinate;

/// Per-district crime statistics loaded at startup.
///
/// Static reference data, read-only at request time. Each district influences
/// points within `radius_meters` of its centroid, with the influence decaying
/// to zero at the boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDistrict", into = "RawDistrict")]
pub struct CrimeDistrictRecord {
    name: String,
    centroid: Coordinate,
    radius_meters: f64,
    incident_count: u64,
    risk_score: f64,
}

/// Errors returned by [`CrimeDistrictRecord::new`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DistrictError {
    /// The district name was empty.
    #[error("district name must not be empty")]
    EmptyName,
    /// The influence radius was zero, negative, or non-finite.
    #[error("district {name} has invalid influence radius {radius_meters}")]
    InvalidRadius {
        /// District being validated.
        name: String,
        /// Offending radius value.
        radius_meters: f64,
    },
    /// The risk score was outside `[0, 100]`.
    #[error("district {name} has risk score {risk_score} outside [0, 100]")]
    InvalidRiskScore {
        /// District being validated.
        name: String,
        /// Offending score value.
        risk_score: f64,
    },
}

impl CrimeDistrictRecord {
    /// Validate and construct a district record.
    ///
    /// # Errors
    /// Returns [`DistrictError`] when the name is empty, the radius is not a
    /// positive finite number, or the risk score falls outside `[0, 100]`.
    pub fn new(
        name: impl Into<String>,
        centroid: Coordinate,
        radius_meters: f64,
        incident_count: u64,
        risk_score: f64,
    ) -> Result<Self, DistrictError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DistrictError::EmptyName);
        }
        if !radius_meters.is_finite() || radius_meters <= 0.0 {
            return Err(DistrictError::InvalidRadius {
                name,
                radius_meters,
            });
        }
        if !risk_score.is_finite() || !(0.0..=100.0).contains(&risk_score) {
            return Err(DistrictError::InvalidRiskScore { name, risk_score });
        }
        Ok(Self {
            name,
            centroid,
            radius_meters,
            incident_count,
            risk_score,
        })
    }

    /// District name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Centroid of the district's influence area.
    #[must_use]
    pub fn centroid(&self) -> Coordinate {
        self.centroid
    }

    /// Influence radius in metres.
    #[must_use]
    pub fn radius_meters(&self) -> f64 {
        self.radius_meters
    }

    /// Recorded incident count backing the risk score.
    #[must_use]
    pub fn incident_count(&self) -> u64 {
        self.incident_count
    }

    /// Derived risk score in `[0, 100]`; higher is riskier.
    #[must_use]
    pub fn risk_score(&self) -> f64 {
        self.risk_score
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawDistrict {
    name: String,
    centroid: Coordinate,
    radius_meters: f64,
    #[serde(default)]
    incident_count: u64,
    risk_score: f64,
}

impl TryFrom<RawDistrict> for CrimeDistrictRecord {
    type Error = DistrictError;

    fn try_from(raw: RawDistrict) -> Result<Self, Self::Error> {
        Self::new(
            raw.name,
            raw.centroid,
            raw.radius_meters,
            raw.incident_count,
            raw.risk_score,
        )
    }
}

impl From<CrimeDistrictRecord> for RawDistrict {
    fn from(record: CrimeDistrictRecord) -> Self {
        Self {
            name: record.name,
            centroid: record.centroid,
            radius_meters: record.radius_meters,
            incident_count: record.incident_count,
            risk_score: record.risk_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn centroid() -> Coordinate {
        Coordinate::new(13.08, 80.27).expect("valid coordinate")
    }

    #[rstest]
    fn accepts_valid_records() {
        let record = CrimeDistrictRecord::new("T. Nagar", centroid(), 1500.0, 42, 63.0);
        assert!(record.is_ok());
    }

    #[rstest]
    #[case(0.0)]
    #[case(-10.0)]
    #[case(f64::NAN)]
    fn rejects_invalid_radius(#[case] radius: f64) {
        let result = CrimeDistrictRecord::new("T. Nagar", centroid(), radius, 42, 63.0);
        assert!(matches!(result, Err(DistrictError::InvalidRadius { .. })));
    }

    #[rstest]
    #[case(-1.0)]
    #[case(100.5)]
    fn rejects_out_of_range_risk(#[case] risk: f64) {
        let result = CrimeDistrictRecord::new("T. Nagar", centroid(), 1500.0, 42, risk);
        assert!(matches!(result, Err(DistrictError::InvalidRiskScore { .. })));
    }

    #[rstest]
    fn deserialisation_goes_through_validation() {
        let json = r#"{
            "name": "Egmore",
            "centroid": {"latitude": 13.07, "longitude": 80.26},
            "radius_meters": 1200.0,
            "risk_score": 40.0
        }"#;
        let record: CrimeDistrictRecord = serde_json::from_str(json).expect("valid record");
        assert_eq!(record.name(), "Egmore");
        assert_eq!(record.incident_count(), 0);

        let bad = r#"{
            "name": "Egmore",
            "centroid": {"latitude": 13.07, "longitude": 80.26},
            "radius_meters": 0.0,
            "risk_score": 40.0
        }"#;
        assert!(serde_json::from_str::<CrimeDistrictRecord>(bad).is_err());
    }
}
