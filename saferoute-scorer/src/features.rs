//! Feature vectors fed to the trained safety model.

/// Number of features the model consumes.
pub(crate) const FEATURE_COUNT: usize = 4;

/// Raw (unscaled) safety features for one location.
///
/// The same vector backs request-time inference and retraining, so the two
/// paths cannot drift apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FeatureVector {
    /// District crime risk in `[0, 100]`.
    pub crime_risk: f64,
    /// Police proximity decay in `[0, 1]`; 1 next to a station.
    pub police_proximity: f64,
    /// Lighting level in `[0, 1]`; 1 in daylight.
    pub lighting: f64,
    /// Nearby feedback sentiment in `[-1, 1]`.
    pub community: f64,
}

impl FeatureVector {
    pub(crate) fn to_vec(self) -> Vec<f64> {
        vec![
            self.crime_risk,
            self.police_proximity,
            self.lighting,
            self.community,
        ]
    }
}
