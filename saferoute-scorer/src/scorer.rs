//! Request-time safety scoring with an explainable factor breakdown.
//!
//! The heuristic subtotal starts from a base score and applies crime risk,
//! police proximity, time-of-day lighting, and nearby rider feedback. When a
//! trained model is loaded its prediction is blended with the heuristic via
//! a configurable weight rather than overwriting it, so the score keeps an
//! explainable heuristic floor even when the model is stale.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Timelike, Utc};
use log::{info, warn};
use saferoute_core::{
    Coordinate, FeedbackRecord, LocationAssessment, RiskLevel, RouteSafety, SafetyFactor,
    StationIndex,
};

use crate::features::{FEATURE_COUNT, FeatureVector};
use crate::model::{
    ModelError, ModelHandle, ModelPaths, ModelSnapshot, TrainingSample, load_snapshot,
    persist_snapshot, train_model,
};
use crate::risk::CrimeRiskCache;

/// Heuristic starting point before any factor is applied.
const BASE_SCORE: f64 = 65.0;
/// Fraction of the crime risk subtracted from the base.
const CRIME_WEIGHT: f64 = 0.45;
/// Maximum bonus for standing next to a police station.
const POLICE_BONUS: f64 = 15.0;
/// Lighting adjustments per band.
const DAYLIGHT_BONUS: f64 = 8.0;
const DUSK_BONUS: f64 = 2.0;
const NIGHT_PENALTY: f64 = -10.0;
/// Span of the community feedback adjustment (at sentiment ±1).
const FEEDBACK_SPAN: f64 = 10.0;
/// Lighting feature used when no timestamp is supplied.
const NEUTRAL_LIGHTING: f64 = 0.7;
/// Route score for an empty path (nothing to sample).
const NEUTRAL_ROUTE_SCORE: f64 = 50.0;
/// Fewest feedback rows a retrain will accept.
const MIN_TRAINING_SAMPLES: usize = 5;

/// Share of the final score taken from the model prediction by default.
const DEFAULT_MODEL_WEIGHT: f64 = 0.3;
const DEFAULT_POLICE_CUTOFF_METERS: f64 = 2_000.0;
const DEFAULT_FEEDBACK_RADIUS_METERS: f64 = 500.0;
const DEFAULT_MAX_ROUTE_SAMPLES: usize = 8;

/// Configuration for [`SafetyScorer`].
#[derive(Debug, Clone)]
pub struct SafetyScorerConfig {
    /// Locations of the persisted model/scaler pair.
    pub model_paths: ModelPaths,
    /// Blend weight for the model prediction, clamped to `[0, 1]`.
    pub model_weight: f64,
    /// Stations further than this contribute nothing.
    pub police_cutoff_meters: f64,
    /// Radius within which feedback rows influence a point.
    pub feedback_radius_meters: f64,
    /// Upper bound on evenly spaced samples per route.
    pub max_route_samples: usize,
}

impl SafetyScorerConfig {
    /// Create a configuration with default weights and radii.
    #[must_use]
    pub fn new(model_paths: ModelPaths) -> Self {
        Self {
            model_paths,
            model_weight: DEFAULT_MODEL_WEIGHT,
            police_cutoff_meters: DEFAULT_POLICE_CUTOFF_METERS,
            feedback_radius_meters: DEFAULT_FEEDBACK_RADIUS_METERS,
            max_route_samples: DEFAULT_MAX_ROUTE_SAMPLES,
        }
    }

    /// Set the model blend weight (clamped to `[0, 1]`).
    #[must_use]
    pub fn with_model_weight(mut self, weight: f64) -> Self {
        self.model_weight = weight.clamp(0.0, 1.0);
        self
    }

    /// Set the police proximity cutoff radius.
    #[must_use]
    pub fn with_police_cutoff_meters(mut self, metres: f64) -> Self {
        self.police_cutoff_meters = metres;
        self
    }

    /// Set the feedback influence radius.
    #[must_use]
    pub fn with_feedback_radius_meters(mut self, metres: f64) -> Self {
        self.feedback_radius_meters = metres;
        self
    }

    /// Set the route subsampling bound (at least 1).
    #[must_use]
    pub fn with_max_route_samples(mut self, samples: usize) -> Self {
        self.max_route_samples = samples.max(1);
        self
    }
}

/// Outcome of a successful retrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrainReport {
    /// Number of samples the promoted model was trained on.
    pub sample_count: u64,
}

/// Errors returned by [`SafetyScorer::retrain_with_feedback`].
#[derive(Debug, thiserror::Error)]
pub enum RetrainError {
    /// Too few usable feedback rows; the active model is untouched.
    #[error("insufficient feedback: {available} usable records, need at least {required}")]
    InsufficientFeedback {
        /// Records supplied.
        available: usize,
        /// Minimum accepted.
        required: usize,
    },
    /// Persisting the new artefacts failed; the active model is untouched.
    #[error("failed to persist retrained model artefacts")]
    Persist {
        /// Underlying artefact error.
        #[source]
        source: ModelError,
    },
}

enum LightBand {
    Day,
    Dusk,
    Night,
}

impl LightBand {
    fn for_hour(hour: u32) -> Self {
        match hour {
            6..=17 => Self::Day,
            5 | 18..=20 => Self::Dusk,
            _ => Self::Night,
        }
    }

    fn feature(&self) -> f64 {
        match self {
            Self::Day => 1.0,
            Self::Dusk => 0.5,
            Self::Night => 0.0,
        }
    }

    fn contribution(&self) -> f64 {
        match self {
            Self::Day => DAYLIGHT_BONUS,
            Self::Dusk => DUSK_BONUS,
            Self::Night => NIGHT_PENALTY,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Day => "daylight hours",
            Self::Dusk => "dusk or dawn",
            Self::Night => "night time",
        }
    }
}

/// Safety scoring engine shared by every concurrent request.
pub struct SafetyScorer {
    risk: Arc<CrimeRiskCache>,
    stations: Arc<StationIndex>,
    feedback: RwLock<Vec<FeedbackRecord>>,
    model: ModelHandle,
    config: SafetyScorerConfig,
}

impl std::fmt::Debug for SafetyScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SafetyScorer")
            .field("stations", &self.stations.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SafetyScorer {
    /// Build a scorer, loading the persisted model when present.
    ///
    /// A missing or corrupt artefact pair is non-fatal: the scorer logs a
    /// warning and serves heuristic-only scores until a retrain promotes a
    /// fresh model.
    #[must_use]
    pub fn new(
        risk: Arc<CrimeRiskCache>,
        stations: Arc<StationIndex>,
        config: SafetyScorerConfig,
    ) -> Self {
        let snapshot = match load_snapshot(&config.model_paths) {
            Ok(snapshot) if snapshot.model.width() == FEATURE_COUNT => {
                info!(
                    "loaded safety model from {} ({} samples)",
                    config.model_paths.model, snapshot.sample_count
                );
                Some(snapshot)
            }
            Ok(snapshot) => {
                warn!(
                    "safety model at {} expects {} feature(s), engine computes {FEATURE_COUNT}; \
                     scoring heuristically",
                    config.model_paths.model,
                    snapshot.model.width()
                );
                None
            }
            Err(err) => {
                warn!("safety model unavailable, scoring heuristically: {err}");
                None
            }
        };
        Self {
            risk,
            stations,
            feedback: RwLock::new(Vec::new()),
            model: ModelHandle::with_snapshot(snapshot),
            config,
        }
    }

    /// Replace the feedback history consulted by the nearby-feedback term.
    pub fn load_feedback(&self, records: Vec<FeedbackRecord>) {
        *self
            .feedback
            .write()
            .unwrap_or_else(PoisonError::into_inner) = records;
    }

    /// Append one feedback record to the history.
    pub fn record_feedback(&self, record: FeedbackRecord) {
        self.feedback
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }

    /// Number of feedback records currently held.
    #[must_use]
    pub fn feedback_count(&self) -> usize {
        self.feedback
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// The model snapshot currently in use, if any.
    #[must_use]
    pub fn current_model(&self) -> Option<Arc<ModelSnapshot>> {
        self.model.current()
    }

    /// Score a single location, returning the score and its factor
    /// breakdown.
    ///
    /// The time-of-day lighting term only applies when `at` is supplied.
    #[must_use]
    pub fn score_location(
        &self,
        coordinate: Coordinate,
        at: Option<DateTime<Utc>>,
    ) -> LocationAssessment {
        let band = at.map(|ts| LightBand::for_hour(ts.hour()));
        let (features, mut factors, heuristic) = self.assess(coordinate, band.as_ref());

        let score = match self.model.current() {
            Some(snapshot) => {
                let scaled = snapshot.scaler.transform(&features.to_vec());
                let predicted = snapshot.model.predict(&scaled).clamp(0.0, 100.0);
                let weight = self.config.model_weight;
                let blended = (1.0 - weight) * heuristic + weight * predicted;
                factors.push(SafetyFactor::new(
                    "model_blend",
                    blended - heuristic,
                    format!("trained model predicted {predicted:.1}, blended at weight {weight:.2}"),
                ));
                blended
            }
            None => heuristic,
        };

        LocationAssessment {
            score: score.clamp(0.0, 100.0),
            factors,
        }
    }

    /// Score a path by sampling a bounded number of evenly spaced points.
    ///
    /// An empty path has nothing to sample and scores a documented neutral
    /// value with no factors.
    #[must_use]
    pub fn score_route(&self, path: &[Coordinate], at: Option<DateTime<Utc>>) -> RouteSafety {
        if path.is_empty() {
            return RouteSafety {
                route_safety_score: NEUTRAL_ROUTE_SCORE,
                risk_level: RiskLevel::from_score(NEUTRAL_ROUTE_SCORE),
                factors: Vec::new(),
            };
        }

        let samples = sample_indices(path.len(), self.config.max_route_samples);
        let count = samples.len();
        let mut total = 0.0;
        let mut names: Vec<String> = Vec::new();
        let mut sums: Vec<f64> = Vec::new();
        for index in samples {
            let Some(point) = path.get(index) else {
                continue;
            };
            let assessment = self.score_location(*point, at);
            total += assessment.score;
            for factor in assessment.factors {
                match names.iter().position(|name| *name == factor.name) {
                    Some(slot) => sums[slot] += factor.contribution,
                    None => {
                        names.push(factor.name);
                        sums.push(factor.contribution);
                    }
                }
            }
        }

        let mean = total / count as f64;
        let factors = names
            .into_iter()
            .zip(sums)
            .map(|(name, sum)| {
                SafetyFactor::new(
                    name,
                    sum / count as f64,
                    format!("mean over {count} sampled points"),
                )
            })
            .collect();
        RouteSafety {
            route_safety_score: mean,
            risk_level: RiskLevel::from_score(mean),
            factors,
        }
    }

    /// Fit and promote a new model/scaler pair from feedback rows.
    ///
    /// The replacement is trained and persisted entirely out-of-band and
    /// swapped in one step only after both artefacts are on disk, so a crash
    /// mid-retrain cannot corrupt the live model. With fewer than the
    /// minimum usable records this is a no-op that returns
    /// [`RetrainError::InsufficientFeedback`].
    ///
    /// # Errors
    /// Returns [`RetrainError`]; in every error case the active model
    /// reference is left untouched.
    pub fn retrain_with_feedback(
        &self,
        records: &[FeedbackRecord],
    ) -> Result<RetrainReport, RetrainError> {
        if records.len() < MIN_TRAINING_SAMPLES {
            return Err(RetrainError::InsufficientFeedback {
                available: records.len(),
                required: MIN_TRAINING_SAMPLES,
            });
        }

        let samples: Vec<TrainingSample> = records
            .iter()
            .map(|record| {
                let band = record.time_of_day.map(|hour| LightBand::for_hour(hour.into()));
                let (features, _, _) = self.assess(record.location, band.as_ref());
                TrainingSample {
                    features: features.to_vec(),
                    label: f64::from(record.rating - 1) / 4.0 * 100.0,
                }
            })
            .collect();

        let (model, scaler) = train_model(&samples);
        let snapshot = ModelSnapshot {
            model,
            scaler,
            sample_count: samples.len() as u64,
        };
        persist_snapshot(&self.config.model_paths, &snapshot)
            .map_err(|source| RetrainError::Persist { source })?;
        self.model.swap(Arc::new(snapshot));
        info!(
            "promoted retrained safety model ({} samples) at {}",
            samples.len(),
            self.config.model_paths.model
        );
        Ok(RetrainReport {
            sample_count: samples.len() as u64,
        })
    }

    /// Heuristic assessment shared by inference and training.
    fn assess(
        &self,
        coordinate: Coordinate,
        band: Option<&LightBand>,
    ) -> (FeatureVector, Vec<SafetyFactor>, f64) {
        let mut factors = Vec::with_capacity(5);
        let mut score = BASE_SCORE;

        let crime = self.risk.score_point(coordinate);
        let crime_contribution = -crime * CRIME_WEIGHT;
        score += crime_contribution;
        factors.push(SafetyFactor::new(
            "crime_risk",
            crime_contribution,
            format!("district crime risk {crime:.1} for this area"),
        ));

        let police = match self.stations.nearest(coordinate) {
            Some((station, metres)) if metres <= self.config.police_cutoff_meters => {
                let decay = 1.0 - metres / self.config.police_cutoff_meters;
                let contribution = POLICE_BONUS * decay;
                score += contribution;
                factors.push(SafetyFactor::new(
                    "police_proximity",
                    contribution,
                    format!("{} station {metres:.0} m away", station.name),
                ));
                decay
            }
            _ => {
                factors.push(SafetyFactor::new(
                    "police_proximity",
                    0.0,
                    format!(
                        "no station within {:.0} m",
                        self.config.police_cutoff_meters
                    ),
                ));
                0.0
            }
        };

        let lighting = match band {
            Some(band) => {
                let contribution = band.contribution();
                score += contribution;
                factors.push(SafetyFactor::new("lighting", contribution, band.label()));
                band.feature()
            }
            None => NEUTRAL_LIGHTING,
        };

        let community = {
            let history = self
                .feedback
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            let nearby: Vec<f64> = history
                .iter()
                .filter(|record| {
                    record.location.distance_meters(&coordinate)
                        <= self.config.feedback_radius_meters
                })
                .map(|record| f64::from(record.rating))
                .collect();
            if nearby.is_empty() {
                factors.push(SafetyFactor::new(
                    "community_feedback",
                    0.0,
                    "no rider feedback nearby",
                ));
                0.0
            } else {
                let mean = nearby.iter().sum::<f64>() / nearby.len() as f64;
                let sentiment = ((mean - 3.0) / 2.0).clamp(-1.0, 1.0);
                let contribution = sentiment * FEEDBACK_SPAN;
                score += contribution;
                factors.push(SafetyFactor::new(
                    "community_feedback",
                    contribution,
                    format!(
                        "{} reports nearby, average rating {mean:.1}",
                        nearby.len()
                    ),
                ));
                sentiment
            }
        };

        let features = FeatureVector {
            crime_risk: crime,
            police_proximity: police,
            lighting,
            community,
        };
        (features, factors, score.clamp(0.0, 100.0))
    }
}

/// Up to `max` evenly spaced indices over a path of `len` points, endpoints
/// included.
fn sample_indices(len: usize, max: usize) -> Vec<usize> {
    let count = len.min(max.max(1));
    if count == 1 {
        return vec![0];
    }
    let mut indices: Vec<usize> = (0..count)
        .map(|i| i * (len - 1) / (count - 1))
        .collect();
    indices.dedup();
    indices
}
