//! Safety scoring for the SafeRoute engine.
//!
//! The crate provides three pieces:
//! - [`CrimeRiskCache`]: per-district crime statistics aggregated into point
//!   risk scores, memoized per 0.01-degree grid cell so repeated lookups in
//!   the same area are cheap.
//! - A persisted linear model and feature scaler (loaded once at startup,
//!   promoted atomically on retrain) that refine the heuristic score.
//! - [`SafetyScorer`]: the request-time scorer combining crime risk, police
//!   proximity, time-of-day lighting, and nearby rider feedback into an
//!   explainable `[0, 100]` score with a named factor breakdown, plus route
//!   scoring over subsampled path points and feedback-driven retraining.

#![forbid(unsafe_code)]

mod features;
mod model;
mod risk;
mod scorer;

pub use model::{
    FeatureScaler, LinearModel, ModelError, ModelPaths, ModelSnapshot, TrainingSample,
    load_snapshot, persist_snapshot, train_model,
};
pub use risk::{CacheStats, CrimeRiskCache, GridKey, NEUTRAL_POINT_RISK};
pub use scorer::{RetrainError, RetrainReport, SafetyScorer, SafetyScorerConfig};
