//! Persisted safety model artefacts.
//!
//! The scorer loads a model/scaler pair once at startup and swaps in a new
//! pair atomically after a successful retrain. Each artefact is a `bincode`
//! payload behind a 4-byte magic and a version number so a foreign or stale
//! file is rejected at load time instead of producing garbage scores.

use std::io;
use std::sync::{Arc, PoisonError, RwLock};

use bincode::Options;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

const MODEL_MAGIC: [u8; 4] = *b"SRML";
const SCALER_MAGIC: [u8; 4] = *b"SRSC";
const ARTIFACT_VERSION: u16 = 1;

const TRAIN_EPOCHS: usize = 500;
const TRAIN_LEARNING_RATE: f64 = 0.01;

/// Bincode options used for all artefact payloads.
fn bincode_options() -> impl bincode::Options {
    bincode::DefaultOptions::new()
}

/// Locations of the two persisted artefacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelPaths {
    /// Serialized [`LinearModel`] file.
    pub model: Utf8PathBuf,
    /// Serialized [`FeatureScaler`] file.
    pub scaler: Utf8PathBuf,
}

/// Errors raised while loading, persisting, or training model artefacts.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Reading an artefact from disk failed.
    #[error("failed to read model artefact at {path}")]
    Read {
        /// Artefact path.
        path: Utf8PathBuf,
        /// Source I/O error.
        #[source]
        source: io::Error,
    },
    /// Decoding an artefact payload failed.
    #[error("failed to decode model artefact at {path}")]
    Decode {
        /// Artefact path.
        path: Utf8PathBuf,
        /// Decoder error from `bincode`.
        #[source]
        source: bincode::Error,
    },
    /// The file did not carry the expected magic bytes.
    #[error("artefact at {path} has invalid magic: expected {expected:?}, found {found:?}")]
    InvalidMagic {
        /// Artefact path.
        path: Utf8PathBuf,
        /// Expected byte sequence.
        expected: [u8; 4],
        /// Sequence read from the file.
        found: [u8; 4],
    },
    /// The artefact was written by an unsupported format version.
    #[error("artefact at {path} has unsupported version {found}; supported version is {supported}")]
    UnsupportedVersion {
        /// Artefact path.
        path: Utf8PathBuf,
        /// Version present in the file.
        found: u16,
        /// Version this binary reads.
        supported: u16,
    },
    /// Encoding an artefact payload failed.
    #[error("failed to encode model artefact for {path}")]
    Encode {
        /// Artefact path.
        path: Utf8PathBuf,
        /// Encoder error from `bincode`.
        #[source]
        source: bincode::Error,
    },
    /// Writing an artefact to disk failed.
    #[error("failed to write model artefact at {path}")]
    Write {
        /// Artefact path.
        path: Utf8PathBuf,
        /// Source I/O error.
        #[source]
        source: io::Error,
    },
}

/// Standardizes features to zero mean and unit variance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl FeatureScaler {
    /// Fit a scaler over row-major feature vectors.
    ///
    /// Constant features get a unit deviation so transformation never
    /// divides by zero.
    #[must_use]
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let width = rows.first().map_or(0, Vec::len);
        let count = rows.len().max(1) as f64;
        let mut means = vec![0.0; width];
        for row in rows {
            for (mean, value) in means.iter_mut().zip(row) {
                *mean += value / count;
            }
        }
        let mut stds = vec![0.0; width];
        for row in rows {
            for ((std, value), mean) in stds.iter_mut().zip(row).zip(&means) {
                *std += (value - mean).powi(2) / count;
            }
        }
        for std in &mut stds {
            *std = std.sqrt();
            if *std < 1e-9 {
                *std = 1.0;
            }
        }
        Self { means, stds }
    }

    /// Standardize one feature vector.
    #[must_use]
    pub fn transform(&self, features: &[f64]) -> Vec<f64> {
        features
            .iter()
            .zip(self.means.iter().zip(&self.stds))
            .map(|(value, (mean, std))| (value - mean) / std)
            .collect()
    }
}

/// Linear regression over standardized safety features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    weights: Vec<f64>,
    bias: f64,
}

impl LinearModel {
    /// Number of features the model was trained over.
    #[must_use]
    pub fn width(&self) -> usize {
        self.weights.len()
    }

    /// Predicted safety score for a standardized feature vector.
    #[must_use]
    pub fn predict(&self, scaled: &[f64]) -> f64 {
        self.bias
            + self
                .weights
                .iter()
                .zip(scaled)
                .map(|(weight, value)| weight * value)
                .sum::<f64>()
    }

    /// Fit by batch gradient descent on mean squared error.
    ///
    /// Deterministic: zero-initialized weights, fixed epoch count and
    /// learning rate.
    #[must_use]
    pub fn fit(rows: &[Vec<f64>], labels: &[f64]) -> Self {
        let width = rows.first().map_or(0, Vec::len);
        let count = rows.len().max(1) as f64;
        let mut weights = vec![0.0; width];
        let mut bias = 0.0;
        for _ in 0..TRAIN_EPOCHS {
            let mut weight_grads = vec![0.0; width];
            let mut bias_grad = 0.0;
            for (row, label) in rows.iter().zip(labels) {
                let error = bias
                    + weights
                        .iter()
                        .zip(row)
                        .map(|(weight, value)| weight * value)
                        .sum::<f64>()
                    - label;
                bias_grad += error / count;
                for (grad, value) in weight_grads.iter_mut().zip(row) {
                    *grad += error * value / count;
                }
            }
            bias -= TRAIN_LEARNING_RATE * bias_grad;
            for (weight, grad) in weights.iter_mut().zip(&weight_grads) {
                *weight -= TRAIN_LEARNING_RATE * grad;
            }
        }
        Self { weights, bias }
    }
}

/// One labelled training row.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSample {
    /// Raw (unscaled) feature vector.
    pub features: Vec<f64>,
    /// Target safety score in `[0, 100]`.
    pub label: f64,
}

/// Fit a scaler and model over training samples.
#[must_use]
pub fn train_model(samples: &[TrainingSample]) -> (LinearModel, FeatureScaler) {
    let rows: Vec<Vec<f64>> = samples.iter().map(|s| s.features.clone()).collect();
    let labels: Vec<f64> = samples.iter().map(|s| s.label).collect();
    let scaler = FeatureScaler::fit(&rows);
    let scaled: Vec<Vec<f64>> = rows.iter().map(|row| scaler.transform(row)).collect();
    let model = LinearModel::fit(&scaled, &labels);
    (model, scaler)
}

/// An immutable, atomically-swappable model/scaler pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSnapshot {
    /// Trained regression model.
    pub model: LinearModel,
    /// Scaler fitted alongside the model.
    pub scaler: FeatureScaler,
    /// Number of samples the pair was trained on.
    pub sample_count: u64,
}

/// Shared slot holding the in-use snapshot.
///
/// Readers clone the `Arc` and score against an immutable snapshot;
/// retraining builds a replacement out-of-band and swaps the pointer in one
/// step, so in-flight requests see either the old model or the new one,
/// never a partial update.
#[derive(Debug, Default)]
pub(crate) struct ModelHandle {
    slot: RwLock<Option<Arc<ModelSnapshot>>>,
}

impl ModelHandle {
    pub(crate) fn with_snapshot(snapshot: Option<ModelSnapshot>) -> Self {
        Self {
            slot: RwLock::new(snapshot.map(Arc::new)),
        }
    }

    pub(crate) fn current(&self) -> Option<Arc<ModelSnapshot>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn swap(&self, snapshot: Arc<ModelSnapshot>) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ArtifactFile<T> {
    magic: [u8; 4],
    version: u16,
    payload: T,
}

#[derive(Debug, Serialize, Deserialize)]
struct ModelPayload {
    model: LinearModel,
    sample_count: u64,
}

fn load_artifact<T: DeserializeOwned>(
    path: &Utf8PathBuf,
    expected_magic: [u8; 4],
) -> Result<T, ModelError> {
    let bytes = std::fs::read(path.as_std_path()).map_err(|source| ModelError::Read {
        path: path.clone(),
        source,
    })?;
    let file: ArtifactFile<T> =
        bincode_options()
            .deserialize(&bytes)
            .map_err(|source| ModelError::Decode {
                path: path.clone(),
                source,
            })?;
    if file.magic != expected_magic {
        return Err(ModelError::InvalidMagic {
            path: path.clone(),
            expected: expected_magic,
            found: file.magic,
        });
    }
    if file.version != ARTIFACT_VERSION {
        return Err(ModelError::UnsupportedVersion {
            path: path.clone(),
            found: file.version,
            supported: ARTIFACT_VERSION,
        });
    }
    Ok(file.payload)
}

fn persist_artifact<T: Serialize>(
    path: &Utf8PathBuf,
    magic: [u8; 4],
    payload: T,
) -> Result<(), ModelError> {
    let file = ArtifactFile {
        magic,
        version: ARTIFACT_VERSION,
        payload,
    };
    let bytes = bincode_options()
        .serialize(&file)
        .map_err(|source| ModelError::Encode {
            path: path.clone(),
            source,
        })?;
    saferoute_fs::write_atomic(path, &bytes).map_err(|source| ModelError::Write {
        path: path.clone(),
        source,
    })
}

/// Load the model/scaler pair from disk.
///
/// # Errors
/// Returns [`ModelError`] when either file is missing, unreadable, or fails
/// the magic/version checks. Callers treat this as non-fatal and degrade to
/// heuristic-only scoring.
pub fn load_snapshot(paths: &ModelPaths) -> Result<ModelSnapshot, ModelError> {
    let payload: ModelPayload = load_artifact(&paths.model, MODEL_MAGIC)?;
    let scaler: FeatureScaler = load_artifact(&paths.scaler, SCALER_MAGIC)?;
    Ok(ModelSnapshot {
        model: payload.model,
        scaler,
        sample_count: payload.sample_count,
    })
}

/// Persist a snapshot, each artefact written to a temporary file and then
/// renamed into place.
///
/// # Errors
/// Returns [`ModelError`] when encoding or writing fails. A failure leaves
/// any previously persisted artefacts untouched.
pub fn persist_snapshot(paths: &ModelPaths, snapshot: &ModelSnapshot) -> Result<(), ModelError> {
    persist_artifact(&paths.scaler, SCALER_MAGIC, snapshot.scaler.clone())?;
    persist_artifact(
        &paths.model,
        MODEL_MAGIC,
        ModelPayload {
            model: snapshot.model.clone(),
            sample_count: snapshot.sample_count,
        },
    )
}
