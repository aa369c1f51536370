//! Deployment configuration for the `saferoute` binary.
//!
//! The config is a single JSON document:
//!
//! ```json
//! {
//!   "providers": {
//!     "order": ["mapbox", "osrm", "openrouteservice"],
//!     "osrm": {"base_url": "http://localhost:5000"},
//!     "timeout_secs": 10
//!   },
//!   "scorer": {
//!     "model_path": "artifacts/model.bin",
//!     "scaler_path": "artifacts/scaler.bin",
//!     "model_weight": 0.3
//!   },
//!   "districts_path": "data/districts.json",
//!   "stations_path": "data/stations.json"
//! }
//! ```

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use eyre::{Result, WrapErr};
use saferoute_core::{
    CrimeDistrictRecord, FeedbackRecord, FeedbackSource, FeedbackSourceError, Station,
    StationIndex,
};
use saferoute_maps::{MapsOrchestrator, ProvidersConfig};
use saferoute_optimizer::RouteOptimizer;
use saferoute_scorer::{CrimeRiskCache, ModelPaths, SafetyScorer, SafetyScorerConfig};
use serde::Deserialize;

/// Scorer artefact locations and tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct ScorerSettings {
    /// Serialized model file.
    pub model_path: Utf8PathBuf,
    /// Serialized feature scaler file.
    pub scaler_path: Utf8PathBuf,
    /// Optional blend weight override for the model prediction.
    #[serde(default)]
    pub model_weight: Option<f64>,
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Routing provider credentials and fallback order.
    pub providers: ProvidersConfig,
    /// Safety scorer settings.
    pub scorer: ScorerSettings,
    /// JSON file of crime district records; absent means no districts.
    #[serde(default)]
    pub districts_path: Option<Utf8PathBuf>,
    /// JSON file of police/safety stations; absent means no stations.
    #[serde(default)]
    pub stations_path: Option<Utf8PathBuf>,
}

impl EngineConfig {
    /// Load and parse a configuration file.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_std_path())
            .wrap_err_with(|| format!("failed to read config at {path}"))?;
        serde_json::from_str(&raw).wrap_err_with(|| format!("failed to parse config at {path}"))
    }

    /// Assemble the maps orchestrator from the provider settings.
    pub fn build_orchestrator(&self) -> Result<Arc<MapsOrchestrator>> {
        let orchestrator = self
            .providers
            .build()
            .wrap_err("failed to assemble routing providers")?;
        Ok(Arc::new(orchestrator))
    }

    /// Assemble the safety scorer, loading reference data files.
    pub fn build_scorer(&self) -> Result<Arc<SafetyScorer>> {
        let districts: Vec<CrimeDistrictRecord> = match &self.districts_path {
            Some(path) => load_json(path).wrap_err_with(|| format!("bad districts file {path}"))?,
            None => Vec::new(),
        };
        let stations: Vec<Station> = match &self.stations_path {
            Some(path) => load_json(path).wrap_err_with(|| format!("bad stations file {path}"))?,
            None => Vec::new(),
        };

        let mut config = SafetyScorerConfig::new(ModelPaths {
            model: self.scorer.model_path.clone(),
            scaler: self.scorer.scaler_path.clone(),
        });
        if let Some(weight) = self.scorer.model_weight {
            config = config.with_model_weight(weight);
        }
        Ok(Arc::new(SafetyScorer::new(
            Arc::new(CrimeRiskCache::new(districts)),
            Arc::new(StationIndex::build(stations)),
            config,
        )))
    }

    /// Assemble the full optimizer stack.
    pub fn build_optimizer(&self) -> Result<(Arc<MapsOrchestrator>, Arc<SafetyScorer>, RouteOptimizer)> {
        let maps = self.build_orchestrator()?;
        let scorer = self.build_scorer()?;
        let optimizer = RouteOptimizer::new(Arc::clone(&maps), Arc::clone(&scorer));
        Ok((maps, scorer, optimizer))
    }
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Utf8Path) -> Result<T> {
    let raw = std::fs::read_to_string(path.as_std_path())
        .wrap_err_with(|| format!("failed to read {path}"))?;
    serde_json::from_str(&raw).wrap_err_with(|| format!("failed to parse {path}"))
}

/// Feedback collaborator backed by a JSON file of records.
#[derive(Debug)]
pub struct JsonFeedbackFile {
    path: Utf8PathBuf,
}

impl JsonFeedbackFile {
    /// Wrap a feedback file path.
    pub fn new(path: Utf8PathBuf) -> Self {
        Self { path }
    }
}

impl FeedbackSource for JsonFeedbackFile {
    fn fetch_feedback(&self) -> std::result::Result<Vec<FeedbackRecord>, FeedbackSourceError> {
        let raw =
            std::fs::read_to_string(self.path.as_std_path()).map_err(|err| FeedbackSourceError {
                message: format!("failed to read {}: {err}", self.path),
            })?;
        serde_json::from_str(&raw).map_err(|err| FeedbackSourceError {
            message: format!("failed to parse {}: {err}", self.path),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> Utf8PathBuf {
        let path = Utf8PathBuf::from_path_buf(dir.path().join(name)).expect("utf-8 path");
        let mut file = std::fs::File::create(path.as_std_path()).expect("create file");
        file.write_all(contents.as_bytes()).expect("write file");
        path
    }

    #[rstest]
    fn full_config_round_trips_and_builds() {
        let dir = tempfile::tempdir().expect("temp dir");
        let districts = write_file(
            &dir,
            "districts.json",
            r#"[{
                "name": "Egmore",
                "centroid": {"latitude": 13.07, "longitude": 80.26},
                "radius_meters": 1200.0,
                "incident_count": 31,
                "risk_score": 40.0
            }]"#,
        );
        let stations = write_file(
            &dir,
            "stations.json",
            r#"[{"name": "Egmore", "coordinate": {"latitude": 13.0732, "longitude": 80.2609}}]"#,
        );
        let config_path = write_file(
            &dir,
            "config.json",
            &format!(
                r#"{{
                    "providers": {{"osrm": {{"base_url": "http://localhost:5000"}}}},
                    "scorer": {{
                        "model_path": "{base}/model.bin",
                        "scaler_path": "{base}/scaler.bin"
                    }},
                    "districts_path": "{districts}",
                    "stations_path": "{stations}"
                }}"#,
                base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8"),
            ),
        );

        let config = EngineConfig::load(&config_path).expect("config loads");
        let (maps, scorer, _optimizer) = config.build_optimizer().expect("stack builds");

        assert_eq!(maps.provider_names(), vec!["osrm"]);
        // No model artefacts yet; the scorer degrades to heuristic-only.
        assert!(scorer.current_model().is_none());
    }

    #[rstest]
    fn feedback_file_parses_records() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_file(
            &dir,
            "feedback.json",
            r#"[{
                "location": {"latitude": 13.05, "longitude": 80.25},
                "rating": 2,
                "time_of_day": 22,
                "feedback_type": "unsafe"
            }]"#,
        );

        let source = JsonFeedbackFile::new(path);
        let records = source.fetch_feedback().expect("parses");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].rating, 2);
    }

    #[rstest]
    fn missing_feedback_file_reports_unavailable() {
        let source = JsonFeedbackFile::new(Utf8PathBuf::from("/nonexistent/feedback.json"));
        assert!(source.fetch_feedback().is_err());
    }
}
