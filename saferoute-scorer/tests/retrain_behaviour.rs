//! Behaviour tests for the retrain-and-reload lifecycle.

use std::sync::Arc;

use camino::Utf8PathBuf;
use saferoute_core::{
    Coordinate, CrimeDistrictRecord, FeedbackRecord, FeedbackType, StationIndex,
};
use saferoute_scorer::{CrimeRiskCache, ModelPaths, SafetyScorer, SafetyScorerConfig};

fn coord(lat: f64, lng: f64) -> Coordinate {
    Coordinate::new(lat, lng).expect("valid coordinate")
}

fn scorer_at(base: &Utf8PathBuf) -> SafetyScorer {
    let districts = vec![
        CrimeDistrictRecord::new("central", coord(13.08, 80.27), 2_500.0, 90, 70.0)
            .expect("valid district"),
    ];
    let config = SafetyScorerConfig::new(ModelPaths {
        model: base.join("model.bin"),
        scaler: base.join("scaler.bin"),
    });
    SafetyScorer::new(
        Arc::new(CrimeRiskCache::new(districts)),
        Arc::new(StationIndex::build(Vec::new())),
        config,
    )
}

fn feedback_rows() -> Vec<FeedbackRecord> {
    (0..10)
        .map(|i| {
            let rating = if i % 2 == 0 { 5 } else { 1 };
            FeedbackRecord::new(
                coord(13.00 + f64::from(i) * 0.01, 80.20),
                rating,
                Some(if i % 2 == 0 { 12 } else { 23 }),
                if rating >= 4 {
                    FeedbackType::Safe
                } else {
                    FeedbackType::Unsafe
                },
            )
            .expect("valid record")
        })
        .collect()
}

#[test]
fn a_fresh_process_loads_the_promoted_model() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp path");

    // First process: no artefacts yet, heuristic-only, then retrain.
    let first = scorer_at(&base);
    assert!(first.current_model().is_none());
    let report = first
        .retrain_with_feedback(&feedback_rows())
        .expect("retrain succeeds");
    assert_eq!(report.sample_count, 10);

    // Second process: startup load finds the promoted artefacts.
    let second = scorer_at(&base);
    let snapshot = second.current_model().expect("model loaded at startup");
    assert_eq!(snapshot.sample_count, 10);

    // Both processes score identically against the same model.
    let point = coord(13.05, 80.25);
    let a = first.score_location(point, None);
    let b = second.score_location(point, None);
    assert_eq!(a.score, b.score);
}

#[test]
fn scores_remain_bounded_with_and_without_a_model() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp path");
    let scorer = scorer_at(&base);
    let point = coord(13.08, 80.27);

    let heuristic_only = scorer.score_location(point, None);
    assert!((0.0..=100.0).contains(&heuristic_only.score));

    scorer
        .retrain_with_feedback(&feedback_rows())
        .expect("retrain succeeds");
    let blended = scorer.score_location(point, None);
    assert!((0.0..=100.0).contains(&blended.score));
}
