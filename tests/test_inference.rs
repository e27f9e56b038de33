//! Integration tests for the predictor: artifact loading, prediction,
//! clinical interpretation

use heart_risk::training::{ModelArtifact, TrainEngine, TrainingConfig};
use heart_risk::{
    load_dataset, HeartRiskError, PatientRecord, Predictor, RiskBand,
};
use std::fmt::Write as _;
use std::path::PathBuf;

const HEADER: &str = "Age,Sex,Chest pain type,BP,Cholesterol,FBS over 120,EKG results,Max HR,Exercise angina,ST depression,Slope of ST,Number of vessels fluro,Thallium,Heart Disease";

fn write_training_csv(dir: &tempfile::TempDir) -> PathBuf {
    let mut content = String::new();
    writeln!(content, "{}", HEADER).unwrap();
    for i in 0..60 {
        let diseased = i % 2 == 1;
        let jitter = (i / 2) % 10;
        if diseased {
            writeln!(
                content,
                "{},1,4,{},{},0,2,{},1,2.5,2,2,7,Presence",
                62 + jitter,
                165 + jitter,
                300 + 3 * jitter,
                105 + jitter,
            )
            .unwrap();
        } else {
            writeln!(
                content,
                "{},0,2,{},{},0,0,{},0,0.5,1,0,3,Absence",
                34 + jitter,
                108 + jitter,
                175 + 3 * jitter,
                165 + jitter,
            )
            .unwrap();
        }
    }

    let path = dir.path().join("heart.csv");
    std::fs::write(&path, content).unwrap();
    path
}

/// Train on the synthetic table and reload the artifacts through disk,
/// the way the real predictor starts up
fn trained_predictor(dir: &tempfile::TempDir) -> Predictor {
    let dataset = load_dataset(write_training_csv(dir)).unwrap();
    let outcome = TrainEngine::new(TrainingConfig::default())
        .train(&dataset)
        .unwrap();

    let model_path = dir.path().join("model.json");
    let scaler_path = dir.path().join("scaler.json");
    ModelArtifact::new(outcome.model).save(&model_path).unwrap();
    outcome.scaler.save(&scaler_path).unwrap();

    Predictor::load(&model_path, &scaler_path).unwrap()
}

fn healthy_record() -> PatientRecord {
    PatientRecord {
        age: 30.0,
        sex: 0.0,
        chest_pain_type: 2.0,
        blood_pressure: 110.0,
        cholesterol: 180.0,
        fasting_blood_sugar: 0.0,
        ekg_results: 0.0,
        max_heart_rate: 170.0,
        exercise_angina: 0.0,
        st_depression: 0.5,
        st_slope: 1.0,
        major_vessels: 0.0,
        thallium: 3.0,
    }
}

fn diseased_record() -> PatientRecord {
    PatientRecord {
        age: 65.0,
        sex: 1.0,
        chest_pain_type: 4.0,
        blood_pressure: 170.0,
        cholesterol: 320.0,
        fasting_blood_sugar: 0.0,
        ekg_results: 2.0,
        max_heart_rate: 108.0,
        exercise_angina: 1.0,
        st_depression: 2.5,
        st_slope: 2.0,
        major_vessels: 2.0,
        thallium: 7.0,
    }
}

// ============================================================================
// Prediction behavior
// ============================================================================

#[test]
fn test_probability_bounds_and_label_consistency() {
    let dir = tempfile::tempdir().unwrap();
    let predictor = trained_predictor(&dir);

    for record in [healthy_record(), diseased_record()] {
        let assessment = predictor.predict(&record).unwrap();
        assert!((0.0..=1.0).contains(&assessment.probability));
        assert_eq!(assessment.disease_present, assessment.probability >= 0.5);
    }
}

#[test]
fn test_separable_profiles_get_opposite_labels() {
    let dir = tempfile::tempdir().unwrap();
    let predictor = trained_predictor(&dir);

    let healthy = predictor.predict(&healthy_record()).unwrap();
    let diseased = predictor.predict(&diseased_record()).unwrap();

    assert!(!healthy.disease_present);
    assert!(diseased.disease_present);
    assert!(diseased.probability > healthy.probability);
}

#[test]
fn test_repeated_predictions_identical() {
    let dir = tempfile::tempdir().unwrap();
    let predictor = trained_predictor(&dir);

    let record = diseased_record();
    let a = predictor.predict(&record).unwrap();
    let b = predictor.predict(&record).unwrap();

    assert_eq!(a.probability, b.probability);
    assert_eq!(a.disease_present, b.disease_present);
    assert_eq!(a.band, b.band);
    assert_eq!(a.explanations, b.explanations);
}

#[test]
fn test_band_matches_probability() {
    let dir = tempfile::tempdir().unwrap();
    let predictor = trained_predictor(&dir);

    let assessment = predictor.predict(&diseased_record()).unwrap();
    assert_eq!(
        assessment.band,
        RiskBand::from_probability(assessment.probability)
    );
}

// ============================================================================
// Clinical interpretation
// ============================================================================

#[test]
fn test_all_six_explanations_in_declared_order() {
    let dir = tempfile::tempdir().unwrap();
    let predictor = trained_predictor(&dir);

    let mut record = diseased_record();
    record.age = 60.0;
    record.blood_pressure = 150.0;
    record.cholesterol = 250.0;

    let assessment = predictor.predict(&record).unwrap();
    assert_eq!(assessment.explanations.len(), 6);
    assert!(assessment.explanations[0].starts_with("Advanced age"));
    assert!(assessment.explanations[1].starts_with("Elevated blood pressure"));
    assert!(assessment.explanations[2].starts_with("High cholesterol"));
    assert!(assessment.explanations[3].starts_with("Exercise-induced angina"));
    assert!(assessment.explanations[4].starts_with("Multiple affected vessels"));
    assert!(assessment.explanations[5].starts_with("Abnormal thallium"));
}

#[test]
fn test_unremarkable_record_gets_single_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let predictor = trained_predictor(&dir);

    let assessment = predictor.predict(&healthy_record()).unwrap();
    assert_eq!(assessment.explanations.len(), 1);
    assert!(assessment.explanations[0].contains("acceptable ranges"));
}

#[test]
fn test_age_rule_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let predictor = trained_predictor(&dir);

    let mut record = healthy_record();
    record.age = 55.0;
    let at = predictor.predict(&record).unwrap();
    assert!(at.explanations[0].contains("acceptable ranges"));

    record.age = 56.0;
    let above = predictor.predict(&record).unwrap();
    assert!(above.explanations[0].starts_with("Advanced age"));
}

#[test]
fn test_out_of_range_inputs_clamped_not_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let predictor = trained_predictor(&dir);

    let mut extreme = healthy_record();
    extreme.age = 300.0;
    extreme.blood_pressure = 500.0;

    let mut bounded = healthy_record();
    bounded.age = 100.0;
    bounded.blood_pressure = 200.0;

    let a = predictor.predict(&extreme).unwrap();
    let b = predictor.predict(&bounded).unwrap();
    assert_eq!(a.probability, b.probability);
}

// ============================================================================
// Artifact loading failures
// ============================================================================

#[test]
fn test_missing_model_artifact_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let predictor = trained_predictor(&dir);
    drop(predictor);

    let err = Predictor::load(
        dir.path().join("absent.json"),
        dir.path().join("scaler.json"),
    )
    .unwrap_err();
    assert!(matches!(err, HeartRiskError::ArtifactError(_)));
}

#[test]
fn test_corrupt_scaler_artifact_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let _ = trained_predictor(&dir);

    let scaler_path = dir.path().join("scaler.json");
    std::fs::write(&scaler_path, "{ not json").unwrap();

    let err = Predictor::load(dir.path().join("model.json"), &scaler_path).unwrap_err();
    assert!(matches!(err, HeartRiskError::ArtifactError(_)));
}
