//! The predictor: loaded artifacts plus the single-record inference flow

use super::explain::{clinical_explanations, key_factors, KeyFactor, RiskBand};
use crate::error::{HeartRiskError, Result};
use crate::preprocessing::StandardScaler;
use crate::schema::PatientRecord;
use crate::training::{ModelArtifact, TrainedClassifier};
use ndarray::Axis;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Result of one prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Predicted class: true = disease present
    pub disease_present: bool,
    /// Positive-class probability in [0, 1]
    pub probability: f64,
    /// Display severity band for the probability
    pub band: RiskBand,
    /// Top global feature-importance entries (linear models only, else empty)
    pub key_factors: Vec<KeyFactor>,
    /// Ordered clinical interpretation sentences (never empty)
    pub explanations: Vec<String>,
}

impl RiskAssessment {
    /// Probability formatted as a two-decimal percentage
    pub fn probability_percent(&self) -> String {
        format!("{:.2}%", self.probability * 100.0)
    }
}

/// Holds the persisted model and scaler and serves predictions.
///
/// Construct once (artifacts load once) and reuse; `predict` is a pure
/// function of the record and the held artifacts.
#[derive(Debug, Clone)]
pub struct Predictor {
    model: TrainedClassifier,
    scaler: StandardScaler,
}

impl Predictor {
    /// Build a predictor from already-loaded artifacts (used by tests and by
    /// the trainer to probe a freshly selected model)
    pub fn new(model: TrainedClassifier, scaler: StandardScaler) -> Self {
        Self { model, scaler }
    }

    /// Load both artifacts from disk.
    ///
    /// A missing or corrupt file is fatal here; no prediction is attempted
    /// against guessed artifacts.
    pub fn load(model_path: impl AsRef<Path>, scaler_path: impl AsRef<Path>) -> Result<Self> {
        let artifact = ModelArtifact::load(model_path)?;
        let scaler = StandardScaler::load(scaler_path)?;
        Ok(Self {
            model: artifact.model,
            scaler,
        })
    }

    /// The family of the loaded model
    pub fn model(&self) -> &TrainedClassifier {
        &self.model
    }

    /// Predict one patient's risk.
    ///
    /// Out-of-range fields are clamped to the declared bounds before any
    /// further processing; the clinical rules then see the clamped raw
    /// values, and the scaler sees the same vector.
    pub fn predict(&self, record: &PatientRecord) -> Result<RiskAssessment> {
        let (record, adjusted) = record.clamped();
        for field in adjusted {
            warn!(field, "input outside declared range, clamped to bounds");
        }

        let raw = record.to_vector();
        let scaled = self.scaler.transform_vector(&raw)?;
        let x = scaled.insert_axis(Axis(0));

        let probability = self.model.predict_proba(&x)?[0];
        let label = self.model.predict(&x)?[0];
        if !(0.0..=1.0).contains(&probability) {
            return Err(HeartRiskError::InferenceError(format!(
                "model produced probability outside [0, 1]: {}",
                probability
            )));
        }

        let factors = self
            .model
            .coefficients()
            .map(key_factors)
            .unwrap_or_default();

        Ok(RiskAssessment {
            disease_present: label >= 0.5,
            probability,
            band: RiskBand::from_probability(probability),
            key_factors: factors,
            explanations: clinical_explanations(&record),
        })
    }
}
