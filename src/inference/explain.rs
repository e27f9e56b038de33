//! Clinical interpretation rules and risk banding
//!
//! Everything here is presentation policy derived from raw (unscaled)
//! inputs or global model parameters. None of it feeds back into the model.

use crate::schema::{PatientRecord, FEATURES};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Display severity band for a risk probability.
///
/// Banding convention: 0-30% low, 31-60% moderate, 61-100% high. This is
/// how the probability is presented, not how the label is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskBand {
    Low,
    Moderate,
    High,
}

impl RiskBand {
    /// Band for a positive-class probability in [0, 1]
    pub fn from_probability(probability: f64) -> Self {
        let percent = probability * 100.0;
        if percent <= 30.0 {
            RiskBand::Low
        } else if percent <= 60.0 {
            RiskBand::Moderate
        } else {
            RiskBand::High
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            RiskBand::Low => "Low Risk",
            RiskBand::Moderate => "Moderate Risk",
            RiskBand::High => "High Risk",
        }
    }
}

/// One entry in the global feature-importance ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyFactor {
    /// Feature display name
    pub feature: String,
    /// Signed coefficient; rank position comes from its magnitude
    pub weight: f64,
}

/// Rank the thirteen features by absolute coefficient magnitude and return
/// the top five.
///
/// This is a model-level importance ranking, not a per-patient attribution:
/// the weights describe the fitted model, not the current input.
pub fn key_factors(coefficients: &Array1<f64>) -> Vec<KeyFactor> {
    let mut factors: Vec<KeyFactor> = FEATURES
        .iter()
        .zip(coefficients.iter())
        .map(|(spec, &weight)| KeyFactor {
            feature: spec.name.to_string(),
            weight,
        })
        .collect();

    factors.sort_by(|a, b| {
        b.weight
            .abs()
            .partial_cmp(&a.weight.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    factors.truncate(5);
    factors
}

const FALLBACK_SENTENCE: &str = "Clinical parameters are largely within acceptable ranges, \
     suggesting lower cardiovascular risk.";

/// Derive the ordered clinical interpretation sentences from raw inputs.
///
/// Each independent threshold predicate contributes one fixed sentence, in
/// the fixed evaluation order below. When none fire, a single reassurance
/// sentence is returned instead of an empty list.
pub fn clinical_explanations(record: &PatientRecord) -> Vec<String> {
    let mut explanations = Vec::new();

    if record.age > 55.0 {
        explanations.push("Advanced age increases cardiovascular risk.".to_string());
    }
    if record.blood_pressure > 140.0 {
        explanations.push("Elevated blood pressure suggests hypertension.".to_string());
    }
    if record.cholesterol > 240.0 {
        explanations.push("High cholesterol is a major risk factor.".to_string());
    }
    if record.exercise_angina == 1.0 {
        explanations.push("Exercise-induced angina indicates reduced blood flow.".to_string());
    }
    if record.major_vessels >= 2.0 {
        explanations.push("Multiple affected vessels increase disease severity.".to_string());
    }
    if record.thallium == 7.0 {
        explanations.push("Abnormal thallium stress test suggests ischemia.".to_string());
    }

    if explanations.is_empty() {
        explanations.push(FALLBACK_SENTENCE.to_string());
    }

    explanations
}
