//! Inference: prediction and clinical interpretation
//!
//! The [`Predictor`] owns the persisted artifacts as explicit state — load
//! once, reuse for every prediction. [`explain`] holds the presentation-side
//! policies (risk banding, threshold rules, importance ranking) so they can
//! change without retraining.

pub mod explain;
mod predictor;

pub use explain::{clinical_explanations, key_factors, KeyFactor, RiskBand};
pub use predictor::{Predictor, RiskAssessment};
