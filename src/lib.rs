//! heart-risk - Heart disease risk modeling
//!
//! This crate trains binary classifiers to estimate heart-disease risk from
//! thirteen patient features and serves predictions with a clinical
//! interpretation layer:
//!
//! - [`schema`] - The shared ordered thirteen-feature schema
//! - [`data`] - Training-table loading and label mapping
//! - [`preprocessing`] - Standardization, fit once on training data
//! - [`training`] - Candidate families, holdout scoring, model selection
//! - [`inference`] - Predictor, risk banding, clinical explanations
//! - [`cli`] - Command-line interface
//!
//! The trainer produces two artifacts (model and scaler) that the predictor
//! loads once and reuses; data flows strictly trainer → artifacts →
//! predictor.

pub mod cli;
pub mod data;
pub mod error;
pub mod inference;
pub mod preprocessing;
pub mod schema;
pub mod training;

pub use data::{load_dataset, Dataset};
pub use error::{HeartRiskError, Result};
pub use inference::{Predictor, RiskAssessment, RiskBand};
pub use preprocessing::StandardScaler;
pub use schema::{PatientRecord, FEATURES, N_FEATURES};
pub use training::{
    ModelArtifact, ModelFamily, TrainEngine, TrainedClassifier, TrainingConfig, TrainingReport,
};
