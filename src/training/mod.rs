//! Model training and selection
//!
//! Provides the four candidate classifier families:
//! - Logistic regression (exposes per-feature coefficients)
//! - Single decision tree
//! - Random forest (bagged trees)
//! - Gradient boosted trees
//!
//! plus the [`TrainEngine`] that splits the dataset, fits and scores every
//! candidate, and persists the winner.

mod engine;
mod models;
pub mod decision_tree;
pub mod gradient_boosting;
pub mod linear;
pub mod random_forest;

pub use decision_tree::{DecisionTree, TreeNode};
pub use engine::{
    CandidateScore, ModelArtifact, ModelFamily, TrainEngine, TrainedClassifier, TrainingConfig,
    TrainingOutcome, TrainingReport, CANDIDATES,
};
pub use gradient_boosting::{GradientBoostingClassifier, GradientBoostingConfig};
pub use linear::LogisticRegression;
pub use models::ClassificationMetrics;
pub use random_forest::RandomForest;
