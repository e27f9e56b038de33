//! Training engine: split, fit candidates, score, select, persist

use super::decision_tree::DecisionTree;
use super::gradient_boosting::{GradientBoostingClassifier, GradientBoostingConfig};
use super::linear::LogisticRegression;
use super::models::ClassificationMetrics;
use super::random_forest::RandomForest;
use crate::data::Dataset;
use crate::error::{HeartRiskError, Result};
use crate::preprocessing::StandardScaler;
use crate::schema;
use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

/// The candidate classifier families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelFamily {
    Logistic,
    DecisionTree,
    RandomForest,
    GradientBoosting,
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelFamily::Logistic => "Logistic Regression",
            ModelFamily::DecisionTree => "Decision Tree",
            ModelFamily::RandomForest => "Random Forest",
            ModelFamily::GradientBoosting => "Gradient Boosting",
        };
        f.write_str(name)
    }
}

/// Candidate evaluation order. Ties in the ranking metric resolve to the
/// earliest entry, so this order is part of the selection contract.
pub const CANDIDATES: [ModelFamily; 4] = [
    ModelFamily::Logistic,
    ModelFamily::DecisionTree,
    ModelFamily::RandomForest,
    ModelFamily::GradientBoosting,
];

/// A fitted classifier of any candidate family.
///
/// Immutable once selected: every accessor takes `&self` and nothing at
/// inference time depends on training-time random state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrainedClassifier {
    Logistic(LogisticRegression),
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
    GradientBoosting(GradientBoostingClassifier),
}

impl TrainedClassifier {
    /// Which family this model belongs to
    pub fn family(&self) -> ModelFamily {
        match self {
            TrainedClassifier::Logistic(_) => ModelFamily::Logistic,
            TrainedClassifier::DecisionTree(_) => ModelFamily::DecisionTree,
            TrainedClassifier::RandomForest(_) => ModelFamily::RandomForest,
            TrainedClassifier::GradientBoosting(_) => ModelFamily::GradientBoosting,
        }
    }

    /// Positive-class probability for each row
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            TrainedClassifier::Logistic(m) => m.predict_proba(x),
            TrainedClassifier::DecisionTree(m) => m.predict_proba(x),
            TrainedClassifier::RandomForest(m) => m.predict_proba(x),
            TrainedClassifier::GradientBoosting(m) => m.predict_proba(x),
        }
    }

    /// Class labels for each row
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            TrainedClassifier::Logistic(m) => m.predict(x),
            TrainedClassifier::DecisionTree(m) => m.predict(x),
            TrainedClassifier::RandomForest(m) => m.predict(x),
            TrainedClassifier::GradientBoosting(m) => m.predict(x),
        }
    }

    /// Per-feature coefficients; `Some` only for the linear family
    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        match self {
            TrainedClassifier::Logistic(m) => m.coefficients(),
            _ => None,
        }
    }
}

/// Configuration for a training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Fraction of the dataset held out for candidate scoring
    pub holdout_fraction: f64,
    /// Seed for the stratified split and every stochastic candidate
    pub seed: u64,
    /// Trees in the random forest candidate
    pub forest_trees: usize,
    /// Boosting rounds in the gradient boosting candidate
    pub boosting_rounds: usize,
    /// Gradient-descent iterations for the logistic candidate
    pub logistic_max_iter: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            holdout_fraction: 0.2,
            seed: 42,
            forest_trees: 200,
            boosting_rounds: 100,
            logistic_max_iter: 1000,
        }
    }
}

impl TrainingConfig {
    /// Set the reproducibility seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Holdout scores for one candidate, in evaluation order
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CandidateScore {
    pub family: ModelFamily,
    pub accuracy: f64,
    pub auc_roc: f64,
}

/// Summary of a training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Scores for every candidate that fit, in evaluation order
    pub candidates: Vec<CandidateScore>,
    /// Candidates excluded because fitting or scoring failed
    pub excluded: Vec<(ModelFamily, String)>,
    /// The winning family
    pub selected: ModelFamily,
    /// Winning ROC-AUC
    pub selected_auc: f64,
    /// Winning accuracy (secondary metric)
    pub selected_accuracy: f64,
    pub n_train: usize,
    pub n_holdout: usize,
}

/// Everything a training run produces
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: TrainedClassifier,
    pub scaler: StandardScaler,
    pub report: TrainingReport,
}

/// Fits every candidate family and selects the best by holdout ROC-AUC
#[derive(Debug, Clone, Default)]
pub struct TrainEngine {
    config: TrainingConfig,
}

impl TrainEngine {
    /// Create an engine with the given configuration
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    /// Run the full pipeline: stratified split, scale, fit candidates,
    /// score, select.
    ///
    /// A candidate that fails to fit is excluded and logged; the run only
    /// fails when every candidate does.
    pub fn train(&self, dataset: &Dataset) -> Result<TrainingOutcome> {
        let n_pos = dataset.n_positive();
        if n_pos == 0 || n_pos == dataset.n_samples() {
            return Err(HeartRiskError::TrainingError(
                "dataset contains a single class; cannot train or score".to_string(),
            ));
        }

        let (x_train, x_hold, y_train, y_hold) =
            self.stratified_split(&dataset.x, &dataset.y)?;

        // Scaling parameters come from the training partition only; the
        // holdout sees the same fitted transform.
        let mut scaler = StandardScaler::new();
        let x_train_scaled = scaler.fit_transform(&x_train)?;
        let x_hold_scaled = scaler.transform(&x_hold)?;

        let mut candidates = Vec::new();
        let mut excluded = Vec::new();
        let mut best: Option<(TrainedClassifier, CandidateScore)> = None;

        for family in CANDIDATES {
            let outcome = self
                .fit_candidate(family, &x_train_scaled, &y_train)
                .and_then(|model| {
                    let score = Self::score(family, &model, &x_hold_scaled, &y_hold)?;
                    Ok((model, score))
                });

            match outcome {
                Ok((model, score)) => {
                    info!(
                        family = %family,
                        accuracy = score.accuracy,
                        auc_roc = score.auc_roc,
                        "scored candidate"
                    );
                    // Strictly greater: ties keep the earlier candidate
                    let improves = best
                        .as_ref()
                        .map_or(true, |(_, held)| score.auc_roc > held.auc_roc);
                    candidates.push(score);
                    if improves {
                        best = Some((model, score));
                    }
                }
                Err(e) => {
                    warn!(family = %family, error = %e, "candidate excluded from selection");
                    excluded.push((family, e.to_string()));
                }
            }
        }

        let (model, selected) = best.ok_or_else(|| {
            HeartRiskError::TrainingError("every candidate failed to fit".to_string())
        })?;

        info!(selected = %selected.family, auc_roc = selected.auc_roc, "selected model");

        Ok(TrainingOutcome {
            model,
            scaler,
            report: TrainingReport {
                candidates,
                excluded,
                selected: selected.family,
                selected_auc: selected.auc_roc,
                selected_accuracy: selected.accuracy,
                n_train: y_train.len(),
                n_holdout: y_hold.len(),
            },
        })
    }

    fn fit_candidate(
        &self,
        family: ModelFamily,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<TrainedClassifier> {
        Ok(match family {
            ModelFamily::Logistic => {
                let mut model =
                    LogisticRegression::new().with_max_iter(self.config.logistic_max_iter);
                model.fit(x, y)?;
                TrainedClassifier::Logistic(model)
            }
            ModelFamily::DecisionTree => {
                let mut model = DecisionTree::new_classifier();
                model.fit(x, y)?;
                TrainedClassifier::DecisionTree(model)
            }
            ModelFamily::RandomForest => {
                let mut model =
                    RandomForest::new(self.config.forest_trees).with_seed(self.config.seed);
                model.fit(x, y)?;
                TrainedClassifier::RandomForest(model)
            }
            ModelFamily::GradientBoosting => {
                let mut model = GradientBoostingClassifier::new(GradientBoostingConfig {
                    n_estimators: self.config.boosting_rounds,
                    seed: self.config.seed,
                    ..Default::default()
                });
                model.fit(x, y)?;
                TrainedClassifier::GradientBoosting(model)
            }
        })
    }

    fn score(
        family: ModelFamily,
        model: &TrainedClassifier,
        x_hold: &Array2<f64>,
        y_hold: &Array1<f64>,
    ) -> Result<CandidateScore> {
        let y_pred = model.predict(x_hold)?;
        let y_prob = model.predict_proba(x_hold)?;
        let metrics = ClassificationMetrics::compute(y_hold, &y_pred, &y_prob)?;
        Ok(CandidateScore {
            family,
            accuracy: metrics.accuracy,
            auc_roc: metrics.auc_roc,
        })
    }

    /// Stratified holdout split: class proportions preserved, indices
    /// shuffled with the configured seed so reruns produce the same
    /// partitions.
    fn stratified_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<(Array2<f64>, Array2<f64>, Array1<f64>, Array1<f64>)> {
        let fraction = self.config.holdout_fraction;
        if !(0.0..1.0).contains(&fraction) || fraction == 0.0 {
            return Err(HeartRiskError::InvalidInput(format!(
                "holdout fraction must be in (0, 1), got {}",
                fraction
            )));
        }

        // BTreeMap keeps class iteration order fixed regardless of label
        // order in the file
        let mut class_indices: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (i, &label) in y.iter().enumerate() {
            class_indices.entry(label as i64).or_default().push(i);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let mut train_indices = Vec::new();
        let mut hold_indices = Vec::new();

        for (class, indices) in &class_indices {
            if indices.len() < 2 {
                return Err(HeartRiskError::DataError(format!(
                    "class {} has fewer than two samples; cannot split",
                    class
                )));
            }
            let mut shuffled = indices.clone();
            shuffled.shuffle(&mut rng);

            let hold_size = ((shuffled.len() as f64) * fraction).round().max(1.0) as usize;
            let hold_size = hold_size.min(shuffled.len() - 1);
            let split_point = shuffled.len() - hold_size;

            train_indices.extend_from_slice(&shuffled[..split_point]);
            hold_indices.extend_from_slice(&shuffled[split_point..]);
        }

        let n_cols = x.ncols();
        let x_train = Array2::from_shape_fn((train_indices.len(), n_cols), |(i, j)| {
            x[[train_indices[i], j]]
        });
        let x_hold = Array2::from_shape_fn((hold_indices.len(), n_cols), |(i, j)| {
            x[[hold_indices[i], j]]
        });
        let y_train = Array1::from_iter(train_indices.iter().map(|&i| y[i]));
        let y_hold = Array1::from_iter(hold_indices.iter().map(|&i| y[i]));

        Ok((x_train, x_hold, y_train, y_hold))
    }
}

/// Persisted form of the selected model.
///
/// Carries the feature-name list so loading verifies the artifact was fit
/// under the current schema order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub feature_names: Vec<String>,
    pub model: TrainedClassifier,
}

impl ModelArtifact {
    /// Wrap a selected model for persistence
    pub fn new(model: TrainedClassifier) -> Self {
        Self {
            feature_names: schema::feature_names(),
            model,
        }
    }

    /// Write the artifact as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load and schema-verify an artifact
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            HeartRiskError::ArtifactError(format!("cannot read model {}: {}", path.display(), e))
        })?;
        let artifact: Self = serde_json::from_str(&json)
            .map_err(|e| HeartRiskError::ArtifactError(format!("corrupt model artifact: {}", e)))?;
        schema::verify_feature_order(&artifact.feature_names)?;
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::N_FEATURES;

    /// Deterministic, cleanly separable dataset: column 0 carries the class,
    /// the rest are structured filler
    fn synthetic_dataset(n: usize) -> Dataset {
        let x = Array2::from_shape_fn((n, N_FEATURES), |(i, j)| {
            let class = (i % 2) as f64;
            match j {
                0 => class * 4.0 + (i as f64 * 0.37).sin() * 0.5,
                1 => class * 3.0 + (i as f64 * 0.53).cos() * 0.5,
                _ => ((i * (j + 1)) as f64 * 0.11).sin(),
            }
        });
        let y = Array1::from_iter((0..n).map(|i| (i % 2) as f64));
        Dataset { x, y }
    }

    #[test]
    fn test_train_selects_a_candidate() {
        let dataset = synthetic_dataset(60);
        let outcome = TrainEngine::new(TrainingConfig::default())
            .train(&dataset)
            .unwrap();

        assert!(!outcome.report.candidates.is_empty());
        assert!((0.0..=1.0).contains(&outcome.report.selected_auc));
        assert_eq!(outcome.model.family(), outcome.report.selected);
    }

    #[test]
    fn test_selected_auc_is_maximum() {
        let dataset = synthetic_dataset(60);
        let outcome = TrainEngine::new(TrainingConfig::default())
            .train(&dataset)
            .unwrap();

        let max_auc = outcome
            .report
            .candidates
            .iter()
            .map(|c| c.auc_roc)
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(outcome.report.selected_auc, max_auc);
    }

    #[test]
    fn test_tie_resolves_to_first_candidate() {
        // Cleanly separable data: every family reaches AUC 1.0 on the
        // holdout, so the declared order decides
        let dataset = synthetic_dataset(60);
        let outcome = TrainEngine::new(TrainingConfig::default())
            .train(&dataset)
            .unwrap();

        let all_perfect = outcome
            .report
            .candidates
            .iter()
            .all(|c| (c.auc_roc - 1.0).abs() < 1e-12);
        if all_perfect {
            assert_eq!(outcome.report.selected, CANDIDATES[0]);
        }
    }

    #[test]
    fn test_training_is_deterministic() {
        let dataset = synthetic_dataset(60);
        let engine = TrainEngine::new(TrainingConfig::default());

        let a = engine.train(&dataset).unwrap();
        let b = engine.train(&dataset).unwrap();

        assert_eq!(a.report.selected, b.report.selected);
        assert_eq!(a.report.selected_auc, b.report.selected_auc);
        for (ca, cb) in a.report.candidates.iter().zip(b.report.candidates.iter()) {
            assert_eq!(ca.family, cb.family);
            assert_eq!(ca.auc_roc, cb.auc_roc);
        }
    }

    #[test]
    fn test_stratified_split_preserves_proportions() {
        let dataset = synthetic_dataset(60);
        let engine = TrainEngine::new(TrainingConfig::default());
        let (_, _, y_train, y_hold) = engine
            .stratified_split(&dataset.x, &dataset.y)
            .unwrap();

        assert_eq!(y_train.len() + y_hold.len(), 60);
        assert_eq!(y_hold.len(), 12);
        // 30/30 split in the source, so the holdout must be 6/6
        let hold_pos = y_hold.iter().filter(|&&v| v > 0.5).count();
        assert_eq!(hold_pos, 6);
        // Both classes present in both partitions
        assert!(y_train.iter().any(|&v| v > 0.5));
        assert!(y_train.iter().any(|&v| v < 0.5));
    }

    #[test]
    fn test_single_class_dataset_fails() {
        let mut dataset = synthetic_dataset(20);
        dataset.y.fill(1.0);
        let err = TrainEngine::new(TrainingConfig::default())
            .train(&dataset)
            .unwrap_err();
        assert!(matches!(err, HeartRiskError::TrainingError(_)));
    }

    #[test]
    fn test_model_artifact_round_trip() {
        let dataset = synthetic_dataset(60);
        let outcome = TrainEngine::new(TrainingConfig::default())
            .train(&dataset)
            .unwrap();

        let file = tempfile::NamedTempFile::new().unwrap();
        ModelArtifact::new(outcome.model.clone())
            .save(file.path())
            .unwrap();
        let loaded = ModelArtifact::load(file.path()).unwrap();

        let probe = outcome.scaler.transform(&dataset.x).unwrap();
        assert_eq!(
            outcome.model.predict_proba(&probe).unwrap(),
            loaded.model.predict_proba(&probe).unwrap()
        );
    }

    #[test]
    fn test_artifact_load_missing_file_fails() {
        let err = ModelArtifact::load("/nonexistent/model.json").unwrap_err();
        assert!(matches!(err, HeartRiskError::ArtifactError(_)));
    }

    #[test]
    fn test_artifact_load_rejects_permuted_schema() {
        let dataset = synthetic_dataset(60);
        let outcome = TrainEngine::new(TrainingConfig::default())
            .train(&dataset)
            .unwrap();

        let mut artifact = ModelArtifact::new(outcome.model);
        artifact.feature_names.swap(0, 1);

        let file = tempfile::NamedTempFile::new().unwrap();
        artifact.save(file.path()).unwrap();
        assert!(ModelArtifact::load(file.path()).is_err());
    }
}
