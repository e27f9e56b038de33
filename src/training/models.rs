//! Evaluation metrics for binary classifiers

use crate::error::{HeartRiskError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Holdout metrics for one fitted candidate.
///
/// ROC-AUC is the ranking metric used for selection: it is independent of the
/// classification threshold, so downstream risk-threshold tuning cannot
/// invalidate the choice. Accuracy is reported secondarily.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub auc_roc: f64,
}

impl ClassificationMetrics {
    /// Compute both metrics from holdout labels, predictions, and
    /// positive-class probabilities
    pub fn compute(
        y_true: &Array1<f64>,
        y_pred: &Array1<f64>,
        y_prob: &Array1<f64>,
    ) -> Result<Self> {
        Ok(Self {
            accuracy: accuracy(y_true, y_pred),
            auc_roc: roc_auc(y_true, y_prob)?,
        })
    }
}

/// Fraction of predictions matching the true label
pub fn accuracy(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| (*t - *p).abs() < 0.5)
        .count();
    correct as f64 / y_true.len() as f64
}

/// Area under the ROC curve via the rank-sum (Mann-Whitney) formulation.
///
/// Tied probabilities receive their average rank. Undefined when the labels
/// contain only one class; that is an error so a degenerate holdout cannot
/// silently score a candidate.
pub fn roc_auc(y_true: &Array1<f64>, y_prob: &Array1<f64>) -> Result<f64> {
    let n = y_true.len();
    if n != y_prob.len() {
        return Err(HeartRiskError::ShapeError {
            expected: format!("{} probabilities", n),
            actual: format!("{} probabilities", y_prob.len()),
        });
    }

    let n_pos = y_true.iter().filter(|&&t| t > 0.5).count();
    let n_neg = n - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(HeartRiskError::TrainingError(
            "ROC-AUC is undefined when the holdout contains a single class".to_string(),
        ));
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        y_prob[a]
            .partial_cmp(&y_prob[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Average ranks over runs of tied probabilities
    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && y_prob[order[j + 1]] == y_prob[order[i]] {
            j += 1;
        }
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for k in i..=j {
            ranks[order[k]] = avg_rank;
        }
        i = j + 1;
    }

    let rank_sum_pos: f64 = y_true
        .iter()
        .zip(ranks.iter())
        .filter(|(t, _)| **t > 0.5)
        .map(|(_, r)| r)
        .sum();

    let u = rank_sum_pos - (n_pos * (n_pos + 1)) as f64 / 2.0;
    Ok(u / (n_pos * n_neg) as f64)
}
