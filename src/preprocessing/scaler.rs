//! Standard (z-score) feature scaling

use crate::error::{HeartRiskError, Result};
use crate::schema;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Per-feature standardization: (x - mean) / std, fit on training data only.
///
/// The fitted parameters travel with the feature-name list they were computed
/// against, so a scaler fit under a different schema order is rejected at
/// load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    feature_names: Vec<String>,
    means: Vec<f64>,
    stds: Vec<f64>,
    is_fitted: bool,
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardScaler {
    /// Create an unfitted scaler bound to the schema's feature order
    pub fn new() -> Self {
        Self {
            feature_names: schema::feature_names(),
            means: Vec::new(),
            stds: Vec::new(),
            is_fitted: false,
        }
    }

    /// Fit the per-feature mean and standard deviation.
    ///
    /// Population standard deviation (ddof = 0); a zero-variance feature
    /// scales by 1.0 instead of dividing by zero.
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        self.check_width(x)?;

        let n = x.nrows();
        if n == 0 {
            return Err(HeartRiskError::DataError(
                "cannot fit scaler on an empty matrix".to_string(),
            ));
        }

        let mut means = Vec::with_capacity(x.ncols());
        let mut stds = Vec::with_capacity(x.ncols());
        for col in x.axis_iter(Axis(1)) {
            let mean = col.sum() / n as f64;
            let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
            let std = var.sqrt();
            means.push(mean);
            stds.push(if std == 0.0 { 1.0 } else { std });
        }

        self.means = means;
        self.stds = stds;
        self.is_fitted = true;
        Ok(self)
    }

    /// Standardize a matrix with the fitted parameters
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(HeartRiskError::ModelNotFitted);
        }
        self.check_width(x)?;

        let mut out = x.clone();
        for (j, mut col) in out.axis_iter_mut(Axis(1)).enumerate() {
            let (mean, std) = (self.means[j], self.stds[j]);
            col.mapv_inplace(|v| (v - mean) / std);
        }
        Ok(out)
    }

    /// Standardize a single feature vector
    pub fn transform_vector(&self, v: &Array1<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted {
            return Err(HeartRiskError::ModelNotFitted);
        }
        if v.len() != self.feature_names.len() {
            return Err(HeartRiskError::ShapeError {
                expected: format!("{} features", self.feature_names.len()),
                actual: format!("{} features", v.len()),
            });
        }

        Ok(Array1::from_iter(v.iter().enumerate().map(|(j, &val)| {
            (val - self.means[j]) / self.stds[j]
        })))
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    /// Undo the standardization
    pub fn inverse_transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(HeartRiskError::ModelNotFitted);
        }
        self.check_width(x)?;

        let mut out = x.clone();
        for (j, mut col) in out.axis_iter_mut(Axis(1)).enumerate() {
            let (mean, std) = (self.means[j], self.stds[j]);
            col.mapv_inplace(|v| v * std + mean);
        }
        Ok(out)
    }

    /// Feature names the scaler was fit against
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Persist the fitted scaler as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        if !self.is_fitted {
            return Err(HeartRiskError::ModelNotFitted);
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a fitted scaler, verifying it matches the schema's feature order
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            HeartRiskError::ArtifactError(format!("cannot read scaler {}: {}", path.display(), e))
        })?;
        let scaler: Self = serde_json::from_str(&json)
            .map_err(|e| HeartRiskError::ArtifactError(format!("corrupt scaler artifact: {}", e)))?;
        if !scaler.is_fitted {
            return Err(HeartRiskError::ArtifactError(
                "scaler artifact is not fitted".to_string(),
            ));
        }
        schema::verify_feature_order(&scaler.feature_names)?;
        Ok(scaler)
    }

    fn check_width(&self, x: &Array2<f64>) -> Result<()> {
        if x.ncols() != self.feature_names.len() {
            return Err(HeartRiskError::ShapeError {
                expected: format!("{} columns", self.feature_names.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }
        Ok(())
    }
}
