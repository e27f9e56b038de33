//! Training dataset loading
//!
//! Reads the labeled tabular file, maps the textual labels onto {0, 1}, and
//! extracts the feature matrix in schema order. Every integrity failure here
//! is fatal: nothing downstream may see a partially mapped dataset.

use crate::error::{HeartRiskError, Result};
use crate::schema::{self, FEATURES, LABEL_ABSENT, LABEL_COLUMN, LABEL_PRESENT};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::info;

/// A loaded training dataset: features in schema order plus binary labels
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Feature matrix, one row per patient, columns in schema order
    pub x: Array2<f64>,
    /// Labels: 1.0 = disease present, 0.0 = absent
    pub y: Array1<f64>,
}

impl Dataset {
    /// Number of patients
    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    /// Count of positive-class (disease present) labels
    pub fn n_positive(&self) -> usize {
        self.y.iter().filter(|&&v| v > 0.5).count()
    }
}

/// Load the training table from a CSV file
pub fn load_dataset(path: impl AsRef<Path>) -> Result<Dataset> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        HeartRiskError::DataError(format!("cannot open {}: {}", path.display(), e))
    })?;

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .into_reader_with_file_handle(file)
        .finish()?;

    let dataset = dataset_from_frame(&df)?;
    info!(
        rows = dataset.n_samples(),
        positive = dataset.n_positive(),
        "loaded training dataset from {}",
        path.display()
    );
    Ok(dataset)
}

/// Extract features and mapped labels from a DataFrame
pub fn dataset_from_frame(df: &DataFrame) -> Result<Dataset> {
    let y = extract_labels(df)?;
    let x = extract_features(df)?;

    if x.nrows() != y.len() {
        return Err(HeartRiskError::ShapeError {
            expected: format!("{} label rows", x.nrows()),
            actual: format!("{} label rows", y.len()),
        });
    }

    Ok(Dataset { x, y })
}

/// Map the label column through the fixed {Presence -> 1, Absence -> 0}
/// dictionary. Any other value (including a missing one) is fatal.
fn extract_labels(df: &DataFrame) -> Result<Array1<f64>> {
    let column = df
        .column(LABEL_COLUMN)
        .map_err(|_| HeartRiskError::FeatureNotFound(LABEL_COLUMN.to_string()))?;

    let labels = column
        .as_materialized_series()
        .str()
        .map_err(|e| HeartRiskError::DataError(e.to_string()))?;

    let mut y = Vec::with_capacity(labels.len());
    for value in labels.into_iter() {
        match value {
            Some(LABEL_PRESENT) => y.push(1.0),
            Some(LABEL_ABSENT) => y.push(0.0),
            Some(other) => return Err(HeartRiskError::LabelError(other.to_string())),
            None => return Err(HeartRiskError::LabelError("<null>".to_string())),
        }
    }

    Ok(Array1::from_vec(y))
}

/// Extract the thirteen feature columns into a row-major matrix, in schema
/// order regardless of the order they appear in the file.
fn extract_features(df: &DataFrame) -> Result<Array2<f64>> {
    let n_rows = df.height();

    let col_data: Vec<Vec<f64>> = FEATURES
        .iter()
        .map(|spec| {
            let column = df
                .column(spec.column)
                .map_err(|_| HeartRiskError::FeatureNotFound(spec.column.to_string()))?;
            let series_f64 = column
                .as_materialized_series()
                .cast(&DataType::Float64)
                .map_err(|e| HeartRiskError::DataError(e.to_string()))?;
            let ca = series_f64
                .f64()
                .map_err(|e| HeartRiskError::DataError(e.to_string()))?;

            let mut values = Vec::with_capacity(n_rows);
            for (row, opt) in ca.into_iter().enumerate() {
                match opt {
                    Some(v) => values.push(v),
                    None => {
                        return Err(HeartRiskError::DataError(format!(
                            "missing value in column {:?} at row {}",
                            spec.column, row
                        )))
                    }
                }
            }
            Ok(values)
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn(
        (n_rows, schema::N_FEATURES),
        |(r, c)| col_refs[c][r],
    ))
}
