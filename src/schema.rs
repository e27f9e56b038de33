//! The shared thirteen-feature schema
//!
//! Both the trainer and the predictor consume this one ordered schema, so a
//! column-order mismatch between the training table and the inference surface
//! is caught at load time instead of silently corrupting predictions.

use crate::error::{HeartRiskError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Name of the label column in the training table
pub const LABEL_COLUMN: &str = "Heart Disease";

/// Label literal mapped to 1.0
pub const LABEL_PRESENT: &str = "Presence";

/// Label literal mapped to 0.0
pub const LABEL_ABSENT: &str = "Absence";

/// Number of input features
pub const N_FEATURES: usize = 13;

/// Declaration of a single input feature
#[derive(Debug, Clone, Copy)]
pub struct FeatureSpec {
    /// Human-readable name used in reports
    pub name: &'static str,
    /// Column header in the training table
    pub column: &'static str,
    /// Inclusive lower bound of the declared valid range
    pub min: f64,
    /// Inclusive upper bound of the declared valid range
    pub max: f64,
}

/// The thirteen features, in the fixed order the scaler and model are fit in.
///
/// Reordering entries here changes the wire order of every artifact; existing
/// artifacts will be rejected at load time by [`verify_feature_order`].
pub const FEATURES: [FeatureSpec; N_FEATURES] = [
    FeatureSpec { name: "Age", column: "Age", min: 20.0, max: 100.0 },
    FeatureSpec { name: "Sex", column: "Sex", min: 0.0, max: 1.0 },
    FeatureSpec { name: "Chest Pain Type", column: "Chest pain type", min: 1.0, max: 4.0 },
    FeatureSpec { name: "Blood Pressure", column: "BP", min: 80.0, max: 200.0 },
    FeatureSpec { name: "Cholesterol", column: "Cholesterol", min: 100.0, max: 600.0 },
    FeatureSpec { name: "Fasting Blood Sugar", column: "FBS over 120", min: 0.0, max: 1.0 },
    FeatureSpec { name: "EKG Results", column: "EKG results", min: 0.0, max: 2.0 },
    FeatureSpec { name: "Max Heart Rate", column: "Max HR", min: 60.0, max: 220.0 },
    FeatureSpec { name: "Exercise Induced Angina", column: "Exercise angina", min: 0.0, max: 1.0 },
    FeatureSpec { name: "ST Depression", column: "ST depression", min: 0.0, max: 6.0 },
    FeatureSpec { name: "ST Slope", column: "Slope of ST", min: 1.0, max: 3.0 },
    FeatureSpec { name: "Major Vessels", column: "Number of vessels fluro", min: 0.0, max: 3.0 },
    FeatureSpec { name: "Thallium Test", column: "Thallium", min: 3.0, max: 7.0 },
];

/// Feature names in schema order
pub fn feature_names() -> Vec<String> {
    FEATURES.iter().map(|f| f.name.to_string()).collect()
}

/// Check that `names` matches the schema's feature order exactly.
///
/// Used when loading persisted artifacts: an artifact fit against a different
/// order must be rejected rather than applied.
pub fn verify_feature_order(names: &[String]) -> Result<()> {
    if names.len() != N_FEATURES {
        return Err(HeartRiskError::ShapeError {
            expected: format!("{} feature names", N_FEATURES),
            actual: format!("{} feature names", names.len()),
        });
    }
    for (spec, name) in FEATURES.iter().zip(names.iter()) {
        if spec.name != name {
            return Err(HeartRiskError::ArtifactError(format!(
                "feature order mismatch: expected {:?}, artifact has {:?}",
                spec.name, name
            )));
        }
    }
    Ok(())
}

/// One patient's raw (unscaled) inputs.
///
/// Categorical fields carry their numeric encodings: `sex` 0=female 1=male,
/// `fasting_blood_sugar` and `exercise_angina` 0=no 1=yes, `thallium` one of
/// {3, 6, 7}.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub age: f64,
    pub sex: f64,
    pub chest_pain_type: f64,
    pub blood_pressure: f64,
    pub cholesterol: f64,
    pub fasting_blood_sugar: f64,
    pub ekg_results: f64,
    pub max_heart_rate: f64,
    pub exercise_angina: f64,
    pub st_depression: f64,
    pub st_slope: f64,
    pub major_vessels: f64,
    pub thallium: f64,
}

impl PatientRecord {
    /// Assemble the fields into a vector in schema order
    pub fn to_vector(&self) -> Array1<f64> {
        Array1::from_vec(vec![
            self.age,
            self.sex,
            self.chest_pain_type,
            self.blood_pressure,
            self.cholesterol,
            self.fasting_blood_sugar,
            self.ekg_results,
            self.max_heart_rate,
            self.exercise_angina,
            self.st_depression,
            self.st_slope,
            self.major_vessels,
            self.thallium,
        ])
    }

    /// Clamp every field to its declared range.
    ///
    /// Returns the clamped record plus the names of any fields that were out
    /// of range. Inputs are clamped rather than rejected; every clamp is
    /// reported to the caller.
    pub fn clamped(&self) -> (PatientRecord, Vec<&'static str>) {
        let raw = self.to_vector();
        let mut clamped = Vec::with_capacity(N_FEATURES);
        let mut adjusted = Vec::new();
        for (spec, &value) in FEATURES.iter().zip(raw.iter()) {
            let bounded = value.clamp(spec.min, spec.max);
            if bounded != value {
                adjusted.push(spec.name);
            }
            clamped.push(bounded);
        }
        (PatientRecord::from_slice(&clamped), adjusted)
    }

    fn from_slice(values: &[f64]) -> PatientRecord {
        PatientRecord {
            age: values[0],
            sex: values[1],
            chest_pain_type: values[2],
            blood_pressure: values[3],
            cholesterol: values[4],
            fasting_blood_sugar: values[5],
            ekg_results: values[6],
            max_heart_rate: values[7],
            exercise_angina: values[8],
            st_depression: values[9],
            st_slope: values[10],
            major_vessels: values[11],
            thallium: values[12],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_has_thirteen_features() {
        assert_eq!(FEATURES.len(), 13);
        assert_eq!(feature_names().len(), 13);
    }

    #[test]
    fn test_vector_order_matches_schema() {
        let record = PatientRecord {
            age: 1.0,
            sex: 2.0,
            chest_pain_type: 3.0,
            blood_pressure: 4.0,
            cholesterol: 5.0,
            fasting_blood_sugar: 6.0,
            ekg_results: 7.0,
            max_heart_rate: 8.0,
            exercise_angina: 9.0,
            st_depression: 10.0,
            st_slope: 11.0,
            major_vessels: 12.0,
            thallium: 13.0,
        };
        let v = record.to_vector();
        for i in 0..N_FEATURES {
            assert_eq!(v[i], (i + 1) as f64);
        }
    }

    #[test]
    fn test_verify_feature_order_accepts_schema() {
        assert!(verify_feature_order(&feature_names()).is_ok());
    }

    #[test]
    fn test_verify_feature_order_rejects_permutation() {
        let mut names = feature_names();
        names.swap(0, 1);
        assert!(verify_feature_order(&names).is_err());
    }

    #[test]
    fn test_verify_feature_order_rejects_wrong_length() {
        let names = vec!["Age".to_string()];
        assert!(verify_feature_order(&names).is_err());
    }

    #[test]
    fn test_clamping_out_of_range_age() {
        let mut record = in_range_record();
        record.age = 150.0;
        let (clamped, adjusted) = record.clamped();
        assert_eq!(clamped.age, 100.0);
        assert_eq!(adjusted, vec!["Age"]);
    }

    #[test]
    fn test_clamping_in_range_is_identity() {
        let record = in_range_record();
        let (clamped, adjusted) = record.clamped();
        assert_eq!(clamped, record);
        assert!(adjusted.is_empty());
    }

    fn in_range_record() -> PatientRecord {
        PatientRecord {
            age: 57.0,
            sex: 1.0,
            chest_pain_type: 4.0,
            blood_pressure: 130.0,
            cholesterol: 236.0,
            fasting_blood_sugar: 0.0,
            ekg_results: 2.0,
            max_heart_rate: 174.0,
            exercise_angina: 0.0,
            st_depression: 0.0,
            st_slope: 2.0,
            major_vessels: 1.0,
            thallium: 3.0,
        }
    }
}
