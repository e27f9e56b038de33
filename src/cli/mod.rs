//! Command-line interface
//!
//! Two subcommands mirror the two components: `train` fits and persists the
//! best candidate, `predict` scores one patient from the persisted artifacts.

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::path::{Path, PathBuf};

use crate::data;
use crate::error::Result;
use crate::inference::Predictor;
use crate::schema::PatientRecord;
use crate::training::{ModelArtifact, TrainEngine, TrainingConfig};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString {
    s.truecolor(100, 100, 100)
}
fn accent(s: &str) -> ColoredString {
    s.truecolor(120, 170, 255)
}
fn muted(s: &str) -> ColoredString {
    s.truecolor(140, 140, 140)
}
fn ok(s: &str) -> ColoredString {
    s.truecolor(100, 210, 120)
}
fn alert(s: &str) -> ColoredString {
    s.truecolor(230, 120, 110)
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn kv(key: &str, val: &str) {
    println!("  {:<26} {}", muted(key), val.white());
}

/// Render a probability as a 20-segment bar
fn risk_bar(probability: f64) -> String {
    let filled = (probability * 20.0).round() as usize;
    let filled = filled.min(20);
    format!("{}{}", "█".repeat(filled), "░".repeat(20 - filled))
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "heart-risk")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Heart disease risk: candidate training, selection, and prediction")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Sex encoding used by the model (0 = female, 1 = male)
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Sex {
    Female,
    Male,
}

/// Yes/no flags encoded as 0/1
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum YesNo {
    No,
    Yes,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train the candidate models and persist the best one
    Train {
        /// Training table: thirteen feature columns plus a "Heart Disease"
        /// label column with values Presence/Absence
        #[arg(short, long)]
        data: PathBuf,

        /// Output path for the selected model
        #[arg(long, default_value = "best_heart_model.json")]
        model_out: PathBuf,

        /// Output path for the fitted scaler
        #[arg(long, default_value = "scaler.json")]
        scaler_out: PathBuf,

        /// Seed for the holdout split and the stochastic candidates
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Predict one patient's risk using persisted artifacts
    Predict {
        /// Path to the persisted model
        #[arg(long, default_value = "best_heart_model.json")]
        model: PathBuf,

        /// Path to the persisted scaler
        #[arg(long, default_value = "scaler.json")]
        scaler: PathBuf,

        /// Age in years (20-100)
        #[arg(long)]
        age: f64,

        /// Sex
        #[arg(long, value_enum)]
        sex: Sex,

        /// Chest pain type code (1-4)
        #[arg(long)]
        chest_pain: f64,

        /// Resting blood pressure in mmHg (80-200)
        #[arg(long)]
        blood_pressure: f64,

        /// Cholesterol in mg/dL (100-600)
        #[arg(long)]
        cholesterol: f64,

        /// Fasting blood sugar above 120 mg/dL
        #[arg(long, value_enum, default_value = "no")]
        fbs_over_120: YesNo,

        /// EKG results code (0-2)
        #[arg(long, default_value = "0")]
        ekg: f64,

        /// Maximum heart rate in bpm (60-220)
        #[arg(long)]
        max_heart_rate: f64,

        /// Exercise-induced angina
        #[arg(long, value_enum, default_value = "no")]
        exercise_angina: YesNo,

        /// ST depression (0.0-6.0)
        #[arg(long, default_value = "0.0")]
        st_depression: f64,

        /// Slope of the ST segment (1-3)
        #[arg(long, default_value = "1")]
        st_slope: f64,

        /// Number of major vessels colored by fluoroscopy (0-3)
        #[arg(long, default_value = "0")]
        major_vessels: f64,

        /// Thallium stress test result (3, 6, or 7)
        #[arg(long, default_value = "3")]
        thallium: f64,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

/// Train, report the candidate comparison, persist the winner
pub fn cmd_train(
    data_path: &Path,
    model_out: &Path,
    scaler_out: &Path,
    seed: u64,
) -> Result<()> {
    section("Training");

    let dataset = data::load_dataset(data_path)?;
    step_ok(&format!(
        "loaded {} patients ({} with disease present)",
        dataset.n_samples(),
        dataset.n_positive()
    ));

    let engine = TrainEngine::new(TrainingConfig::default().with_seed(seed));
    let outcome = engine.train(&dataset)?;

    section("Candidate comparison");
    for score in &outcome.report.candidates {
        let marker = if score.family == outcome.report.selected {
            ok("›")
        } else {
            dim(" ")
        };
        println!(
            "  {} {:<22} {} {:.4}   {} {:.4}",
            marker,
            score.family,
            muted("accuracy"),
            score.accuracy,
            muted("roc-auc"),
            score.auc_roc,
        );
    }
    for (family, reason) in &outcome.report.excluded {
        println!(
            "  {} {:<22} {}",
            alert("x"),
            family.to_string(),
            dim(&format!("excluded: {}", reason))
        );
    }

    println!();
    kv("Selected model", &outcome.report.selected.to_string());
    kv("Holdout ROC-AUC", &format!("{:.4}", outcome.report.selected_auc));
    kv(
        "Holdout accuracy",
        &format!("{:.4}", outcome.report.selected_accuracy),
    );
    kv(
        "Train / holdout",
        &format!("{} / {}", outcome.report.n_train, outcome.report.n_holdout),
    );

    section("Artifacts");
    ModelArtifact::new(outcome.model).save(model_out)?;
    step_ok(&format!("model written to {}", model_out.display()));
    outcome.scaler.save(scaler_out)?;
    step_ok(&format!("scaler written to {}", scaler_out.display()));

    Ok(())
}

/// Load artifacts, score one patient, and render the assessment
pub fn cmd_predict(
    model_path: &Path,
    scaler_path: &Path,
    record: &PatientRecord,
) -> Result<()> {
    let predictor = Predictor::load(model_path, scaler_path)?;
    let assessment = predictor.predict(record)?;

    section("Prediction result");
    let headline = if assessment.disease_present {
        alert("High risk of heart disease").bold()
    } else {
        ok("Low risk of heart disease").bold()
    };
    println!("  {}", headline);
    println!(
        "  {} {}  ({})",
        accent(&risk_bar(assessment.probability)),
        assessment.probability_percent(),
        assessment.band.label()
    );

    if !assessment.key_factors.is_empty() {
        section("Key risk-contributing factors");
        println!(
            "  {}",
            dim("model-level coefficient magnitudes, not patient-specific")
        );
        for factor in &assessment.key_factors {
            println!("  {:<26} {:+.4}", factor.feature, factor.weight);
        }
    }

    section("Clinical interpretation");
    for sentence in &assessment.explanations {
        println!("  {} {}", accent("•"), sentence);
    }
    println!();

    Ok(())
}

/// Assemble a `PatientRecord` from the parsed predict arguments
#[allow(clippy::too_many_arguments)]
pub fn patient_record(
    age: f64,
    sex: Sex,
    chest_pain: f64,
    blood_pressure: f64,
    cholesterol: f64,
    fbs_over_120: YesNo,
    ekg: f64,
    max_heart_rate: f64,
    exercise_angina: YesNo,
    st_depression: f64,
    st_slope: f64,
    major_vessels: f64,
    thallium: f64,
) -> PatientRecord {
    PatientRecord {
        age,
        sex: match sex {
            Sex::Female => 0.0,
            Sex::Male => 1.0,
        },
        chest_pain_type: chest_pain,
        blood_pressure,
        cholesterol,
        fasting_blood_sugar: match fbs_over_120 {
            YesNo::No => 0.0,
            YesNo::Yes => 1.0,
        },
        ekg_results: ekg,
        max_heart_rate,
        exercise_angina: match exercise_angina {
            YesNo::No => 0.0,
            YesNo::Yes => 1.0,
        },
        st_depression,
        st_slope,
        major_vessels,
        thallium,
    }
}
