//! heart-risk - Main Entry Point
//!
//! Trains heart-disease risk classifiers and serves single-patient
//! predictions from the persisted artifacts.

use clap::Parser;
use heart_risk::cli::{cmd_predict, cmd_train, patient_record, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "heart_risk=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            data,
            model_out,
            scaler_out,
            seed,
        } => {
            cmd_train(&data, &model_out, &scaler_out, seed)?;
        }
        Commands::Predict {
            model,
            scaler,
            age,
            sex,
            chest_pain,
            blood_pressure,
            cholesterol,
            fbs_over_120,
            ekg,
            max_heart_rate,
            exercise_angina,
            st_depression,
            st_slope,
            major_vessels,
            thallium,
        } => {
            let record = patient_record(
                age,
                sex,
                chest_pain,
                blood_pressure,
                cholesterol,
                fbs_over_120,
                ekg,
                max_heart_rate,
                exercise_angina,
                st_depression,
                st_slope,
                major_vessels,
                thallium,
            );
            cmd_predict(&model, &scaler, &record)?;
        }
    }

    Ok(())
}
