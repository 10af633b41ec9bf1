//! Fit the housing preprocessor on the training split and persist it.
//!
//! Usage: `prepare_data [config.json]`
//!
//! Reads the configured CSV, splits it, fits on the training rows and writes
//! `preprocessor_<timestamp>.bin` plus a JSON summary into the configured
//! output directory. Set `RUST_LOG=debug` for per-step logs.

use benchmarks::data::CaliforniaHousingDataset;
use chrono::Local;
use housing_prep::config::PipelineConfig;
use housing_prep::training::{
    prepare_data_for_training, ARTIFACT_EXTENSION, PREPROCESSOR_PREFIX,
};
use serde_json::json;
use std::error::Error;
use std::fs;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.json".to_string());
    let config = if Path::new(&config_path).exists() {
        PipelineConfig::from_json_file(&config_path)?
    } else {
        info!(path = %config_path, "config file not found, using defaults");
        PipelineConfig::default()
    };

    let dataset = CaliforniaHousingDataset::load(&config.data_file)?;
    info!(
        path = %config.data_file.display(),
        rows = dataset.len(),
        columns = dataset.table().n_columns(),
        "dataset loaded"
    );

    let prepared = prepare_data_for_training(dataset.table(), &config)?;

    fs::create_dir_all(&config.model_output_dir)?;
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let artifact = config
        .model_output_dir
        .join(format!("{PREPROCESSOR_PREFIX}{timestamp}.{ARTIFACT_EXTENSION}"));
    prepared.preprocessor.persist(&artifact)?;

    let summary = json!({
        "artifact": artifact.display().to_string(),
        "target_column": config.target_column,
        "train_rows": prepared.x_train.nrows(),
        "test_rows": prepared.x_test.nrows(),
        "feature_names": prepared.feature_names,
    });
    let summary_path = config
        .model_output_dir
        .join(format!("{PREPROCESSOR_PREFIX}{timestamp}.json"));
    fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)?;

    info!(
        artifact = %artifact.display(),
        features = prepared.feature_names.len(),
        "preprocessor saved"
    );
    println!("Train matrix: {:?}", prepared.x_train.dim());
    println!("Test matrix:  {:?}", prepared.x_test.dim());
    println!("Artifact:     {}", artifact.display());

    Ok(())
}
