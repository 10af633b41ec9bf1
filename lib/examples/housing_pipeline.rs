//! End-to-end housing preprocessing example.
//!
//! Demonstrates the full lifecycle of the preprocessor:
//! - Loading a small housing table from CSV text
//! - Seeded train/test split
//! - Fitting on the training split only
//! - Persisting the fitted state and reloading it
//! - Serving predictions through a stand-in model
//!
//! Run with: RUST_LOG=debug cargo run --example housing_pipeline

use housing_prep::config::PipelineConfig;
use housing_prep::dataset::Table;
use housing_prep::serving::{HousingFeatures, Regressor, ServiceContext};
use housing_prep::training::prepare_data_for_training;
use housing_prep::Preprocessor;
use ndarray::{Array1, Array2};
use std::error::Error;
use tracing_subscriber::EnvFilter;

const CSV: &str = "\
longitude,latitude,housing_median_age,total_rooms,total_bedrooms,\
population,households,median_income,median_house_value,ocean_proximity
-122.23,37.88,41.0,880.0,129.0,322.0,126.0,8.3252,452600.0,NEAR BAY
-122.22,37.86,21.0,7099.0,1106.0,2401.0,1138.0,8.3014,358500.0,NEAR BAY
-122.24,37.85,52.0,1467.0,190.0,496.0,177.0,7.2574,352100.0,NEAR BAY
-122.25,37.85,52.0,1274.0,235.0,558.0,219.0,5.6431,341300.0,NEAR BAY
-121.25,38.52,16.0,2330.0,,1270.0,405.0,3.5625,118200.0,INLAND
-119.78,36.76,27.0,2516.0,527.0,1563.0,502.0,2.6114,72900.0,INLAND
-120.99,37.64,35.0,1890.0,401.0,1117.0,0.0,2.2800,95600.0,INLAND
-118.41,34.02,33.0,3110.0,600.0,1300.0,580.0,6.1150,500001.0,<1H OCEAN
-118.28,34.05,38.0,2600.0,650.0,2400.0,620.0,2.1500,187500.0,<1H OCEAN
-117.91,33.65,24.0,3300.0,,1700.0,640.0,4.9800,289000.0,<1H OCEAN
-117.16,32.72,45.0,1962.0,480.0,1050.0,455.0,2.8990,205300.0,NEAR OCEAN
-120.65,35.28,18.0,2050.0,390.0,980.0,360.0,3.7000,241000.0,NEAR OCEAN
-121.89,37.33,29.0,2900.0,610.0,1750.0,590.0,4.4000,265000.0,
-118.32,33.35,27.0,1675.0,521.0,744.0,331.0,2.1579,450000.0,ISLAND
";

/// Scores a district by income alone; stands in for a trained model.
struct IncomeModel {
    income_column: usize,
}

impl Regressor for IncomeModel {
    fn predict(&self, features: &Array2<f64>) -> Array1<f64> {
        features
            .column(self.income_column)
            .mapv(|z| 200_000.0 + 80_000.0 * z)
    }

    fn name(&self) -> &str {
        "income_baseline"
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Housing Preprocessing Pipeline ===\n");

    // 1. Load raw data
    let table = Table::from_csv_reader(CSV.as_bytes())?;
    println!(
        "Raw table: {} rows, columns {:?}",
        table.n_rows(),
        table.column_names()
    );

    // 2. Split and fit on the training rows
    let config = PipelineConfig::default().with_test_size(0.25);
    let prepared = prepare_data_for_training(&table, &config)?;
    println!("\nTrain matrix: {:?}", prepared.x_train.dim());
    println!("Test matrix:  {:?}", prepared.x_test.dim());
    println!("Output features:");
    for (i, name) in prepared.feature_names.iter().enumerate() {
        println!("  {:>2}: {}", i, name);
    }

    // 3. Persist and reload
    let dir = std::env::temp_dir().join("housing_prep_example");
    std::fs::create_dir_all(&dir)?;
    let path = dir.join("preprocessor_example.bin");
    prepared.preprocessor.persist(&path)?;
    let reloaded = Preprocessor::load_from_file(&path)?;
    println!("\nReloaded preprocessor: {:?}", reloaded.status());

    let original = prepared.preprocessor.transform(&table)?;
    let replayed = reloaded.transform(&table)?;
    println!("Reloaded output identical: {}", original == replayed);

    // 4. Serve a request
    let income_column = prepared
        .feature_names
        .iter()
        .position(|name| name == "median_income")
        .ok_or("median_income missing from output")?;
    let context = ServiceContext::new(reloaded, Box::new(IncomeModel { income_column }))?;

    let request = HousingFeatures {
        longitude: -122.1,
        latitude: 37.7,
        housing_median_age: 30.0,
        total_rooms: 2100.0,
        total_bedrooms: 420.0,
        population: 1100.0,
        households: 400.0,
        median_income: 5.2,
        ocean_proximity: "NEAR BAY".to_string(),
    };
    let response = context.predict(std::slice::from_ref(&request))?;
    println!(
        "\nPrediction from '{}': {:.0}",
        response.model_name, response.predictions[0]
    );
    println!("Health: {:?}", context.health());

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}
