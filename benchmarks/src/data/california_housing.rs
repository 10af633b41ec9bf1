use housing_prep::dataset::{Column, Table};
use housing_prep::PreprocessingError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;

/// Ocean proximity labels as they appear in the California housing CSV.
pub const OCEAN_PROXIMITY: [&str; 5] =
    ["<1H OCEAN", "INLAND", "NEAR OCEAN", "NEAR BAY", "ISLAND"];

/// California Housing dataset loader.
///
/// Wraps the raw housing table: 8 numeric block-group measurements,
/// the `ocean_proximity` label and the `median_house_value` target.
/// `total_bedrooms` has gaps in the published file, which are kept as
/// missing cells.
#[derive(Debug, Clone)]
pub struct CaliforniaHousingDataset {
    table: Table,
}

impl CaliforniaHousingDataset {
    /// Load the dataset from a CSV file with a header row.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use benchmarks::data::CaliforniaHousingDataset;
    ///
    /// let dataset = CaliforniaHousingDataset::load("data/housing.csv").unwrap();
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PreprocessingError> {
        Ok(Self {
            table: Table::from_csv_path(path)?,
        })
    }

    /// Generate `n_samples` plausible districts from a fixed seed.
    ///
    /// Roughly 1% of `total_bedrooms` cells are left missing and a handful
    /// of districts have zero households, so the generated table exercises
    /// imputation and the division guards the same way the real file does.
    pub fn synthetic(n_samples: usize, seed: u64) -> Result<Self, PreprocessingError> {
        let mut rng = StdRng::seed_from_u64(seed);

        let mut longitude = Vec::with_capacity(n_samples);
        let mut latitude = Vec::with_capacity(n_samples);
        let mut age = Vec::with_capacity(n_samples);
        let mut rooms = Vec::with_capacity(n_samples);
        let mut bedrooms = Vec::with_capacity(n_samples);
        let mut population = Vec::with_capacity(n_samples);
        let mut households = Vec::with_capacity(n_samples);
        let mut income = Vec::with_capacity(n_samples);
        let mut proximity = Vec::with_capacity(n_samples);
        let mut value = Vec::with_capacity(n_samples);

        for _ in 0..n_samples {
            let total_rooms: f64 = rng.gen_range(200.0..8000.0);
            let n_households: f64 = if rng.gen_bool(0.002) {
                0.0
            } else {
                (total_rooms / rng.gen_range(3.0..7.0)).round()
            };
            let median_income: f64 = rng.gen_range(0.5..15.0);

            longitude.push(Some(rng.gen_range(-124.3..-114.3)));
            latitude.push(Some(rng.gen_range(32.5..42.0)));
            age.push(Some(rng.gen_range(1..53) as f64));
            rooms.push(Some(total_rooms));
            bedrooms.push(if rng.gen_bool(0.01) {
                None
            } else {
                Some((total_rooms * rng.gen_range(0.15..0.3)).round())
            });
            population.push(Some((n_households * rng.gen_range(2.0..4.0)).round()));
            households.push(Some(n_households));
            income.push(Some(median_income));
            proximity.push(Some(
                OCEAN_PROXIMITY[rng.gen_range(0..OCEAN_PROXIMITY.len() - 1)].to_string(),
            ));
            let noise: f64 = rng.gen_range(-20_000.0..20_000.0);
            value.push(Some((median_income * 40_000.0 + noise).clamp(15_000.0, 500_001.0)));
        }

        let table = Table::from_columns(vec![
            Column::numeric("longitude", longitude),
            Column::numeric("latitude", latitude),
            Column::numeric("housing_median_age", age),
            Column::numeric("total_rooms", rooms),
            Column::numeric("total_bedrooms", bedrooms),
            Column::numeric("population", population),
            Column::numeric("households", households),
            Column::numeric("median_income", income),
            Column::text("ocean_proximity", proximity),
            Column::numeric("median_house_value", value),
        ])?;
        Ok(Self { table })
    }

    /// Number of districts.
    pub fn len(&self) -> usize {
        self.table.n_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn into_table(self) -> Table {
        self.table
    }
}
