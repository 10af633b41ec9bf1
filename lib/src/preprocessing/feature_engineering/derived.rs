//! Ratio features derived from raw housing counts.
//!
//! | Output | Formula |
//! |--------|---------|
//! | `rooms_per_household` | `total_rooms / households` |
//! | `bedrooms_per_room` | `total_bedrooms / total_rooms` |
//! | `population_per_household` | `population / households` |
//!
//! Division by zero, a missing operand, or any other non-finite result
//! yields a missing value. Derivation never fails: it only adds columns.

use crate::dataset::{Column, Record, Table, Value};
use tracing::debug;

pub const TOTAL_ROOMS: &str = "total_rooms";
pub const TOTAL_BEDROOMS: &str = "total_bedrooms";
pub const POPULATION: &str = "population";
pub const HOUSEHOLDS: &str = "households";

pub const ROOMS_PER_HOUSEHOLD: &str = "rooms_per_household";
pub const BEDROOMS_PER_ROOM: &str = "bedrooms_per_room";
pub const POPULATION_PER_HOUSEHOLD: &str = "population_per_household";

/// Raw columns the derived features are computed from.
pub const SOURCE_COLUMNS: [&str; 4] = [TOTAL_ROOMS, TOTAL_BEDROOMS, POPULATION, HOUSEHOLDS];

/// Derived column names, in output order.
pub const DERIVED_COLUMNS: [&str; 3] =
    [ROOMS_PER_HOUSEHOLD, BEDROOMS_PER_ROOM, POPULATION_PER_HOUSEHOLD];

/// (output, numerator, denominator)
const RATIOS: [(&str, &str, &str); 3] = [
    (ROOMS_PER_HOUSEHOLD, TOTAL_ROOMS, HOUSEHOLDS),
    (BEDROOMS_PER_ROOM, TOTAL_BEDROOMS, TOTAL_ROOMS),
    (POPULATION_PER_HOUSEHOLD, POPULATION, HOUSEHOLDS),
];

fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let value = numerator? / denominator?;
    value.is_finite().then_some(value)
}

/// Stateless computer for the housing ratio features.
///
/// Applied identically before fitting and before every transform, so the
/// derived columns go through numeric imputation and scaling like any raw
/// column.
#[derive(Clone, Copy, Debug, Default)]
pub struct DerivedFeatureComputer;

impl DerivedFeatureComputer {
    pub fn new() -> Self {
        Self
    }

    /// Return a copy of `table` with the three derived columns.
    ///
    /// A derived column already present is replaced where it stands;
    /// otherwise the columns are appended. A source column that is absent
    /// or textual makes the affected outputs all-missing.
    pub fn compute(&self, table: &Table) -> Table {
        let n_rows = table.n_rows();
        let source = |name: &str| -> Vec<Option<f64>> {
            table
                .numeric_values(name)
                .unwrap_or_else(|_| vec![None; n_rows])
        };

        let mut output = table.clone();
        for (name, numerator, denominator) in RATIOS {
            let values: Vec<Option<f64>> = source(numerator)
                .into_iter()
                .zip(source(denominator))
                .map(|(n, d)| ratio(n, d))
                .collect();
            let n_missing = values.iter().filter(|v| v.is_none()).count();
            debug!(column = name, missing = n_missing, "derived feature computed");
            output.set_column(Column::numeric(name, values));
        }
        output
    }

    /// Apply the same derivation to a single record.
    pub fn derive_record(&self, record: &Record) -> Record {
        let get = |name: &str| record.get(name).and_then(Value::as_f64);

        let mut output = record.clone();
        for (name, numerator, denominator) in RATIOS {
            let value = ratio(get(numerator), get(denominator));
            output.insert(name.to_string(), value.into());
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn housing_table(households: Vec<Option<f64>>) -> Table {
        let n = households.len();
        Table::from_columns(vec![
            Column::numeric("total_rooms", vec![Some(880.0); n]),
            Column::numeric("total_bedrooms", vec![Some(129.0); n]),
            Column::numeric("population", vec![Some(322.0); n]),
            Column::numeric("households", households),
        ])
        .unwrap()
    }

    #[test]
    fn test_ratios() {
        let table = housing_table(vec![Some(126.0)]);
        let derived = DerivedFeatureComputer::new().compute(&table);

        let rooms = derived.numeric_values(ROOMS_PER_HOUSEHOLD).unwrap();
        let bedrooms = derived.numeric_values(BEDROOMS_PER_ROOM).unwrap();
        let population = derived.numeric_values(POPULATION_PER_HOUSEHOLD).unwrap();

        assert!((rooms[0].unwrap() - 880.0 / 126.0).abs() < 1e-12);
        assert!((bedrooms[0].unwrap() - 129.0 / 880.0).abs() < 1e-12);
        assert!((population[0].unwrap() - 322.0 / 126.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_households_yields_missing() {
        let table = housing_table(vec![Some(0.0), Some(10.0)]);
        let derived = DerivedFeatureComputer::new().compute(&table);

        let rooms = derived.numeric_values(ROOMS_PER_HOUSEHOLD).unwrap();
        let population = derived.numeric_values(POPULATION_PER_HOUSEHOLD).unwrap();
        assert_eq!(rooms[0], None);
        assert_eq!(population[0], None);
        assert_eq!(rooms[1], Some(88.0));

        // bedrooms_per_room does not depend on households
        let bedrooms = derived.numeric_values(BEDROOMS_PER_ROOM).unwrap();
        assert!(bedrooms[0].is_some());
    }

    #[test]
    fn test_zero_over_zero_yields_missing() {
        let table = Table::from_columns(vec![
            Column::numeric("total_rooms", vec![Some(0.0)]),
            Column::numeric("total_bedrooms", vec![Some(0.0)]),
        ])
        .unwrap();
        let derived = DerivedFeatureComputer::new().compute(&table);
        assert_eq!(derived.numeric_values(BEDROOMS_PER_ROOM).unwrap(), vec![None]);
    }

    #[test]
    fn test_missing_operand_yields_missing() {
        let table = housing_table(vec![None]);
        let derived = DerivedFeatureComputer::new().compute(&table);
        assert_eq!(
            derived.numeric_values(ROOMS_PER_HOUSEHOLD).unwrap(),
            vec![None]
        );
    }

    #[test]
    fn test_absent_source_column_never_fails() {
        let table = Table::from_columns(vec![Column::text(
            "ocean_proximity",
            vec![Some("INLAND".to_string())],
        )])
        .unwrap();
        let derived = DerivedFeatureComputer::new().compute(&table);

        assert_eq!(derived.n_columns(), 4);
        for name in DERIVED_COLUMNS {
            assert!(derived.column(name).unwrap().is_all_missing());
        }
    }

    #[test]
    fn test_input_not_mutated_and_columns_appended() {
        let table = housing_table(vec![Some(2.0)]);
        let derived = DerivedFeatureComputer::new().compute(&table);

        assert_eq!(table.n_columns(), 4);
        assert_eq!(
            derived.column_names(),
            vec![
                "total_rooms",
                "total_bedrooms",
                "population",
                "households",
                "rooms_per_household",
                "bedrooms_per_room",
                "population_per_household",
            ]
        );
    }

    #[test]
    fn test_existing_derived_column_replaced_in_place() {
        let mut table = housing_table(vec![Some(2.0)]);
        table
            .upsert_column(Column::numeric(BEDROOMS_PER_ROOM, vec![Some(-1.0)]))
            .unwrap();

        let derived = DerivedFeatureComputer::new().compute(&table);
        assert_eq!(derived.column_names()[4], BEDROOMS_PER_ROOM);
        assert_eq!(derived.n_columns(), 7);
        assert!(derived.numeric_values(BEDROOMS_PER_ROOM).unwrap()[0].unwrap() > 0.0);
    }

    #[test]
    fn test_derived_columns_always_present() {
        let mut table = housing_table(vec![Some(2.0), Some(4.0)]);
        table
            .upsert_column(Column::text(
                ROOMS_PER_HOUSEHOLD,
                vec![Some("stale".to_string()), None],
            ))
            .unwrap();

        let derived = DerivedFeatureComputer::new().compute(&table);
        for name in DERIVED_COLUMNS {
            assert!(derived.column(name).is_some_and(|c| c.is_numeric()), "{name}");
        }
        assert_eq!(derived.column_names()[4], ROOMS_PER_HOUSEHOLD);

        let empty = DerivedFeatureComputer::new().compute(&Table::new());
        assert_eq!(empty.column_names(), DERIVED_COLUMNS.to_vec());
        assert_eq!(empty.n_rows(), 0);
    }

    #[test]
    fn test_derive_record() {
        let mut record = Record::new();
        record.insert("total_rooms".into(), Value::Number(100.0));
        record.insert("total_bedrooms".into(), Value::Number(20.0));
        record.insert("population".into(), Value::Number(50.0));
        record.insert("households".into(), Value::Number(0.0));

        let derived = DerivedFeatureComputer::new().derive_record(&record);
        assert_eq!(derived[ROOMS_PER_HOUSEHOLD], Value::Missing);
        assert_eq!(derived[POPULATION_PER_HOUSEHOLD], Value::Missing);
        assert_eq!(derived[BEDROOMS_PER_ROOM], Value::Number(0.2));
        assert_eq!(record.len(), 4);
    }
}
