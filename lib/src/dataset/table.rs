//! In-memory columnar tables.
//!
//! A [`Table`] is an ordered list of equally long, uniquely named columns.
//! Each column is either numeric or textual; missing cells are `None`.
//! Non-finite numbers are normalised to missing when a column is built, so
//! every `Some(f64)` stored in a table is finite.

use crate::preprocessing::error::PreprocessingError;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::info;

/// Cell tokens read as missing values from delimited text.
const MISSING_TOKENS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "NULL", "null"];

/// A single cell value.
///
/// Deserializes untagged, so a JSON record such as
/// `{"households": 126.0, "ocean_proximity": "NEAR BAY", "total_bedrooms": null}`
/// maps directly onto a [`Record`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    Missing,
}

impl Value {
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Number(v) => !v.is_finite(),
            Value::Text(_) => false,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Missing)
    }
}

/// One observation: column name to value.
pub type Record = BTreeMap<String, Value>;

/// Values of a single column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take(&self, indices: &[usize]) -> ColumnData {
        match self {
            ColumnData::Numeric(v) => ColumnData::Numeric(indices.iter().map(|&i| v[i]).collect()),
            ColumnData::Text(v) => {
                ColumnData::Text(indices.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }
}

/// A named column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    /// Numeric column; non-finite values become missing.
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        let values = values
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();
        Self {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    pub fn text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Text(values),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.data, ColumnData::Numeric(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self.data, ColumnData::Text(_))
    }

    /// True when no cell holds a value. Such a column carries no type
    /// information and is compatible with any declared kind.
    pub fn is_all_missing(&self) -> bool {
        match &self.data {
            ColumnData::Numeric(v) => v.iter().all(Option::is_none),
            ColumnData::Text(v) => v.iter().all(Option::is_none),
        }
    }

    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match &self.data {
            ColumnData::Numeric(v) => Some(v),
            ColumnData::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&[Option<String>]> {
        match &self.data {
            ColumnData::Text(v) => Some(v),
            ColumnData::Numeric(_) => None,
        }
    }

    pub fn value(&self, row: usize) -> Value {
        match &self.data {
            ColumnData::Numeric(v) => v[row].map(Value::Number).unwrap_or(Value::Missing),
            ColumnData::Text(v) => v[row].clone().map(Value::Text).unwrap_or(Value::Missing),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self.data {
            ColumnData::Numeric(_) => "numeric",
            ColumnData::Text(_) => "text",
        }
    }
}

/// Ordered collection of equally long named columns.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from columns, checking lengths and name uniqueness.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, PreprocessingError> {
        let mut table = Table::new();
        for column in columns {
            table.push_column(column)?;
        }
        Ok(table)
    }

    /// Build a table from row records.
    ///
    /// Column order is first-seen order. A key absent from a record is a
    /// missing cell. A column containing any text value is textual; mixing
    /// numbers and text in one column is rejected.
    pub fn from_records(records: &[Record]) -> Result<Self, PreprocessingError> {
        let mut order: Vec<&str> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for record in records {
            for key in record.keys() {
                if seen.insert(key.as_str()) {
                    order.push(key.as_str());
                }
            }
        }

        let mut columns = Vec::with_capacity(order.len());
        for name in order {
            let cells: Vec<&Value> = records
                .iter()
                .map(|r| r.get(name).unwrap_or(&Value::Missing))
                .collect();
            let has_text = cells.iter().any(|v| matches!(v, Value::Text(_)));
            let has_number = cells.iter().any(|v| v.as_f64().is_some());

            let column = match (has_text, has_number) {
                (true, true) => {
                    return Err(PreprocessingError::SchemaMismatch {
                        column: name.to_string(),
                        reason: "mixes numeric and text values".to_string(),
                    })
                }
                (true, false) => Column::text(
                    name,
                    cells.iter().map(|v| v.as_str().map(str::to_string)).collect(),
                ),
                _ => Column::numeric(name, cells.iter().map(|v| v.as_f64()).collect()),
            };
            columns.push(column);
        }

        Table::from_columns(columns)
    }

    /// Read delimited text with a header row.
    ///
    /// A column whose every non-missing cell parses as `f64` is numeric,
    /// otherwise it is textual.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, PreprocessingError> {
        let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

        let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
        for result in rdr.records() {
            let record = result?;
            for (col, cell) in record.iter().enumerate() {
                let cell = if MISSING_TOKENS.contains(&cell) {
                    None
                } else {
                    Some(cell.to_string())
                };
                raw[col].push(cell);
            }
        }

        let columns = headers
            .into_iter()
            .zip(raw)
            .map(|(name, cells)| {
                let parsed: Option<Vec<Option<f64>>> = cells
                    .iter()
                    .map(|cell| match cell {
                        None => Some(None),
                        Some(s) => s.trim().parse::<f64>().ok().map(Some),
                    })
                    .collect();
                match parsed {
                    Some(values) => Column::numeric(name, values),
                    None => Column::text(name, cells),
                }
            })
            .collect();

        Table::from_columns(columns)
    }

    /// Read a CSV file with a header row.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, PreprocessingError> {
        let file = File::open(path.as_ref())?;
        let table = Self::from_csv_reader(BufReader::new(file))?;
        info!(
            path = %path.as_ref().display(),
            rows = table.n_rows(),
            columns = table.n_columns(),
            "dataset loaded"
        );
        Ok(table)
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Numeric values of a column.
    ///
    /// An all-missing textual column is read as all-missing numeric.
    pub fn numeric_values(&self, name: &str) -> Result<Vec<Option<f64>>, PreprocessingError> {
        let column = self
            .column(name)
            .ok_or_else(|| PreprocessingError::missing_column(name))?;
        match column.as_numeric() {
            Some(values) => Ok(values.to_vec()),
            None if column.is_all_missing() => Ok(vec![None; column.len()]),
            None => Err(type_mismatch(column, "numeric")),
        }
    }

    /// Text values of a column.
    ///
    /// An all-missing numeric column is read as all-missing text.
    pub fn text_values(&self, name: &str) -> Result<Vec<Option<String>>, PreprocessingError> {
        let column = self
            .column(name)
            .ok_or_else(|| PreprocessingError::missing_column(name))?;
        match column.as_text() {
            Some(values) => Ok(values.to_vec()),
            None if column.is_all_missing() => Ok(vec![None; column.len()]),
            None => Err(type_mismatch(column, "text")),
        }
    }

    /// Append a column.
    pub fn push_column(&mut self, column: Column) -> Result<(), PreprocessingError> {
        if self.contains(column.name()) {
            return Err(PreprocessingError::InvalidParameter(format!(
                "duplicate column '{}'",
                column.name()
            )));
        }
        if !self.columns.is_empty() && column.len() != self.n_rows() {
            return Err(PreprocessingError::InvalidParameter(format!(
                "column '{}' has {} rows, table has {}",
                column.name(),
                column.len(),
                self.n_rows()
            )));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Replace a column with the same name in place, or append it.
    pub fn upsert_column(&mut self, column: Column) -> Result<(), PreprocessingError> {
        match self.columns.iter().position(|c| c.name == column.name) {
            Some(idx) => {
                if column.len() != self.n_rows() {
                    return Err(PreprocessingError::InvalidParameter(format!(
                        "column '{}' has {} rows, table has {}",
                        column.name(),
                        column.len(),
                        self.n_rows()
                    )));
                }
                self.columns[idx] = column;
                Ok(())
            }
            None => self.push_column(column),
        }
    }

    /// Replace the column of the same name in place, or append it.
    ///
    /// Only for columns built from this table's own rows, so the length
    /// always matches.
    pub(crate) fn set_column(&mut self, column: Column) {
        debug_assert!(self.columns.is_empty() || column.len() == self.n_rows());
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(slot) => *slot = column,
            None => self.columns.push(column),
        }
    }

    /// Copy of the table without the named column.
    pub fn without_column(&self, name: &str) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .filter(|c| c.name != name)
                .cloned()
                .collect(),
        }
    }

    /// Copy of the selected rows, in the given order.
    pub fn take_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    data: c.data.take(indices),
                })
                .collect(),
        }
    }

    /// Row `idx` as a record. Missing cells are kept as [`Value::Missing`].
    pub fn record(&self, idx: usize) -> Record {
        self.columns
            .iter()
            .map(|c| (c.name.clone(), c.value(idx)))
            .collect()
    }
}

fn type_mismatch(column: &Column, expected: &str) -> PreprocessingError {
    PreprocessingError::SchemaMismatch {
        column: column.name().to_string(),
        reason: format!("expected {} values, found {}", expected, column.kind_name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_from_csv_reader_infers_types() {
        let csv = "total_rooms,total_bedrooms,ocean_proximity\n\
                   880,129,NEAR BAY\n\
                   7099,,INLAND\n";
        let table = Table::from_csv_reader(csv.as_bytes()).unwrap();

        assert_eq!(table.n_rows(), 2);
        assert_eq!(
            table.column_names(),
            vec!["total_rooms", "total_bedrooms", "ocean_proximity"]
        );
        assert!(table.column("total_rooms").unwrap().is_numeric());
        assert!(table.column("ocean_proximity").unwrap().is_text());
        assert_eq!(
            table.numeric_values("total_bedrooms").unwrap(),
            vec![Some(129.0), None]
        );
    }

    #[test]
    fn test_from_csv_reader_all_missing_column_is_numeric() {
        let csv = "a,b\n1,\n2,NA\n";
        let table = Table::from_csv_reader(csv.as_bytes()).unwrap();
        let b = table.column("b").unwrap();
        assert!(b.is_numeric());
        assert!(b.is_all_missing());
    }

    #[test]
    fn test_from_csv_reader_ragged_rows() {
        let csv = "a,b\n1,2\n3\n";
        assert!(Table::from_csv_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_from_records_column_order_and_missing_keys() {
        let records = vec![
            record(&[("households", 126.0.into()), ("ocean_proximity", "NEAR BAY".into())]),
            record(&[("households", 0.0.into())]),
        ];
        let table = Table::from_records(&records).unwrap();

        assert_eq!(table.n_rows(), 2);
        assert_eq!(
            table.text_values("ocean_proximity").unwrap(),
            vec![Some("NEAR BAY".to_string()), None]
        );
    }

    #[test]
    fn test_from_records_rejects_mixed_types() {
        let records = vec![
            record(&[("total_rooms", 880.0.into())]),
            record(&[("total_rooms", "many".into())]),
        ];
        let err = Table::from_records(&records).unwrap_err();
        assert_eq!(err.column(), Some("total_rooms"));
    }

    #[test]
    fn test_numeric_column_drops_non_finite() {
        let column = Column::numeric("x", vec![Some(1.0), Some(f64::INFINITY), Some(f64::NAN)]);
        assert_eq!(column.as_numeric().unwrap(), &[Some(1.0), None, None]);
    }

    #[test]
    fn test_push_column_length_mismatch() {
        let mut table = Table::from_columns(vec![Column::numeric("a", vec![Some(1.0)])]).unwrap();
        let result = table.push_column(Column::numeric("b", vec![Some(1.0), Some(2.0)]));
        assert!(matches!(result, Err(PreprocessingError::InvalidParameter(_))));
    }

    #[test]
    fn test_push_column_duplicate_name() {
        let mut table = Table::from_columns(vec![Column::numeric("a", vec![Some(1.0)])]).unwrap();
        assert!(table.push_column(Column::numeric("a", vec![Some(2.0)])).is_err());
    }

    #[test]
    fn test_upsert_keeps_position() {
        let mut table = Table::from_columns(vec![
            Column::numeric("a", vec![Some(1.0)]),
            Column::numeric("b", vec![Some(2.0)]),
        ])
        .unwrap();
        table
            .upsert_column(Column::numeric("a", vec![Some(9.0)]))
            .unwrap();
        assert_eq!(table.column_names(), vec!["a", "b"]);
        assert_eq!(table.numeric_values("a").unwrap(), vec![Some(9.0)]);
    }

    #[test]
    fn test_set_column_replaces_or_appends() {
        let mut table = Table::from_columns(vec![
            Column::numeric("a", vec![Some(1.0)]),
            Column::text("b", vec![Some("x".to_string())]),
        ])
        .unwrap();

        table.set_column(Column::numeric("b", vec![Some(2.0)]));
        table.set_column(Column::numeric("c", vec![None]));
        assert_eq!(table.column_names(), vec!["a", "b", "c"]);
        assert_eq!(table.numeric_values("b").unwrap(), vec![Some(2.0)]);
    }

    #[test]
    fn test_take_rows_and_without_column() {
        let table = Table::from_columns(vec![
            Column::numeric("a", vec![Some(1.0), Some(2.0), Some(3.0)]),
            Column::text(
                "b",
                vec![Some("x".to_string()), Some("y".to_string()), None],
            ),
        ])
        .unwrap();

        let subset = table.take_rows(&[2, 0]);
        assert_eq!(subset.numeric_values("a").unwrap(), vec![Some(3.0), Some(1.0)]);

        let dropped = table.without_column("b");
        assert_eq!(dropped.column_names(), vec!["a"]);
        assert_eq!(table.n_columns(), 2);
    }

    #[test]
    fn test_numeric_values_type_mismatch() {
        let table = Table::from_columns(vec![Column::text(
            "ocean_proximity",
            vec![Some("INLAND".to_string())],
        )])
        .unwrap();
        let err = table.numeric_values("ocean_proximity").unwrap_err();
        assert!(matches!(err, PreprocessingError::SchemaMismatch { .. }));
        assert!(matches!(
            table.numeric_values("households"),
            Err(PreprocessingError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_value_deserializes_untagged() {
        let json =
            r#"{"households": 126.0, "ocean_proximity": "NEAR BAY", "total_bedrooms": null}"#;
        let rec: Record = serde_json::from_str(json).unwrap();
        assert_eq!(rec["households"], Value::Number(126.0));
        assert_eq!(rec["ocean_proximity"], Value::Text("NEAR BAY".to_string()));
        assert_eq!(rec["total_bedrooms"], Value::Missing);
    }

    #[test]
    fn test_record_roundtrip() {
        let table = Table::from_columns(vec![Column::numeric("a", vec![None, Some(2.0)])]).unwrap();
        assert_eq!(table.record(0)["a"], Value::Missing);
        assert_eq!(table.record(1)["a"], Value::Number(2.0));
    }
}
