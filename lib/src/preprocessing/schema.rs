//! Column classification and the declared feature schema.
//!
//! [`ColumnClassifier`] separates the target from the features and sorts the
//! feature columns by runtime value type. The resulting [`Schema`] is frozen
//! when a preprocessor is fitted and every later table is validated against
//! it, so a column never silently changes role between fit and transform.

use crate::dataset::{Column, Table};
use crate::preprocessing::error::PreprocessingError;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::info;

/// Semantic role of a feature column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Median-imputed and standardized.
    Numeric,
    /// Sentinel-imputed and one-hot encoded.
    Categorical,
    /// Numeric column copied to the output untouched.
    Passthrough,
}

impl ColumnKind {
    fn accepts(&self, column: &Column) -> bool {
        if column.is_all_missing() {
            return true;
        }
        match self {
            ColumnKind::Numeric | ColumnKind::Passthrough => column.is_numeric(),
            ColumnKind::Categorical => column.is_text(),
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Categorical => write!(f, "categorical"),
            ColumnKind::Passthrough => write!(f, "passthrough"),
        }
    }
}

/// One schema entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchemaColumn {
    pub name: String,
    pub kind: ColumnKind,
}

/// Ordered list of feature columns and their kinds.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<SchemaColumn>,
}

impl Schema {
    /// Declare a schema explicitly. Duplicate names are rejected.
    pub fn new<I, S>(columns: I) -> Result<Self, PreprocessingError>
    where
        I: IntoIterator<Item = (S, ColumnKind)>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for (name, kind) in columns {
            let name = name.into();
            if !seen.insert(name.clone()) {
                return Err(PreprocessingError::Configuration(format!(
                    "column '{}' declared twice in schema",
                    name
                )));
            }
            entries.push(SchemaColumn { name, kind });
        }
        Ok(Self { columns: entries })
    }

    /// Classify by value type: numeric columns are [`ColumnKind::Numeric`],
    /// text columns [`ColumnKind::Categorical`].
    pub fn infer(features: &Table) -> Self {
        let columns = features
            .columns()
            .iter()
            .map(|c| SchemaColumn {
                name: c.name().to_string(),
                kind: if c.is_numeric() {
                    ColumnKind::Numeric
                } else {
                    ColumnKind::Categorical
                },
            })
            .collect();
        Self { columns }
    }

    pub fn columns(&self) -> &[SchemaColumn] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn kind(&self, name: &str) -> Option<ColumnKind> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.kind)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.kind(name).is_some()
    }

    /// Names of the columns of one kind, in schema order.
    pub fn names_of(&self, kind: ColumnKind) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn numeric(&self) -> Vec<String> {
        self.names_of(ColumnKind::Numeric)
    }

    pub fn categorical(&self) -> Vec<String> {
        self.names_of(ColumnKind::Categorical)
    }

    pub fn passthrough(&self) -> Vec<String> {
        self.names_of(ColumnKind::Passthrough)
    }

    /// Check that `table` carries exactly the schema columns with compatible
    /// value types. The `ignored` column (the target) may be present or not.
    ///
    /// Missing columns are reported before type problems, and type problems
    /// before unexpected columns.
    pub fn validate(&self, table: &Table, ignored: Option<&str>) -> Result<(), PreprocessingError> {
        for entry in &self.columns {
            let column = table
                .column(&entry.name)
                .ok_or_else(|| PreprocessingError::missing_column(&entry.name))?;
            if !entry.kind.accepts(column) {
                return Err(PreprocessingError::SchemaMismatch {
                    column: entry.name.clone(),
                    reason: format!(
                        "declared {} but holds {} values",
                        entry.kind,
                        if column.is_numeric() { "numeric" } else { "text" }
                    ),
                });
            }
        }

        if let Some(extra) = table
            .column_names()
            .into_iter()
            .find(|name| Some(*name) != ignored && !self.contains(name))
        {
            return Err(PreprocessingError::unexpected_column(extra));
        }
        Ok(())
    }
}

/// Output of [`ColumnClassifier::classify`].
#[derive(Clone, Debug)]
pub struct Classification {
    /// Input table without the target column.
    pub features: Table,
    /// Target values; missing targets are NaN.
    pub target: Array1<f64>,
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
}

impl Classification {
    /// The inferred schema of the feature table.
    pub fn schema(&self) -> Schema {
        Schema::infer(&self.features)
    }
}

/// Splits a table into features and target and sorts features by value type.
#[derive(Clone, Debug)]
pub struct ColumnClassifier {
    target: String,
}

impl ColumnClassifier {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Extract only the target vector.
    pub fn target_values(&self, table: &Table) -> Result<Array1<f64>, PreprocessingError> {
        let column = table.column(&self.target).ok_or_else(|| {
            PreprocessingError::Configuration(format!(
                "target column '{}' not found",
                self.target
            ))
        })?;
        let values = match column.as_numeric() {
            Some(values) => values.to_vec(),
            None if column.is_all_missing() => vec![None; column.len()],
            None => {
                return Err(PreprocessingError::Configuration(format!(
                    "target column '{}' is not numeric",
                    self.target
                )))
            }
        };
        Ok(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }

    pub fn classify(&self, table: &Table) -> Result<Classification, PreprocessingError> {
        let target = self.target_values(table)?;
        let features = table.without_column(&self.target);
        let schema = Schema::infer(&features);
        let numeric = schema.numeric();
        let categorical = schema.categorical();

        info!(
            numeric = numeric.len(),
            categorical = categorical.len(),
            target = %self.target,
            "features classified"
        );

        Ok(Classification {
            features,
            target,
            numeric,
            categorical,
        })
    }
}
