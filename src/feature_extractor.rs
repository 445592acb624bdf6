//! Column-wise preprocessing for transaction tables.
//!
//! A [`FeatureSchema`] is computed once from a table and records which
//! columns are standardized, which are one-hot encoded and which are dropped.
//! [`FeatureExtractor`] is the unfitted plan; fitting it on a training table
//! yields a [`FittedExtractor`] whose statistics and vocabularies are frozen
//! and applied identically to every later table.

use crate::error::{FraudError, Result};
use crate::types::{ColumnKind, Table, Value};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Explicit partition of a table's feature columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    label: String,
    numeric: Vec<String>,
    categorical: Vec<String>,
    dropped: Vec<String>,
}

impl FeatureSchema {
    /// Classify every column except `label`, in table order.
    pub fn infer(table: &Table, label: &str) -> Result<Self> {
        if !table.has_column(label) {
            return Err(FraudError::MissingColumn(label.to_string()));
        }

        let mut numeric = Vec::new();
        let mut categorical = Vec::new();
        let mut dropped = Vec::new();

        for (idx, name) in table.columns().iter().enumerate() {
            if name == label {
                continue;
            }
            match table.column_kind(idx) {
                ColumnKind::Numeric => numeric.push(name.clone()),
                ColumnKind::Categorical => categorical.push(name.clone()),
                ColumnKind::Boolean | ColumnKind::Empty => dropped.push(name.clone()),
            }
        }

        if numeric.is_empty() && categorical.is_empty() {
            return Err(FraudError::MalformedInput(
                "table has no numeric or categorical feature columns".into(),
            ));
        }

        debug!(
            numeric = numeric.len(),
            categorical = categorical.len(),
            dropped = ?dropped,
            "Feature schema inferred"
        );

        Ok(Self {
            label: label.to_string(),
            numeric,
            categorical,
            dropped,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn numeric(&self) -> &[String] {
        &self.numeric
    }

    pub fn categorical(&self) -> &[String] {
        &self.categorical
    }

    pub fn dropped(&self) -> &[String] {
        &self.dropped
    }

    /// Check that `table` carries every numeric and categorical column.
    pub fn validate(&self, table: &Table) -> Result<()> {
        for name in self.numeric.iter().chain(&self.categorical) {
            if !table.has_column(name) {
                return Err(FraudError::MissingColumn(name.clone()));
            }
        }
        Ok(())
    }
}

/// Unfitted preprocessing plan
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    schema: FeatureSchema,
}

impl FeatureExtractor {
    pub fn new(schema: FeatureSchema) -> Self {
        Self { schema }
    }

    /// Infer the schema of `table` and build a plan from it.
    pub fn from_table(table: &Table, label: &str) -> Result<Self> {
        Ok(Self::new(FeatureSchema::infer(table, label)?))
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Learn standardization statistics and category vocabularies.
    pub fn fit(&self, table: &Table) -> Result<FittedExtractor> {
        self.schema.validate(table)?;
        if table.is_empty() {
            return Err(FraudError::MalformedInput(
                "cannot fit preprocessing on an empty table".into(),
            ));
        }

        let scalers = self
            .schema
            .numeric
            .iter()
            .map(|name| {
                let values = numeric_column(table, name)?;
                Ok(Standardizer::fit(&values))
            })
            .collect::<Result<Vec<_>>>()?;

        let vocabularies = self
            .schema
            .categorical
            .iter()
            .map(|name| {
                let categories: BTreeSet<String> = table
                    .column(name)?
                    .into_iter()
                    .filter_map(Value::category_key)
                    .collect();
                Ok(categories.into_iter().collect())
            })
            .collect::<Result<Vec<Vec<String>>>>()?;

        Ok(FittedExtractor {
            schema: self.schema.clone(),
            scalers,
            vocabularies,
        })
    }
}

/// Mean/variance standardization for one numeric column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Standardizer {
    pub mean: f64,
    pub scale: f64,
}

impl Standardizer {
    /// Population mean and standard deviation; a constant column scales by 1.
    pub fn fit(values: &[f64]) -> Self {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std = variance.sqrt();
        Self {
            mean,
            scale: if std > 0.0 { std } else { 1.0 },
        }
    }

    pub fn apply(&self, value: f64) -> f64 {
        (value - self.mean) / self.scale
    }
}

/// Frozen preprocessing plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedExtractor {
    schema: FeatureSchema,
    scalers: Vec<Standardizer>,
    vocabularies: Vec<Vec<String>>,
}

impl FittedExtractor {
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn scalers(&self) -> &[Standardizer] {
        &self.scalers
    }

    pub fn vocabularies(&self) -> &[Vec<String>] {
        &self.vocabularies
    }

    /// Width of the transformed feature matrix
    pub fn feature_count(&self) -> usize {
        self.scalers.len() + self.vocabularies.iter().map(Vec::len).sum::<usize>()
    }

    /// Output column names: numeric columns, then `column=category` indicators
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = self.schema.numeric.clone();
        for (column, vocabulary) in self.schema.categorical.iter().zip(&self.vocabularies) {
            names.extend(vocabulary.iter().map(|c| format!("{}={}", column, c)));
        }
        names
    }

    /// Apply the frozen plan to `table`.
    ///
    /// Categories absent from the training vocabulary, and missing categorical
    /// cells, encode to all zeros. A missing numeric cell is an error.
    pub fn transform(&self, table: &Table) -> Result<Array2<f64>> {
        self.schema.validate(table)?;

        let mut features = Array2::<f64>::zeros((table.len(), self.feature_count()));

        for (col, (name, scaler)) in self.schema.numeric.iter().zip(&self.scalers).enumerate() {
            let values = numeric_column(table, name)?;
            for (row, value) in values.into_iter().enumerate() {
                features[[row, col]] = scaler.apply(value);
            }
        }

        let mut offset = self.scalers.len();
        for (name, vocabulary) in self.schema.categorical.iter().zip(&self.vocabularies) {
            for (row, value) in table.column(name)?.into_iter().enumerate() {
                let position = value
                    .category_key()
                    .and_then(|key| vocabulary.binary_search(&key).ok());
                if let Some(position) = position {
                    features[[row, offset + position]] = 1.0;
                }
            }
            offset += vocabulary.len();
        }

        Ok(features)
    }
}

fn numeric_column(table: &Table, name: &str) -> Result<Vec<f64>> {
    table
        .column(name)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.as_number().ok_or_else(|| {
                FraudError::MalformedInput(format!(
                    "numeric column `{}` has `{}` at row {}",
                    name,
                    value,
                    row + 1
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn training_table() -> Table {
        Table::from_rows(
            vec![
                "Amount".into(),
                "AmountCategory".into(),
                "IsOnline".into(),
                "Class".into(),
            ],
            vec![
                vec![Value::Number(10.0), "Low".into(), Value::Bool(true), Value::Number(0.0)],
                vec![Value::Number(20.0), "High".into(), Value::Bool(false), Value::Number(1.0)],
                vec![Value::Number(30.0), "Low".into(), Value::Bool(true), Value::Number(0.0)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_schema_partitions_columns() {
        let schema = FeatureSchema::infer(&training_table(), "Class").unwrap();
        assert_eq!(schema.numeric(), ["Amount"]);
        assert_eq!(schema.categorical(), ["AmountCategory"]);
        assert_eq!(schema.dropped(), ["IsOnline"]);
        assert_eq!(schema.label(), "Class");
    }

    #[test]
    fn test_schema_requires_label() {
        let err = FeatureSchema::infer(&training_table(), "Fraud").unwrap_err();
        assert!(matches!(err, FraudError::MissingColumn(c) if c == "Fraud"));
    }

    #[test]
    fn test_fit_transform() {
        let table = training_table();
        let fitted = FeatureExtractor::from_table(&table, "Class")
            .unwrap()
            .fit(&table)
            .unwrap();

        assert_eq!(fitted.feature_count(), 3);
        assert_eq!(
            fitted.feature_names(),
            vec!["Amount", "AmountCategory=High", "AmountCategory=Low"]
        );

        let x = fitted.transform(&table).unwrap();
        assert_eq!(x.dim(), (3, 3));
        // mean 20, population std sqrt(200/3)
        let std = (200.0f64 / 3.0).sqrt();
        assert!((x[[0, 0]] + 10.0 / std).abs() < 1e-12);
        assert_eq!(x[[1, 0]], 0.0);
        assert_eq!(x.row(0).to_vec()[1..], [0.0, 1.0]);
        assert_eq!(x.row(1).to_vec()[1..], [1.0, 0.0]);
    }

    #[test]
    fn test_unseen_category_encodes_to_zeros() {
        let table = training_table();
        let fitted = FeatureExtractor::from_table(&table, "Class")
            .unwrap()
            .fit(&table)
            .unwrap();

        let new_rows = Table::from_rows(
            vec!["Amount".into(), "AmountCategory".into()],
            vec![
                vec![Value::Number(15.0), "VeryHigh".into()],
                vec![Value::Number(25.0), Value::Missing],
            ],
        )
        .unwrap();

        let x = fitted.transform(&new_rows).unwrap();
        assert_eq!(x.dim(), (2, 3));
        assert_eq!(x.row(0).to_vec()[1..], [0.0, 0.0]);
        assert_eq!(x.row(1).to_vec()[1..], [0.0, 0.0]);
    }

    #[test]
    fn test_transform_requires_feature_columns() {
        let table = training_table();
        let fitted = FeatureExtractor::from_table(&table, "Class")
            .unwrap()
            .fit(&table)
            .unwrap();
        let partial =
            Table::from_rows(vec!["Amount".into()], vec![vec![Value::Number(1.0)]]).unwrap();
        assert!(matches!(
            fitted.transform(&partial),
            Err(FraudError::MissingColumn(c)) if c == "AmountCategory"
        ));
    }

    #[test]
    fn test_missing_numeric_is_malformed() {
        let table = training_table();
        let fitted = FeatureExtractor::from_table(&table, "Class")
            .unwrap()
            .fit(&table)
            .unwrap();
        let bad = Table::from_rows(
            vec!["Amount".into(), "AmountCategory".into()],
            vec![vec![Value::Missing, "Low".into()]],
        )
        .unwrap();
        assert!(matches!(
            fitted.transform(&bad),
            Err(FraudError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_constant_column_scale() {
        let scaler = Standardizer::fit(&[5.0, 5.0, 5.0]);
        assert_eq!(scaler.scale, 1.0);
        assert_eq!(scaler.apply(5.0), 0.0);
    }
}
