//! In-memory transaction tables

use crate::error::{FraudError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell of a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Number(f64),
    Text(String),
    Bool(bool),
    Missing,
}

impl Value {
    /// Type a raw CSV cell.
    ///
    /// Empty, `NaN` and `NA` cells are missing; finite floats are numbers;
    /// `true`/`false` in any case are booleans; everything else is text.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("nan") || raw == "NA" {
            return Value::Missing;
        }
        if let Ok(number) = raw.parse::<f64>() {
            if number.is_finite() {
                return Value::Number(number);
            }
        }
        if raw.eq_ignore_ascii_case("true") {
            return Value::Bool(true);
        }
        if raw.eq_ignore_ascii_case("false") {
            return Value::Bool(false);
        }
        Value::Text(raw.to_string())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Category key used by one-hot encoding; `None` for missing cells
    pub fn category_key(&self) -> Option<String> {
        match self {
            Value::Missing => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Missing => Ok(()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

/// Inferred kind of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Every non-missing cell is a number
    Numeric,
    /// Text, or a mix of cell kinds
    Categorical,
    /// Every non-missing cell is a boolean
    Boolean,
    /// No non-missing cells
    Empty,
}

/// Row-oriented table; every row has one cell per column
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the given header
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table, rejecting rows whose width differs from the header
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(FraudError::MalformedInput(format!(
                "row {} has {} cells, expected {}",
                self.rows.len() + 1,
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cells of one column, in row order
    pub fn column(&self, name: &str) -> Result<Vec<&Value>> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| FraudError::MissingColumn(name.to_string()))?;
        Ok(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Infer the kind of the column at `idx`
    pub fn column_kind(&self, idx: usize) -> ColumnKind {
        let mut numbers = 0usize;
        let mut bools = 0usize;
        let mut present = 0usize;

        for row in &self.rows {
            match &row[idx] {
                Value::Missing => continue,
                Value::Number(_) => numbers += 1,
                Value::Bool(_) => bools += 1,
                Value::Text(_) => {}
            }
            present += 1;
        }

        if present == 0 {
            ColumnKind::Empty
        } else if numbers == present {
            ColumnKind::Numeric
        } else if bools == present {
            ColumnKind::Boolean
        } else {
            ColumnKind::Categorical
        }
    }

    /// New table holding the given rows, in the given order
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Append a column, or overwrite it if a column of that name exists
    pub fn with_column(mut self, name: &str, values: Vec<Value>) -> Result<Table> {
        if values.len() != self.rows.len() {
            return Err(FraudError::MalformedInput(format!(
                "column `{}` has {} values for {} rows",
                name,
                values.len(),
                self.rows.len()
            )));
        }

        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(self)
    }

    /// Binary label vector from `label`; cells must be 0/1 numbers or booleans
    pub fn labels(&self, label: &str) -> Result<Vec<u8>> {
        self.column(label)?
            .into_iter()
            .enumerate()
            .map(|(row, value)| match value {
                Value::Number(n) if *n == 0.0 => Ok(0),
                Value::Number(n) if *n == 1.0 => Ok(1),
                Value::Bool(b) => Ok(u8::from(*b)),
                other => Err(FraudError::MalformedInput(format!(
                    "label `{}` at row {} must be 0 or 1, got `{}`",
                    label,
                    row + 1,
                    other
                ))),
            })
            .collect()
    }
}
