//! Batch scoring of uploaded or default datasets

use crate::dataset::{self, UPLOAD_FORMATS};
use crate::error::{FraudError, Result};
use crate::models::FraudModel;
use crate::types::{Table, Value};
use std::fs;
use std::path::Path;
use tracing::info;

/// Appended probability column
pub const PROBA_COLUMN: &str = "fraud_proba";
/// Appended 0/1 flag column
pub const FLAG_COLUMN: &str = "fraud_flag";

/// Read an uploaded table, falling back from comma to whitespace separation
pub fn read_upload<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(FraudError::NotFound {
            what: "upload",
            path: path.to_path_buf(),
        });
    }
    dataset::parse_with_fallback(&fs::read(path)?, &UPLOAD_FORMATS)
}

/// Score `table` and append the probability and flag columns.
pub fn score_table(model: &FraudModel, table: Table, threshold: f64) -> Result<Table> {
    let prediction = model.predict_flag(&table, threshold)?;

    info!(
        rows = prediction.len(),
        flagged = prediction.flagged(),
        threshold,
        "Predictions completed"
    );

    let probabilities = prediction
        .probabilities
        .iter()
        .map(|&p| Value::Number(p))
        .collect();
    let flags = prediction
        .flags
        .iter()
        .map(|&f| Value::Number(f64::from(f)))
        .collect();

    table
        .with_column(PROBA_COLUMN, probabilities)?
        .with_column(FLAG_COLUMN, flags)
}

/// Render the first `rows` rows as an aligned text grid
pub fn preview(table: &Table, rows: usize) -> String {
    let shown = &table.rows()[..rows.min(table.len())];
    let cells: Vec<Vec<String>> = shown
        .iter()
        .map(|row| row.iter().map(|v| v.to_string()).collect())
        .collect();

    let widths: Vec<usize> = table
        .columns()
        .iter()
        .enumerate()
        .map(|(i, name)| {
            cells
                .iter()
                .map(|row| row[i].len())
                .chain(std::iter::once(name.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = vec![render_row(table.columns().iter().map(String::as_str), &widths)];
    for row in &cells {
        lines.push(render_row(row.iter().map(String::as_str), &widths));
    }
    lines.join("\n")
}

fn render_row<'a>(values: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    values
        .zip(widths)
        .map(|(v, w)| format!("{:>width$}", v, width = *w))
        .collect::<Vec<_>>()
        .join("  ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LogisticConfig, PipelineSpec};
    use tempfile::tempdir;

    fn model_and_table() -> (FraudModel, Table) {
        let rows = (0..10)
            .map(|i| {
                vec![
                    Value::Number(i as f64),
                    Value::Number(if i >= 5 { 1.0 } else { 0.0 }),
                ]
            })
            .collect();
        let table = Table::from_rows(vec!["Amount".into(), "Class".into()], rows).unwrap();
        let labels = table.labels("Class").unwrap();
        let pipeline = PipelineSpec::from_table(&table, "Class", LogisticConfig::default())
            .unwrap()
            .fit(&table, &labels)
            .unwrap();
        (FraudModel::from_pipeline(pipeline), table)
    }

    #[test]
    fn test_score_table_appends_columns() {
        let (model, table) = model_and_table();
        let scored = score_table(&model, table.clone(), 0.5).unwrap();

        assert_eq!(scored.columns(), ["Amount", "Class", PROBA_COLUMN, FLAG_COLUMN]);
        assert_eq!(scored.len(), table.len());

        let probs = model.predict_proba(&table).unwrap();
        for (row, p) in scored.rows().iter().zip(probs) {
            assert_eq!(row[2], Value::Number(p));
            let flag = if p >= 0.5 { 1.0 } else { 0.0 };
            assert_eq!(row[3], Value::Number(flag));
        }
    }

    #[test]
    fn test_rescoring_replaces_columns() {
        let (model, table) = model_and_table();
        let once = score_table(&model, table, 0.5).unwrap();
        let twice = score_table(&model, once.clone(), 0.0).unwrap();
        assert_eq!(twice.columns().len(), once.columns().len());
        assert!(twice.column(FLAG_COLUMN).unwrap().iter().all(|v| **v == Value::Number(1.0)));
    }

    #[test]
    fn test_read_upload_whitespace() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("upload.csv");
        fs::write(&path, "Amount Class\n1 0\n7 1\n").unwrap();

        let table = read_upload(&path).unwrap();
        assert_eq!(table.columns(), ["Amount", "Class"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_read_upload_missing() {
        assert!(read_upload("missing/upload.csv").unwrap_err().is_not_found());
    }

    #[test]
    fn test_preview() {
        let (_, table) = model_and_table();
        let text = preview(&table, 3);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Amount  Class");
        assert_eq!(lines[1], "     0      0");
    }
}
