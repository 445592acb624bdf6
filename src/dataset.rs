//! CSV loading, fallback parsing and writing for transaction tables.

use crate::error::{FraudError, Result};
use crate::types::{Table, Value};
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, warn};

/// Layout of a delimited text table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvFormat {
    /// Comma-separated with quoting
    Comma,
    /// Fields separated by runs of spaces or tabs
    Whitespace,
}

impl fmt::Display for CsvFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CsvFormat::Comma => f.write_str("comma-separated"),
            CsvFormat::Whitespace => f.write_str("whitespace-separated"),
        }
    }
}

/// Parser attempts for uploaded tables: comma first, whitespace second
pub const UPLOAD_FORMATS: [CsvFormat; 2] = [CsvFormat::Comma, CsvFormat::Whitespace];

/// Load a comma-separated dataset with a header row.
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(FraudError::dataset_not_found(path));
    }

    let bytes = fs::read(path)?;
    let table = parse_table(&bytes, CsvFormat::Comma)?;

    info!(
        path = %path.display(),
        rows = table.len(),
        columns = table.columns().len(),
        "Dataset loaded"
    );
    Ok(table)
}

/// Parse `bytes` with each format in order, returning the first success.
///
/// Every failed attempt is recorded; if none succeeds the error lists them all.
pub fn parse_with_fallback(bytes: &[u8], formats: &[CsvFormat]) -> Result<Table> {
    let mut attempts = Vec::with_capacity(formats.len());

    for (i, &format) in formats.iter().enumerate() {
        match parse_table(bytes, format) {
            Ok(table) => {
                if i > 0 {
                    warn!(format = %format, "Parsed table with fallback format");
                }
                return Ok(table);
            }
            Err(e) => {
                debug!(format = %format, error = %e, "Parser attempt failed");
                attempts.push(format!("{}: {}", format, e));
            }
        }
    }

    Err(FraudError::ParseFailed { attempts })
}

/// Parse `bytes` as a table in a single format.
pub fn parse_table(bytes: &[u8], format: CsvFormat) -> Result<Table> {
    match format {
        CsvFormat::Comma => parse_comma(bytes),
        CsvFormat::Whitespace => parse_whitespace(bytes),
    }
}

fn parse_comma(bytes: &[u8]) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if columns.is_empty() || columns.iter().all(String::is_empty) {
        return Err(FraudError::MalformedInput("missing header row".into()));
    }

    // A whitespace-delimited file read with commas collapses into one column.
    // A quoted header is taken literally.
    let quoted = bytes.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'"');
    if !quoted && columns.len() == 1 && columns[0].split_whitespace().count() > 1 {
        return Err(FraudError::MalformedInput(format!(
            "single column header `{}` contains whitespace",
            columns[0]
        )));
    }

    let mut table = Table::new(columns);
    for record in reader.records() {
        let record = record?;
        table.push_row(record.iter().map(Value::parse).collect())?;
    }
    Ok(table)
}

fn parse_whitespace(bytes: &[u8]) -> Result<Table> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| FraudError::MalformedInput(format!("not valid UTF-8: {}", e)))?;
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());

    let columns: Vec<String> = lines
        .next()
        .ok_or_else(|| FraudError::MalformedInput("missing header row".into()))?
        .split_whitespace()
        .map(str::to_string)
        .collect();

    // A comma-separated file read on whitespace collapses into one column.
    if columns.len() == 1 && columns[0].contains(',') {
        return Err(FraudError::MalformedInput(format!(
            "single column header `{}` contains commas",
            columns[0]
        )));
    }

    let mut table = Table::new(columns);
    for line in lines {
        table.push_row(line.split_whitespace().map(Value::parse).collect())?;
    }
    Ok(table)
}

/// Write a table as comma-separated text with a header row.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a table to `path`, creating parent directories.
pub fn save_csv<P: AsRef<Path>>(table: &Table, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    write_csv(table, File::create(path)?)?;
    info!(path = %path.display(), rows = table.len(), "Table written");
    Ok(())
}
