//! JSON and CSV file helpers for seeds, decision feeds and queues

use crate::error::{EngineError, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Tabular file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TableFormat {
    Csv,
    Json,
}

impl TableFormat {
    /// `.csv` → CSV, anything else → JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::Json,
        }
    }
}

pub fn read_json(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).map_err(|e| EngineError::io(path, e))?;
    Ok(serde_json::from_str(&content)?)
}

/// Write pretty JSON, creating parent directories
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    let mut content = serde_json::to_string_pretty(value)?;
    content.push('\n');
    fs::write(path, content).map_err(|e| EngineError::io(path, e))
}

/// Read rows from CSV (header row required) or JSON
///
/// JSON may be an array of objects or an object with a `rows` or
/// `decisions` array. CSV cells are read as strings; blank cells are dropped.
pub fn read_table(path: &Path) -> Result<Vec<Map<String, Value>>> {
    match TableFormat::from_path(path) {
        TableFormat::Csv => read_csv_rows(path),
        TableFormat::Json => json_rows(read_json(path)?, path),
    }
}

fn read_csv_rows(path: &Path) -> Result<Vec<Map<String, Value>>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Map<String, Value> = headers
            .iter()
            .zip(record.iter())
            .filter(|(_, cell)| !cell.is_empty())
            .map(|(header, cell)| (header.to_string(), Value::String(cell.to_string())))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

fn json_rows(value: Value, path: &Path) -> Result<Vec<Map<String, Value>>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("rows").or_else(|| obj.remove("decisions")) {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(EngineError::InvalidInput(format!(
                    "{}: expected an array of rows",
                    path.display()
                )))
            }
        },
        _ => {
            return Err(EngineError::InvalidInput(format!(
                "{}: expected an array of rows",
                path.display()
            )))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(obj) => Ok(obj),
            _ => Err(EngineError::InvalidInput(format!(
                "{}: row {} is not an object",
                path.display(),
                index
            ))),
        })
        .collect()
}

/// Write rows as CSV or as a JSON array
pub fn write_table<T: Serialize>(path: &Path, format: TableFormat, rows: &[T]) -> Result<()> {
    match format {
        TableFormat::Json => write_json(path, &rows),
        TableFormat::Csv => {
            ensure_parent(path)?;
            let mut writer = csv::Writer::from_path(path)?;
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush().map_err(|e| EngineError::io(path, e))
        }
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| EngineError::io(parent, e))
        }
        _ => Ok(()),
    }
}
