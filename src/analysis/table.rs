//! Parsing of the stored datasets into records.
//!
//! The time series is a delimited text table (tab-separated at the source,
//! comma-separated accepted) whose headers and fields carry padding. The
//! population payload is JSON in one of two shapes: a bare array of
//! records, or an object wrapping them in `data`.

use crate::error::{PipelineError, PipelineResult};
use crate::models::{PopulationRecord, TimeSeriesRecord};
use serde_json::{Map, Value};

const REQUIRED_COLUMNS: [&str; 4] = ["series_id", "year", "period", "value"];

/// Parse the raw time-series blob. Every header and field is trimmed and
/// fields may be quoted.
pub fn parse_time_series(bytes: &[u8]) -> PipelineResult<Vec<TimeSeriesRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(detect_delimiter(bytes))
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| PipelineError::analysis(format!("time series header: {}", e)))?
        .clone();
    if headers.iter().all(str::is_empty) {
        return Err(PipelineError::analysis("time series is empty"));
    }

    let mut index = [0usize; 4];
    for (slot, column) in index.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = headers.iter().position(|h| h == column).ok_or_else(|| {
            PipelineError::analysis(format!("time series has no '{}' column", column))
        })?;
    }
    let [series_col, year_col, period_col, value_col] = index;
    let width = index.iter().copied().max().unwrap_or(0) + 1;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| PipelineError::analysis(format!("time series: {}", e)))?;
        if row.iter().all(str::is_empty) {
            continue;
        }
        let line = row.position().map(|p| p.line()).unwrap_or(0);

        if row.len() < width {
            return Err(PipelineError::analysis(format!(
                "time series line {}: expected at least {} fields, found {}",
                line,
                width,
                row.len()
            )));
        }

        let year = row[year_col].parse::<i32>().map_err(|_| {
            PipelineError::analysis(format!(
                "time series line {}: invalid year '{}'",
                line, &row[year_col]
            ))
        })?;
        let value = row[value_col]
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| {
                PipelineError::analysis(format!(
                    "time series line {}: invalid value '{}'",
                    line, &row[value_col]
                ))
            })?;

        records.push(TimeSeriesRecord {
            series_id: row[series_col].to_string(),
            year,
            period: row[period_col].to_string(),
            value,
        });
    }

    Ok(records)
}

/// Tab if the header line has one, comma otherwise.
fn detect_delimiter(bytes: &[u8]) -> u8 {
    let header = bytes
        .split(|b| *b == b'\n')
        .find(|line| line.iter().any(|b| !b.is_ascii_whitespace()))
        .unwrap_or_default();

    if header.contains(&b'\t') {
        b'\t'
    } else {
        b','
    }
}

/// Parse the stored population JSON.
pub fn parse_population(bytes: &[u8]) -> PipelineResult<Vec<PopulationRecord>> {
    let root: Value = serde_json::from_slice(bytes)
        .map_err(|e| PipelineError::analysis(format!("population is not valid JSON: {}", e)))?;

    let rows = match &root {
        Value::Array(rows) => rows,
        Value::Object(obj) => match field(obj, "data") {
            Some(Value::Array(rows)) => rows,
            _ => {
                return Err(PipelineError::analysis(
                    "population object has no 'data' array",
                ))
            }
        },
        _ => {
            return Err(PipelineError::analysis(
                "population must be an array or an object with 'data'",
            ))
        }
    };

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let obj = row.as_object().ok_or_else(|| {
                PipelineError::analysis(format!("population row {} is not an object", i))
            })?;
            let year = number(obj, "year", i)?;
            if year.fract() != 0.0 || year < i32::MIN as f64 || year > i32::MAX as f64 {
                return Err(PipelineError::analysis(format!(
                    "population row {}: year {} is not an integer",
                    i, year
                )));
            }
            Ok(PopulationRecord {
                year: year as i32,
                population: number(obj, "population", i)?,
            })
        })
        .collect()
}

/// Look up a key case-insensitively.
fn field<'a>(obj: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    obj.get(name).or_else(|| {
        obj.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    })
}

/// Read a numeric field that may be encoded as a number or a numeric string.
fn number(obj: &Map<String, Value>, name: &str, row: usize) -> PipelineResult<f64> {
    let parsed = match field(obj, name) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite());

    parsed.ok_or_else(|| {
        PipelineError::analysis(format!(
            "population row {}: missing or non-numeric '{}'",
            row, name
        ))
    })
}
