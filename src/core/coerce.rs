use crate::config::cleaning::CleaningConfig;
use crate::domain::model::{ColumnType, Table, Value};
use crate::domain::ports::ColumnLookup;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Parses a date/time string. Offsets are converted to UTC.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parses a number, keeping integers as `Int`. Blank or malformed text gives `None`.
pub fn parse_number(raw: &str) -> Option<Value> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Some(Value::Int(i));
    }
    raw.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Value::Float)
}

fn to_timestamp(value: Value) -> Value {
    match value {
        Value::Timestamp(_) => value,
        Value::Text(s) => parse_datetime(&s).map(Value::Timestamp).unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

fn to_numeric(value: Value) -> Value {
    match value {
        Value::Int(_) => value,
        Value::Float(f) if f.is_finite() => value,
        Value::Bool(b) => Value::Int(i64::from(b)),
        Value::Text(s) => parse_number(&s).unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

/// Converts date columns (name contains the configured marker) to timestamps and the
/// configured numeric columns to numbers. Values that do not parse become `Null`;
/// missing numeric columns are skipped. Row count and column set never change.
///
/// Returns the table and how many non-null values were turned into `Null`.
pub fn coerce_types(table: Table, config: &CleaningConfig) -> (Table, usize) {
    let mut table = table;
    let mut nulled = 0;

    let date_columns: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.name.contains(config.date_marker.as_str()))
        .map(|(i, _)| i)
        .collect();

    for &index in &date_columns {
        nulled += convert_column(&mut table, index, to_timestamp);
        table.columns[index].column_type = ColumnType::Temporal;
    }

    for name in &config.numeric_columns {
        let Some(index) = table.column_index(name) else {
            tracing::debug!("Numeric column '{}' not present, skipping", name);
            continue;
        };
        nulled += convert_column(&mut table, index, to_numeric);
        table.columns[index].column_type = ColumnType::Numeric;
    }

    tracing::debug!(
        "Coerced {} date column(s); {} malformed value(s) replaced with null",
        date_columns.len(),
        nulled
    );

    (table, nulled)
}

fn convert_column(table: &mut Table, index: usize, convert: fn(Value) -> Value) -> usize {
    let mut nulled = 0;
    for row in &mut table.rows {
        let cell = std::mem::replace(&mut row[index], Value::Null);
        let was_null = cell.is_null();
        let converted = convert(cell);
        if !was_null && converted.is_null() {
            nulled += 1;
        }
        row[index] = converted;
    }
    nulled
}
