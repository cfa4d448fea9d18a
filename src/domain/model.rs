//! Core data model: the tagged [`Value`], input [`Record`]s and the row-major [`Table`]
//! every cleaning stage consumes and produces.

use crate::domain::ports::ColumnLookup;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// A single cell. The variant is decided once when JSON is parsed, so later stages
/// match on it instead of probing types at runtime.
#[derive(Debug, Clone)]
pub enum Value {
    /// Missing / unknown. The only null marker used by every stage.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Only produced by date coercion.
    Timestamp(NaiveDateTime),
    /// Nested key/value structure, keys in source order.
    Object(Vec<(String, Value)>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_object(&self) -> Option<&[(String, Value)]> {
        match self {
            Value::Object(fields) => Some(fields),
            _ => None,
        }
    }

    /// Looks up a key of a nested object.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Text rendering shared by the CSV and Parquet writers. `None` for null.
    pub fn render(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Text(s) => Some(s.clone()),
            Value::Timestamp(ts) => Some(ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
            Value::Object(_) => Some(serde_json::Value::from(self.clone()).to_string()),
        }
    }

    fn canonical_float_bits(f: f64) -> u64 {
        if f.is_nan() {
            f64::NAN.to_bits()
        } else if f == 0.0 {
            0.0f64.to_bits()
        } else {
            f.to_bits()
        }
    }
}

// Equality is structural; floats compare by canonical bits so NaN == NaN and the
// relation stays consistent with `Hash` for duplicate detection.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => {
                Value::canonical_float_bits(*a) == Value::canonical_float_bits(*b)
            }
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => Value::canonical_float_bits(*f).hash(state),
            Value::Text(s) => s.hash(state),
            Value::Timestamp(ts) => ts.hash(state),
            Value::Object(fields) => fields.hash(state),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::Text(s),
            // 陣列沒有欄位可以展開，保留成 JSON 文字
            serde_json::Value::Array(items) => {
                Value::Text(serde_json::Value::Array(items).to_string())
            }
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Int(i) => serde_json::Value::from(i),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s),
            Value::Timestamp(ts) => {
                serde_json::Value::String(ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
            }
            Value::Object(fields) => serde_json::Value::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

/// One element of the fetched JSON array, fields in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub fields: Vec<(String, Value)>,
}

impl Record {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Record {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            fields: map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
        }
    }
}

/// Physical type of a column. Raw columns start as `Text` (loosely typed JSON);
/// coercion moves them to `Numeric` or `Temporal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Numeric,
    Temporal,
}

/// Declared meaning of an output column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Identifier,
    Categorical,
    Numeric,
    Temporal,
    FreeText,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub role: Option<ColumnRole>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: ColumnType::Text,
            role: None,
        }
    }
}

/// In-memory table. `rows[i][j]` belongs to `columns[j]`; every row has exactly
/// `columns.len()` cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Builds a table whose columns are the union of record keys in first-seen order.
    /// Records lacking a key get `Null` in that column.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut columns: Vec<Column> = Vec::new();
        let mut positions: std::collections::HashMap<String, usize> =
            std::collections::HashMap::new();

        for record in &records {
            for (key, _) in &record.fields {
                if !positions.contains_key(key) {
                    positions.insert(key.clone(), columns.len());
                    columns.push(Column::new(key.clone()));
                }
            }
        }

        let width = columns.len();
        let rows = records
            .into_iter()
            .map(|record| {
                let mut row = vec![Value::Null; width];
                for (key, value) in record.fields {
                    row[positions[&key]] = value;
                }
                row
            })
            .collect();

        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Values of one column, top to bottom.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |row| &row[index])
    }

    /// Cell lookup by column name; `None` when the column does not exist.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[index])
    }
}

impl ColumnLookup for Table {
    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

/// Serialized form of the cleaned table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Delimited text with a header row and no index column.
    #[default]
    Csv,
    /// Columnar binary.
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }

    /// Picks the format from a file extension, defaulting to CSV.
    pub fn from_path(path: &str) -> Self {
        if path.ends_with(".parquet") {
            OutputFormat::Parquet
        } else {
            OutputFormat::Csv
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "parquet" => Ok(OutputFormat::Parquet),
            other => Err(format!("unsupported output format '{}' (expected csv or parquet)", other)),
        }
    }
}

/// Outcome of the transform phase.
#[derive(Debug, Clone)]
pub struct TransformResult {
    pub table: Table,
    pub report: CleanReport,
}

/// Row/column counts observed along the cleaning chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanReport {
    pub input_rows: usize,
    pub flattened_columns: Vec<String>,
    pub merge_conflicts: usize,
    pub coerced_nulls: usize,
    pub duplicates_removed: usize,
    pub defaults_filled: usize,
    pub output_rows: usize,
    pub output_columns: Vec<String>,
}
