use crate::domain::model::{ColumnType, OutputFormat, Table, Value};
use crate::utils::error::{EtlError, Result};
use parquet::basic::{Compression, ConvertedType, Repetition, Type as PhysicalType};
use parquet::data_type::{ByteArray, ByteArrayType, DoubleType, Int64Type};
use parquet::file::properties::WriterProperties;
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::types::Type;
use std::sync::Arc;

/// Encodes the table in the requested format. Column and row order are kept.
pub fn serialize_table(table: &Table, format: OutputFormat) -> Result<Vec<u8>> {
    let bytes = match format {
        OutputFormat::Csv => to_csv_bytes(table)?,
        OutputFormat::Parquet => to_parquet_bytes(table)?,
    };
    tracing::debug!(
        "Serialized {} rows x {} columns as {} ({} bytes)",
        table.row_count(),
        table.column_count(),
        format.extension(),
        bytes.len()
    );
    Ok(bytes)
}

/// Header row plus one line per row, no index column. Nulls are empty fields.
pub fn to_csv_bytes(table: &Table) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    // 沒有任何欄位時輸出空檔案
    if table.column_count() > 0 {
        writer.write_record(table.column_names())?;
        for row in &table.rows {
            writer.write_record(row.iter().map(|v| v.render().unwrap_or_default()))?;
        }
    }

    writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ParquetKind {
    Utf8,
    Int64,
    Double,
    TimestampMillis,
}

/// Physical kind of a column. A Numeric or Temporal column holding any other
/// non-null value (e.g. a text default) is written as UTF8, same as its CSV text.
fn parquet_kind(table: &Table, index: usize) -> ParquetKind {
    let mut cells = table.column_values(index).filter(|v| !v.is_null());
    let kind = match table.columns[index].column_type {
        ColumnType::Text => ParquetKind::Utf8,
        ColumnType::Temporal => {
            if cells.all(|v| matches!(v, Value::Timestamp(_))) {
                ParquetKind::TimestampMillis
            } else {
                ParquetKind::Utf8
            }
        }
        ColumnType::Numeric => {
            let cells: Vec<&Value> = cells.collect();
            if cells.iter().all(|v| matches!(v, Value::Int(_))) {
                ParquetKind::Int64
            } else if cells.iter().all(|v| matches!(v, Value::Int(_) | Value::Float(_))) {
                ParquetKind::Double
            } else {
                ParquetKind::Utf8
            }
        }
    };

    if kind == ParquetKind::Utf8 && table.columns[index].column_type != ColumnType::Text {
        tracing::debug!(
            "Column '{}' holds mixed values, writing it as UTF8",
            table.columns[index].name
        );
    }
    kind
}

fn parquet_schema(table: &Table, kinds: &[ParquetKind]) -> Result<Type> {
    let mut fields = Vec::with_capacity(kinds.len());
    for (column, kind) in table.columns.iter().zip(kinds) {
        let (physical, converted) = match kind {
            ParquetKind::Utf8 => (PhysicalType::BYTE_ARRAY, ConvertedType::UTF8),
            ParquetKind::Int64 => (PhysicalType::INT64, ConvertedType::NONE),
            ParquetKind::Double => (PhysicalType::DOUBLE, ConvertedType::NONE),
            ParquetKind::TimestampMillis => (PhysicalType::INT64, ConvertedType::TIMESTAMP_MILLIS),
        };
        let field = Type::primitive_type_builder(&column.name, physical)
            .with_repetition(Repetition::OPTIONAL)
            .with_converted_type(converted)
            .build()?;
        fields.push(Arc::new(field));
    }

    Ok(Type::group_type_builder("schema").with_fields(fields).build()?)
}

/// Non-null physical values plus one definition level per cell. `convert` returns
/// `None` only for null cells once `parquet_kind` has picked the column's kind.
fn present_values<'a, T>(
    cells: impl Iterator<Item = &'a Value>,
    convert: impl Fn(&Value) -> Option<T>,
) -> (Vec<T>, Vec<i16>) {
    let mut data = Vec::new();
    let mut def_levels = Vec::new();
    for cell in cells {
        match convert(cell) {
            Some(value) => {
                data.push(value);
                def_levels.push(1);
            }
            None => def_levels.push(0),
        }
    }
    (data, def_levels)
}

/// Single row group, every column OPTIONAL, Snappy compressed.
pub fn to_parquet_bytes(table: &Table) -> Result<Vec<u8>> {
    if table.column_count() == 0 {
        return Err(EtlError::ProcessingError {
            message: "cannot write parquet for a table without columns".to_string(),
        });
    }

    let kinds: Vec<ParquetKind> = (0..table.column_count())
        .map(|i| parquet_kind(table, i))
        .collect();
    let schema = Arc::new(parquet_schema(table, &kinds)?);
    let props = Arc::new(
        WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build(),
    );

    let mut buffer = Vec::new();
    let mut writer = SerializedFileWriter::new(&mut buffer, schema, props)?;
    let mut row_group = writer.next_row_group()?;

    let mut index = 0;
    while let Some(mut column) = row_group.next_column()? {
        let cells = table.column_values(index);

        match kinds[index] {
            ParquetKind::Utf8 => {
                let (data, def_levels) = present_values(cells, |v| v.render().map(|s| ByteArray::from(s.into_bytes())));
                column
                    .typed::<ByteArrayType>()
                    .write_batch(&data, Some(def_levels.as_slice()), None)?;
            }
            ParquetKind::Int64 => {
                let (data, def_levels) = present_values(cells, |v| match v {
                    Value::Int(i) => Some(*i),
                    _ => None,
                });
                column
                    .typed::<Int64Type>()
                    .write_batch(&data, Some(def_levels.as_slice()), None)?;
            }
            ParquetKind::Double => {
                let (data, def_levels) = present_values(cells, |v| match v {
                    Value::Int(i) => Some(*i as f64),
                    Value::Float(f) => Some(*f),
                    _ => None,
                });
                column
                    .typed::<DoubleType>()
                    .write_batch(&data, Some(def_levels.as_slice()), None)?;
            }
            ParquetKind::TimestampMillis => {
                let (data, def_levels) = present_values(cells, |v| match v {
                    Value::Timestamp(ts) => Some(ts.and_utc().timestamp_millis()),
                    _ => None,
                });
                column
                    .typed::<Int64Type>()
                    .write_batch(&data, Some(def_levels.as_slice()), None)?;
            }
        }

        column.close()?;
        index += 1;
    }

    row_group.close()?;
    writer.close()?;

    Ok(buffer)
}
