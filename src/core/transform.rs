use crate::config::cleaning::CleaningConfig;
use crate::core::coerce::coerce_types;
use crate::core::flatten::flatten_nested_columns;
use crate::core::normalize::normalize_columns;
use crate::core::project::project_columns;
use crate::core::sanitize::sanitize_records;
use crate::domain::model::{CleanReport, Record, Table, TransformResult};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::Validate;

/// Parses a raw dataset payload. The document must be a JSON array whose
/// elements are all objects.
pub fn parse_records(bytes: &[u8]) -> Result<Vec<Record>> {
    let document: serde_json::Value = serde_json::from_slice(bytes)?;

    let serde_json::Value::Array(items) = document else {
        return Err(EtlError::ProcessingError {
            message: "expected a JSON array of records at the top level".to_string(),
        });
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            serde_json::Value::Object(map) => Ok(Record::from(map)),
            other => Err(EtlError::ProcessingError {
                message: format!("record {} is not a JSON object: {}", i, other),
            }),
        })
        .collect()
}

/// Runs the full cleaning chain:
/// flatten → normalize → coerce → sanitize → project.
pub fn clean_records(records: Vec<Record>, config: &CleaningConfig) -> Result<TransformResult> {
    config.validate()?;
    let input_rows = records.len();
    let table = Table::from_records(records);
    let raw_columns: Vec<String> = table.column_names().map(String::from).collect();
    tracing::debug!(
        "Built table: {} rows x {} columns",
        table.row_count(),
        table.column_count()
    );

    let table = flatten_nested_columns(table)?;
    let flattened_columns: Vec<String> = table
        .column_names()
        .filter(|name| !raw_columns.iter().any(|raw| raw == name))
        .map(String::from)
        .collect();
    tracing::debug!(
        "Flattened: {} columns ({} derived)",
        table.column_count(),
        flattened_columns.len()
    );

    let (table, merge_conflicts) = normalize_columns(table);
    tracing::debug!("Normalized: {} columns", table.column_count());

    let (table, coerced_nulls) = coerce_types(table, config);
    tracing::debug!("Coerced: {} unparseable value(s) set to null", coerced_nulls);

    let (table, duplicates_removed, defaults_filled) = sanitize_records(table, config);

    let table = project_columns(table, config);
    tracing::debug!(
        "Projected: {} rows x {} columns",
        table.row_count(),
        table.column_count()
    );

    let report = CleanReport {
        input_rows,
        flattened_columns,
        merge_conflicts,
        coerced_nulls,
        duplicates_removed,
        defaults_filled,
        output_rows: table.row_count(),
        output_columns: table.column_names().map(String::from).collect(),
    };

    Ok(TransformResult { table, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::cleaning::OutputColumn;
    use crate::domain::model::{ColumnRole, ColumnType, Value};

    #[test]
    fn test_parse_records_requires_array_of_objects() {
        let records = parse_records(br#"[{"unique_key":"1"},{"unique_key":"2"}]"#).unwrap();
        assert_eq!(records.len(), 2);

        assert!(matches!(
            parse_records(br#"{"unique_key":"1"}"#),
            Err(EtlError::ProcessingError { .. })
        ));
        assert!(matches!(
            parse_records(br#"[{"unique_key":"1"}, 5]"#),
            Err(EtlError::ProcessingError { .. })
        ));
        assert!(matches!(
            parse_records(b"not json"),
            Err(EtlError::SerializationError(_))
        ));
    }

    #[test]
    fn test_nested_location_is_flattened_but_not_projected() {
        let records = parse_records(
            br#"[{"unique_key":"1","complaint_type":"Noise","location":{"lat":40.7,"lon":-73.9}}]"#,
        )
        .unwrap();

        let result = clean_records(records, &CleaningConfig::nyc311()).unwrap();

        assert_eq!(
            result.report.flattened_columns,
            vec!["location_lat".to_string(), "location_lon".to_string()]
        );
        assert_eq!(
            result.report.output_columns,
            vec!["unique_key".to_string(), "complaint_type".to_string()]
        );
        assert_eq!(
            result.table.rows,
            vec![vec![Value::Text("1".into()), Value::Text("Noise".into())]]
        );
    }

    #[test]
    fn test_column_name_variants_collapse_to_one_row() {
        let records = parse_records(
            br#"[
                {"unique_key":"7","Complaint Type":"Noise"},
                {"unique_key":"7","complaint-type":"Noise"}
            ]"#,
        )
        .unwrap();

        let result = clean_records(records, &CleaningConfig::nyc311()).unwrap();

        assert_eq!(result.report.duplicates_removed, 1);
        assert_eq!(result.report.output_rows, 1);
        assert_eq!(
            result.report.output_columns,
            vec!["unique_key".to_string(), "complaint_type".to_string()]
        );
    }

    #[test]
    fn test_bad_zip_becomes_null_and_row_is_kept() {
        let records = parse_records(
            br#"[
                {"unique_key":"1","incident_zip":"abc","created_date":"2024-01-05T10:30:00.000"},
                {"unique_key":"2","incident_zip":"10001","created_date":"garbage"}
            ]"#,
        )
        .unwrap();

        let result = clean_records(records, &CleaningConfig::nyc311()).unwrap();
        let table = &result.table;

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.value(0, "incident_zip"), Some(&Value::Null));
        assert_eq!(table.value(1, "incident_zip"), Some(&Value::Int(10001)));
        assert!(matches!(
            table.value(0, "created_date"),
            Some(Value::Timestamp(_))
        ));
        assert_eq!(table.value(1, "created_date"), Some(&Value::Null));
        assert_eq!(result.report.coerced_nulls, 2);

        let zip = table
            .columns
            .iter()
            .find(|c| c.name == "incident_zip")
            .unwrap();
        assert_eq!(zip.column_type, ColumnType::Numeric);
    }

    #[test]
    fn test_defaults_are_filled_after_dedup() {
        let records = parse_records(
            br#"[
                {"unique_key":"1","agency":null,"descriptor":"Loud Music"},
                {"unique_key":"1","agency":null,"descriptor":"Loud Music"},
                {"unique_key":"2","descriptor":null}
            ]"#,
        )
        .unwrap();

        let result = clean_records(records, &CleaningConfig::nyc311()).unwrap();

        assert_eq!(result.report.input_rows, 3);
        assert_eq!(result.report.duplicates_removed, 1);
        assert_eq!(result.table.value(0, "agency"), Some(&Value::Text("Unknown".into())));
        assert_eq!(
            result.table.value(1, "descriptor"),
            Some(&Value::Text("Not Specified".into()))
        );
    }

    #[test]
    fn test_empty_input_gives_empty_table() {
        let result = clean_records(Vec::new(), &CleaningConfig::nyc311()).unwrap();
        assert_eq!(result.table.row_count(), 0);
        assert_eq!(result.table.column_count(), 0);
        assert_eq!(result.report, CleanReport::default());
    }

    #[test]
    fn test_flatten_collision_is_fatal() {
        let records = parse_records(
            br#"[{"location":{"lat":1},"location_lat":2}]"#,
        )
        .unwrap();

        assert!(matches!(
            clean_records(records, &CleaningConfig::nyc311()),
            Err(EtlError::ColumnCollision { .. })
        ));
    }

    #[test]
    fn test_duplicate_output_column_is_rejected_before_cleaning() {
        let mut config = CleaningConfig::nyc311();
        config.output_columns.push(OutputColumn::new("status", ColumnRole::Categorical));
        let records = parse_records(br#"[{"unique_key":"1","status":"Open"}]"#).unwrap();

        assert!(matches!(
            clean_records(records, &config),
            Err(EtlError::InvalidConfigValueError { .. })
        ));
    }
}
