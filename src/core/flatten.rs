use crate::core::normalize::normalize_name;
use crate::domain::model::{Column, Table, Value};
use crate::utils::error::{EtlError, Result};
use std::collections::HashSet;

/// Expands every column holding at least one nested object into `{parent}_{key}`
/// columns, one level deep.
///
/// - The whole column is scanned; a single object anywhere marks it.
/// - Sub-columns are the union of keys across the column, in first-seen order.
/// - Rows without an object (or without a key) get `Null`.
/// - The parent column is dropped and its sub-columns are appended at the end.
/// - Objects nested inside sub-column values are kept as-is.
///
/// Fails with [`EtlError::ColumnCollision`] when a derived name already exists,
/// comparing names as they will read after normalization.
pub fn flatten_nested_columns(table: Table) -> Result<Table> {
    let nested: Vec<usize> = (0..table.column_count())
        .filter(|&i| table.column_values(i).any(|v| matches!(v, Value::Object(_))))
        .collect();

    if nested.is_empty() {
        return Ok(table);
    }

    // 每個巢狀欄位的子欄位 key（聯集，依出現順序）
    let expansions: Vec<(usize, Vec<String>)> = nested
        .iter()
        .map(|&i| (i, union_of_keys(&table, i)))
        .collect();

    // 以正規化後的名稱比對，避免 `Location_Lat` 與 `location_lat` 之後被合併
    let mut taken: HashSet<String> = table
        .columns
        .iter()
        .enumerate()
        .filter(|(i, _)| !nested.contains(i))
        .map(|(_, c)| normalize_name(&c.name))
        .collect();

    let mut derived_columns = Vec::new();
    for (parent, keys) in &expansions {
        let parent_name = &table.columns[*parent].name;
        for key in keys {
            let name = format!("{}_{}", parent_name, key);
            if !taken.insert(normalize_name(&name)) {
                return Err(EtlError::ColumnCollision { column: name });
            }
            derived_columns.push(Column::new(name));
        }
    }

    tracing::debug!(
        "Flattening {} nested column(s) into {} sub-column(s)",
        expansions.len(),
        derived_columns.len()
    );

    let Table { columns, rows } = table;

    let mut out_columns: Vec<Column> = columns
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !nested.contains(i))
        .map(|(_, c)| c)
        .collect();
    out_columns.extend(derived_columns);

    let out_rows = rows
        .into_iter()
        .map(|row| {
            let mut kept = Vec::with_capacity(out_columns.len());
            let mut parents = Vec::with_capacity(nested.len());
            for (i, value) in row.into_iter().enumerate() {
                if nested.contains(&i) {
                    parents.push(value);
                } else {
                    kept.push(value);
                }
            }

            for ((_, keys), parent) in expansions.iter().zip(parents) {
                let mut fields = match parent {
                    Value::Object(fields) => fields,
                    _ => Vec::new(),
                };
                for key in keys {
                    let value = fields
                        .iter()
                        .position(|(k, _)| k == key)
                        .map(|pos| fields.swap_remove(pos).1)
                        .unwrap_or(Value::Null);
                    kept.push(value);
                }
            }
            kept
        })
        .collect();

    Ok(Table::new(out_columns, out_rows))
}

fn union_of_keys(table: &Table, index: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    for value in table.column_values(index) {
        if let Value::Object(fields) = value {
            for (key, _) in fields {
                if seen.insert(key.as_str()) {
                    keys.push(key.clone());
                }
            }
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Record;
    use crate::domain::ports::ColumnLookup;
    use serde_json::json;

    fn table(value: serde_json::Value) -> Table {
        let records = value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| Record::from(v.as_object().unwrap().clone()))
            .collect();
        Table::from_records(records)
    }

    #[test]
    fn test_flatten_appends_sub_columns_and_drops_parent() {
        let input = table(json!([
            {"unique_key": "1", "location": {"lat": 40.7, "lon": -73.9}, "status": "Open"}
        ]));

        let out = flatten_nested_columns(input).unwrap();

        assert_eq!(
            out.column_names().collect::<Vec<_>>(),
            vec!["unique_key", "status", "location_lat", "location_lon"]
        );
        assert_eq!(out.value(0, "location_lat"), Some(&Value::Float(40.7)));
        assert!(!out.has_column("location"));
    }

    #[test]
    fn test_mixed_column_and_key_union() {
        let input = table(json!([
            {"loc": {"a": 1}},
            {"loc": "not an object"},
            {"loc": {"b": 2}},
            {}
        ]));

        let out = flatten_nested_columns(input).unwrap();

        assert_eq!(out.column_names().collect::<Vec<_>>(), vec!["loc_a", "loc_b"]);
        assert_eq!(out.rows[0], vec![Value::Int(1), Value::Null]);
        assert_eq!(out.rows[1], vec![Value::Null, Value::Null]);
        assert_eq!(out.rows[2], vec![Value::Null, Value::Int(2)]);
        assert_eq!(out.rows[3], vec![Value::Null, Value::Null]);
    }

    #[test]
    fn test_only_one_level_is_expanded() {
        let input = table(json!([
            {"geo": {"point": {"lat": 1.0}, "kind": "Point"}}
        ]));

        let out = flatten_nested_columns(input).unwrap();

        assert_eq!(out.column_names().collect::<Vec<_>>(), vec!["geo_point", "geo_kind"]);
        assert!(matches!(out.value(0, "geo_point"), Some(Value::Object(_))));
    }

    #[test]
    fn test_table_without_objects_is_untouched() {
        let input = table(json!([{"a": 1, "b": "x"}, {"a": 2, "b": null}]));
        let out = flatten_nested_columns(input.clone()).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn test_collision_with_existing_column_fails() {
        let input = table(json!([
            {"location_lat": "40.7", "location": {"lat": 40.7}}
        ]));

        let err = flatten_nested_columns(input).unwrap_err();
        assert!(matches!(err, EtlError::ColumnCollision { ref column } if column == "location_lat"));
    }

    #[test]
    fn test_collision_after_normalization_fails() {
        let input = table(json!([
            {"Location": {"Lat": "2.0"}, "location_lat": "9.9"}
        ]));

        let err = flatten_nested_columns(input).unwrap_err();
        assert!(matches!(err, EtlError::ColumnCollision { ref column } if column == "Location_Lat"));

        let hyphenated = table(json!([
            {"location-lat": "9.9", "location": {"lat": 2.0}}
        ]));
        assert!(matches!(
            flatten_nested_columns(hyphenated),
            Err(EtlError::ColumnCollision { .. })
        ));
    }

    #[test]
    fn test_collision_between_derived_columns_fails() {
        let input = table(json!([
            {"a_b": {"c": 1}, "a": {"b_c": 2}}
        ]));

        assert!(matches!(
            flatten_nested_columns(input),
            Err(EtlError::ColumnCollision { .. })
        ));
    }

    #[test]
    fn test_parent_columns_are_removed() {
        let input = table(json!([
            {"x": {"y": 1}, "z": {"w": {"deep": true}}},
            {"x": null, "z": {"v": 3}}
        ]));

        let out = flatten_nested_columns(input).unwrap();

        assert_eq!(out.column_names().collect::<Vec<_>>(), vec!["x_y", "z_w", "z_v"]);
        assert!(!out.has_column("x"));
        assert!(!out.has_column("z"));
        assert_eq!(out.rows[1], vec![Value::Null, Value::Null, Value::Int(3)]);
    }
}
