use crate::domain::model::{Column, Table, Value};
use std::collections::HashMap;

/// Lower-cases a column name and turns spaces and hyphens into underscores.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase().replace([' ', '-'], "_")
}

/// Normalizes every column name.
///
/// Columns that end up with the same name are merged into the first one: each row
/// keeps its first non-null value, left to right. Returns the table and the number
/// of cells where two different non-null values met (the left-most one wins).
pub fn normalize_columns(table: Table) -> (Table, usize) {
    let Table { columns, rows } = table;

    let mut targets: Vec<usize> = Vec::with_capacity(columns.len());
    let mut out_columns: Vec<Column> = Vec::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();

    for column in columns {
        let name = normalize_name(&column.name);
        match by_name.get(&name) {
            Some(&existing) => targets.push(existing),
            None => {
                by_name.insert(name.clone(), out_columns.len());
                targets.push(out_columns.len());
                out_columns.push(Column { name, ..column });
            }
        }
    }

    if out_columns.len() == targets.len() {
        return (Table::new(out_columns, rows), 0);
    }

    tracing::debug!(
        "Merging {} column(s) that share a normalized name",
        targets.len() - out_columns.len()
    );

    let mut conflicts = 0;
    let width = out_columns.len();
    let out_rows = rows
        .into_iter()
        .map(|row| {
            let mut merged = vec![Value::Null; width];
            for (value, &target) in row.into_iter().zip(&targets) {
                if value.is_null() {
                    continue;
                }
                if merged[target].is_null() {
                    merged[target] = value;
                } else if merged[target] != value {
                    conflicts += 1;
                }
            }
            merged
        })
        .collect();

    if conflicts > 0 {
        tracing::warn!(
            "{} cell(s) had conflicting values in merged columns; kept the left-most value",
            conflicts
        );
    }

    (Table::new(out_columns, out_rows), conflicts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_row(names: &[&str], values: Vec<Value>) -> Table {
        Table::new(names.iter().map(|n| Column::new(*n)).collect(), vec![values])
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Complaint Type"), "complaint_type");
        assert_eq!(normalize_name("Incident-Zip"), "incident_zip");
        assert_eq!(normalize_name("Due Date - Closed"), "due_date___closed");
        assert_eq!(normalize_name("unique_key"), "unique_key");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for name in ["Complaint Type", "BBL", "x-coordinate (state plane)", "a b-c"] {
            let once = normalize_name(name);
            assert_eq!(normalize_name(&once), once);
        }

        let table = single_row(&["Created Date", "Agency Name"], vec![Value::Null, Value::Null]);
        let (once, _) = normalize_columns(table);
        let (twice, conflicts) = normalize_columns(once.clone());
        assert_eq!(twice, once);
        assert_eq!(conflicts, 0);
    }

    #[test]
    fn test_values_untouched_without_collision() {
        let table = single_row(&["Status"], vec![Value::Text("Open Case".to_string())]);
        let (out, _) = normalize_columns(table);
        assert_eq!(out.columns[0].name, "status");
        assert_eq!(out.rows[0][0], Value::Text("Open Case".to_string()));
    }

    #[test]
    fn test_colliding_names_merge_first_non_null() {
        let table = Table::new(
            vec![
                Column::new("Complaint Type"),
                Column::new("status"),
                Column::new("complaint-type"),
            ],
            vec![
                vec![Value::Null, Value::Text("Open".into()), Value::Text("Noise".into())],
                vec![Value::Text("Heat".into()), Value::Null, Value::Text("Water".into())],
            ],
        );

        let (out, conflicts) = normalize_columns(table);

        assert_eq!(
            out.column_names().collect::<Vec<_>>(),
            vec!["complaint_type", "status"]
        );
        assert_eq!(out.rows[0], vec![Value::Text("Noise".into()), Value::Text("Open".into())]);
        assert_eq!(out.rows[1], vec![Value::Text("Heat".into()), Value::Null]);
        assert_eq!(conflicts, 1);
    }
}
