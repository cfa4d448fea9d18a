use crate::config::cleaning::CleaningConfig;
use crate::domain::model::{Table, Value};
use crate::domain::ports::ColumnLookup;
use std::collections::HashSet;

/// Drops rows identical to an earlier row across every column. The first
/// occurrence is kept and row order is preserved.
pub fn drop_duplicates(table: Table) -> (Table, usize) {
    let Table { columns, rows } = table;
    let before = rows.len();

    let mut seen: HashSet<Vec<Value>> = HashSet::with_capacity(rows.len());
    let rows: Vec<Vec<Value>> = rows
        .into_iter()
        .filter(|row| {
            if seen.contains(row) {
                false
            } else {
                seen.insert(row.clone());
                true
            }
        })
        .collect();

    let removed = before - rows.len();
    (Table::new(columns, rows), removed)
}

/// Replaces nulls in each configured column with its default. Columns not in the
/// table are skipped.
pub fn fill_defaults(table: Table, config: &CleaningConfig) -> (Table, usize) {
    let mut table = table;
    let mut filled = 0;

    for (name, default) in &config.fill_defaults {
        let Some(index) = table.column_index(name) else {
            continue;
        };
        for row in &mut table.rows {
            if row[index].is_null() {
                row[index] = Value::Text(default.clone());
                filled += 1;
            }
        }
    }

    (table, filled)
}

/// Deduplicates, then fills defaults. The order is fixed.
pub fn sanitize_records(table: Table, config: &CleaningConfig) -> (Table, usize, usize) {
    let (table, removed) = drop_duplicates(table);
    let (table, filled) = fill_defaults(table, config);
    tracing::debug!(
        "Sanitized table: {} duplicate row(s) removed, {} default(s) filled",
        removed,
        filled
    );
    (table, removed, filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Column;

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn test_drop_duplicates_keeps_first_occurrence_in_order() {
        let table = Table::new(
            vec![Column::new("unique_key"), Column::new("agency")],
            vec![
                vec![text("1"), text("NYPD")],
                vec![text("2"), Value::Null],
                vec![text("1"), text("NYPD")],
                vec![text("3"), text("DOT")],
                vec![text("2"), Value::Null],
            ],
        );

        let (out, removed) = drop_duplicates(table);

        assert_eq!(removed, 2);
        assert_eq!(
            out.rows,
            vec![
                vec![text("1"), text("NYPD")],
                vec![text("2"), Value::Null],
                vec![text("3"), text("DOT")],
            ]
        );
    }

    #[test]
    fn test_rows_differing_in_one_column_are_kept() {
        let table = Table::new(
            vec![Column::new("a"), Column::new("b")],
            vec![
                vec![Value::Int(1), Value::Float(1.0)],
                vec![Value::Int(1), Value::Int(1)],
            ],
        );
        let (out, removed) = drop_duplicates(table);
        assert_eq!(removed, 0);
        assert_eq!(out.row_count(), 2);
    }

    #[test]
    fn test_fill_defaults_only_touches_nulls_of_present_columns() {
        let table = Table::new(
            vec![Column::new("agency"), Column::new("descriptor"), Column::new("status")],
            vec![
                vec![Value::Null, text("Loud Music"), Value::Null],
                vec![text("NYPD"), Value::Null, Value::Null],
            ],
        );

        let (out, filled) = fill_defaults(table, &CleaningConfig::nyc311_with_borough());

        assert_eq!(filled, 2);
        assert_eq!(out.rows[0], vec![text("Unknown"), text("Loud Music"), Value::Null]);
        assert_eq!(out.rows[1], vec![text("NYPD"), text("Not Specified"), Value::Null]);
        assert!(!out.has_column("borough"));
    }

    #[test]
    fn test_dedup_runs_before_fill() {
        // 兩列只差在一個 null 與預設值；先去重所以兩列都保留
        let table = Table::new(
            vec![Column::new("unique_key"), Column::new("agency")],
            vec![
                vec![text("1"), Value::Null],
                vec![text("1"), text("Unknown")],
            ],
        );

        let (out, removed, filled) = sanitize_records(table, &CleaningConfig::nyc311());

        assert_eq!(removed, 0);
        assert_eq!(filled, 1);
        assert_eq!(out.row_count(), 2);
        assert_eq!(out.rows[0], out.rows[1]);
    }
}
