use crate::config::cleaning::CleaningConfig;
use crate::domain::model::{Column, Table, Value};
use crate::domain::ports::ColumnLookup;
use std::collections::HashSet;

/// Keeps the whitelisted columns that exist, in whitelist order. Whitelist entries
/// missing from the table are left out, never created as null columns. A repeated
/// entry is kept once, at its first position.
pub fn project_columns(table: Table, config: &CleaningConfig) -> Table {
    let mut seen = HashSet::new();
    let selected: Vec<(usize, Column)> = config
        .output_columns
        .iter()
        .filter_map(|wanted| {
            let index = table.column_index(&wanted.name)?;
            if !seen.insert(index) {
                return None;
            }
            let column = Column {
                role: Some(wanted.role),
                ..table.columns[index].clone()
            };
            Some((index, column))
        })
        .collect();

    let skipped: Vec<&str> = config
        .output_column_names()
        .filter(|name| !table.has_column(name))
        .collect();
    if !skipped.is_empty() {
        tracing::debug!("Output columns not present in data: {}", skipped.join(", "));
    }

    let rows: Vec<Vec<Value>> = table
        .rows
        .into_iter()
        .map(|mut row| {
            selected
                .iter()
                .map(|(index, _)| std::mem::replace(&mut row[*index], Value::Null))
                .collect::<Vec<_>>()
        })
        .collect();

    Table::new(selected.into_iter().map(|(_, c)| c).collect(), rows)
}
