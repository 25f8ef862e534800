use crate::core::normalize::normalize_cell;
use crate::core::selection::RemovalSet;
use crate::core::table::{Source, Table};
use std::collections::{BTreeSet, HashSet};

/// Rows that would be dropped from one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRemoval {
    pub source: String,
    pub rows: Vec<usize>,
}

/// Indexes of rows in `source` whose value in any selected column normalizes
/// to one of the keys marked for that source.
///
/// Every occurrence of a marked value goes, not only the occurrence that was
/// matched.
pub fn rows_to_remove(source: &Source, columns: &[String], removal: &RemovalSet) -> Vec<usize> {
    let Some(keys) = removal.get(&source.name).filter(|keys| !keys.is_empty()) else {
        return Vec::new();
    };

    let indexes: Vec<usize> = columns
        .iter()
        .filter_map(|column| source.table.column_index(column))
        .collect();

    let mut marked = BTreeSet::new();
    for index in indexes {
        for (row, cell) in source.table.column(index).enumerate() {
            if keys.contains(&normalize_cell(cell)) {
                marked.insert(row);
            }
        }
    }
    marked.into_iter().collect()
}

/// Preview of what `clean` would drop, one entry per source in order.
pub fn plan_removal(sources: &[Source], columns: &[String], removal: &RemovalSet) -> Vec<SourceRemoval> {
    sources
        .iter()
        .map(|source| SourceRemoval {
            source: source.name.clone(),
            rows: rows_to_remove(source, columns, removal),
        })
        .collect()
}

/// Drop marked rows from each source and stack the survivors, in source
/// order, into one table over the union of the source columns.
pub fn clean(sources: Vec<Source>, columns: &[String], removal: &RemovalSet) -> Table {
    let mut survivors = Vec::with_capacity(sources.len());
    for source in sources {
        let drop: HashSet<usize> = rows_to_remove(&source, columns, removal)
            .into_iter()
            .collect();
        log::info!(
            "Removing {} of {} rows from {}",
            drop.len(),
            source.table.len(),
            source.name
        );
        survivors.push(source.table.without_rows(&drop));
    }
    Table::concat(survivors)
}
