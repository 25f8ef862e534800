use crate::core::normalize::normalize_cell;
use crate::core::table::Source;
use crate::error::{InputError, Result};
use serde::{Deserialize, Serialize};

/// A normalized value and the source it was found in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub key: String,
    pub source: String,
}

impl Record {
    pub fn new(key: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            source: source.into(),
        }
    }
}

/// Collect one record per non-empty cell of the selected columns.
///
/// Order is source, then selected column, then row. Columns a source does not
/// have are skipped for that source only.
pub fn extract_records(sources: &[Source], columns: &[String]) -> Result<Vec<Record>> {
    if sources.is_empty() {
        return Err(InputError::NoSources.into());
    }
    if columns.is_empty() {
        return Err(InputError::NoColumns.into());
    }

    let mut records = Vec::new();
    for source in sources {
        for column in columns {
            let Some(index) = source.table.column_index(column) else {
                log::debug!("Column '{}' not present in {}; skipping", column, source.name);
                continue;
            };
            records.extend(
                source
                    .table
                    .column(index)
                    .filter(|cell| !cell.is_empty())
                    .map(|cell| Record::new(normalize_cell(cell), source.name.as_str())),
            );
        }
    }

    log::info!(
        "Extracted {} records from {} source(s)",
        records.len(),
        sources.len()
    );
    Ok(records)
}
