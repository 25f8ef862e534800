use crate::core::table::{Source, Table};
use crate::error::{DupsyError, Result};
use crate::services::csv::CsvFormat;
use crate::services::xlsx::ExcelFormat;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Reading and writing one tabular file format. Matching never sees files,
/// only the `Table`s these produce.
pub trait TabularFormat {
    /// Read the first sheet, using its first row as the header.
    fn read_table(&self, path: &Path) -> Result<Table>;

    /// Encode `table` as a complete file. `sheet_name` is used by formats that
    /// have named sheets.
    fn encode_table(&self, table: &Table, sheet_name: &str, path: &Path) -> Result<Vec<u8>>;

    fn read_columns(&self, path: &Path) -> Result<Vec<String>> {
        Ok(self.read_table(path)?.columns().to_vec())
    }
}

const EXCEL_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xls", "xlsb", "ods"];

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
}

pub fn is_supported(path: &Path) -> bool {
    matches!(extension(path).as_deref(), Some(ext) if ext == "csv" || EXCEL_EXTENSIONS.contains(&ext))
}

/// Pick a reader by file extension.
pub fn reader_for(path: &Path) -> Result<Box<dyn TabularFormat>> {
    match extension(path).as_deref() {
        Some("csv") => Ok(Box::new(CsvFormat)),
        Some(ext) if EXCEL_EXTENSIONS.contains(&ext) => Ok(Box::new(ExcelFormat)),
        _ => Err(DupsyError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Pick a writer by file extension. Only `.xlsx` and `.csv` can be written.
pub fn writer_for(path: &Path) -> Result<Box<dyn TabularFormat>> {
    match extension(path).as_deref() {
        Some("csv") => Ok(Box::new(CsvFormat)),
        Some("xlsx") => Ok(Box::new(ExcelFormat)),
        _ => Err(DupsyError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Encode and write `table` to `path`.
///
/// The bytes go to a temporary file next to `path` that is renamed into
/// place only once fully written, so a failure never leaves a file at `path`.
pub fn write_table(table: &Table, sheet_name: &str, path: &Path) -> Result<()> {
    let bytes = writer_for(path)?.encode_table(table, sheet_name, path)?;

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| DupsyError::write(path, e))?;
    tmp.write_all(&bytes)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| DupsyError::write(path, e))?;
    tmp.persist(path)
        .map_err(|e| DupsyError::write(path, e.error))?;

    log::info!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

/// A source file selected by the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceHandle {
    pub path: PathBuf,
    /// Stable identifier used in records, reports and removal sets
    pub name: String,
}

impl SourceHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self { path, name }
    }

    /// Read the whole file. The file is closed again before this returns.
    pub fn load(&self) -> Result<Source> {
        let table = reader_for(&self.path)?.read_table(&self.path)?;
        log::debug!(
            "Loaded {} ({} rows, {} columns)",
            self.name,
            table.len(),
            table.columns().len()
        );
        Ok(Source::new(self.name.clone(), table))
    }

    pub fn columns(&self) -> Result<Vec<String>> {
        reader_for(&self.path)?.read_columns(&self.path)
    }
}

/// Load every handle in order, failing on the first unreadable one.
pub fn load_sources(handles: &[SourceHandle]) -> Result<Vec<Source>> {
    handles.iter().map(SourceHandle::load).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::table::Cell;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_format_selection_by_extension() {
        assert!(reader_for(Path::new("a.XLSX")).is_ok());
        assert!(reader_for(Path::new("a.ods")).is_ok());
        assert!(reader_for(Path::new("a.csv")).is_ok());
        assert!(matches!(
            reader_for(Path::new("a.txt")),
            Err(DupsyError::UnsupportedFormat { .. })
        ));
        assert!(writer_for(Path::new("out.xls")).is_err());
        assert!(is_supported(Path::new("dir/list.xlsm")));
        assert!(!is_supported(Path::new("notes")));
    }

    #[test]
    fn test_source_name_is_file_name() {
        let handle = SourceHandle::new("/data/customers/list.xlsx");
        assert_eq!(handle.name, "list.xlsx");
    }

    #[test]
    fn test_unwritable_format_leaves_no_file() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("out.xls");
        let table = Table::new(vec!["Name".to_string()]);

        assert!(write_table(&table, "Sheet1", &out).is_err());
        assert!(!out.exists());
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_write_replaces_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("out.csv");
        fs::write(&out, "stale").unwrap();

        let mut table = Table::new(vec!["Name".to_string()]);
        table.push_row(vec![Cell::Text("Acme".to_string())]);
        write_table(&table, "Sheet1", &out).unwrap();

        assert_eq!(fs::read_to_string(&out).unwrap(), "Name\nAcme\n");
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_missing_source_is_read_error() {
        let handle = SourceHandle::new("/definitely/not/here.csv");
        assert!(matches!(handle.load(), Err(DupsyError::Read { .. })));
    }
}
