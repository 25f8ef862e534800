use crate::core::table::{Cell, Table};
use crate::error::{DupsyError, Result};
use crate::services::tabular::TabularFormat;
use std::fs::File;
use std::path::Path;

/// Comma-separated text with a header line. Every non-empty field is read as
/// text; empty fields are missing values.
///
/// Short rows are padded with missing values. A row with more fields than the
/// header is a read error.
pub struct CsvFormat;

fn open(path: &Path) -> Result<csv::Reader<File>> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| DupsyError::read(path, e))
}

fn header(reader: &mut csv::Reader<File>, path: &Path) -> Result<Vec<String>> {
    Ok(reader
        .headers()
        .map_err(|e| DupsyError::read(path, e))?
        .iter()
        .map(str::to_string)
        .collect())
}

impl TabularFormat for CsvFormat {
    fn read_table(&self, path: &Path) -> Result<Table> {
        let mut reader = open(path)?;
        let mut table = Table::with_header(header(&mut reader, path)?);

        for record in reader.records() {
            let record = record.map_err(|e| DupsyError::read(path, e))?;
            if record.len() > table.columns().len() {
                let line = record.position().map_or(0, |pos| pos.line());
                return Err(DupsyError::read(
                    path,
                    format!(
                        "line {}: expected {} fields, saw {}",
                        line,
                        table.columns().len(),
                        record.len()
                    ),
                ));
            }
            table.push_row(
                record
                    .iter()
                    .map(|field| {
                        if field.is_empty() {
                            Cell::Empty
                        } else {
                            Cell::Text(field.to_string())
                        }
                    })
                    .collect(),
            );
        }

        Ok(table)
    }

    fn read_columns(&self, path: &Path) -> Result<Vec<String>> {
        let mut reader = open(path)?;
        Ok(Table::with_header(header(&mut reader, path)?).columns().to_vec())
    }

    fn encode_table(&self, table: &Table, _sheet_name: &str, path: &Path) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(table.columns())
            .map_err(|e| DupsyError::write(path, e))?;
        for row in table.rows() {
            writer
                .write_record(row.iter().map(|cell| cell.to_text().unwrap_or_default()))
                .map_err(|e| DupsyError::write(path, e))?;
        }
        writer
            .into_inner()
            .map_err(|e| DupsyError::write(path, e.error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_read_csv_with_missing_values() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("people.csv");
        fs::write(&path, "Name,City\nAcme,Oslo\n,Rome\nGlobex\n").unwrap();

        let table = CsvFormat.read_table(&path).unwrap();
        assert_eq!(table.columns(), ["Name", "City"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows()[1][0], Cell::Empty);
        assert_eq!(table.rows()[2], vec![Cell::Text("Globex".to_string()), Cell::Empty]);
    }

    #[test]
    fn test_row_longer_than_header_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ragged.csv");
        fs::write(&path, "Name,City\nabc,Oslo\nxyz,Bergen,KEEPME\n").unwrap();

        match CsvFormat.read_table(&path) {
            Err(DupsyError::Read { message, .. }) => {
                assert!(message.contains("line 3"), "{}", message);
                assert!(message.contains("expected 2 fields, saw 3"), "{}", message);
            }
            other => panic!("expected a read error, got {:?}", other),
        }
    }

    #[test]
    fn test_read_columns_only_needs_the_header() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("people.csv");
        // A bad data row does not matter when only the header is wanted
        fs::write(&path, "Name,,Name\nabc,Oslo,x,EXTRA\n").unwrap();

        assert_eq!(
            CsvFormat.read_columns(&path).unwrap(),
            ["Name", "Unnamed: 1", "Name.1"]
        );
        assert!(CsvFormat.read_table(&path).is_err());
    }

    #[test]
    fn test_encode_quotes_fields() {
        let mut table = Table::new(vec!["Name".to_string(), "Score".to_string()]);
        table.push_row(vec![Cell::Text("Acme, Inc".to_string()), Cell::Int(90)]);

        let bytes = CsvFormat
            .encode_table(&table, "ignored", Path::new("out.csv"))
            .unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "Name,Score\n\"Acme, Inc\",90\n");
    }
}
