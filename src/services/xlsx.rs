use crate::core::table::{Cell, Table};
use crate::error::{DupsyError, Result};
use crate::services::tabular::TabularFormat;
use calamine::{
    Data, ExcelDateTime, ExcelDateTimeType, Reader, Sheets, Xlsx, open_workbook_auto,
};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::io::{Read, Seek};
use std::path::Path;

/// Days from the 1900 date-system epoch to the 1904 one.
const EPOCH_1904_OFFSET: f64 = 1462.0;

/// Excel-family workbooks: reads xlsx, xlsm, xls, xlsb and ods through
/// calamine, writes xlsx through rust_xlsxwriter.
pub struct ExcelFormat;

impl TabularFormat for ExcelFormat {
    fn read_table(&self, path: &Path) -> Result<Table> {
        let mut workbook =
            open_workbook_auto(path).map_err(|e| DupsyError::read(path, e))?;

        let Some(first) = workbook.sheet_names().first().cloned() else {
            return Err(DupsyError::read(path, "workbook contains no sheets"));
        };
        let range = workbook
            .worksheet_range(&first)
            .map_err(|e| DupsyError::read(path, format!("sheet '{}': {}", first, e)))?;

        let mut rows = range.rows();
        let header = rows
            .next()
            .map(|row| {
                row.iter()
                    .map(|data| to_cell(data).to_text().unwrap_or_default())
                    .collect()
            })
            .unwrap_or_default();

        let mut table = Table::with_header(header);
        for row in rows {
            table.push_row(row.iter().map(to_cell).collect());
        }
        Ok(table)
    }

    /// Only xlsx can be streamed cell by cell; the other formats fall back to
    /// loading the first sheet.
    fn read_columns(&self, path: &Path) -> Result<Vec<String>> {
        match open_workbook_auto(path).map_err(|e| DupsyError::read(path, e))? {
            Sheets::Xlsx(mut xlsx) => Ok(Table::with_header(header_row(&mut xlsx, path)?)
                .columns()
                .to_vec()),
            _ => Ok(self.read_table(path)?.columns().to_vec()),
        }
    }

    fn encode_table(&self, table: &Table, sheet_name: &str, path: &Path) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        fill_worksheet(worksheet, table, sheet_name).map_err(|e| DupsyError::write(path, e))?;
        workbook
            .save_to_buffer()
            .map_err(|e| DupsyError::write(path, e))
    }
}

/// First non-empty row of the first worksheet, read without loading the rest.
fn header_row<RS: Read + Seek>(xlsx: &mut Xlsx<RS>, path: &Path) -> Result<Vec<String>> {
    let Some(first) = xlsx.sheet_names().first().cloned() else {
        return Err(DupsyError::read(path, "workbook contains no sheets"));
    };
    let mut cells = xlsx
        .worksheet_cells_reader(&first)
        .map_err(|e| DupsyError::read(path, format!("sheet '{}': {}", first, e)))?;

    let mut header_at = None;
    let mut named: Vec<(u32, String)> = Vec::new();
    while let Some(cell) = cells.next_cell().map_err(|e| DupsyError::read(path, e))? {
        let value = Data::from(cell.get_value().clone());
        if value == Data::Empty {
            continue;
        }
        let (row, col) = cell.get_position();
        match header_at {
            None => header_at = Some(row),
            Some(header) if header != row => break,
            Some(_) => {}
        }
        named.push((col, to_cell(&value).to_text().unwrap_or_default()));
    }

    let Some(start) = named.iter().map(|(col, _)| *col).min() else {
        return Ok(Vec::new());
    };
    let width = named.iter().map(|(col, _)| col - start + 1).max().unwrap_or(0);
    let mut header = vec![String::new(); width as usize];
    for (col, name) in named {
        header[(col - start) as usize] = name;
    }
    Ok(header)
}

/// Serial number in the 1900 date system, whichever system the workbook uses.
fn serial_1900(dt: &ExcelDateTime) -> f64 {
    let as_1904 = ExcelDateTime::new(dt.as_f64(), ExcelDateTimeType::DateTime, true);
    if *dt == as_1904 {
        dt.as_f64() + EPOCH_1904_OFFSET
    } else {
        dt.as_f64()
    }
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(n) => Cell::Int(*n),
        Data::Float(n) => Cell::Float(*n),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::DateTime(serial_1900(dt)),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Error(e.to_string()),
    }
}

fn fill_worksheet(
    worksheet: &mut Worksheet,
    table: &Table,
    sheet_name: &str,
) -> std::result::Result<(), XlsxError> {
    worksheet.set_name(sheet_name)?;

    let header_format = Format::new().set_bold();
    let date_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    for (col, name) in table.columns().iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, &header_format)?;
    }

    for (index, row) in table.rows().iter().enumerate() {
        let r = index as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            let c = col as u16;
            match cell {
                Cell::Empty => {}
                Cell::Text(s) | Cell::Error(s) => {
                    worksheet.write_string(r, c, s)?;
                }
                Cell::Int(n) => {
                    worksheet.write_number(r, c, *n as f64)?;
                }
                Cell::Float(n) => {
                    worksheet.write_number(r, c, *n)?;
                }
                Cell::Bool(b) => {
                    worksheet.write_boolean(r, c, *b)?;
                }
                Cell::DateTime(serial) => {
                    worksheet.write_number_with_format(r, c, *serial, &date_format)?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sample() -> Table {
        let mut table = Table::new(vec![
            "Name".to_string(),
            "Employees".to_string(),
            "Active".to_string(),
            "Since".to_string(),
        ]);
        table.push_row(vec![
            Cell::Text("Acme Inc".to_string()),
            Cell::Float(12.0),
            Cell::Bool(true),
            Cell::DateTime(45292.0),
        ]);
        table.push_row(vec![
            Cell::Text("Globex".to_string()),
            Cell::Empty,
            Cell::Bool(false),
            Cell::Empty,
        ]);
        table
    }

    #[test]
    fn test_xlsx_write_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("companies.xlsx");

        let bytes = ExcelFormat.encode_table(&sample(), "Companies", &path).unwrap();
        fs::write(&path, bytes).unwrap();

        let table = ExcelFormat.read_table(&path).unwrap();
        assert_eq!(table.columns(), ["Name", "Employees", "Active", "Since"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0][0], Cell::Text("Acme Inc".to_string()));
        assert_eq!(table.rows()[0][1].to_text().unwrap(), "12");
        assert_eq!(table.rows()[0][2], Cell::Bool(true));
        assert_eq!(table.rows()[0][3].to_text().unwrap(), "2024-01-01 00:00:00");
        assert!(table.rows()[1][1].is_empty());
    }

    #[test]
    fn test_read_columns_from_header_row() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("companies.xlsx");
        let mut table = sample();
        table.push_row(vec![Cell::Text("Initech".to_string())]);
        fs::write(&path, ExcelFormat.encode_table(&table, "Sheet1", &path).unwrap()).unwrap();

        assert_eq!(
            ExcelFormat.read_columns(&path).unwrap(),
            ["Name", "Employees", "Active", "Since"]
        );
    }

    #[test]
    fn test_1904_dates_are_shifted_to_1900_serials() {
        let in_1904 = Data::DateTime(ExcelDateTime::new(43830.0, ExcelDateTimeType::DateTime, true));
        let in_1900 = Data::DateTime(ExcelDateTime::new(45292.0, ExcelDateTimeType::DateTime, false));

        assert_eq!(to_cell(&in_1904), Cell::DateTime(45292.0));
        assert_eq!(to_cell(&in_1904).to_text().unwrap(), "2024-01-01 00:00:00");
        assert_eq!(to_cell(&in_1900), to_cell(&in_1904));
    }

    #[test]
    fn test_durations_are_not_shifted() {
        let duration = Data::DateTime(ExcelDateTime::new(1.5, ExcelDateTimeType::TimeDelta, true));
        assert_eq!(to_cell(&duration), Cell::DateTime(1.5));
    }

    #[test]
    fn test_invalid_sheet_name_is_write_error() {
        let result = ExcelFormat.encode_table(&sample(), "bad/name", Path::new("out.xlsx"));
        assert!(matches!(result, Err(DupsyError::Write { .. })));
    }

    #[test]
    fn test_corrupt_workbook_is_read_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.xlsx");
        fs::write(&path, b"not a zip archive").unwrap();

        assert!(matches!(
            ExcelFormat.read_table(&path),
            Err(DupsyError::Read { .. })
        ));
    }
}
