use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One spreadsheet cell as read from a source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Excel serial date (days since 1899-12-30, fraction is time of day)
    DateTime(f64),
    /// Rendered error value, e.g. `#DIV/0!`
    Error(String),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Textual form of the cell, `None` for an empty cell.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Int(n) => Some(n.to_string()),
            Cell::Float(n) => Some(format_float(*n)),
            Cell::Bool(b) => Some(b.to_string()),
            Cell::DateTime(serial) => Some(format_serial_date(*serial)),
            Cell::Error(e) => Some(e.clone()),
        }
    }
}

// Integers without decimals
fn format_float(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn format_serial_date(serial: f64) -> String {
    let millis = (serial * 86_400_000.0).round() as i64;
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|epoch| epoch.and_hms_opt(0, 0, 0))
        .and_then(|epoch| epoch.checked_add_signed(Duration::milliseconds(millis)))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| format_float(serial))
}

/// A header row plus data rows. Every row has exactly `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from raw header cells, disambiguating repeated and blank
    /// names the way spreadsheet readers usually do.
    pub fn with_header(header: Vec<String>) -> Self {
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut columns = Vec::with_capacity(header.len());

        for (index, name) in header.into_iter().enumerate() {
            let name = if name.trim().is_empty() {
                format!("Unnamed: {}", index)
            } else {
                name
            };
            let unique = match seen.get(&name).copied() {
                None => name.clone(),
                Some(mut count) => loop {
                    let candidate = format!("{}.{}", name, count);
                    count += 1;
                    if !seen.contains_key(&candidate) {
                        seen.insert(name.clone(), count);
                        break candidate;
                    }
                },
            };
            seen.entry(name).or_insert(1);
            seen.insert(unique.clone(), 1);
            columns.push(unique);
        }

        Self::new(columns)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Append a row, padding a short one with missing cells. Readers reject
    /// rows wider than the header before they get here.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Empty);
        self.rows.push(row);
    }

    /// Cells of one column in row order.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().map(move |row| &row[index])
    }

    /// Concatenate tables vertically over the union of their columns.
    ///
    /// Column order is first-seen order across `tables`; cells for columns a
    /// table does not have are left empty.
    pub fn concat(tables: Vec<Table>) -> Table {
        let mut columns: Vec<String> = Vec::new();
        for table in &tables {
            for column in &table.columns {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }

        let mut combined = Table::new(columns);
        for table in tables {
            let mapping: Vec<usize> = table
                .columns
                .iter()
                .filter_map(|c| combined.column_index(c))
                .collect();
            for row in table.rows {
                let mut out = vec![Cell::Empty; combined.columns.len()];
                for (cell, &target) in row.into_iter().zip(&mapping) {
                    out[target] = cell;
                }
                combined.rows.push(out);
            }
        }
        combined
    }

    /// Keep only rows whose index is not in `drop`.
    pub fn without_rows(self, drop: &std::collections::HashSet<usize>) -> Table {
        let rows = self
            .rows
            .into_iter()
            .enumerate()
            .filter(|(index, _)| !drop.contains(index))
            .map(|(_, row)| row)
            .collect();
        Table {
            columns: self.columns,
            rows,
        }
    }
}

/// A loaded dataset and the stable name it is known by (usually the file name).
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub name: String,
    pub table: Table,
}

impl Source {
    pub fn new(name: impl Into<String>, table: Table) -> Self {
        Self {
            name: name.into(),
            table,
        }
    }
}
