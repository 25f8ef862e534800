use crate::core::matcher::MatchPair;
use crate::core::table::{Cell, Table};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const REPORT_SHEET: &str = "Fuzzy Matches";
pub const REPORT_COLUMNS: [&str; 5] = ["Value A", "File A", "Value B", "File B", "Similarity Score"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub value_a: String,
    pub file_a: String,
    pub value_b: String,
    pub file_b: String,
    pub score: u8,
}

/// One row per unordered pair of keys. `(a, b)` and `(b, a)` collapse into the
/// first one seen, whatever sources the later ones came from.
pub fn build_report(pairs: &[MatchPair]) -> Vec<ReportRow> {
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    pairs
        .iter()
        .filter(|pair| seen.insert(sorted_keys(*pair)))
        .map(|pair| ReportRow {
            value_a: pair.key_a.clone(),
            file_a: pair.source_a.clone(),
            value_b: pair.key_b.clone(),
            file_b: pair.source_b.clone(),
            score: pair.score,
        })
        .collect()
}

fn sorted_keys(pair: &MatchPair) -> (&str, &str) {
    let (a, b) = (pair.key_a.as_str(), pair.key_b.as_str());
    if a <= b { (a, b) } else { (b, a) }
}

pub fn report_table(rows: &[ReportRow]) -> Table {
    let mut table = Table::new(REPORT_COLUMNS.iter().map(|c| c.to_string()).collect());
    for row in rows {
        table.push_row(vec![
            Cell::Text(row.value_a.clone()),
            Cell::Text(row.file_a.clone()),
            Cell::Text(row.value_b.clone()),
            Cell::Text(row.file_b.clone()),
            Cell::Int(i64::from(row.score)),
        ]);
    }
    table
}
