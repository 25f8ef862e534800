use crate::core::table::Cell;

/// Canonical comparison key for a raw value: trimmed and lowercased.
///
/// A missing value maps to the empty string. Punctuation and accents are left
/// alone, so `"Café"` and `"cafe"` stay distinct keys.
pub fn normalize(value: Option<&str>) -> String {
    match value {
        Some(raw) => raw.trim().to_lowercase(),
        None => String::new(),
    }
}

/// Canonical key for a spreadsheet cell.
pub fn normalize_cell(cell: &Cell) -> String {
    normalize(cell.to_text().as_deref())
}
