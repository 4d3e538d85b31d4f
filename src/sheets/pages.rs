// file: src/sheets/pages.rs
use crate::models::OneColumnRecord;
use crate::sheets::rows::{normalize_row, RawRow};

/// Picks the text of a one-column row: the named column when configured and
/// present, otherwise the first non-blank cell. Empty text drops the row.
pub fn map_page_row(row: &RawRow, column: Option<&str>, position: usize) -> Option<OneColumnRecord> {
    let row = normalize_row(row);

    let text = column
        .and_then(|name| row.get(&name.trim().to_lowercase()))
        .or_else(|| row.values().find(|value| !value.trim().is_empty()))
        .map(String::as_str);

    let cleaned = text.unwrap_or_default().trim();
    if cleaned.is_empty() {
        return None;
    }

    Some(OneColumnRecord::new(position, cleaned.to_string()))
}

pub fn map_page_rows(rows: &[RawRow], column: Option<&str>) -> Vec<OneColumnRecord> {
    rows.iter()
        .enumerate()
        .filter_map(|(position, row)| map_page_row(row, column, position))
        .collect()
}
