// file: src/sheets/rows.rs
use indexmap::IndexMap;

/// One spreadsheet row as delivered by the proxy, column name to cell text,
/// in sheet column order.
pub type RawRow = IndexMap<String, String>;

/// Trims and lower-cases column names and trims cell values. When two
/// columns normalize to the same name the later value wins, at the position
/// of the first.
pub fn normalize_row(row: &RawRow) -> RawRow {
    let mut normalized = RawRow::with_capacity(row.len());
    for (key, value) in row {
        normalized.insert(key.trim().to_lowercase(), value.trim().to_string());
    }
    normalized
}

/// First non-blank value among `keys`, tried in order. Keys are matched
/// against an already normalized row.
pub fn value_for<'a>(row: &'a RawRow, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| row.get(&key.trim().to_lowercase()))
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_normalize_row() {
        let normalized = normalize_row(&row(&[(" Title ", "  Math  "), ("ROOM", "101")]));
        assert_eq!(normalized.get("title").map(String::as_str), Some("Math"));
        assert_eq!(normalized.get("room").map(String::as_str), Some("101"));
        let keys: Vec<_> = normalized.keys().cloned().collect();
        assert_eq!(keys, vec!["title", "room"]);
    }

    #[test]
    fn test_value_for_priority_and_blank_skipping() {
        let normalized = normalize_row(&row(&[("name", "Chess"), ("title", "  ")]));
        assert_eq!(value_for(&normalized, &["title", "name"]), Some("Chess"));

        let both = normalize_row(&row(&[("name", "Chess"), ("title", "Go")]));
        assert_eq!(value_for(&both, &["title", "name"]), Some("Go"));

        assert_eq!(value_for(&both, &["teacher", "instructor"]), None);
    }

    #[test]
    fn test_value_for_mixed_case_keys() {
        let normalized = normalize_row(&row(&[("ChineseTeacher", "王老师")]));
        assert_eq!(value_for(&normalized, &["chineseTeacher"]), Some("王老师"));
    }
}
