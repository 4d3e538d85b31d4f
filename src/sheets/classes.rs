// file: src/sheets/classes.rs
use crate::models::{stable_class_id, ClassRecord};
use crate::sheets::rows::{normalize_row, value_for, RawRow};
use log::debug;

/// Maps a class sheet row. Rows without a title are dropped.
pub fn map_class_row(row: &RawRow) -> Option<ClassRecord> {
    let row = normalize_row(row);

    let Some(title) = value_for(&row, &["title", "name"]) else {
        debug!("Dropping class row without title: {:?}", row);
        return None;
    };

    let field = |keys: &[&str]| value_for(&row, keys).unwrap_or_default().to_string();
    let optional = |keys: &[&str]| value_for(&row, keys).map(str::to_string);

    let teacher = field(&["teacher", "instructor"]);
    let day = field(&["day"]);
    let time = field(&["time"]);
    let room = field(&["room", "location"]);

    let id = value_for(&row, &["id"])
        .map(str::to_string)
        .unwrap_or_else(|| stable_class_id(title, &teacher, &day, &time, &room));

    Some(ClassRecord {
        id,
        title: title.to_string(),
        teacher,
        chinese_teacher: optional(&["chineseTeacher", "chinese teacher", "中文老师"]),
        day,
        time,
        grade: field(&["grade", "age"]),
        room,
        building_hint: optional(&["buildingHint", "building", "hint"]),
        category: field(&["category", "type"]),
    })
}

/// Maps every row, silently dropping the ones that produce nothing.
pub fn map_class_rows(rows: &[RawRow]) -> Vec<ClassRecord> {
    rows.iter().filter_map(map_class_row).collect()
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
    fn test_map_full_row() {
        let record = map_class_row(&row(&[
            ("ID", "c-17"),
            ("Title", " Calligraphy "),
            ("Instructor", "Zhang Min"),
            ("中文老师", "张敏"),
            ("Day", "Sunday"),
            ("Time", "2:40-4:10"),
            ("Age", "7岁以上"),
            ("Location", "B204"),
            ("Building", "Main building, 2nd floor"),
            ("Type", "Arts"),
        ]))
        .unwrap();

        assert_eq!(record.id, "c-17");
        assert_eq!(record.title, "Calligraphy");
        assert_eq!(record.teacher, "Zhang Min");
        assert_eq!(record.chinese_teacher.as_deref(), Some("张敏"));
        assert_eq!(record.grade, "7岁以上");
        assert_eq!(record.min_age(), Some(7));
        assert_eq!(record.room, "B204");
        assert_eq!(record.building_hint.as_deref(), Some("Main building, 2nd floor"));
        assert_eq!(record.category, "Arts");
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let record = map_class_row(&row(&[("name", "Go")])).unwrap();
        assert_eq!(record.title, "Go");
        assert_eq!(record.teacher, "");
        assert_eq!(record.day, "");
        assert_eq!(record.category, "");
        assert!(record.chinese_teacher.is_none());
        assert!(record.building_hint.is_none());
    }

    #[test]
    fn test_rows_without_title_are_dropped() {
        let rows = vec![
            row(&[("title", "Math"), ("room", "1")]),
            row(&[("title", "   "), ("room", "2")]),
            row(&[("teacher", "Nobody")]),
            row(&[("name", "Art")]),
        ];
        let mapped = map_class_rows(&rows);
        assert_eq!(mapped.len(), rows.len() - 2);
        assert_eq!(mapped[0].title, "Math");
        assert_eq!(mapped[1].title, "Art");
    }

    #[test]
    fn test_derived_id_is_stable_across_fetches() {
        let source = row(&[
            ("title", "Dance"),
            ("teacher", "Chen"),
            ("day", "Sun"),
            ("time", "1pm"),
            ("room", "Gym"),
        ]);
        let first = map_class_row(&source).unwrap();
        let second = map_class_row(&source.clone()).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.id, stable_class_id("Dance", "Chen", "Sun", "1pm", "Gym"));
    }

    #[test]
    fn test_blank_id_column_falls_back_to_derived_id() {
        let record = map_class_row(&row(&[("id", " "), ("title", "Dance")])).unwrap();
        assert_eq!(record.id, stable_class_id("Dance", "", "", "", ""));
    }
}
