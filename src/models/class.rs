// file: src/models/class.rs
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

lazy_static! {
    // "5岁", "10 岁"
    static ref AGE_IN_YEARS: Regex = Regex::new(r"(\d{1,2})\s*岁").unwrap();
}

/// Ordinal grade keyword to starting age. Matched as substrings in table order.
const GRADE_AGES: [(&str, u32); 12] = [
    ("1st", 6),
    ("2nd", 7),
    ("3rd", 8),
    ("4th", 9),
    ("5th", 10),
    ("6th", 11),
    ("7th", 12),
    ("8th", 13),
    ("9th", 14),
    ("10th", 15),
    ("11th", 16),
    ("12th", 17),
];

/// A single course offering from the class sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredClassRecord")]
pub struct ClassRecord {
    pub id: String,
    pub title: String,
    pub teacher: String,
    #[serde(rename = "chineseTeacher")]
    pub chinese_teacher: Option<String>,
    pub day: String,
    pub time: String,
    pub grade: String,
    pub room: String,
    #[serde(rename = "buildingHint")]
    pub building_hint: Option<String>,
    pub category: String,
}

/// Lenient on-disk shape: every field but `title` may be missing.
#[derive(Deserialize)]
struct StoredClassRecord {
    #[serde(default)]
    id: Option<String>,
    title: String,
    #[serde(default)]
    teacher: String,
    #[serde(default, rename = "chineseTeacher")]
    chinese_teacher: Option<String>,
    #[serde(default)]
    day: String,
    #[serde(default)]
    time: String,
    #[serde(default)]
    grade: String,
    #[serde(default)]
    room: String,
    #[serde(default, rename = "buildingHint")]
    building_hint: Option<String>,
    #[serde(default)]
    category: String,
}

impl From<StoredClassRecord> for ClassRecord {
    fn from(stored: StoredClassRecord) -> Self {
        let id = stored
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| {
                stable_class_id(
                    &stored.title,
                    &stored.teacher,
                    &stored.day,
                    &stored.time,
                    &stored.room,
                )
            });

        Self {
            id,
            title: stored.title,
            teacher: stored.teacher,
            chinese_teacher: stored.chinese_teacher,
            day: stored.day,
            time: stored.time,
            grade: stored.grade,
            room: stored.room,
            building_hint: stored.building_hint,
            category: stored.category,
        }
    }
}

/// Derives a UUID-formatted identifier from the fields that identify a class.
/// The digest is laid out as a version 8 (custom) UUID.
///
/// The same inputs always produce the same id, so a row without an `id`
/// column keeps its identity across fetches and saved classes can be matched
/// back to fresh data.
pub fn stable_class_id(title: &str, teacher: &str, day: &str, time: &str, room: &str) -> String {
    let key = [title, teacher, day, time, room].join("|");
    let digest = Sha256::digest(key.as_bytes());

    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    uuid::Builder::from_custom_bytes(bytes)
        .into_uuid()
        .to_string()
}

impl ClassRecord {
    /// Youngest age the class is meant for, derived from the free-text grade.
    pub fn min_age(&self) -> Option<u32> {
        min_age_from_grade(&self.grade)
    }

    /// Classes held online or over Zoom are not on site.
    pub fn is_on_site(&self) -> bool {
        let room = self.room.to_lowercase();
        !(room.contains("online") || room.contains("zoom"))
    }

    /// All display fields joined for free-text search.
    pub fn search_text(&self) -> String {
        [
            Some(self.title.as_str()),
            Some(self.teacher.as_str()),
            self.chinese_teacher.as_deref(),
            Some(self.day.as_str()),
            Some(self.time.as_str()),
            Some(self.grade.as_str()),
            Some(self.room.as_str()),
            Some(self.category.as_str()),
            self.building_hint.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
    }

    /// A numeric query matches the derived age exactly; any other query is a
    /// case-insensitive substring search over the display fields.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }

        if let Ok(age) = query.parse::<i64>() {
            return self.min_age().map(i64::from) == Some(age);
        }

        self.search_text().contains(&query)
    }
}

pub fn min_age_from_grade(grade: &str) -> Option<u32> {
    let normalized = grade.trim().to_lowercase();

    if let Some(captures) = AGE_IN_YEARS.captures(&normalized) {
        if let Ok(age) = captures[1].parse() {
            return Some(age);
        }
    }

    if normalized.contains("prek") || normalized.contains("pre-k") {
        return Some(4);
    }

    if normalized.contains('k') && !normalized.contains("1st") {
        return Some(5);
    }

    if let Some((_, age)) = GRADE_AGES
        .iter()
        .find(|(keyword, _)| normalized.contains(keyword))
    {
        return Some(*age);
    }

    if normalized.contains("adult") {
        return Some(18);
    }

    None
}
