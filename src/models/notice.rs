// file: src/models/notice.rs
use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A dated announcement from the weekly notice tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeRecord {
    pub id: String,
    /// Milliseconds since the Unix epoch.
    #[serde(rename = "dateMillis")]
    pub date_millis: i64,
    pub message: String,
}

impl NoticeRecord {
    pub fn date(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.date_millis).single()
    }

    /// Local calendar date, e.g. "Mar 1, 2024".
    pub fn formatted_date(&self) -> String {
        match Local.timestamp_millis_opt(self.date_millis).single() {
            Some(local) => local.format("%b %-d, %Y").to_string(),
            None => String::new(),
        }
    }
}

/// Newest first. Stable, so notices sharing a date keep sheet order.
pub fn sort_newest_first(notices: &mut [NoticeRecord]) {
    notices.sort_by(|a, b| b.date_millis.cmp(&a.date_millis));
}
