// file: src/sheets/notices.rs
use crate::models::notice::sort_newest_first;
use crate::models::NoticeRecord;
use crate::sheets::rows::{normalize_row, value_for, RawRow};
use chrono::{Local, NaiveDate, TimeZone, Utc};
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use sha2::{Digest, Sha256};

lazy_static! {
    // yyyy-MM-dd, MM/dd/yyyy, M/d/yyyy, M/d/yy, tried in this order.
    static ref ISO_DATE: Regex = Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").unwrap();
    static ref US_DATE_PADDED: Regex = Regex::new(r"^(\d{2})/(\d{2})/(\d{4})$").unwrap();
    static ref US_DATE: Regex = Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").unwrap();
    static ref US_DATE_SHORT_YEAR: Regex = Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{2})$").unwrap();
}

/// Parses a free-text sheet date into local midnight, as epoch millis.
pub fn parse_notice_date(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let date = parse_date(trimmed)?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|local| local.timestamp_millis())
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    if let Some(c) = ISO_DATE.captures(text) {
        if let Some(date) = ymd(&c[1], &c[2], &c[3]) {
            return Some(date);
        }
    }
    for pattern in [&*US_DATE_PADDED, &*US_DATE] {
        if let Some(c) = pattern.captures(text) {
            if let Some(date) = ymd(&c[3], &c[1], &c[2]) {
                return Some(date);
            }
        }
    }
    if let Some(c) = US_DATE_SHORT_YEAR.captures(text) {
        let year: i32 = c[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(2000 + year, c[1].parse().ok()?, c[2].parse().ok()?);
    }
    None
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// Maps a notice row. The message is the first non-blank cell that is not
/// the date cell; rows without one are dropped. Unparseable dates fall back
/// to `now_millis`.
pub fn map_notice_row(row: &RawRow, now_millis: i64) -> Option<NoticeRecord> {
    let row = normalize_row(row);
    let date_raw = row.get("date").map(String::as_str).unwrap_or_default();

    let Some(message) = row
        .values()
        .find(|value| !value.trim().is_empty() && value.as_str() != date_raw)
    else {
        debug!("Dropping notice row without message: {:?}", row);
        return None;
    };

    let date_millis = parse_notice_date(date_raw).unwrap_or(now_millis);
    let id = value_for(&row, &["id"])
        .map(str::to_string)
        .unwrap_or_else(|| notice_id(date_raw, message));

    Some(NoticeRecord {
        id,
        date_millis,
        message: message.trim().to_string(),
    })
}

/// Maps all rows and orders the result newest first.
pub fn map_notice_rows(rows: &[RawRow]) -> Vec<NoticeRecord> {
    let now_millis = Utc::now().timestamp_millis();
    let mut notices: Vec<NoticeRecord> = rows
        .iter()
        .filter_map(|row| map_notice_row(row, now_millis))
        .collect();
    sort_newest_first(&mut notices);
    notices
}

fn notice_id(date: &str, message: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(date.as_bytes());
    hasher.update(b"\n");
    hasher.update(message.as_bytes());
    let digest = hasher.finalize();
    digest[..12].iter().map(|b| format!("{:02x}", b)).collect()
}
