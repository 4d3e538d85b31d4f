// file: src/models/refresh.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one `refresh` call for a cache slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResult {
    pub slot: String,
    pub success: bool,
    /// Another refresh of the same slot was already running.
    pub skipped: bool,
    pub items: usize,
    pub error_message: Option<String>,
    pub refreshed_at: DateTime<Utc>,
}

impl RefreshResult {
    pub fn success(slot: &str, items: usize) -> Self {
        Self {
            slot: slot.to_string(),
            success: true,
            skipped: false,
            items,
            error_message: None,
            refreshed_at: Utc::now(),
        }
    }

    pub fn with_error(slot: &str, error: String) -> Self {
        Self {
            slot: slot.to_string(),
            success: false,
            skipped: false,
            items: 0,
            error_message: Some(error),
            refreshed_at: Utc::now(),
        }
    }

    pub fn in_progress(slot: &str) -> Self {
        Self {
            slot: slot.to_string(),
            success: false,
            skipped: true,
            items: 0,
            error_message: None,
            refreshed_at: Utc::now(),
        }
    }
}
