// file: src/models/page.rs
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One free-text block of an informational page (intro, contact, sponsors...).
///
/// Stored lists may omit `id`; it decodes empty and [`fill_missing_ids`]
/// derives it from the block's position in the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneColumnRecord {
    #[serde(default)]
    pub id: String,
    pub text: String,
}

impl OneColumnRecord {
    pub fn new(position: usize, text: String) -> Self {
        Self {
            id: text_block_id(position, &text),
            text,
        }
    }
}

/// Gives every block with a blank id the id the mapper would have produced
/// for it at the same position.
pub fn fill_missing_ids(records: &mut [OneColumnRecord]) {
    for (position, record) in records.iter_mut().enumerate() {
        if record.id.trim().is_empty() {
            record.id = text_block_id(position, &record.text);
        }
    }
}

/// Hex digest of the block's position and text.
pub fn text_block_id(position: usize, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(position.to_string().as_bytes());
    hasher.update(b"\n");
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    digest[..12].iter().map(|b| format!("{:02x}", b)).collect()
}
