// file: src/database/cache.rs
use crate::database::slots::SlotStore;
use crate::error::AppResult;
use crate::utils::logging;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Typed record lists stored per slot, with bundled seed files as the
/// first-launch fallback.
///
/// Reads never fail: a missing, unreadable or undecodable slot is reported
/// as "no cache" and logged.
#[derive(Clone)]
pub struct CacheStore {
    store: Arc<dyn SlotStore>,
    seed_dir: Option<PathBuf>,
}

impl CacheStore {
    pub fn new(store: Arc<dyn SlotStore>, seed_dir: Option<PathBuf>) -> Self {
        Self { store, seed_dir }
    }

    pub async fn load_list<T: DeserializeOwned>(&self, slot: &str) -> Option<Vec<T>> {
        let started = Instant::now();
        let payload = match self.store.get(slot).await {
            Ok(payload) => payload?,
            Err(e) => {
                warn!("Failed to read cache slot {}: {}", slot, e);
                return None;
            }
        };
        logging::log_storage_operation("read", slot, started.elapsed().as_millis() as u64);

        match serde_json::from_str(&payload) {
            Ok(items) => Some(items),
            Err(e) => {
                warn!("Ignoring undecodable cache slot {}: {}", slot, e);
                None
            }
        }
    }

    /// Reads `<seed_dir>/<slot>.json` if present.
    pub async fn load_seed<T: DeserializeOwned>(&self, slot: &str) -> Option<Vec<T>> {
        let path = self.seed_dir.as_ref()?.join(format!("{}.json", slot));

        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) => {
                debug!("No seed for {} at {}: {}", slot, path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&text) {
            Ok(items) => Some(items),
            Err(e) => {
                warn!("Ignoring invalid seed file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Overwrites the slot and records the write time.
    pub async fn save_list<T: Serialize>(&self, slot: &str, items: &[T]) -> AppResult<DateTime<Utc>> {
        let started = Instant::now();
        let payload = serde_json::to_string(items)?;
        let written_at = self.store.put(slot, &payload).await?;
        logging::log_storage_operation("write", slot, started.elapsed().as_millis() as u64);
        Ok(written_at)
    }

    pub async fn last_updated(&self, slot: &str) -> Option<DateTime<Utc>> {
        match self.store.last_modified(slot).await {
            Ok(updated_at) => updated_at,
            Err(e) => {
                warn!("Failed to read last update of {}: {}", slot, e);
                None
            }
        }
    }

    pub async fn clear(&self, slot: &str) -> AppResult<()> {
        self.store.remove(slot).await?;
        Ok(())
    }
}
