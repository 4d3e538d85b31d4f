// file: src/database/saved.rs
use crate::database::slots::SlotStore;
use crate::error::AppResult;
use crate::models::ClassRecord;
use log::warn;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const SAVED_CLASSES_SLOT: &str = "saved_classes";

/// The user's bookmarked classes ("my schedule").
///
/// Whole-list reads and writes only. Every write goes through one lock shared
/// by all clones, so a toggle and a background reconcile never interleave
/// their read-modify-write cycles.
#[derive(Clone)]
pub struct SavedClassStore {
    store: Arc<dyn SlotStore>,
    write_lock: Arc<Mutex<()>>,
}

impl SavedClassStore {
    pub fn new(store: Arc<dyn SlotStore>) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Persisted saved classes, first occurrence of each id kept. Unreadable
    /// data reads as an empty schedule.
    pub async fn load(&self) -> Vec<ClassRecord> {
        let payload = match self.store.get(SAVED_CLASSES_SLOT).await {
            Ok(Some(payload)) => payload,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Failed to read saved classes: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<ClassRecord>>(&payload) {
            Ok(items) => dedup_by_id(items),
            Err(e) => {
                warn!("Ignoring undecodable saved classes: {}", e);
                Vec::new()
            }
        }
    }

    /// Replaces the saved set, dropping repeated ids. Returns what was stored.
    pub async fn save(&self, items: Vec<ClassRecord>) -> AppResult<Vec<ClassRecord>> {
        let _write = self.write_lock.lock().await;
        self.write(items).await
    }

    /// Loads the set, applies `change` and stores the result, all under the
    /// write lock. Nothing is written when `change` leaves the set as it was.
    pub async fn update<F>(&self, change: F) -> AppResult<Vec<ClassRecord>>
    where
        F: FnOnce(&mut Vec<ClassRecord>) + Send,
    {
        let _write = self.write_lock.lock().await;
        let current = self.load().await;
        let mut items = current.clone();
        change(&mut items);
        if items == current {
            return Ok(current);
        }
        self.write(items).await
    }

    pub async fn clear(&self) -> AppResult<()> {
        let _write = self.write_lock.lock().await;
        self.store.remove(SAVED_CLASSES_SLOT).await?;
        Ok(())
    }

    async fn write(&self, items: Vec<ClassRecord>) -> AppResult<Vec<ClassRecord>> {
        let unique = dedup_by_id(items);
        let payload = serde_json::to_string(&unique)?;
        self.store.put(SAVED_CLASSES_SLOT, &payload).await?;
        Ok(unique)
    }
}

/// Adds `item` when its id is absent, removes the entry otherwise. Returns
/// whether the class is saved afterwards.
pub fn toggle_in(saved: &mut Vec<ClassRecord>, item: &ClassRecord) -> bool {
    if let Some(pos) = saved.iter().position(|s| s.id == item.id) {
        saved.remove(pos);
        false
    } else {
        saved.push(item.clone());
        true
    }
}

pub fn dedup_by_id(items: Vec<ClassRecord>) -> Vec<ClassRecord> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.id.clone()))
        .collect()
}
