//! Sync orchestration
//!
//! Ties the row source, the mappers and the local stores together for each
//! content type. `load_*` never touches the network; `refresh_*` fetches,
//! maps and overwrites the cache only when the mapped result is non-empty.

use crate::config::{AppConfig, PageConfig, CLASSES_SLOT, NOTICES_SLOT};
use crate::database::saved::toggle_in;
use crate::database::{CacheStore, Database, SavedClassStore};
use crate::error::AppResult;
use crate::models::notice::sort_newest_first;
use crate::models::page::fill_missing_ids;
use crate::models::{ClassRecord, NoticeRecord, OneColumnRecord, RefreshResult};
use crate::sheets::{classes, notices, pages, RawRow, RowSource, SheetClient};
use crate::utils::logging;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Marks a slot as being refreshed until dropped.
struct RefreshGuard {
    in_flight: Arc<Mutex<HashSet<String>>>,
    slot: String,
}

impl RefreshGuard {
    fn acquire(in_flight: &Arc<Mutex<HashSet<String>>>, slot: &str) -> Option<Self> {
        let mut slots = in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !slots.insert(slot.to_string()) {
            return None;
        }
        Some(Self {
            in_flight: Arc::clone(in_flight),
            slot: slot.to_string(),
        })
    }
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        let mut slots = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        slots.remove(&self.slot);
    }
}

pub struct Repository<S: RowSource = SheetClient> {
    source: Arc<S>,
    cache: CacheStore,
    saved: SavedClassStore,
    config: Arc<AppConfig>,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl<S: RowSource> Clone for Repository<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            cache: self.cache.clone(),
            saved: self.saved.clone(),
            config: Arc::clone(&self.config),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<S: RowSource> Repository<S> {
    pub fn new(source: S, cache: CacheStore, saved: SavedClassStore, config: AppConfig) -> Self {
        Self {
            source: Arc::new(source),
            cache,
            saved,
            config: Arc::new(config),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Repository over the database's cache and saved tables, with seeds read
    /// from the configured seed directory.
    pub fn with_database(source: S, db: &Database, config: AppConfig) -> Self {
        let cache = CacheStore::new(Arc::new(db.cache_slots()), Some(config.seed_dir.clone()));
        let saved = SavedClassStore::new(Arc::new(db.saved_slots()));
        Self::new(source, cache, saved, config)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    // --- Classes ---

    pub async fn load_classes(&self) -> Vec<ClassRecord> {
        self.load_or_seed(CLASSES_SLOT).await
    }

    /// Fetches the class sheet. On success the saved schedule is reconciled
    /// with the fresh records.
    pub async fn refresh_classes(&self) -> RefreshResult {
        let url = self.config.classes_url.clone();
        let (result, fresh) = self
            .refresh_slot(CLASSES_SLOT, Some(&url), classes::map_class_rows)
            .await;

        if let Some(fresh) = fresh {
            if let Err(e) = self.sync_saved_with(&fresh).await {
                warn!("Failed to store reconciled schedule: {}", e);
            }
        }
        result
    }

    pub async fn last_updated_classes(&self) -> Option<DateTime<Utc>> {
        self.cache.last_updated(CLASSES_SLOT).await
    }

    // --- Notices ---

    /// Cached notices, newest first.
    pub async fn load_notices(&self) -> Vec<NoticeRecord> {
        let mut notices: Vec<NoticeRecord> = self.load_or_seed(NOTICES_SLOT).await;
        sort_newest_first(&mut notices);
        notices
    }

    pub async fn refresh_notices(&self) -> RefreshResult {
        let url = self.config.notices_url.clone();
        let (result, _) = self
            .refresh_slot(NOTICES_SLOT, Some(&url), notices::map_notice_rows)
            .await;
        result
    }

    pub async fn last_updated_notices(&self) -> Option<DateTime<Utc>> {
        self.cache.last_updated(NOTICES_SLOT).await
    }

    // --- One-column pages ---

    pub fn page(&self, slug: &str) -> Option<PageConfig> {
        self.config.page(slug).cloned()
    }

    pub fn pages(&self) -> Vec<PageConfig> {
        self.config.pages.clone()
    }

    pub async fn load_page(&self, page: &PageConfig) -> Vec<OneColumnRecord> {
        let mut blocks: Vec<OneColumnRecord> = self.load_or_seed(&page.slot()).await;
        fill_missing_ids(&mut blocks);
        blocks
    }

    pub async fn refresh_page(&self, page: &PageConfig) -> RefreshResult {
        let column = page.column.clone();
        let (result, _) = self
            .refresh_slot(&page.slot(), page.sheet_url.as_deref(), |rows| {
                pages::map_page_rows(rows, column.as_deref())
            })
            .await;
        result
    }

    pub async fn last_updated_page(&self, page: &PageConfig) -> Option<DateTime<Utc>> {
        self.cache.last_updated(&page.slot()).await
    }

    // --- Saved schedule ---

    pub async fn load_saved(&self) -> Vec<ClassRecord> {
        self.saved.load().await
    }

    pub async fn save_saved(&self, items: Vec<ClassRecord>) -> AppResult<Vec<ClassRecord>> {
        self.saved.save(items).await
    }

    pub async fn clear_saved(&self) -> AppResult<()> {
        self.saved.clear().await
    }

    /// Adds or removes `item` from the stored schedule. Returns the stored
    /// set and whether the class is saved afterwards.
    pub async fn toggle_saved(&self, item: &ClassRecord) -> AppResult<(Vec<ClassRecord>, bool)> {
        let mut now_saved = false;
        let stored = self
            .saved
            .update(|saved| now_saved = toggle_in(saved, item))
            .await?;
        Ok((stored, now_saved))
    }

    /// Replaces saved entries with fresh copies sharing their id and stores
    /// the result when anything changed.
    pub async fn sync_saved_with(&self, fresh: &[ClassRecord]) -> AppResult<Vec<ClassRecord>> {
        self.saved
            .update(|saved| {
                let reconciled = reconcile_saved(saved, fresh);
                if reconciled != *saved {
                    debug!("Updating {} saved classes from fresh data", reconciled.len());
                    *saved = reconciled;
                }
            })
            .await
    }

    // --- Shared plumbing ---

    async fn load_or_seed<T: DeserializeOwned>(&self, slot: &str) -> Vec<T> {
        if let Some(items) = self.cache.load_list(slot).await {
            return items;
        }
        if let Some(items) = self.cache.load_seed(slot).await {
            debug!("Using seed data for {}", slot);
            return items;
        }
        Vec::new()
    }

    async fn refresh_slot<T, F>(
        &self,
        slot: &str,
        url: Option<&str>,
        map: F,
    ) -> (RefreshResult, Option<Vec<T>>)
    where
        T: Serialize,
        F: FnOnce(&[RawRow]) -> Vec<T>,
    {
        let Some(_guard) = RefreshGuard::acquire(&self.in_flight, slot) else {
            info!("Refresh of {} already running, skipping", slot);
            return (RefreshResult::in_progress(slot), None);
        };

        let Some(url) = url else {
            return (
                RefreshResult::with_error(slot, "No endpoint configured".to_string()),
                None,
            );
        };

        let started = Instant::now();
        let rows = self.source.fetch_rows(url).await;
        if rows.is_empty() {
            warn!("Refresh of {} got no rows, keeping cached data", slot);
            return (
                RefreshResult::with_error(slot, "No rows fetched".to_string()),
                None,
            );
        }

        let mapped = map(&rows);
        if mapped.is_empty() {
            warn!(
                "Refresh of {}: all {} rows dropped, keeping cached data",
                slot,
                rows.len()
            );
            return (
                RefreshResult::with_error(slot, format!("All {} rows were unusable", rows.len())),
                None,
            );
        }
        if mapped.len() < rows.len() {
            debug!("Refresh of {} dropped {} rows", slot, rows.len() - mapped.len());
        }

        if let Err(e) = self.cache.save_list(slot, &mapped).await {
            warn!("Failed to write cache slot {}: {}", slot, e);
            return (RefreshResult::with_error(slot, e.to_safe_string()), None);
        }

        logging::log_refresh(slot, mapped.len(), started.elapsed().as_millis() as u64);
        (RefreshResult::success(slot, mapped.len()), Some(mapped))
    }
}

/// Saved classes with each entry replaced by the fresh record of the same
/// id. Entries missing from `fresh` are kept unchanged.
pub fn reconcile_saved(saved: &[ClassRecord], fresh: &[ClassRecord]) -> Vec<ClassRecord> {
    if saved.is_empty() {
        return Vec::new();
    }

    let by_id: HashMap<&str, &ClassRecord> =
        fresh.iter().map(|item| (item.id.as_str(), item)).collect();

    saved
        .iter()
        .map(|item| {
            by_id
                .get(item.id.as_str())
                .map(|fresh| (*fresh).clone())
                .unwrap_or_else(|| item.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{MemorySlotStore, SlotStore};
    use crate::sheets::MockRowSource;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn class(id: &str, title: &str, room: &str) -> ClassRecord {
        ClassRecord {
            id: id.to_string(),
            title: title.to_string(),
            teacher: String::new(),
            chinese_teacher: None,
            day: String::new(),
            time: String::new(),
            grade: String::new(),
            room: room.to_string(),
            building_hint: None,
            category: String::new(),
        }
    }

    fn repository(source: MockRowSource) -> Repository<MockRowSource> {
        let cache = CacheStore::new(Arc::new(MemorySlotStore::new()), None);
        let saved = SavedClassStore::new(Arc::new(MemorySlotStore::new()));
        Repository::new(source, cache, saved, AppConfig::default())
    }

    #[test]
    fn test_reconcile_replaces_and_keeps() {
        let saved = vec![class("x", "Math", "101"), class("gone", "Art", "5")];
        let fresh = vec![class("x", "Math", "202"), class("new", "Go", "7")];

        let reconciled = reconcile_saved(&saved, &fresh);
        assert_eq!(reconciled.len(), 2);
        assert_eq!(reconciled[0].room, "202");
        assert_eq!(reconciled[1], saved[1]);
    }

    #[tokio::test]
    async fn test_refresh_classes_writes_cache() {
        let mut source = MockRowSource::new();
        source
            .expect_fetch_rows()
            .times(1)
            .returning(|_| vec![row(&[("title", "Math"), ("room", "1")]), row(&[("room", "2")])]);

        let repo = repository(source);
        let result = repo.refresh_classes().await;

        assert!(result.success);
        assert_eq!(result.items, 1);
        let classes = repo.load_classes().await;
        assert_eq!(classes.len(), 1);
        assert!(repo.last_updated_classes().await.is_some());
    }

    #[tokio::test]
    async fn test_refresh_with_no_usable_rows_keeps_cache() {
        let mut source = MockRowSource::new();
        source
            .expect_fetch_rows()
            .returning(|_| vec![row(&[("teacher", "No title")])]);

        let repo = repository(source);
        repo.cache()
            .save_list(CLASSES_SLOT, &[class("a", "Kept", "1")])
            .await
            .unwrap();

        let result = repo.refresh_classes().await;
        assert!(!result.success);
        assert!(result.error_message.unwrap().contains("unusable"));

        let classes = repo.load_classes().await;
        assert_eq!(classes, vec![class("a", "Kept", "1")]);
    }

    #[tokio::test]
    async fn test_refresh_page_without_endpoint_skips_fetch() {
        let mut source = MockRowSource::new();
        source.expect_fetch_rows().times(0);

        let repo = repository(source);
        let page = PageConfig::new("maps", "Maps", None);
        let result = repo.refresh_page(&page).await;
        assert!(!result.success);
        assert!(repo.load_page(&page).await.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_notices_uses_notice_url() {
        let mut source = MockRowSource::new();
        let expected = AppConfig::default().notices_url;
        source
            .expect_fetch_rows()
            .withf(move |url| url == expected)
            .returning(|_| vec![row(&[("date", "2024-01-01"), ("message", "Hello")])]);

        let repo = repository(source);
        assert!(repo.refresh_notices().await.success);
        assert_eq!(repo.load_notices().await[0].message, "Hello");
    }

    #[tokio::test]
    async fn test_load_page_derives_ids_by_position() {
        let slots = MemorySlotStore::new();
        slots
            .put("onecol_sponsors", r#"[{"text":"Thank you!"},{"text":"Thank you!"}]"#)
            .await
            .unwrap();
        let cache = CacheStore::new(Arc::new(slots), None);
        let saved = SavedClassStore::new(Arc::new(MemorySlotStore::new()));
        let repo = Repository::new(MockRowSource::new(), cache, saved, AppConfig::default());

        let page = repo.page("sponsors").unwrap();
        let blocks = repo.load_page(&page).await;
        assert_eq!(blocks.len(), 2);
        assert!(!blocks[0].id.is_empty());
        assert_ne!(blocks[0].id, blocks[1].id);
    }

    #[test]
    fn test_refresh_guard_is_exclusive_per_slot() {
        let in_flight = Arc::new(Mutex::new(HashSet::new()));
        let first = RefreshGuard::acquire(&in_flight, "classes");
        assert!(first.is_some());
        assert!(RefreshGuard::acquire(&in_flight, "classes").is_none());
        assert!(RefreshGuard::acquire(&in_flight, "notices").is_some());

        drop(first);
        assert!(RefreshGuard::acquire(&in_flight, "classes").is_some());
    }
}
