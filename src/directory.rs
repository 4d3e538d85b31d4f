//! Class directory state
//!
//! Holds the loaded classes, the saved schedule and the active filter, and
//! publishes the visible list through a watch channel whenever any of them
//! changes.

use crate::database::saved::toggle_in;
use crate::filter::{self, ClassFilter};
use crate::models::{ClassRecord, RefreshResult};
use crate::repository::{reconcile_saved, Repository};
use crate::sheets::{RowSource, SheetClient};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;

#[derive(Default)]
struct DirectoryState {
    all: Vec<ClassRecord>,
    saved: Vec<ClassRecord>,
    filter: ClassFilter,
    last_updated: Option<DateTime<Utc>>,
}

pub struct ClassDirectory<S: RowSource = SheetClient> {
    repo: Repository<S>,
    state: Mutex<DirectoryState>,
    /// Held while the saved list is read from or written to storage, so a
    /// reload never replaces a toggle made while it was reading.
    saved_sync: tokio::sync::Mutex<()>,
    visible_tx: watch::Sender<Vec<ClassRecord>>,
}

impl<S: RowSource> ClassDirectory<S> {
    /// Empty directory; call [`ClassDirectory::load`] to read the cache.
    pub fn new(repo: Repository<S>) -> Self {
        let (visible_tx, _) = watch::channel(Vec::new());
        Self {
            repo,
            state: Mutex::new(DirectoryState::default()),
            saved_sync: tokio::sync::Mutex::new(()),
            visible_tx,
        }
    }

    fn state(&self) -> MutexGuard<'_, DirectoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, state: &DirectoryState) {
        let visible = filter::apply_filters(&state.all, &state.saved, &state.filter);
        self.visible_tx.send_replace(visible);
    }

    /// Reads cached (or seeded) classes and the saved schedule.
    pub async fn load(&self) {
        let all = self.repo.load_classes().await;
        let _saved_sync = self.saved_sync.lock().await;
        let saved = self.repo.load_saved().await;
        let last_updated = self.repo.last_updated_classes().await;
        debug!("Directory loaded {} classes, {} saved", all.len(), saved.len());

        let mut state = self.state();
        state.saved = reconcile_saved(&saved, &all);
        state.all = all;
        state.last_updated = last_updated;
        self.publish(&state);
    }

    /// Refreshes from the network, then reloads. The lists are reloaded even
    /// on failure so the directory shows whatever is cached.
    pub async fn refresh(&self) -> RefreshResult {
        let result = self.repo.refresh_classes().await;
        if !result.skipped {
            self.load().await;
        }
        result
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<ClassRecord>> {
        self.visible_tx.subscribe()
    }

    pub fn visible(&self) -> Vec<ClassRecord> {
        self.visible_tx.borrow().clone()
    }

    pub fn all(&self) -> Vec<ClassRecord> {
        self.state().all.clone()
    }

    pub fn filter(&self) -> ClassFilter {
        self.state().filter.clone()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.state().last_updated
    }

    pub fn set_query(&self, query: &str) {
        let mut state = self.state();
        state.filter.query = query.to_string();
        self.publish(&state);
    }

    pub fn set_category(&self, category: &str) {
        let mut state = self.state();
        state.filter.category = category.to_string();
        self.publish(&state);
    }

    pub fn set_on_site_only(&self, on_site_only: bool) {
        let mut state = self.state();
        state.filter.on_site_only = on_site_only;
        self.publish(&state);
    }

    pub fn categories(&self) -> Vec<String> {
        filter::categories(&self.state().all)
    }

    pub fn is_saved(&self, id: &str) -> bool {
        self.state().saved.iter().any(|item| item.id == id)
    }

    pub fn saved_list(&self) -> Vec<ClassRecord> {
        self.state().saved.clone()
    }

    /// Saved classes ordered for display as a day plan.
    pub fn schedule(&self) -> Vec<ClassRecord> {
        filter::schedule_order(&self.state().saved)
    }

    /// Looks an id up in the loaded classes first, then in the saved list.
    pub fn class_by_id(&self, id: &str) -> Option<ClassRecord> {
        let state = self.state();
        state
            .all
            .iter()
            .chain(state.saved.iter())
            .find(|item| item.id == id)
            .cloned()
    }

    /// Adds or removes `item` from the saved schedule and stores the result.
    /// Returns whether the class is saved afterwards.
    pub async fn toggle_saved(&self, item: &ClassRecord) -> bool {
        let _saved_sync = self.saved_sync.lock().await;

        match self.repo.toggle_saved(item).await {
            Ok((stored, now_saved)) => {
                let mut state = self.state();
                state.saved = stored;
                self.publish(&state);
                now_saved
            }
            Err(e) => {
                warn!("Failed to store saved classes: {}", e);
                let mut state = self.state();
                let now_saved = toggle_in(&mut state.saved, item);
                self.publish(&state);
                now_saved
            }
        }
    }

    pub async fn clear_saved(&self) {
        let _saved_sync = self.saved_sync.lock().await;
        if let Err(e) = self.repo.clear_saved().await {
            warn!("Failed to clear saved classes: {}", e);
        }

        let mut state = self.state();
        state.saved.clear();
        self.publish(&state);
    }
}
