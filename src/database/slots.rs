// file: src/database/slots.rs
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Named blobs with a last-modified time.
#[async_trait]
pub trait SlotStore: Send + Sync {
    async fn get(&self, slot: &str) -> Result<Option<String>>;

    /// Overwrites the slot and stamps it with the current time.
    async fn put(&self, slot: &str, payload: &str) -> Result<DateTime<Utc>>;

    async fn last_modified(&self, slot: &str) -> Result<Option<DateTime<Utc>>>;

    async fn remove(&self, slot: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotTable {
    Cache,
    Saved,
}

impl SlotTable {
    fn name(self) -> &'static str {
        match self {
            SlotTable::Cache => "cache_slots",
            SlotTable::Saved => "saved_slots",
        }
    }
}

#[derive(Clone)]
pub struct SqliteSlotStore {
    pool: SqlitePool,
    table: SlotTable,
}

impl SqliteSlotStore {
    pub fn new(pool: SqlitePool, table: SlotTable) -> Self {
        Self { pool, table }
    }
}

#[async_trait]
impl SlotStore for SqliteSlotStore {
    async fn get(&self, slot: &str) -> Result<Option<String>> {
        let sql = format!("SELECT payload FROM {} WHERE name = ?", self.table.name());
        let payload = sqlx::query_scalar::<_, String>(&sql)
            .bind(slot)
            .fetch_optional(&self.pool)
            .await?;

        Ok(payload)
    }

    async fn put(&self, slot: &str, payload: &str) -> Result<DateTime<Utc>> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO {} (name, payload, updated_at) VALUES (?, ?, ?) \
             ON CONFLICT(name) DO UPDATE SET payload = excluded.payload, updated_at = excluded.updated_at",
            self.table.name()
        );
        sqlx::query(&sql)
            .bind(slot)
            .bind(payload)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(now)
    }

    async fn last_modified(&self, slot: &str) -> Result<Option<DateTime<Utc>>> {
        let sql = format!("SELECT updated_at FROM {} WHERE name = ?", self.table.name());
        let updated_at = sqlx::query_scalar::<_, DateTime<Utc>>(&sql)
            .bind(slot)
            .fetch_optional(&self.pool)
            .await?;

        Ok(updated_at)
    }

    async fn remove(&self, slot: &str) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE name = ?", self.table.name());
        sqlx::query(&sql).bind(slot).execute(&self.pool).await?;

        Ok(())
    }
}

/// Process-local store, for tests and runs without a database file.
#[derive(Clone, Default)]
pub struct MemorySlotStore {
    slots: Arc<RwLock<HashMap<String, (String, DateTime<Utc>)>>>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SlotStore for MemorySlotStore {
    async fn get(&self, slot: &str) -> Result<Option<String>> {
        let slots = self.slots.read().await;
        Ok(slots.get(slot).map(|(payload, _)| payload.clone()))
    }

    async fn put(&self, slot: &str, payload: &str) -> Result<DateTime<Utc>> {
        let now = Utc::now();
        let mut slots = self.slots.write().await;
        slots.insert(slot.to_string(), (payload.to_string(), now));
        Ok(now)
    }

    async fn last_modified(&self, slot: &str) -> Result<Option<DateTime<Utc>>> {
        let slots = self.slots.read().await;
        Ok(slots.get(slot).map(|(_, updated_at)| *updated_at))
    }

    async fn remove(&self, slot: &str) -> Result<()> {
        self.slots.write().await.remove(slot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use tempfile::NamedTempFile;

    async fn create_test_database() -> Database {
        let temp_file = NamedTempFile::new().unwrap();
        let (_, path) = temp_file.keep().unwrap();
        Database::open(&path).await.unwrap()
    }

    async fn exercise(store: &dyn SlotStore) {
        assert!(store.get("classes").await.unwrap().is_none());
        assert!(store.last_modified("classes").await.unwrap().is_none());

        let first = store.put("classes", "[1]").await.unwrap();
        assert_eq!(store.get("classes").await.unwrap().as_deref(), Some("[1]"));
        let stamped = store.last_modified("classes").await.unwrap().unwrap();
        assert!((stamped - first).num_milliseconds().abs() < 1000);

        let second = store.put("classes", "[2]").await.unwrap();
        assert!(second >= first);
        assert_eq!(store.get("classes").await.unwrap().as_deref(), Some("[2]"));

        store.remove("classes").await.unwrap();
        assert!(store.get("classes").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sqlite_slot_store() {
        let db = create_test_database().await;
        exercise(&db.cache_slots()).await;
    }

    #[tokio::test]
    async fn test_memory_slot_store() {
        exercise(&MemorySlotStore::new()).await;
    }

    #[tokio::test]
    async fn test_tables_are_independent() {
        let db = create_test_database().await;
        db.cache_slots().put("shared", "cache").await.unwrap();
        db.saved_slots().put("shared", "saved").await.unwrap();

        db.cache_slots().remove("shared").await.unwrap();
        assert_eq!(
            db.saved_slots().get("shared").await.unwrap().as_deref(),
            Some("saved")
        );
    }
}
