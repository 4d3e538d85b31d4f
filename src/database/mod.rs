// file: src/database/mod.rs

use anyhow::{Context, Result};
use log::info;
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePool, Sqlite};
use std::path::Path;

pub mod cache;
pub mod saved;
pub mod slots;

pub use cache::CacheStore;
pub use saved::SavedClassStore;
pub use slots::{MemorySlotStore, SlotStore, SlotTable, SqliteSlotStore};

#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    /// Opens (creating if needed) the database file at `path`.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let db_url = format!("sqlite:{}?mode=rwc", path.display());

        let db_exists = Sqlite::database_exists(&db_url)
            .await
            .context("Failed to check if database exists")?;
        if !db_exists {
            info!("Creating database at {}", path.display());
            Sqlite::create_database(&db_url)
                .await
                .context("Failed to create database")?;
        }

        let pool = SqlitePool::connect(&db_url)
            .await
            .context("Failed to connect to database")?;

        Self::from_pool(pool).await
    }

    /// Wraps an existing pool, making sure the schema is in place.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        run_schema(&pool).await.context("Failed to run database schema")?;
        info!("Database initialized successfully");
        Ok(Database { pool })
    }

    pub fn cache_slots(&self) -> SqliteSlotStore {
        SqliteSlotStore::new(self.pool.clone(), SlotTable::Cache)
    }

    pub fn saved_slots(&self) -> SqliteSlotStore {
        SqliteSlotStore::new(self.pool.clone(), SlotTable::Saved)
    }
}

async fn run_schema(pool: &SqlitePool) -> Result<()> {
    let schema = include_str!("schema.sql");

    let mut current_statement = String::new();
    for line in schema.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") || trimmed.is_empty() {
            continue;
        }

        current_statement.push_str(line);
        current_statement.push('\n');

        if trimmed.ends_with(';') {
            sqlx::query(&current_statement).execute(pool).await?;
            current_statement.clear();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_creates_file_and_tables() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("hxgny.db");

        let db = Database::open(&path).await.unwrap();
        assert!(path.exists());

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type='table' ORDER BY name",
        )
        .fetch_all(&db.pool)
        .await
        .unwrap();
        assert_eq!(tables, vec!["cache_slots", "saved_slots"]);
    }

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hxgny.db");

        let first = Database::open(&path).await.unwrap();
        first.pool.close().await;
        assert!(Database::open(&path).await.is_ok());
    }
}
