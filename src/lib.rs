// HXGNY school companion library
// Cached sheet content for classes, notices and info pages, plus the saved schedule

pub mod config;
pub mod database;
pub mod directory;
pub mod error;
pub mod filter;
pub mod http_config;
pub mod models;
pub mod repository;
pub mod sheets;
pub mod sync;
pub mod utils;

// Re-export commonly used types
pub use config::{AppConfig, PageConfig};
pub use database::Database;
pub use directory::ClassDirectory;
pub use error::{AppError, AppResult};
pub use filter::ClassFilter;
pub use models::*;
pub use repository::Repository;
pub use sheets::{RowSource, SheetClient};
pub use sync::SyncEvent;

use http_config::HttpConfig;
use log::info;
use std::sync::Arc;

/// Application state shared across the application
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub repository: Repository,
    pub directory: Arc<ClassDirectory>,
    pub shutdown: tokio_util::sync::CancellationToken,
}

impl AppState {
    /// Opens the database at the configured path and wires the stores, the
    /// HTTP sheet client and the class directory together. Nothing is fetched.
    pub async fn init(config: AppConfig) -> AppResult<Self> {
        config::validate_config(&config)?;

        let db = Database::open(&config.database_path).await?;
        let source = SheetClient::new(&HttpConfig::default())?;
        let repository = Repository::with_database(source, &db, config);

        let directory = Arc::new(ClassDirectory::new(repository.clone()));
        directory.load().await;
        info!("Loaded {} classes from local storage", directory.all().len());

        Ok(Self {
            db: Arc::new(db),
            repository,
            directory,
            shutdown: tokio_util::sync::CancellationToken::new(),
        })
    }

    /// Starts the one-shot background refresh of every content type.
    pub fn start_refresh(
        &self,
        sender: Option<tokio::sync::mpsc::Sender<SyncEvent>>,
    ) -> tokio::task::JoinHandle<Vec<RefreshResult>> {
        sync::spawn_startup_refresh(
            Arc::clone(&self.directory),
            self.repository.clone(),
            sender,
            self.shutdown.clone(),
        )
    }
}
