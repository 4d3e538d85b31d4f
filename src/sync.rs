use crate::config::PageConfig;
use crate::directory::ClassDirectory;
use crate::models::{OneColumnRecord, RefreshResult};
use crate::repository::Repository;
use crate::sheets::RowSource;
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub enum SyncEvent {
    ClassesRefreshed(RefreshResult),
    NoticesRefreshed(RefreshResult),
    PageRefreshed { slug: String, result: RefreshResult },
    Finished { succeeded: usize, failed: usize },
}

async fn notify(sender: &Option<Sender<SyncEvent>>, event: SyncEvent) {
    if let Some(tx) = sender {
        // Receiver may be gone; the refresh result is already persisted.
        let _ = tx.send(event).await;
    }
}

fn report(result: &RefreshResult) {
    if result.success {
        debug!("{} refreshed with {} items", result.slot, result.items);
    } else if result.skipped {
        debug!("{} refresh skipped, already running", result.slot);
    } else {
        warn!(
            "{} refresh failed: {}",
            result.slot,
            result.error_message.as_deref().unwrap_or("unknown error")
        );
    }
}

/// Refreshes every content type once, in order: classes (through the
/// directory so its state follows), notices, then each configured page.
///
/// Stops early when `shutdown` is cancelled.
pub async fn refresh_all<S: RowSource + 'static>(
    directory: Arc<ClassDirectory<S>>,
    repo: Repository<S>,
    sender: Option<Sender<SyncEvent>>,
    shutdown: CancellationToken,
) -> Vec<RefreshResult> {
    info!("Starting full refresh");
    let mut results = Vec::new();

    let classes = directory.refresh().await;
    report(&classes);
    results.push(classes.clone());
    notify(&sender, SyncEvent::ClassesRefreshed(classes)).await;

    if !shutdown.is_cancelled() {
        let notices = repo.refresh_notices().await;
        report(&notices);
        results.push(notices.clone());
        notify(&sender, SyncEvent::NoticesRefreshed(notices)).await;
    }

    for page in repo.pages() {
        if shutdown.is_cancelled() {
            info!("Shutdown requested, stopping refresh");
            break;
        }
        let result = repo.refresh_page(&page).await;
        report(&result);
        results.push(result.clone());
        notify(
            &sender,
            SyncEvent::PageRefreshed {
                slug: page.slug.clone(),
                result,
            },
        )
        .await;
    }

    let succeeded = results.iter().filter(|r| r.success).count();
    let failed = results.iter().filter(|r| !r.success && !r.skipped).count();
    info!("Full refresh done: {} succeeded, {} failed", succeeded, failed);
    notify(&sender, SyncEvent::Finished { succeeded, failed }).await;

    results
}

/// Runs [`refresh_all`] in the background after startup.
pub fn spawn_startup_refresh<S: RowSource + 'static>(
    directory: Arc<ClassDirectory<S>>,
    repo: Repository<S>,
    sender: Option<Sender<SyncEvent>>,
    shutdown: CancellationToken,
) -> JoinHandle<Vec<RefreshResult>> {
    tokio::spawn(refresh_all(directory, repo, sender, shutdown))
}

/// Cached content for a page right away, with a refresh started in the
/// background. The refreshed list arrives as a `PageRefreshed` event.
pub async fn open_page<S: RowSource + 'static>(
    repo: &Repository<S>,
    page: &PageConfig,
    sender: Option<Sender<SyncEvent>>,
) -> (Vec<OneColumnRecord>, JoinHandle<RefreshResult>) {
    let cached = repo.load_page(page).await;

    let repo = repo.clone();
    let page = page.clone();
    let handle = tokio::spawn(async move {
        let result = repo.refresh_page(&page).await;
        report(&result);
        notify(
            &sender,
            SyncEvent::PageRefreshed {
                slug: page.slug.clone(),
                result: result.clone(),
            },
        )
        .await;
        result
    });

    (cached, handle)
}
