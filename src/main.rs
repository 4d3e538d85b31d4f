// HXGNY - school companion, headless driver
// Loads local content, refreshes every sheet once and prints a summary

use hxgny::utils::logging;
use hxgny::{AppConfig, AppState, SyncEvent};
use log::{error, info};
use tokio::sync::mpsc;

fn describe(event: &SyncEvent) -> String {
    let outcome = |result: &hxgny::RefreshResult| {
        if result.success {
            format!("{} items", result.items)
        } else if result.skipped {
            "already running".to_string()
        } else {
            format!(
                "failed ({})",
                result.error_message.as_deref().unwrap_or("unknown error")
            )
        }
    };

    match event {
        SyncEvent::ClassesRefreshed(result) => format!("classes: {}", outcome(result)),
        SyncEvent::NoticesRefreshed(result) => format!("notices: {}", outcome(result)),
        SyncEvent::PageRefreshed { slug, result } => format!("page {}: {}", slug, outcome(result)),
        SyncEvent::Finished { succeeded, failed } => {
            format!("done: {} refreshed, {} failed", succeeded, failed)
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging
    if let Err(e) = logging::init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    info!("Starting HXGNY");

    let config = AppConfig::from_env();
    let state = match AppState::init(config).await {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize: {}", e);
            eprintln!("Failed to initialize: {}", e.to_safe_string());
            std::process::exit(1);
        }
    };

    let notices = state.repository.load_notices().await;
    println!(
        "Cached: {} classes, {} saved, {} notices",
        state.directory.all().len(),
        state.directory.saved_list().len(),
        notices.len()
    );

    let shutdown = state.shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, stopping refresh");
            shutdown.cancel();
        }
    });

    let (tx, mut rx) = mpsc::channel(16);
    let refresh = state.start_refresh(Some(tx));
    while let Some(event) = rx.recv().await {
        println!("{}", describe(&event));
    }
    if let Err(e) = refresh.await {
        error!("Refresh task failed: {}", e);
    }

    if let Some(query) = std::env::args().nth(1) {
        state.directory.set_query(&query);
        for class in state.directory.visible() {
            println!(
                "{} | {} | {} {} | room {}",
                class.title, class.teacher, class.day, class.time, class.room
            );
        }
    }

    if let Some(latest) = state.repository.load_notices().await.first() {
        println!("Latest notice ({}): {}", latest.formatted_date(), latest.message);
    }
}
