use env_logger::{Builder, Target};
use log::{Level, LevelFilter};
use std::env;
use std::io::Write;

/// Installs the global logger. Level comes from `RUST_LOG` (default `info`);
/// `RUST_ENV=production` quiets the HTTP and database crates.
pub fn init_logging() -> Result<(), log::SetLoggerError> {
    let level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let log_level = parse_level(&level);

    let mut builder = Builder::new();

    builder.format(|buf, record| {
        let timestamp = buf.timestamp();
        match record.level() {
            Level::Info => writeln!(
                buf,
                "{} [INFO] [{}]: {}",
                timestamp,
                record.target(),
                record.args()
            ),
            level => writeln!(
                buf,
                "{} [{}] [{}:{}] {}: {}",
                timestamp,
                level,
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.target(),
                record.args()
            ),
        }
    });

    if env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string()) == "production" {
        builder.filter_module("reqwest", LevelFilter::Warn);
        builder.filter_module("hyper", LevelFilter::Warn);
        builder.filter_module("sqlx", LevelFilter::Warn);
    }

    builder
        .filter_level(log_level)
        .target(Target::Stdout)
        .try_init()
}

fn parse_level(value: &str) -> LevelFilter {
    match value.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

pub fn log_network_error(operation: &str, error: &dyn std::error::Error) {
    log::warn!("[Network] {} failed: {}", operation, error);
}

pub fn log_refresh(slot: &str, items: usize, duration_ms: u64) {
    log::info!("[Sync] Refreshed {} with {} records in {}ms", slot, items, duration_ms);
}

pub fn log_storage_operation(operation: &str, slot: &str, duration_ms: u64) {
    log::debug!("[Storage] {} on slot {} took {}ms", operation, slot, duration_ms);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(parse_level("error"), LevelFilter::Error);
        assert_eq!(parse_level("DEBUG"), LevelFilter::Debug);
        assert_eq!(parse_level("off"), LevelFilter::Off);
        assert_eq!(parse_level("verbose"), LevelFilter::Info);
    }

    #[test]
    fn test_init_logging_twice_is_an_error_not_a_panic() {
        let _ = init_logging();
        assert!(init_logging().is_err());
    }
}
