//! Application configuration
//!
//! Endpoints for every content type, the local database location and the
//! directory holding bundled seed files. Defaults match the published school
//! sheets; each value can be overridden through the environment.

use crate::error::{AppError, AppResult};
use log::{info, warn};
use std::env;
use std::path::PathBuf;
use url::Url;

const SHEET_PROXY: &str = "https://opensheet.vercel.app";
const CONTENT_SHEET_ID: &str = "1qgbo7IlKkuFpCTYzrtIWHwjo0K6zItfyEeY6t_YbLV4";
const CLASSES_SHEET_ID: &str = "1uuM1vd0U1YDiHCnB9M-40hZIltGE0ij3ELVOBcnjRog";

pub const CLASSES_SLOT: &str = "classes";
pub const NOTICES_SLOT: &str = "notices";

/// A one-column informational page backed by its own sheet tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageConfig {
    pub slug: String,
    pub title: String,
    pub sheet_url: Option<String>,
    /// Column holding the text; first non-blank column when unset.
    pub column: Option<String>,
}

impl PageConfig {
    pub fn new(slug: &str, title: &str, sheet_url: Option<String>) -> Self {
        Self {
            slug: slug.to_string(),
            title: title.to_string(),
            sheet_url,
            column: None,
        }
    }

    pub fn with_column(mut self, column: &str) -> Self {
        self.column = Some(column.to_string());
        self
    }

    /// Cache slot name, also the seed file stem.
    pub fn slot(&self) -> String {
        format!("onecol_{}", self.slug)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub seed_dir: PathBuf,
    pub classes_url: String,
    pub notices_url: String,
    pub pages: Vec<PageConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            seed_dir: PathBuf::from("assets"),
            classes_url: format!("{}/{}/test", SHEET_PROXY, CLASSES_SHEET_ID),
            notices_url: content_tab("notice"),
            pages: default_pages(),
        }
    }
}

impl AppConfig {
    /// Defaults overridden by `HXGNY_DB_PATH`, `HXGNY_SEED_DIR`,
    /// `HXGNY_CLASSES_URL` and `HXGNY_NOTICES_URL`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = env::var("HXGNY_DB_PATH") {
            config.database_path = PathBuf::from(path);
        }
        if let Ok(dir) = env::var("HXGNY_SEED_DIR") {
            config.seed_dir = PathBuf::from(dir);
        }
        if let Ok(url) = env::var("HXGNY_CLASSES_URL") {
            config.classes_url = url;
        }
        if let Ok(url) = env::var("HXGNY_NOTICES_URL") {
            config.notices_url = url;
        }

        config
    }

    pub fn page(&self, slug: &str) -> Option<&PageConfig> {
        self.pages.iter().find(|page| page.slug == slug)
    }
}

fn content_tab(tab: &str) -> String {
    format!("{}/{}/{}", SHEET_PROXY, CONTENT_SHEET_ID, tab)
}

fn default_pages() -> Vec<PageConfig> {
    vec![
        PageConfig::new("school_intro", "School Intro", Some(content_tab("schoolintro"))),
        PageConfig::new("join", "Join Us", Some(content_tab("joinus"))),
        PageConfig::new("lostfound", "Lost & Found", Some(content_tab("lostnFound"))),
        PageConfig::new("sponsors", "Sponsors", Some(content_tab("sponsors"))),
        PageConfig::new("contact", "Contact", Some(content_tab("contact"))),
    ]
}

fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("hxgny"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hxgny.db")
}

/// Checks that an endpoint is an absolute http(s) URL with a host.
pub fn validate_endpoint_url(endpoint: &str) -> AppResult<()> {
    if endpoint.trim().is_empty() {
        return Err(AppError::config("Endpoint URL cannot be empty"));
    }

    let parsed = Url::parse(endpoint)
        .map_err(|e| AppError::config(format!("Invalid endpoint URL '{}': {}", endpoint, e)))?;

    if parsed.scheme() != "https" && parsed.scheme() != "http" {
        return Err(AppError::config(format!(
            "Endpoint URL must use http or https, got '{}://'",
            parsed.scheme()
        )));
    }

    match parsed.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => {
            return Err(AppError::config(format!(
                "Endpoint URL '{}' has no host",
                endpoint
            )))
        }
    }

    if parsed.scheme() == "http" {
        warn!("Endpoint is not using HTTPS: {}", endpoint);
    }

    Ok(())
}

/// Validates every configured endpoint. Pages without a sheet are allowed.
pub fn validate_config(config: &AppConfig) -> AppResult<()> {
    validate_endpoint_url(&config.classes_url)?;
    validate_endpoint_url(&config.notices_url)?;

    for page in &config.pages {
        if page.slug.trim().is_empty() {
            return Err(AppError::config("Page slug cannot be empty"));
        }
        if let Some(url) = &page.sheet_url {
            validate_endpoint_url(url)?;
        }
    }

    info!(
        "Configuration valid: {} pages, database at {}",
        config.pages.len(),
        config.database_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config_validates() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.pages.len(), 5);
        assert!(config.notices_url.ends_with("/notice"));
    }

    #[test]
    fn test_page_slot_name() {
        let config = AppConfig::default();
        let contact = config.page("contact").unwrap();
        assert_eq!(contact.slot(), "onecol_contact");
        assert!(config.page("missing").is_none());
    }

    #[test]
    fn test_validate_endpoint_url_rejects_bad_values() {
        assert!(validate_endpoint_url("  ").is_err());
        assert!(validate_endpoint_url("not a url").is_err());
        assert!(validate_endpoint_url("ftp://example.com/sheet").is_err());
        assert!(validate_endpoint_url("https://example.com/sheet").is_ok());
        assert!(validate_endpoint_url("http://127.0.0.1:8080/rows").is_ok());
    }

    #[test]
    fn test_validate_config_rejects_blank_slug() {
        let mut config = AppConfig::default();
        config.pages.push(PageConfig::new(" ", "Blank", None));
        assert!(validate_config(&config).is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        env::set_var("HXGNY_DB_PATH", "/tmp/hxgny-test.db");
        env::set_var("HXGNY_CLASSES_URL", "https://example.com/classes");

        let config = AppConfig::from_env();
        assert_eq!(config.database_path, PathBuf::from("/tmp/hxgny-test.db"));
        assert_eq!(config.classes_url, "https://example.com/classes");

        env::remove_var("HXGNY_DB_PATH");
        env::remove_var("HXGNY_CLASSES_URL");
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        env::remove_var("HXGNY_SEED_DIR");
        let config = AppConfig::from_env();
        assert_eq!(config.seed_dir, PathBuf::from("assets"));
    }
}
