// Sheet integration module
// Fetches spreadsheet rows through the JSON proxy and maps them into records

use crate::error::{AppError, AppResult};
use crate::http_config::HttpConfig;
use crate::utils::logging;
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Client;
use serde_json::Value;
use std::time::Instant;

pub mod classes;
pub mod notices;
pub mod pages;
pub mod rows;

pub use rows::RawRow;

/// Anything that can produce sheet rows for an endpoint.
///
/// Implementations never fail: an unreachable endpoint, a bad status or an
/// unexpected body all come back as no rows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RowSource: Send + Sync {
    async fn fetch_rows(&self, url: &str) -> Vec<RawRow>;
}

/// Fetches rows over HTTP from the sheet proxy.
#[derive(Clone)]
pub struct SheetClient {
    client: Client,
}

impl SheetClient {
    pub fn new(config: &HttpConfig) -> AppResult<Self> {
        Ok(Self {
            client: config.build_client()?,
        })
    }

    async fn try_fetch(&self, url: &str) -> AppResult<Vec<RawRow>> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(AppError::invalid_input(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let body = response.text().await?;
        Ok(parse_rows(&body))
    }
}

#[async_trait]
impl RowSource for SheetClient {
    async fn fetch_rows(&self, url: &str) -> Vec<RawRow> {
        let started = Instant::now();
        debug!("Fetching sheet rows from {}", url);

        match self.try_fetch(url).await {
            Ok(rows) => {
                info!(
                    "Fetched {} rows from {} in {}ms",
                    rows.len(),
                    url,
                    started.elapsed().as_millis()
                );
                rows
            }
            Err(e) => {
                logging::log_network_error(url, &e);
                Vec::new()
            }
        }
    }
}

/// Parses a proxy response body: a JSON array of flat objects.
///
/// Entries that are not objects are skipped. Cell values are coerced to
/// text, `null` becoming an empty string and nested values their JSON text.
/// Anything other than an array yields no rows.
pub fn parse_rows(body: &str) -> Vec<RawRow> {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            warn!("Sheet response is not valid JSON: {}", e);
            return Vec::new();
        }
    };

    let Value::Array(entries) = value else {
        warn!("Sheet response is not a JSON array");
        return Vec::new();
    };

    entries
        .into_iter()
        .filter_map(|entry| match entry {
            Value::Object(object) => Some(
                object
                    .into_iter()
                    .map(|(key, value)| (key, cell_text(value)))
                    .collect::<RawRow>(),
            ),
            other => {
                debug!("Skipping non-object row: {}", other);
                None
            }
        })
        .collect()
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        nested => nested.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rows_coerces_values() {
        let body = r#"[{"title":"Math","seats":12,"open":true,"note":null,"tags":["a"]}]"#;
        let rows = parse_rows(body);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row["title"], "Math");
        assert_eq!(row["seats"], "12");
        assert_eq!(row["open"], "true");
        assert_eq!(row["note"], "");
        assert_eq!(row["tags"], r#"["a"]"#);
    }

    #[test]
    fn test_parse_rows_keeps_column_order() {
        let rows = parse_rows(r#"[{"zeta":"1","alpha":"2"}]"#);
        let keys: Vec<_> = rows[0].keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_parse_rows_skips_non_objects() {
        let rows = parse_rows(r#"[{"a":"1"}, "stray", 5, null, {"b":"2"}]"#);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_parse_rows_rejects_other_shapes() {
        assert!(parse_rows(r#"{"error":"sheet not found"}"#).is_empty());
        assert!(parse_rows("<!DOCTYPE html><html></html>").is_empty());
        assert!(parse_rows("").is_empty());
        assert!(parse_rows("[]").is_empty());
    }

    #[tokio::test]
    async fn test_fetch_rows_unreachable_endpoint_returns_empty() {
        let client = SheetClient::new(&HttpConfig::default()).unwrap();
        // Port 9 (discard) is closed on test machines; connection is refused.
        let rows = client.fetch_rows("http://127.0.0.1:9/rows").await;
        assert!(rows.is_empty());
    }
}
