//! Weird Gloop GE dump (`/gazproj/gazbot/os_dump.json`).
//!
//! One flat object keyed by item id. The dump also carries bookkeeping keys
//! such as `%LAST_UPDATE%` next to the items; those are dropped.

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{ConfigError, FetchError};
use crate::models::item::{parse_item_id, DumpEntry};
use crate::services::http;

const DUMP_PATH: &str = "/gazproj/gazbot/os_dump.json";

#[derive(Clone)]
pub struct GeDumpService {
    client: Client,
    base_url: String,
}

impl GeDumpService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        Ok(Self {
            client: http::build_client(timeout, None)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch item metadata and GE guide prices for every item in the dump
    pub async fn fetch_dump(&self) -> Result<Vec<DumpEntry>, FetchError> {
        let url = format!("{}{}", self.base_url, DUMP_PATH);
        info!(url = %url, "Fetching GE dump");

        let body = http::get_json(&url, self.client.get(&url)).await?;
        let entries = parse_dump(&body)?;

        info!(count = entries.len(), "Fetched GE dump");
        Ok(entries)
    }
}

pub fn parse_dump(body: &Value) -> Result<Vec<DumpEntry>, FetchError> {
    let items = body
        .as_object()
        .ok_or_else(|| FetchError::UnexpectedShape("GE dump is not a JSON object".to_string()))?;

    let mut entries = Vec::with_capacity(items.len());
    for (key, value) in items {
        match parse_item_id(key) {
            Some(item_id) => entries.push(DumpEntry::from_dump_entry(item_id, value)),
            None => debug!(key = %key, "Skipping non-item key in GE dump"),
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_dump_skips_sentinel_keys() {
        let body = json!({
            "%LAST_UPDATE%": 1700000000,
            "%LAST_UPDATE_F%": "14 November 2023",
            "last_updated": "yesterday",
            "4151": {"id": 4151, "name": "Abyssal whip", "price": 2450000, "last": 2400000},
            "995": {"name": "Coins"}
        });

        let mut entries = parse_dump(&body).unwrap();
        entries.sort_by_key(|e| e.item_id());

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].item_id(), 995);
        assert_eq!(entries[0].ge_price, None);
        assert_eq!(entries[1].item_id(), 4151);
        assert_eq!(entries[1].detail.name.as_deref(), Some("Abyssal whip"));
        assert_eq!(entries[1].ge_price, Some(2450000));
        assert_eq!(entries[1].previous_ge_price, Some(2400000));
    }

    #[test]
    fn test_parse_dump_rejects_non_object() {
        let err = parse_dump(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, FetchError::UnexpectedShape(_)));
    }
}
