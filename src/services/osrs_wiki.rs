//! OSRS Wiki real-time prices API (`/api/v1/osrs/latest`).
//!
//! The wiki asks every consumer to identify itself through the User-Agent,
//! so the client is always built with one.

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{ConfigError, FetchError};
use crate::models::item::{parse_item_id, ItemPriceRecord};
use crate::services::http;

const LATEST_PATH: &str = "/api/v1/osrs/latest";

#[derive(Clone)]
pub struct OsrsWikiService {
    client: Client,
    base_url: String,
}

impl OsrsWikiService {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, ConfigError> {
        Ok(Self {
            client: http::build_client(timeout, Some(user_agent))?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the latest instant-buy/sell prices for every traded item
    pub async fn fetch_latest_prices(&self) -> Result<Vec<ItemPriceRecord>, FetchError> {
        let url = format!("{}{}", self.base_url, LATEST_PATH);
        info!(url = %url, "Fetching latest prices from OSRS Wiki");

        let body = http::get_json(&url, self.client.get(&url)).await?;
        let records = parse_latest_prices(&body)?;

        info!(count = records.len(), "Fetched latest prices from OSRS Wiki");
        Ok(records)
    }
}

/// Normalize a `latest` response body: `{"data": {"<itemId>": {...}}}`
pub fn parse_latest_prices(body: &Value) -> Result<Vec<ItemPriceRecord>, FetchError> {
    let data = body
        .get("data")
        .and_then(Value::as_object)
        .ok_or_else(|| FetchError::UnexpectedShape("missing \"data\" object".to_string()))?;

    let mut records = Vec::with_capacity(data.len());
    for (key, value) in data {
        match parse_item_id(key) {
            Some(item_id) => records.push(ItemPriceRecord::from_latest_entry(item_id, value)),
            None => warn!(key = %key, "Skipping price entry with non-numeric item id"),
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_latest_prices() {
        let body = json!({
            "data": {
                "4151": {"high": 2500000, "highTime": 1700000000, "low": 2400000, "lowTime": 1700000100},
                "2": {"high": 180, "highTime": null, "low": 175}
            }
        });

        let mut records = parse_latest_prices(&body).unwrap();
        records.sort_by_key(|r| r.item_id);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].item_id, 2);
        assert_eq!(records[0].in_game_high_price_timestamp, None);
        assert_eq!(records[0].in_game_low_price, Some(175));
        assert_eq!(records[1].item_id, 4151);
        assert_eq!(records[1].in_game_high_price, Some(2500000));
    }

    #[test]
    fn test_parse_latest_prices_skips_bad_keys() {
        let body = json!({"data": {"abc": {"high": 1}, "10": {}}});
        let records = parse_latest_prices(&body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].item_id, 10);
        assert_eq!(records[0].in_game_high_price, None);
    }

    #[test]
    fn test_parse_latest_prices_requires_data() {
        let err = parse_latest_prices(&json!({"items": {}})).unwrap_err();
        assert!(matches!(err, FetchError::UnexpectedShape(_)));

        let err = parse_latest_prices(&json!({"data": []})).unwrap_err();
        assert!(matches!(err, FetchError::UnexpectedShape(_)));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let service = OsrsWikiService::new(
            "https://prices.runescape.wiki/",
            "test-agent",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(service.base_url, "https://prices.runescape.wiki");
    }
}
