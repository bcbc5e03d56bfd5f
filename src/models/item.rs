use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::entities::{item_detail, item_price};

/// Price row for one item, built from the wiki `latest` feed and
/// completed with GE guide prices during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemPriceRecord {
    pub item_id: i32,
    pub in_game_high_price: Option<i64>,
    pub in_game_high_price_timestamp: Option<DateTime<Utc>>,
    pub in_game_low_price: Option<i64>,
    pub in_game_low_price_timestamp: Option<DateTime<Utc>>,
    pub ge_price: Option<i64>,
    pub previous_ge_price: Option<i64>,
}

/// Static item metadata from the GE dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemDetailRecord {
    pub item_id: i32,
    pub name: Option<String>,
    pub examine: Option<String>,
    pub members: Option<bool>,
    pub volume: Option<i64>,
    pub low_alch: Option<i64>,
    pub high_alch: Option<i64>,
    pub buy_limit: Option<i64>,
}

/// One entry of the GE dump: the item's metadata plus its guide prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DumpEntry {
    pub detail: ItemDetailRecord,
    pub ge_price: Option<i64>,
    pub previous_ge_price: Option<i64>,
}

impl DumpEntry {
    pub fn item_id(&self) -> i32 {
        self.detail.item_id
    }
}

impl ItemPriceRecord {
    /// Normalize one value of the `data` object of the `latest` feed.
    ///
    /// Anything that isn't an object yields a record with every price field null.
    pub fn from_latest_entry(item_id: i32, value: &Value) -> Self {
        let empty = Map::new();
        let fields = value.as_object().unwrap_or(&empty);

        Self {
            item_id,
            in_game_high_price: int_field(fields, "high"),
            in_game_high_price_timestamp: timestamp_field(fields, "highTime"),
            in_game_low_price: int_field(fields, "low"),
            in_game_low_price_timestamp: timestamp_field(fields, "lowTime"),
            ge_price: None,
            previous_ge_price: None,
        }
    }
}

impl DumpEntry {
    /// Normalize one value of the GE dump. Missing or mistyped fields become null.
    pub fn from_dump_entry(item_id: i32, value: &Value) -> Self {
        let empty = Map::new();
        let fields = value.as_object().unwrap_or(&empty);

        Self {
            detail: ItemDetailRecord {
                item_id,
                name: text_field(fields, "name"),
                examine: text_field(fields, "examine"),
                members: fields.get("members").and_then(Value::as_bool),
                volume: int_field(fields, "volume"),
                low_alch: int_field(fields, "lowalch"),
                high_alch: int_field(fields, "highalch"),
                buy_limit: int_field(fields, "limit"),
            },
            ge_price: int_field(fields, "price"),
            previous_ge_price: int_field(fields, "last"),
        }
    }
}

/// Parse a feed key into an item id. Only plain ASCII digit strings qualify,
/// so sentinel keys such as `%LAST_UPDATE%` are rejected.
pub fn parse_item_id(key: &str) -> Option<i32> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse().ok()
}

/// Integers pass through, finite floats are rounded, everything else is null.
pub fn normalize_int(value: &Value) -> Option<i64> {
    let Value::Number(n) = value else {
        return None;
    };

    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
            .map(|f| f.round() as i64)
    })
}

/// Unix seconds to UTC. Zero means "never observed" upstream and maps to null.
pub fn normalize_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    normalize_int(value)
        .filter(|secs| *secs != 0)
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

fn int_field(fields: &Map<String, Value>, key: &str) -> Option<i64> {
    fields.get(key).and_then(normalize_int)
}

fn timestamp_field(fields: &Map<String, Value>, key: &str) -> Option<DateTime<Utc>> {
    fields.get(key).and_then(normalize_timestamp)
}

fn text_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(str::to_string)
}

impl From<&ItemPriceRecord> for item_price::Model {
    fn from(record: &ItemPriceRecord) -> Self {
        Self {
            item_id: record.item_id,
            in_game_high_price: record.in_game_high_price,
            in_game_high_price_timestamp: record.in_game_high_price_timestamp,
            in_game_low_price: record.in_game_low_price,
            in_game_low_price_timestamp: record.in_game_low_price_timestamp,
            ge_price: record.ge_price,
            previous_ge_price: record.previous_ge_price,
        }
    }
}

impl From<&ItemDetailRecord> for item_detail::Model {
    fn from(record: &ItemDetailRecord) -> Self {
        Self {
            item_id: record.item_id,
            name: record.name.clone(),
            examine: record.examine.clone(),
            members: record.members,
            volume: record.volume,
            low_alch: record.low_alch,
            high_alch: record.high_alch,
            buy_limit: record.buy_limit,
        }
    }
}
