//! Joins the wiki price feed with the GE dump by item id.

use std::collections::HashMap;

use crate::models::item::{DumpEntry, ItemPriceRecord};

/// Left outer join of `prices` with the guide prices in `dump`.
///
/// Every price record is kept, in input order. Records with a dump entry of
/// the same item id take its `ge_price`/`previous_ge_price`; the rest keep
/// null. When the dump repeats an id the first entry wins.
pub fn reconcile(prices: &[ItemPriceRecord], dump: &[DumpEntry]) -> Vec<ItemPriceRecord> {
    let mut guide_prices: HashMap<i32, (Option<i64>, Option<i64>)> =
        HashMap::with_capacity(dump.len());
    for entry in dump {
        guide_prices
            .entry(entry.item_id())
            .or_insert((entry.ge_price, entry.previous_ge_price));
    }

    prices
        .iter()
        .map(|record| match guide_prices.get(&record.item_id) {
            Some(&(ge_price, previous_ge_price)) => ItemPriceRecord {
                ge_price,
                previous_ge_price,
                ..record.clone()
            },
            None => ItemPriceRecord {
                ge_price: None,
                previous_ge_price: None,
                ..record.clone()
            },
        })
        .collect()
}
