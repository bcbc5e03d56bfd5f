mod common;

use async_trait::async_trait;
use ge_price_sync::error::{CycleError, FetchError, UpsertError};
use ge_price_sync::jobs::ge_item_sync::{run_and_record_cycle, run_cycle, run_sync_loop, ItemFeeds};
use ge_price_sync::models::item::{DumpEntry, ItemDetailRecord, ItemPriceRecord};
use ge_price_sync::services::item_store::{ItemStore, ItemStoreService, UpsertStats};
use ge_price_sync::services::sync_status::{self, jobs};
use sea_orm::{DbErr, EntityTrait};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::common::{dump_entries, price_records, setup_test_db};

struct FakeFeeds {
    prices: Result<Vec<ItemPriceRecord>, String>,
    dump: Result<Vec<DumpEntry>, String>,
    calls: Arc<AtomicUsize>,
}

impl FakeFeeds {
    fn ok() -> Self {
        Self {
            prices: Ok(price_records(json!({
                "4151": {"high": 2500000, "highTime": 1700000000, "low": 2400000, "lowTime": 1700000100},
                "2": {"high": 180}
            }))),
            dump: Ok(dump_entries(json!({
                "%LAST_UPDATE%": 1700000000,
                "4151": {"id": 4151, "name": "Abyssal whip", "price": 2450000, "last": 2400000},
                "995": {"name": "Coins"}
            }))),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl ItemFeeds for FakeFeeds {
    async fn latest_prices(&self) -> Result<Vec<ItemPriceRecord>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prices.clone().map_err(FetchError::UnexpectedShape)
    }

    async fn ge_dump(&self) -> Result<Vec<DumpEntry>, FetchError> {
        self.dump.clone().map_err(FetchError::UnexpectedShape)
    }
}

/// Records every call instead of writing anywhere
#[derive(Default)]
struct RecordingStore {
    down: bool,
    fail_details: bool,
    calls: Mutex<Vec<String>>,
    prices: Mutex<Vec<ItemPriceRecord>>,
    details: Mutex<Vec<ItemDetailRecord>>,
}

impl RecordingStore {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ItemStore for RecordingStore {
    async fn ping(&self) -> Result<(), UpsertError> {
        self.calls.lock().unwrap().push("ping".to_string());
        if self.down {
            return Err(UpsertError::Unreachable(DbErr::Custom("connection refused".into())));
        }
        Ok(())
    }

    async fn upsert_item_details(
        &self,
        records: &[ItemDetailRecord],
    ) -> Result<UpsertStats, UpsertError> {
        self.calls.lock().unwrap().push("details".to_string());
        if self.fail_details {
            return Err(UpsertError::Write {
                table: "item_detail",
                source: DbErr::Custom("constraint violated".into()),
            });
        }
        self.details.lock().unwrap().extend_from_slice(records);
        Ok(UpsertStats {
            inserted: records.len(),
            ..Default::default()
        })
    }

    async fn upsert_item_prices(
        &self,
        records: &[ItemPriceRecord],
    ) -> Result<UpsertStats, UpsertError> {
        self.calls.lock().unwrap().push("prices".to_string());
        self.prices.lock().unwrap().extend_from_slice(records);
        Ok(UpsertStats {
            inserted: records.len(),
            ..Default::default()
        })
    }

    async fn record_cycle(&self, job_name: &str, outcome: Result<(), String>) {
        let entry = match outcome {
            Ok(()) => format!("record:{}:ok", job_name),
            Err(_) => format!("record:{}:err", job_name),
        };
        self.calls.lock().unwrap().push(entry);
    }
}

#[tokio::test]
async fn test_cycle_runs_stages_in_order() {
    let feeds = FakeFeeds::ok();
    let store = RecordingStore::default();

    let report = run_cycle(&feeds, &store).await.unwrap();

    assert_eq!(store.calls(), vec!["ping", "details", "prices"]);
    assert_eq!(report.price_records, 2);
    assert_eq!(report.dump_entries, 2);
    assert_eq!(report.details.inserted, 2);
    assert_eq!(report.prices.inserted, 2);

    let prices = store.prices.lock().unwrap();
    let whip = prices.iter().find(|p| p.item_id == 4151).unwrap();
    assert_eq!(whip.ge_price, Some(2450000));
    assert_eq!(whip.previous_ge_price, Some(2400000));
    let item_2 = prices.iter().find(|p| p.item_id == 2).unwrap();
    assert_eq!(item_2.ge_price, None);
    assert_eq!(item_2.previous_ge_price, None);
}

#[tokio::test]
async fn test_price_feed_failure_aborts_cycle() {
    let feeds = FakeFeeds {
        prices: Err("wiki down".to_string()),
        ..FakeFeeds::ok()
    };
    let store = RecordingStore::default();

    let err = run_cycle(&feeds, &store).await.unwrap_err();

    assert!(matches!(err, CycleError::PriceFeed(_)));
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_dump_failure_aborts_cycle_before_any_write() {
    let feeds = FakeFeeds {
        dump: Err("dump down".to_string()),
        ..FakeFeeds::ok()
    };
    let store = RecordingStore::default();

    let err = run_and_record_cycle(&feeds, &store).await.unwrap_err();

    assert!(matches!(err, CycleError::DumpFeed(_)));
    assert_eq!(store.calls(), vec!["record:ge_item_sync:err"]);
    assert!(store.prices.lock().unwrap().is_empty());
    assert!(store.details.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_store_aborts_cycle() {
    let feeds = FakeFeeds::ok();
    let store = RecordingStore {
        down: true,
        ..Default::default()
    };

    let err = run_and_record_cycle(&feeds, &store).await.unwrap_err();

    assert!(matches!(err, CycleError::Store(UpsertError::Unreachable(_))));
    assert_eq!(store.calls(), vec!["ping"]);
}

#[tokio::test]
async fn test_failed_details_batch_skips_prices() {
    let feeds = FakeFeeds::ok();
    let store = RecordingStore {
        fail_details: true,
        ..Default::default()
    };

    let err = run_cycle(&feeds, &store).await.unwrap_err();

    assert!(matches!(
        err,
        CycleError::Store(UpsertError::Write { table: "item_detail", .. })
    ));
    assert_eq!(store.calls(), vec!["ping", "details"]);
    assert!(store.prices.lock().unwrap().is_empty());

    // The failure still reaches the job ledger
    let err = run_and_record_cycle(&feeds, &store).await.unwrap_err();
    assert!(matches!(err, CycleError::Store(UpsertError::Write { .. })));
    assert_eq!(
        store.calls(),
        vec!["ping", "details", "ping", "details", "record:ge_item_sync:err"]
    );
}

#[tokio::test]
async fn test_loop_keeps_running_after_failed_cycles() {
    let feeds = FakeFeeds {
        dump: Err("dump down".to_string()),
        ..FakeFeeds::ok()
    };
    let calls = feeds.calls.clone();
    let store = RecordingStore::default();

    run_sync_loop(
        feeds,
        store,
        Duration::from_millis(10),
        tokio::time::sleep(Duration::from_millis(200)),
    )
    .await;

    assert!(calls.load(Ordering::SeqCst) >= 2, "loop should retry on the next tick");
}

#[tokio::test]
async fn test_cycle_against_database() {
    let db = setup_test_db().await.unwrap();
    let store = ItemStoreService::new(db.clone());
    let feeds = FakeFeeds::ok();

    let first = run_and_record_cycle(&feeds, &store).await.unwrap();
    assert_eq!(first.prices.inserted, 2);
    assert_eq!(first.details.inserted, 2);

    let second = run_and_record_cycle(&feeds, &store).await.unwrap();
    assert_eq!(second.prices.inserted + second.prices.updated, 0);
    assert_eq!(second.details.inserted + second.details.updated, 0);

    let rows = ge_price_sync::entities::prelude::ItemPrice::find()
        .all(&db)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);

    let status = sync_status::find_status(&db, jobs::GE_ITEM_SYNC)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(status.success_count, 2);
    assert_eq!(status.error_count, 0);
}
