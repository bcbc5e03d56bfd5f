//! GE Item Sync Job
//!
//! Every cycle fetches the OSRS Wiki latest prices and the GE dump, joins
//! them by item id and upserts `item_detail` then `item_price`. Stages run
//! strictly in order; the first failure aborts the rest of the cycle and the
//! next attempt happens one interval later. The interval is a delay after a
//! cycle finishes, not a fixed rate. Supports graceful shutdown via SIGINT.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::{error, info};

use crate::error::{CycleError, FetchError, UpsertError};
use crate::models::item::{DumpEntry, ItemDetailRecord, ItemPriceRecord};
use crate::services::ge_dump::GeDumpService;
use crate::services::item_store::{ItemStore, UpsertStats};
use crate::services::osrs_wiki::OsrsWikiService;
use crate::services::reconcile::reconcile;
use crate::services::sync_status::jobs;

/// The two upstream feeds a cycle reads
#[async_trait]
pub trait ItemFeeds: Send + Sync {
    async fn latest_prices(&self) -> Result<Vec<ItemPriceRecord>, FetchError>;
    async fn ge_dump(&self) -> Result<Vec<DumpEntry>, FetchError>;
}

#[derive(Clone)]
pub struct MarketFeeds {
    pub osrs_wiki: OsrsWikiService,
    pub ge_dump: GeDumpService,
}

#[async_trait]
impl ItemFeeds for MarketFeeds {
    async fn latest_prices(&self) -> Result<Vec<ItemPriceRecord>, FetchError> {
        self.osrs_wiki.fetch_latest_prices().await
    }

    async fn ge_dump(&self) -> Result<Vec<DumpEntry>, FetchError> {
        self.ge_dump.fetch_dump().await
    }
}

/// What a completed cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub price_records: usize,
    pub dump_entries: usize,
    pub details: UpsertStats,
    pub prices: UpsertStats,
}

/// Run one fetch → reconcile → upsert pass
pub async fn run_cycle<F, S>(feeds: &F, store: &S) -> Result<CycleReport, CycleError>
where
    F: ItemFeeds + ?Sized,
    S: ItemStore + ?Sized,
{
    let prices = feeds.latest_prices().await.map_err(CycleError::PriceFeed)?;
    let dump = feeds.ge_dump().await.map_err(CycleError::DumpFeed)?;

    store.ping().await?;

    let merged = reconcile(&prices, &dump);
    let details: Vec<ItemDetailRecord> = dump.iter().map(|entry| entry.detail.clone()).collect();

    let detail_stats = store.upsert_item_details(&details).await?;
    info!(
        inserted = detail_stats.inserted,
        updated = detail_stats.updated,
        "Grand Exchange item details synced"
    );

    let price_stats = store.upsert_item_prices(&merged).await?;
    info!(
        inserted = price_stats.inserted,
        updated = price_stats.updated,
        "OSRS Wiki item prices synced"
    );

    Ok(CycleReport {
        price_records: prices.len(),
        dump_entries: dump.len(),
        details: detail_stats,
        prices: price_stats,
    })
}

/// Run a cycle, log its outcome and note it in the job ledger
pub async fn run_and_record_cycle<F, S>(feeds: &F, store: &S) -> Result<CycleReport, CycleError>
where
    F: ItemFeeds + ?Sized,
    S: ItemStore + ?Sized,
{
    let result = run_cycle(feeds, store).await;

    match &result {
        Ok(report) => {
            info!(
                price_records = report.price_records,
                dump_entries = report.dump_entries,
                "GE item sync cycle complete"
            );
            store.record_cycle(jobs::GE_ITEM_SYNC, Ok(())).await;
        }
        Err(e) => {
            error!(error = %e, "GE item sync cycle aborted");
            // Nothing to record when the store itself is down
            if !matches!(e, CycleError::Store(UpsertError::Unreachable(_))) {
                store.record_cycle(jobs::GE_ITEM_SYNC, Err(e.to_string())).await;
            }
        }
    }

    result
}

/// Start the sync loop and run until SIGINT
pub async fn start_ge_item_sync_job<F, S>(feeds: F, store: S, interval: Duration)
where
    F: ItemFeeds,
    S: ItemStore,
{
    run_sync_loop(feeds, store, interval, shutdown_signal()).await;
}

/// Cycle, then sleep `interval`, until `shutdown` resolves.
///
/// Shutdown is honoured mid-cycle too; an interrupted batch rolls back with
/// its transaction.
pub async fn run_sync_loop<F, S, Sh>(feeds: F, store: S, interval: Duration, shutdown: Sh)
where
    F: ItemFeeds,
    S: ItemStore,
    Sh: Future<Output = ()>,
{
    info!(
        interval_secs = interval.as_secs(),
        "GE item sync job started"
    );

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = run_and_record_cycle(&feeds, &store) => {}
        }

        tokio::select! {
            _ = &mut shutdown => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    info!("Shutdown signal received, GE item sync job stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
