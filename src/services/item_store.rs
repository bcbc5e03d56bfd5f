//! Conditional upsert of item rows.
//!
//! Each batch runs in its own transaction: stored rows for the batch's ids are
//! loaded, every incoming row is classified as insert / update / unchanged,
//! and only the first two reach the database. A failure anywhere drops the
//! transaction, so a batch is written completely or not at all.

use async_trait::async_trait;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, TransactionTrait,
};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::entities::{item_detail, item_price, prelude::*};
use crate::error::UpsertError;
use crate::models::item::{ItemDetailRecord, ItemPriceRecord};
use crate::services::sync_status;

const ITEM_PRICE_TABLE: &str = "item_price";
const ITEM_DETAIL_TABLE: &str = "item_detail";

/// Ids per `IN (...)` lookup
const LOOKUP_CHUNK_SIZE: usize = 1000;

/// Rows per multi-row INSERT, keeps bind parameters well under driver limits
const INSERT_CHUNK_SIZE: usize = 500;

/// Counts of what an upsert did with its batch
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpsertStats {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Repeated ids within the batch; only the first occurrence is written
    pub duplicates: usize,
}

/// Classification of an incoming batch against the stored rows
#[derive(Debug)]
pub struct UpsertPlan<M> {
    pub inserts: Vec<M>,
    pub updates: Vec<M>,
    pub unchanged: usize,
    pub duplicates: usize,
}

impl<M> UpsertPlan<M> {
    pub fn stats(&self) -> UpsertStats {
        UpsertStats {
            inserted: self.inserts.len(),
            updated: self.updates.len(),
            unchanged: self.unchanged,
            duplicates: self.duplicates,
        }
    }
}

/// Decide what to do with each incoming row.
///
/// Rows are compared field by field, so a stored null only matches an
/// incoming null and never causes a rewrite on its own. Rows that differ are
/// replaced whole.
pub fn plan_upsert<M, K>(incoming: Vec<M>, stored: &HashMap<i32, M>, key: K) -> UpsertPlan<M>
where
    M: PartialEq,
    K: Fn(&M) -> i32,
{
    let mut plan = UpsertPlan {
        inserts: Vec::new(),
        updates: Vec::new(),
        unchanged: 0,
        duplicates: 0,
    };
    let mut seen = HashSet::with_capacity(incoming.len());

    for row in incoming {
        let id = key(&row);
        if !seen.insert(id) {
            plan.duplicates += 1;
            continue;
        }

        match stored.get(&id) {
            None => plan.inserts.push(row),
            Some(existing) if *existing != row => plan.updates.push(row),
            Some(_) => plan.unchanged += 1,
        }
    }

    plan
}

/// Destination of a sync cycle
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Check the store is reachable before any write of the cycle
    async fn ping(&self) -> Result<(), UpsertError>;

    async fn upsert_item_details(
        &self,
        records: &[ItemDetailRecord],
    ) -> Result<UpsertStats, UpsertError>;

    async fn upsert_item_prices(
        &self,
        records: &[ItemPriceRecord],
    ) -> Result<UpsertStats, UpsertError>;

    /// Note the outcome of a cycle in the job ledger. Best effort.
    async fn record_cycle(&self, job_name: &str, outcome: Result<(), String>);
}

#[derive(Clone)]
pub struct ItemStoreService {
    db: DatabaseConnection,
}

impl ItemStoreService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ItemStore for ItemStoreService {
    async fn ping(&self) -> Result<(), UpsertError> {
        self.db.ping().await.map_err(UpsertError::Unreachable)
    }

    async fn upsert_item_details(
        &self,
        records: &[ItemDetailRecord],
    ) -> Result<UpsertStats, UpsertError> {
        upsert_item_details(&self.db, records).await
    }

    async fn upsert_item_prices(
        &self,
        records: &[ItemPriceRecord],
    ) -> Result<UpsertStats, UpsertError> {
        upsert_item_prices(&self.db, records).await
    }

    async fn record_cycle(&self, job_name: &str, outcome: Result<(), String>) {
        let result = match outcome {
            Ok(()) => sync_status::record_success(&self.db, job_name).await,
            Err(error) => sync_status::record_failure(&self.db, job_name, &error).await,
        };

        if let Err(e) = result {
            warn!(job = job_name, error = %e, "Failed to update sync status");
        }
    }
}

pub async fn upsert_item_prices(
    db: &DatabaseConnection,
    records: &[ItemPriceRecord],
) -> Result<UpsertStats, UpsertError> {
    let incoming: Vec<item_price::Model> = records.iter().map(item_price::Model::from).collect();
    let on_err = || UpsertError::write(ITEM_PRICE_TABLE);

    let txn = db.begin().await.map_err(UpsertError::Unreachable)?;

    let ids: Vec<i32> = incoming.iter().map(|m| m.item_id).collect();
    let stored = load_stored_prices(&txn, &ids).await.map_err(on_err())?;
    let plan = plan_upsert(incoming, &stored, |m| m.item_id);
    let stats = plan.stats();

    for chunk in plan.inserts.chunks(INSERT_CHUNK_SIZE) {
        ItemPrice::insert_many(chunk.iter().cloned().map(price_active_model))
            .exec_without_returning(&txn)
            .await
            .map_err(on_err())?;
    }

    for model in plan.updates {
        ItemPrice::update(price_active_model(model))
            .exec(&txn)
            .await
            .map_err(on_err())?;
    }

    txn.commit().await.map_err(on_err())?;

    log_stats(ITEM_PRICE_TABLE, &stats);
    Ok(stats)
}

pub async fn upsert_item_details(
    db: &DatabaseConnection,
    records: &[ItemDetailRecord],
) -> Result<UpsertStats, UpsertError> {
    let incoming: Vec<item_detail::Model> = records.iter().map(item_detail::Model::from).collect();
    let on_err = || UpsertError::write(ITEM_DETAIL_TABLE);

    let txn = db.begin().await.map_err(UpsertError::Unreachable)?;

    let ids: Vec<i32> = incoming.iter().map(|m| m.item_id).collect();
    let stored = load_stored_details(&txn, &ids).await.map_err(on_err())?;
    let plan = plan_upsert(incoming, &stored, |m| m.item_id);
    let stats = plan.stats();

    for chunk in plan.inserts.chunks(INSERT_CHUNK_SIZE) {
        ItemDetail::insert_many(chunk.iter().cloned().map(detail_active_model))
            .exec_without_returning(&txn)
            .await
            .map_err(on_err())?;
    }

    for model in plan.updates {
        ItemDetail::update(detail_active_model(model))
            .exec(&txn)
            .await
            .map_err(on_err())?;
    }

    txn.commit().await.map_err(on_err())?;

    log_stats(ITEM_DETAIL_TABLE, &stats);
    Ok(stats)
}

async fn load_stored_prices(
    txn: &DatabaseTransaction,
    ids: &[i32],
) -> Result<HashMap<i32, item_price::Model>, DbErr> {
    let mut stored = HashMap::with_capacity(ids.len());
    for chunk in ids.chunks(LOOKUP_CHUNK_SIZE) {
        let rows = ItemPrice::find()
            .filter(item_price::Column::ItemId.is_in(chunk.iter().copied()))
            .all(txn)
            .await?;
        stored.extend(rows.into_iter().map(|row| (row.item_id, row)));
    }
    Ok(stored)
}

async fn load_stored_details(
    txn: &DatabaseTransaction,
    ids: &[i32],
) -> Result<HashMap<i32, item_detail::Model>, DbErr> {
    let mut stored = HashMap::with_capacity(ids.len());
    for chunk in ids.chunks(LOOKUP_CHUNK_SIZE) {
        let rows = ItemDetail::find()
            .filter(item_detail::Column::ItemId.is_in(chunk.iter().copied()))
            .all(txn)
            .await?;
        stored.extend(rows.into_iter().map(|row| (row.item_id, row)));
    }
    Ok(stored)
}

// Every column Set: inserts carry the full row and updates overwrite it.
fn price_active_model(model: item_price::Model) -> item_price::ActiveModel {
    item_price::ActiveModel {
        item_id: Set(model.item_id),
        in_game_high_price: Set(model.in_game_high_price),
        in_game_high_price_timestamp: Set(model.in_game_high_price_timestamp),
        in_game_low_price: Set(model.in_game_low_price),
        in_game_low_price_timestamp: Set(model.in_game_low_price_timestamp),
        ge_price: Set(model.ge_price),
        previous_ge_price: Set(model.previous_ge_price),
    }
}

fn detail_active_model(model: item_detail::Model) -> item_detail::ActiveModel {
    item_detail::ActiveModel {
        item_id: Set(model.item_id),
        name: Set(model.name),
        examine: Set(model.examine),
        members: Set(model.members),
        volume: Set(model.volume),
        low_alch: Set(model.low_alch),
        high_alch: Set(model.high_alch),
        buy_limit: Set(model.buy_limit),
    }
}

fn log_stats(table: &str, stats: &UpsertStats) {
    if stats.duplicates > 0 {
        warn!(
            table = table,
            duplicates = stats.duplicates,
            "Batch contained repeated item ids, kept first occurrence"
        );
    }
    info!(
        table = table,
        inserted = stats.inserted,
        updated = stats.updated,
        unchanged = stats.unchanged,
        "Upsert complete"
    );
    debug!(table = table, "Transaction committed");
}
