#![allow(dead_code)]

use ge_price_sync::models::item::{DumpEntry, ItemPriceRecord};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;

/// Set up an in-memory SQLite database with all migrations applied.
/// A single pooled connection keeps the in-memory database alive for the test.
pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// Price records from a `latest`-style `data` object
pub fn price_records(data: Value) -> Vec<ItemPriceRecord> {
    ge_price_sync::services::osrs_wiki::parse_latest_prices(&serde_json::json!({ "data": data }))
        .expect("valid price feed")
}

/// Dump entries from a GE dump-style object
pub fn dump_entries(dump: Value) -> Vec<DumpEntry> {
    ge_price_sync::services::ge_dump::parse_dump(&dump).expect("valid GE dump")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_setup_test_db() {
        let db = setup_test_db().await;
        assert!(db.is_ok(), "Test database should be created and migrated");
    }
}
