use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ge_price_sync::config::SyncConfig;
use ge_price_sync::jobs::ge_item_sync::{self, MarketFeeds};
use ge_price_sync::services::{
    ge_dump::GeDumpService, item_store::ItemStoreService, osrs_wiki::OsrsWikiService,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ge_price_sync=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = SyncConfig::from_env().inspect_err(|e| {
        tracing::error!("Invalid configuration: {}", e);
    })?;
    tracing::info!(config = ?config, "Loaded configuration");

    // Connect to database
    tracing::info!("Connecting to database...");
    let db = Database::connect(config.connect_options()).await.inspect_err(|e| {
        tracing::error!("Failed to connect to database: {}", e);
    })?;

    // Run migrations
    tracing::info!("Running migrations...");
    migration::Migrator::up(&db, None).await?;

    let feeds = MarketFeeds {
        osrs_wiki: OsrsWikiService::new(
            &config.osrs_wiki_base_url,
            &config.user_agent(),
            config.http_timeout,
        )?,
        ge_dump: GeDumpService::new(&config.ge_dump_base_url, config.http_timeout)?,
    };
    let store = ItemStoreService::new(db.clone());

    ge_item_sync::start_ge_item_sync_job(feeds, store, config.sync_interval).await;

    db.close().await?;
    Ok(())
}
