pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_item_detail;
mod m20260301_000002_create_item_price;
mod m20260301_000003_create_sync_status;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_item_detail::Migration),
            Box::new(m20260301_000002_create_item_price::Migration),
            Box::new(m20260301_000003_create_sync_status::Migration),
        ]
    }
}
