use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // No foreign key to item_detail: either feed may know an item the other doesn't
        manager
            .create_table(
                Table::create()
                    .table(ItemPrice::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ItemPrice::ItemId)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ItemPrice::InGameHighPrice).big_integer().null())
                    .col(
                        ColumnDef::new(ItemPrice::InGameHighPriceTimestamp)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(ItemPrice::InGameLowPrice).big_integer().null())
                    .col(
                        ColumnDef::new(ItemPrice::InGameLowPriceTimestamp)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(ItemPrice::GePrice).big_integer().null())
                    .col(ColumnDef::new(ItemPrice::PreviousGePrice).big_integer().null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ItemPrice::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ItemPrice {
    Table,
    ItemId,
    InGameHighPrice,
    InGameHighPriceTimestamp,
    InGameLowPrice,
    InGameLowPriceTimestamp,
    GePrice,
    PreviousGePrice,
}
