use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Item ids come from the game, so the key is never generated here
        manager
            .create_table(
                Table::create()
                    .table(ItemDetail::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ItemDetail::ItemId)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ItemDetail::Name).string().null())
                    .col(ColumnDef::new(ItemDetail::Examine).text().null())
                    .col(ColumnDef::new(ItemDetail::Members).boolean().null())
                    .col(ColumnDef::new(ItemDetail::Volume).big_integer().null())
                    .col(ColumnDef::new(ItemDetail::LowAlch).big_integer().null())
                    .col(ColumnDef::new(ItemDetail::HighAlch).big_integer().null())
                    .col(ColumnDef::new(ItemDetail::BuyLimit).big_integer().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_item_detail_name")
                    .table(ItemDetail::Table)
                    .col(ItemDetail::Name)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ItemDetail::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ItemDetail {
    Table,
    ItemId,
    Name,
    Examine,
    Members,
    Volume,
    LowAlch,
    HighAlch,
    BuyLimit,
}
