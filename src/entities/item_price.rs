//! `SeaORM` Entity for item_price table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "item_price")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub item_id: i32,
    /// Latest instant-buy price reported by the wiki price feed
    pub in_game_high_price: Option<i64>,
    pub in_game_high_price_timestamp: Option<DateTimeUtc>,
    /// Latest instant-sell price reported by the wiki price feed
    pub in_game_low_price: Option<i64>,
    pub in_game_low_price_timestamp: Option<DateTimeUtc>,
    /// Official guide price from the GE dump
    pub ge_price: Option<i64>,
    pub previous_ge_price: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
