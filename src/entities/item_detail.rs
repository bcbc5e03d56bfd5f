//! `SeaORM` Entity for item_detail table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "item_detail")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub item_id: i32,
    pub name: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub examine: Option<String>,
    pub members: Option<bool>,
    /// Daily trade volume
    pub volume: Option<i64>,
    pub low_alch: Option<i64>,
    pub high_alch: Option<i64>,
    /// GE buy limit per four hours
    pub buy_limit: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
