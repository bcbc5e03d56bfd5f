// src/lib.rs

pub mod config;
pub mod error;

pub mod entities {
    pub mod prelude;
    pub mod item_detail;
    pub mod item_price;
    pub mod sync_status;
}

pub mod services {
    pub mod http;
    pub mod osrs_wiki;
    pub mod ge_dump;
    pub mod reconcile;
    pub mod item_store;
    pub mod sync_status;
}

pub mod jobs {
    pub mod ge_item_sync;
}

pub mod models;
