pub use super::item_detail::Entity as ItemDetail;
pub use super::item_price::Entity as ItemPrice;
pub use super::sync_status::Entity as SyncStatus;
