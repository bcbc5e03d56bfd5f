//! Sync job ledger.
//!
//! Keeps one `sync_status` row per job with the last attempt, the last
//! success, the last error and running counters, so an operator can tell
//! from the database alone whether the daemon is keeping up.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter,
};

use crate::entities::sync_status::{self, Entity as SyncStatus};

/// Job names recorded in the ledger
pub mod jobs {
    pub const GE_ITEM_SYNC: &str = "ge_item_sync";
}

pub async fn find_status(
    db: &DatabaseConnection,
    job_name: &str,
) -> Result<Option<sync_status::Model>, DbErr> {
    SyncStatus::find()
        .filter(sync_status::Column::JobName.eq(job_name))
        .one(db)
        .await
}

/// Record a completed cycle
pub async fn record_success(
    db: &DatabaseConnection,
    job_name: &str,
) -> Result<(), DbErr> {
    let now = Utc::now().naive_utc();

    match find_status(db, job_name).await? {
        Some(record) => {
            let success_count = record.success_count + 1;
            let mut active_model: sync_status::ActiveModel = record.into();
            active_model.last_success_at = Set(Some(now));
            active_model.last_attempt_at = Set(Some(now));
            active_model.last_error = Set(None);
            active_model.success_count = Set(success_count);
            active_model.update(db).await?;
        }
        None => {
            sync_status::ActiveModel {
                job_name: Set(job_name.to_string()),
                last_success_at: Set(Some(now)),
                last_attempt_at: Set(Some(now)),
                last_error: Set(None),
                success_count: Set(1),
                error_count: Set(0),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
    }

    tracing::debug!("[{}] Recorded successful sync", job_name);
    Ok(())
}

/// Record an aborted cycle. The previous success time is kept.
pub async fn record_failure(
    db: &DatabaseConnection,
    job_name: &str,
    error: &str,
) -> Result<(), DbErr> {
    let now = Utc::now().naive_utc();

    match find_status(db, job_name).await? {
        Some(record) => {
            let error_count = record.error_count + 1;
            let mut active_model: sync_status::ActiveModel = record.into();
            active_model.last_attempt_at = Set(Some(now));
            active_model.last_error = Set(Some(error.to_string()));
            active_model.error_count = Set(error_count);
            active_model.update(db).await?;
        }
        None => {
            sync_status::ActiveModel {
                job_name: Set(job_name.to_string()),
                last_success_at: Set(None),
                last_attempt_at: Set(Some(now)),
                last_error: Set(Some(error.to_string())),
                success_count: Set(0),
                error_count: Set(1),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
    }

    tracing::debug!("[{}] Recorded failed sync: {}", job_name, error);
    Ok(())
}
