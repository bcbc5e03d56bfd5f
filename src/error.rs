//! Error types for the sync pipeline.

use sea_orm::DbErr;
use thiserror::Error;

/// Failure fetching or decoding one upstream feed.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("invalid JSON from {url}: {source}")]
    InvalidJson {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),
}

/// Failure writing a batch to the store. The batch's transaction is rolled back.
#[derive(Error, Debug)]
pub enum UpsertError {
    #[error("database unreachable: {0}")]
    Unreachable(#[source] DbErr),

    #[error("write to {table} failed: {source}")]
    Write {
        table: &'static str,
        #[source]
        source: DbErr,
    },
}

impl UpsertError {
    pub(crate) fn write(table: &'static str) -> impl FnOnce(DbErr) -> Self {
        move |source| UpsertError::Write { table, source }
    }
}

/// Missing or invalid startup configuration. Always fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    Missing(&'static str),

    #[error("environment variable {var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// The stage that aborted a sync cycle.
#[derive(Error, Debug)]
pub enum CycleError {
    #[error("price feed fetch failed: {0}")]
    PriceFeed(#[source] FetchError),

    #[error("GE dump fetch failed: {0}")]
    DumpFeed(#[source] FetchError),

    #[error("store sync failed: {0}")]
    Store(#[from] UpsertError),
}
