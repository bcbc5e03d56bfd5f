//! Startup configuration.
//!
//! Values come from the process environment (after `.env` is loaded by
//! `main`). Every lookup goes through a closure so the parsing rules can be
//! exercised without touching the real environment.

use reqwest::Url;
use sea_orm::ConnectOptions;
use std::env;
use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;

/// Full connection string, takes precedence over the DB_* parts
const ENV_DATABASE_URL: &str = "DATABASE_URL";
const ENV_DB_HOSTNAME: &str = "DB_HOSTNAME";
const ENV_DB_USERNAME: &str = "DB_USERNAME";
const ENV_DB_PASSWORD: &str = "DB_PASSWORD";
const ENV_DB_NAME: &str = "DB_NAME";

/// Identification token sent to the wiki price API in the User-Agent
const ENV_DISCORD_ID: &str = "DISCORD_ID";

const ENV_SYNC_INTERVAL: &str = "SYNC_INTERVAL_SECS";
const ENV_HTTP_TIMEOUT: &str = "HTTP_TIMEOUT_SECS";
const ENV_OSRS_WIKI_BASE_URL: &str = "OSRS_WIKI_BASE_URL";
const ENV_GE_DUMP_BASE_URL: &str = "GE_DUMP_BASE_URL";

const DEFAULT_DB_NAME: &str = "runescape";
/// Delay between the end of one cycle and the start of the next (5 minutes)
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_OSRS_WIKI_BASE_URL: &str = "https://prices.runescape.wiki";
pub const DEFAULT_GE_DUMP_BASE_URL: &str = "https://chisel.weirdgloop.org";

/// Pool sizing: 5 steady connections, room for 10 more under load
const DB_MIN_CONNECTIONS: u32 = 5;
const DB_MAX_CONNECTIONS: u32 = 15;
/// Connections are recycled after an hour
const DB_MAX_LIFETIME: Duration = Duration::from_secs(3600);
const DB_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct SyncConfig {
    pub database_url: String,
    pub discord_id: String,
    pub sync_interval: Duration,
    pub http_timeout: Duration,
    pub osrs_wiki_base_url: String,
    pub ge_dump_base_url: String,
}

impl SyncConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = match get(ENV_DATABASE_URL) {
            Some(url) => url,
            None => build_database_url(
                &get(ENV_DB_HOSTNAME).ok_or(ConfigError::Missing(ENV_DB_HOSTNAME))?,
                &get(ENV_DB_USERNAME).ok_or(ConfigError::Missing(ENV_DB_USERNAME))?,
                &get(ENV_DB_PASSWORD).ok_or(ConfigError::Missing(ENV_DB_PASSWORD))?,
                &get(ENV_DB_NAME).unwrap_or_else(|| DEFAULT_DB_NAME.to_string()),
            )?,
        };

        let discord_id = get(ENV_DISCORD_ID).ok_or(ConfigError::Missing(ENV_DISCORD_ID))?;

        let sync_interval = parse_secs(
            ENV_SYNC_INTERVAL,
            get(ENV_SYNC_INTERVAL),
            DEFAULT_SYNC_INTERVAL_SECS,
        )?;
        let http_timeout = parse_secs(
            ENV_HTTP_TIMEOUT,
            get(ENV_HTTP_TIMEOUT),
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?;

        Ok(Self {
            database_url,
            discord_id,
            sync_interval,
            http_timeout,
            osrs_wiki_base_url: get(ENV_OSRS_WIKI_BASE_URL)
                .unwrap_or_else(|| DEFAULT_OSRS_WIKI_BASE_URL.to_string()),
            ge_dump_base_url: get(ENV_GE_DUMP_BASE_URL)
                .unwrap_or_else(|| DEFAULT_GE_DUMP_BASE_URL.to_string()),
        })
    }

    /// Pool settings for the store connection
    pub fn connect_options(&self) -> ConnectOptions {
        let mut options = ConnectOptions::new(self.database_url.clone());
        options
            .min_connections(DB_MIN_CONNECTIONS)
            .max_connections(DB_MAX_CONNECTIONS)
            .max_lifetime(DB_MAX_LIFETIME)
            .connect_timeout(DB_CONNECT_TIMEOUT)
            .sqlx_logging(false);
        options
    }

    /// User-Agent the wiki price API asks consumers to send
    pub fn user_agent(&self) -> String {
        format!("GrandExchangeLocalDataSync v1.0 DiscId {}", self.discord_id)
    }
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("database_url", &redact_password(&self.database_url))
            .field("discord_id", &self.discord_id)
            .field("sync_interval", &self.sync_interval)
            .field("http_timeout", &self.http_timeout)
            .field("osrs_wiki_base_url", &self.osrs_wiki_base_url)
            .field("ge_dump_base_url", &self.ge_dump_base_url)
            .finish()
    }
}

/// Postgres URL with username and password percent-encoded
fn build_database_url(
    hostname: &str,
    username: &str,
    password: &str,
    database: &str,
) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        var: ENV_DB_HOSTNAME,
        reason,
    };

    let mut url = Url::parse(&format!("postgres://{}/{}", hostname, database))
        .map_err(|e| invalid(e.to_string()))?;
    url.set_username(username)
        .map_err(|_| invalid("cannot carry credentials".to_string()))?;
    url.set_password(Some(password))
        .map_err(|_| invalid("cannot carry credentials".to_string()))?;

    Ok(url.to_string())
}

fn parse_secs(
    var: &'static str,
    raw: Option<String>,
    default_secs: u64,
) -> Result<Duration, ConfigError> {
    let Some(raw) = raw else {
        return Ok(Duration::from_secs(default_secs));
    };

    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            var,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(e) => Err(ConfigError::Invalid {
            var,
            reason: format!("{:?} is not a number of seconds: {}", raw, e),
        }),
    }
}

fn redact_password(database_url: &str) -> String {
    match Url::parse(database_url) {
        Ok(mut url) if url.password().is_some() => {
            let _ = url.set_password(Some("***"));
            url.to_string()
        }
        Ok(url) => url.to_string(),
        Err(_) => "<unparsable>".to_string(),
    }
}
