//! Runtime configuration.
//!
//! `LogleafConfig` is read once from the environment at startup and handed to
//! the pieces that need it.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::db::{Database, ReplicaConfig, StoreResult};
use crate::qiita::{QiitaClient, DEFAULT_QIITA_API_BASE_URL};
use crate::sync::SyncSettings;
use crate::util::{is_http_url, normalize_text_option};

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Qiita account whose stocks are synced
#[derive(Clone, PartialEq, Eq)]
pub struct QiitaCredentials {
    pub user: String,
    pub token: String,
}

impl fmt::Debug for QiitaCredentials {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("QiitaCredentials")
            .field("user", &self.user)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Clone)]
pub struct LogleafConfig {
    pub db_path: PathBuf,
    pub replica: Option<ReplicaConfig>,
    pub qiita: Option<QiitaCredentials>,
    pub qiita_api_base_url: String,
    pub sync_list_limit: usize,
    pub sync_pace: Duration,
    pub sync_timeout: Duration,
    pub bind_addr: String,
}

impl fmt::Debug for LogleafConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("LogleafConfig")
            .field("db_path", &self.db_path)
            .field("replica", &self.replica)
            .field("qiita", &self.qiita)
            .field("qiita_api_base_url", &self.qiita_api_base_url)
            .field("sync_list_limit", &self.sync_list_limit)
            .field("sync_pace", &self.sync_pace)
            .field("sync_timeout", &self.sync_timeout)
            .field("bind_addr", &self.bind_addr)
            .finish()
    }
}

impl LogleafConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let db_path = optional_trimmed(&lookup, "LOGLEAF_DB_PATH")
            .map_or_else(default_db_path, PathBuf::from);

        let replica = match (
            optional_trimmed(&lookup, "TURSO_DATABASE_URL"),
            optional_trimmed(&lookup, "TURSO_AUTH_TOKEN"),
        ) {
            (Some(url), Some(token)) => Some(ReplicaConfig::new(url, token)),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::MissingVar("TURSO_AUTH_TOKEN")),
            (None, Some(_)) => return Err(ConfigError::MissingVar("TURSO_DATABASE_URL")),
        };

        let qiita = match (
            optional_trimmed(&lookup, "QIITA_USER"),
            optional_trimmed(&lookup, "QIITA_TOKEN"),
        ) {
            (Some(user), Some(token)) => Some(QiitaCredentials { user, token }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::MissingVar("QIITA_TOKEN")),
            (None, Some(_)) => return Err(ConfigError::MissingVar("QIITA_USER")),
        };

        let qiita_api_base_url =
            value_or_default(&lookup, "QIITA_API_BASE_URL", DEFAULT_QIITA_API_BASE_URL)
                .trim_end_matches('/')
                .to_string();
        if !is_http_url(&qiita_api_base_url) {
            return Err(ConfigError::Invalid(
                "QIITA_API_BASE_URL must start with http:// or https://".to_string(),
            ));
        }

        let sync_list_limit = bounded(&lookup, "LOGLEAF_SYNC_LIST_LIMIT", 1_000, 1, 10_000)?;
        let sync_pace_ms = bounded(&lookup, "LOGLEAF_SYNC_PACE_MS", 1_000, 0, 60_000)?;
        let sync_timeout_secs = bounded(&lookup, "LOGLEAF_SYNC_TIMEOUT_SECS", 600, 1, 86_400)?;

        let bind_addr = value_or_default(&lookup, "LOGLEAF_BIND_ADDR", DEFAULT_BIND_ADDR);

        Ok(Self {
            db_path,
            replica,
            qiita,
            qiita_api_base_url,
            sync_list_limit: usize::try_from(sync_list_limit).map_err(|_| {
                ConfigError::Invalid("LOGLEAF_SYNC_LIST_LIMIT is out of range".to_string())
            })?,
            sync_pace: Duration::from_millis(sync_pace_ms),
            sync_timeout: Duration::from_secs(sync_timeout_secs),
            bind_addr,
        })
    }

    /// Point the config at a different local database file
    #[must_use]
    pub fn with_db_path(mut self, db_path: impl Into<PathBuf>) -> Self {
        self.db_path = db_path.into();
        self
    }

    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            list_limit: self.sync_list_limit,
            pace: self.sync_pace,
            ..SyncSettings::default()
        }
    }

    /// Credentials, or an error naming the first missing variable
    pub fn require_qiita(&self) -> Result<&QiitaCredentials, ConfigError> {
        self.qiita
            .as_ref()
            .ok_or(ConfigError::MissingVar("QIITA_TOKEN"))
    }

    pub fn qiita_client(&self) -> crate::Result<QiitaClient> {
        let credentials = self.require_qiita()?;
        Ok(QiitaClient::new(
            self.qiita_api_base_url.as_str(),
            credentials.user.as_str(),
            credentials.token.as_str(),
        )?)
    }

    /// Open the local database, as an embedded replica when Turso is set.
    pub async fn open_database(&self) -> StoreResult<Database> {
        match &self.replica {
            Some(replica) => {
                tracing::info!("Opening database as Turso embedded replica");
                Database::open_with_replica(&self.db_path, replica.clone()).await
            }
            None => Database::open(&self.db_path).await,
        }
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("logleaf")
        .join("logleaf.db")
}

fn bounded(
    lookup: impl Fn(&str) -> Option<String>,
    name: &str,
    default: u64,
    min: u64,
    max: u64,
) -> Result<u64, ConfigError> {
    let value = match optional_trimmed(lookup, name) {
        Some(raw) => raw.parse::<u64>().map_err(|_| {
            ConfigError::Invalid(format!("{name} must be an integer in [{min}, {max}]"))
        })?,
        None => default,
    };
    if !(min..=max).contains(&value) {
        return Err(ConfigError::Invalid(format!(
            "{name} must be in [{min}, {max}]"
        )));
    }
    Ok(value)
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    normalize_text_option(lookup(name))
}
