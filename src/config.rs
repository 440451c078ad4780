use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, StoreError};

pub const ENV_DATABASE: &str = "ACCOUNT_STORE_DB";
pub const ENV_BUSY_TIMEOUT_MS: &str = "ACCOUNT_STORE_BUSY_TIMEOUT_MS";
pub const ENV_LOG_LEVEL: &str = "ACCOUNT_STORE_LOG";

/// Special database path for a private in-memory database
pub const IN_MEMORY: &str = ":memory:";

/// Connection settings for the account store, supplied once at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database file (or `:memory:`)
    pub database: PathBuf,

    /// How long a statement waits on a locked database before failing
    pub busy_timeout_ms: u64,

    /// Write-ahead logging for file databases
    pub wal: bool,

    /// Upper bound on pooled connections
    pub max_connections: u32,

    /// Connections the pool keeps open while idle
    pub min_idle: u32,

    /// Pooled connections are recycled after this many seconds (0 = never)
    pub max_lifetime_secs: u64,

    pub log_level: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("accounts.db"),
            busy_timeout_ms: 5_000,
            wal: true,
            max_connections: 10,
            min_idle: 5,
            max_lifetime_secs: 300,
            log_level: "info".to_string(),
        }
    }
}

impl StoreConfig {
    /// Config for a database file with every other setting defaulted
    pub fn for_path(database: impl Into<PathBuf>) -> Self {
        Self {
            database: database.into(),
            ..Self::default()
        }
    }

    /// Load from an optional TOML file, then apply env overrides
    pub fn load(provided: Option<&Path>) -> Result<Self> {
        let mut config = match provided {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        config.apply_env_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let origin = path.display().to_string();
        let data = fs::read_to_string(path).map_err(|e| StoreError::config(&origin, e))?;
        Self::from_toml(&data).map_err(|e| match e {
            StoreError::Config { message, .. } => StoreError::Config { origin, message },
            other => other,
        })
    }

    pub fn from_toml(data: &str) -> Result<Self> {
        toml::from_str(data).map_err(|e| StoreError::config("TOML", e))
    }

    /// Env lookups are injected so tests don't touch process state
    fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(database) = lookup(ENV_DATABASE) {
            self.database = PathBuf::from(database);
        }

        if let Some(raw) = lookup(ENV_BUSY_TIMEOUT_MS) {
            self.busy_timeout_ms = raw
                .trim()
                .parse()
                .map_err(|e| StoreError::config(ENV_BUSY_TIMEOUT_MS, format!("{e} ({raw:?})")))?;
        }

        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = level;
        }

        Ok(())
    }

    /// Pool sizing has to make sense before a pool is built from it
    pub fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(StoreError::config("max_connections", "must be at least 1"));
        }
        if self.min_idle > self.max_connections {
            return Err(StoreError::config(
                "min_idle",
                format!("{} exceeds max_connections {}", self.min_idle, self.max_connections),
            ));
        }
        Ok(())
    }

    pub fn max_lifetime(&self) -> Option<Duration> {
        (self.max_lifetime_secs > 0).then(|| Duration::from_secs(self.max_lifetime_secs))
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn is_in_memory(&self) -> bool {
        self.database.as_os_str() == IN_MEMORY
    }
}
