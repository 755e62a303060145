use thiserror::Error;

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::dirs;

mod v1;

pub const DEFAULT_FILE: &str = "config.toml";
pub const ENV_VAR: &str = "SPLITVPN_CONFIG_PATH";
pub const DATABASE_FILE: &str = "splitvpn.db";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 4;

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub database: Database,
    pub log_file: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Database {
    /// sqlx connection url, e.g. `sqlite:///path/to/splitvpn.db` or `sqlite::memory:`
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration file not found")]
    NoFile,
    #[error("Unable to determine configuration version")]
    VersionNotFound,
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    #[error("Deserialization error: {0}")]
    TomlDeserialization(#[from] toml::de::Error),
    #[error("Unsupported config version: {0}")]
    VersionMismatch(i64),
    #[error("Invalid max_connections: {0}")]
    InvalidMaxConnections(u32),
    #[error("Project directory error: {0}")]
    Dirs(#[from] dirs::Error),
}

impl Database {
    pub fn in_memory() -> Self {
        Database {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        }
    }

    pub fn is_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }

    fn default_url() -> Result<String, Error> {
        let path = dirs::data_dir(DATABASE_FILE)?;
        Ok(format!("sqlite://{}", path.display()))
    }
}

impl Config {
    pub fn with_defaults() -> Result<Self, Error> {
        Ok(Config {
            database: Database {
                url: Database::default_url()?,
                max_connections: DEFAULT_MAX_CONNECTIONS,
            },
            log_file: None,
        })
    }
}

pub fn default_path() -> Result<PathBuf, Error> {
    dirs::config_dir(DEFAULT_FILE).map_err(Error::from)
}

pub async fn read(path: &Path) -> Result<Config, Error> {
    let content = fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::NoFile
        } else {
            Error::IO(e)
        }
    })?;

    let table = content.parse::<toml::Table>()?;
    let version = table
        .get("version")
        .and_then(|v| v.as_integer())
        .ok_or(Error::VersionNotFound)?;

    match version {
        1 => {
            let res = toml::from_str::<v1::Config>(&content)?;
            let wrong_keys = v1::wrong_keys(&table);
            for key in wrong_keys.iter() {
                tracing::warn!(%key, "ignoring unsupported key in configuration file");
            }
            res.try_into()
        }
        _ => Err(Error::VersionMismatch(version)),
    }
}

/// Like [`read`] but falls back to the defaults when no file exists.
pub async fn read_or_default(path: &Path) -> Result<Config, Error> {
    match read(path).await {
        Err(Error::NoFile) => {
            tracing::debug!(path = %path.display(), "no configuration file, using defaults");
            Config::with_defaults()
        }
        res => res,
    }
}
