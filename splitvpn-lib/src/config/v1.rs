use serde::Deserialize;

use std::path::PathBuf;

use crate::config::{self, DEFAULT_MAX_CONNECTIONS};

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Config {
    pub version: u8,
    database: Option<Database>,
    log: Option<Log>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
struct Database {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
struct Log {
    file: Option<PathBuf>,
}

pub fn wrong_keys(table: &toml::Table) -> Vec<String> {
    let mut wrong_keys = Vec::new();
    for (key, value) in table.iter() {
        // version plain key
        if key == "version" {
            continue;
        }
        if key == "database" {
            if let Some(database) = value.as_table() {
                for (k, _v) in database.iter() {
                    if k == "url" || k == "max_connections" {
                        continue;
                    }
                    wrong_keys.push(format!("database.{k}"));
                }
            }
            continue;
        }
        if key == "log" {
            if let Some(log) = value.as_table() {
                for (k, _v) in log.iter() {
                    if k == "file" {
                        continue;
                    }
                    wrong_keys.push(format!("log.{k}"));
                }
            }
            continue;
        }
        wrong_keys.push(key.clone());
    }
    wrong_keys
}

impl TryFrom<Config> for config::Config {
    type Error = config::Error;

    fn try_from(value: Config) -> Result<Self, Self::Error> {
        let database = value.database.unwrap_or(Database {
            url: None,
            max_connections: None,
        });
        let url = match database.url {
            Some(url) => url,
            None => config::Database::default_url()?,
        };
        let max_connections = database.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS);
        if max_connections == 0 {
            return Err(config::Error::InvalidMaxConnections(max_connections));
        }

        Ok(config::Config {
            database: config::Database { url, max_connections },
            log_file: value.log.and_then(|l| l.file),
        })
    }
}
