use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Error, SqlitePool};

use std::str::FromStr;

use crate::config::Database;
use crate::models;

#[derive(Clone, Debug)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub async fn new(database: &Database) -> Result<Self, Error> {
        let options = SqliteConnectOptions::from_str(&database.url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = if database.is_memory() {
            // every connection would open its own empty in-memory database
            SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(database.max_connections)
                .connect_with(options)
                .await?
        };

        Self::create_schema(&pool).await?;
        tracing::debug!(url = %database.url, "storage ready");

        Ok(Self { pool })
    }

    pub async fn in_memory() -> Result<Self, Error> {
        Self::new(&Database::in_memory()).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn create_schema(pool: &SqlitePool) -> Result<(), Error> {
        for table in models::schema() {
            sqlx::query(&table.create()).execute(pool).await?;
            tracing::trace!(table = table.name(), "table ensured");
        }
        Ok(())
    }
}
