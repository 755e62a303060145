use time::OffsetDateTime;

use super::{Error, write_error};
use crate::models::Network;
use crate::storage::Storage;

#[derive(Clone, Debug)]
pub struct NetworkRepository {
    storage: Storage,
}

impl NetworkRepository {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Fails with [`Error::AlreadyExists`] when the name is taken.
    pub async fn create(&self, name: &str) -> Result<Network, Error> {
        let id = sqlx::query("INSERT INTO networks (name, created_at) VALUES ($1, $2)")
            .bind(name)
            .bind(OffsetDateTime::now_utc())
            .execute(self.storage.pool())
            .await
            .map_err(write_error)?
            .last_insert_rowid();

        self.get(id).await
    }

    pub async fn get(&self, id: i64) -> Result<Network, Error> {
        sqlx::query_as("SELECT id, name, created_at FROM networks WHERE id = $1")
            .bind(id)
            .fetch_optional(self.storage.pool())
            .await?
            .ok_or(Error::NotFound)
    }

    pub async fn list(&self) -> Result<Vec<Network>, Error> {
        let networks = sqlx::query_as("SELECT id, name, created_at FROM networks ORDER BY id")
            .fetch_all(self.storage.pool())
            .await?;
        Ok(networks)
    }

    /// Removes the network and, through the foreign key, its hosts.
    pub async fn delete(&self, id: i64) -> Result<(), Error> {
        let result = sqlx::query("DELETE FROM networks WHERE id = $1")
            .bind(id)
            .execute(self.storage.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }
}
