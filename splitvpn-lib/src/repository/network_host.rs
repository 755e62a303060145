use time::OffsetDateTime;

use std::net::Ipv4Addr;

use super::{Error, write_error};
use crate::models::NetworkHost;
use crate::storage::Storage;

#[derive(Clone, Debug)]
pub struct NetworkHostRepository {
    storage: Storage,
}

impl NetworkHostRepository {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Adds a host to a network.
    ///
    /// The address must be an IPv4 address since it ends up as the
    /// destination of an additional route. Fails with [`Error::NotFound`] for
    /// an unknown network and [`Error::AlreadyExists`] when the network
    /// already holds that address.
    pub async fn create(&self, network_id: i64, address: &str, description: Option<&str>) -> Result<NetworkHost, Error> {
        let address = address.trim();
        address
            .parse::<Ipv4Addr>()
            .map_err(|_| Error::InvalidAddress(address.to_string()))?;

        let id = sqlx::query(
            r#"
            INSERT INTO network_hosts (network_id, address, description, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(network_id)
        .bind(address)
        .bind(description)
        .bind(OffsetDateTime::now_utc())
        .execute(self.storage.pool())
        .await
        .map_err(write_error)?
        .last_insert_rowid();

        self.get(id).await
    }

    pub async fn get(&self, id: i64) -> Result<NetworkHost, Error> {
        sqlx::query_as("SELECT id, network_id, address, description, created_at FROM network_hosts WHERE id = $1")
            .bind(id)
            .fetch_optional(self.storage.pool())
            .await?
            .ok_or(Error::NotFound)
    }

    pub async fn list(&self, network_id: i64) -> Result<Vec<NetworkHost>, Error> {
        let hosts = sqlx::query_as(
            r#"
            SELECT id, network_id, address, description, created_at
            FROM network_hosts
            WHERE network_id = $1
            ORDER BY id
            "#,
        )
        .bind(network_id)
        .fetch_all(self.storage.pool())
        .await?;
        Ok(hosts)
    }

    pub async fn list_ids(&self, network_id: i64) -> Result<Vec<i64>, Error> {
        let ids: Vec<(i64,)> = sqlx::query_as("SELECT id FROM network_hosts WHERE network_id = $1 ORDER BY id")
            .bind(network_id)
            .fetch_all(self.storage.pool())
            .await?;
        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    pub async fn delete(&self, id: i64) -> Result<(), Error> {
        let result = sqlx::query("DELETE FROM network_hosts WHERE id = $1")
            .bind(id)
            .execute(self.storage.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }
}
