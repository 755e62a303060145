use sqlx::{QueryBuilder, Sqlite};

use super::Error;
use crate::batch;
use crate::models::NetworkHostSetup;
use crate::storage::Storage;

/// Rows per insert statement (five bound parameters each).
///
/// Both chunk sizes exceed SQLite's default limit of 32,766 variables; the
/// bundled library is built with `SQLITE_MAX_VARIABLE_NUMBER` raised in
/// `.cargo/config.toml`.
pub const INSERT_CHUNK_SIZE: usize = 10_000;
/// Host ids per delete statement.
pub const DELETE_CHUNK_SIZE: usize = 50_000;

/// Applied route setups.
///
/// Rows are only ever created and deleted in bulk. Bulk statements are split
/// into chunks that run sequentially outside a shared transaction: on failure
/// the chunks before the failing one stay committed.
#[derive(Clone, Debug)]
pub struct NetworkHostSetupRepository {
    storage: Storage,
}

impl NetworkHostSetupRepository {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub async fn add_batch(&self, setups: &[NetworkHostSetup]) -> Result<(), Error> {
        let chunks = batch::in_chunks(setups, INSERT_CHUNK_SIZE, async |chunk: &[NetworkHostSetup]| {
            let mut builder = QueryBuilder::<Sqlite>::new(
                "INSERT INTO network_host_setups (network_host_id, network_host_ip, subnet_mask, router, created_at) ",
            );
            builder.push_values(chunk, |mut row, setup| {
                row.push_bind(setup.network_host_id)
                    .push_bind(setup.network_host_ip.clone())
                    .push_bind(setup.subnet_mask.clone())
                    .push_bind(setup.router.clone())
                    .push_bind(setup.created_at);
            });
            builder.build().execute(self.storage.pool()).await.map(|_| ())
        })
        .await
        .map_err(|source| Error::Batch {
            op: "add network host setups",
            source,
        })?;

        tracing::debug!(rows = setups.len(), chunks, "network host setups added");
        Ok(())
    }

    pub async fn delete_batch_by_network_host_ids(&self, ids: &[i64]) -> Result<(), Error> {
        let mut deleted = 0;
        let chunks = batch::in_chunks(ids, DELETE_CHUNK_SIZE, async |chunk: &[i64]| {
            let mut builder = QueryBuilder::<Sqlite>::new("DELETE FROM network_host_setups WHERE network_host_id IN (");
            push_ids(&mut builder, chunk);
            let result = builder.build().execute(self.storage.pool()).await?;
            deleted += result.rows_affected();
            Ok::<(), sqlx::Error>(())
        })
        .await
        .map_err(|source| Error::Batch {
            op: "delete network host setups",
            source,
        })?;

        tracing::debug!(ids = ids.len(), deleted, chunks, "network host setups deleted");
        Ok(())
    }

    pub async fn list_by_network_host_ids(&self, ids: &[i64]) -> Result<Vec<NetworkHostSetup>, Error> {
        let mut setups = Vec::new();
        batch::in_chunks(ids, DELETE_CHUNK_SIZE, async |chunk: &[i64]| {
            let mut builder = QueryBuilder::<Sqlite>::new(
                r#"
                SELECT network_host_id, network_host_ip, subnet_mask, router, created_at
                FROM network_host_setups
                WHERE network_host_id IN ("#,
            );
            push_ids(&mut builder, chunk);
            builder.push(" ORDER BY id");
            let rows: Vec<NetworkHostSetup> = builder.build_query_as().fetch_all(self.storage.pool()).await?;
            setups.extend(rows);
            Ok::<(), sqlx::Error>(())
        })
        .await
        .map_err(|source| Error::Batch {
            op: "list network host setups",
            source,
        })?;
        Ok(setups)
    }

    pub async fn count(&self) -> Result<i64, Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM network_host_setups")
            .fetch_one(self.storage.pool())
            .await?;
        Ok(count)
    }
}

// Appends `id, id, ...)` closing the `IN (` list opened by the caller.
fn push_ids(builder: &mut QueryBuilder<'_, Sqlite>, ids: &[i64]) {
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;

    async fn repository() -> anyhow::Result<NetworkHostSetupRepository> {
        Ok(NetworkHostSetupRepository::new(Storage::in_memory().await?))
    }

    fn setups(count: usize) -> Vec<NetworkHostSetup> {
        let created_at = OffsetDateTime::UNIX_EPOCH + time::Duration::days(19_700);
        (0..count)
            .map(|i| NetworkHostSetup {
                network_host_id: i as i64 + 1,
                network_host_ip: format!("10.{}.{}.{}", i / 65_536, (i / 256) % 256, i % 256),
                subnet_mask: "255.255.255.0".into(),
                router: "192.168.1.1".into(),
                created_at,
            })
            .collect()
    }

    #[tokio::test]
    async fn add_batch_of_exactly_one_chunk() -> anyhow::Result<()> {
        let repo = repository().await?;
        repo.add_batch(&setups(INSERT_CHUNK_SIZE)).await?;
        assert_eq!(repo.count().await?, INSERT_CHUNK_SIZE as i64);
        Ok(())
    }

    #[tokio::test]
    async fn add_batch_spanning_two_chunks_keeps_every_row() -> anyhow::Result<()> {
        let repo = repository().await?;
        repo.add_batch(&setups(INSERT_CHUNK_SIZE + 1)).await?;
        assert_eq!(repo.count().await?, INSERT_CHUNK_SIZE as i64 + 1);
        Ok(())
    }

    #[tokio::test]
    async fn empty_batches_are_noops() -> anyhow::Result<()> {
        let repo = repository().await?;
        repo.add_batch(&setups(3)).await?;

        repo.add_batch(&[]).await?;
        repo.delete_batch_by_network_host_ids(&[]).await?;

        assert_eq!(repo.count().await?, 3);
        Ok(())
    }

    #[tokio::test]
    async fn deletes_only_given_hosts() -> anyhow::Result<()> {
        let repo = repository().await?;
        let rows = setups(5);
        repo.add_batch(&rows).await?;

        repo.delete_batch_by_network_host_ids(&[2, 4, 99]).await?;

        let remaining = repo.list_by_network_host_ids(&[1, 2, 3, 4, 5]).await?;
        assert_eq!(remaining, vec![rows[0].clone(), rows[2].clone(), rows[4].clone()]);
        Ok(())
    }

    #[tokio::test]
    async fn full_chunks_bind_past_default_variable_limit() -> anyhow::Result<()> {
        let repo = repository().await?;
        // 6,554 rows bind 32,770 parameters
        repo.add_batch(&setups(6_554)).await?;
        assert_eq!(repo.count().await?, 6_554);

        let ids: Vec<i64> = (1..=DELETE_CHUNK_SIZE as i64).collect();
        repo.delete_batch_by_network_host_ids(&ids).await?;
        assert_eq!(repo.count().await?, 0);

        repo.delete_batch_by_network_host_ids(&ids).await?;
        assert!(repo.list_by_network_host_ids(&ids).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn deletes_across_chunk_boundary() -> anyhow::Result<()> {
        let repo = repository().await?;
        repo.add_batch(&setups(INSERT_CHUNK_SIZE + 5)).await?;

        let mut ids: Vec<i64> = (1..=DELETE_CHUNK_SIZE as i64 + 10).collect();
        ids.reverse();
        repo.delete_batch_by_network_host_ids(&ids).await?;

        assert_eq!(repo.count().await?, 0);
        Ok(())
    }
}
