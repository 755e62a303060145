//! Persistence for networks, their hosts and the applied route setups.

use thiserror::Error;

mod network;
mod network_host;
mod network_host_setup;

pub use network::NetworkRepository;
pub use network_host::NetworkHostRepository;
pub use network_host_setup::{DELETE_CHUNK_SIZE, INSERT_CHUNK_SIZE, NetworkHostSetupRepository};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Record not found")]
    NotFound,
    #[error("Record already exists")]
    AlreadyExists,
    #[error("Invalid host address: {0}")]
    InvalidAddress(String),
    #[error("{op} failed: {source}")]
    Batch {
        op: &'static str,
        #[source]
        source: sqlx::Error,
    },
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Maps constraint violations of single-row writes to the CRUD sentinels.
fn write_error(e: sqlx::Error) -> Error {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => Error::AlreadyExists,
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => Error::NotFound,
        _ => Error::Database(e),
    }
}
