use serde::Serialize;
use time::OffsetDateTime;

use super::{NetworkHost, Table};
use crate::networksetup::NetworkInfo;

/// An applied additional route: one host paired with the local subnet facts
/// that were current when it was pushed to the OS.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct NetworkHostSetup {
    pub network_host_id: i64,
    pub network_host_ip: String,
    pub subnet_mask: String,
    pub router: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl NetworkHostSetup {
    pub fn new(host: &NetworkHost, info: &NetworkInfo, created_at: OffsetDateTime) -> Self {
        Self {
            network_host_id: host.id,
            network_host_ip: host.address.clone(),
            subnet_mask: info.subnet_mask.clone(),
            router: info.router.clone(),
            created_at,
        }
    }
}

#[derive(Clone)]
pub struct NetworkHostSetupTable;

impl Table for NetworkHostSetupTable {
    fn name(&self) -> &'static str {
        "network_host_setups"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS network_host_setups (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                network_host_id INTEGER NOT NULL,
                network_host_ip TEXT NOT NULL,
                subnet_mask TEXT NOT NULL,
                router TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_network_host_setups_host
                ON network_host_setups (network_host_id);
            "#,
        )
    }
}
