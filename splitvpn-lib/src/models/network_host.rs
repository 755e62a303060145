use serde::Serialize;
use time::OffsetDateTime;

use super::Table;

/// A destination that should bypass the VPN tunnel of its network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct NetworkHost {
    pub id: i64,
    pub network_id: i64,
    pub address: String,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Clone)]
pub struct NetworkHostTable;

impl Table for NetworkHostTable {
    fn name(&self) -> &'static str {
        "network_hosts"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS network_hosts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                network_id INTEGER NOT NULL,
                address TEXT NOT NULL,
                description TEXT,
                created_at TIMESTAMP NOT NULL,
                UNIQUE (network_id, address),
                FOREIGN KEY (network_id) REFERENCES networks (id) ON DELETE CASCADE
            );
            "#,
        )
    }
}
