use serde::Serialize;
use time::OffsetDateTime;

use super::Table;

/// A VPN whose name matches a VPN service configured in the OS.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Network {
    pub id: i64,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Clone)]
pub struct NetworkTable;

impl Table for NetworkTable {
    fn name(&self) -> &'static str {
        "networks"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS networks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                created_at TIMESTAMP NOT NULL
            );
            "#,
        )
    }
}
