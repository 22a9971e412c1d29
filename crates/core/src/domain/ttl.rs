// Row-expiry (TTL) Table Domain Model

use serde::{Deserialize, Serialize};

/// A table swept by the row-expiry sweeper (one row of `pg_ttl_tables`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtlTable {
    pub database: String,
    pub schema: String,
    pub table: String,
    /// Timestamp column compared against the current time
    pub column: String,
    pub expiry_secs: i64,
}

impl std::fmt::Display for TtlTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.database, self.schema, self.table)
    }
}
