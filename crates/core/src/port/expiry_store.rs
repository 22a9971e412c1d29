// Row-expiry Store Port (Interface)

use crate::domain::TtlTable;
use crate::error::Result;
use async_trait::async_trait;

/// Storage side of the row-expiry sweeper
#[async_trait]
pub trait ExpiryStore: Send + Sync {
    /// Tables registered in `pg_ttl_tables`
    async fn list_ttl_tables(&self) -> Result<Vec<TtlTable>>;

    /// Delete expired rows of one table, in that table's database
    ///
    /// # Returns
    /// Number of rows deleted
    async fn delete_expired(&self, table: &TtlTable) -> Result<u64>;
}

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    /// In-memory expiry store returning canned row counts
    #[derive(Default)]
    pub struct InMemoryExpiryStore {
        tables: Vec<TtlTable>,
        expired_rows: HashMap<String, u64>,
        failing: HashSet<String>,
        fail_listing: bool,
        deletes: Mutex<Vec<String>>,
    }

    impl InMemoryExpiryStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_table(mut self, table: TtlTable, expired_rows: u64) -> Self {
            self.expired_rows.insert(table.to_string(), expired_rows);
            self.tables.push(table);
            self
        }

        pub fn with_failing_table(mut self, table: TtlTable) -> Self {
            self.failing.insert(table.to_string());
            self.tables.push(table);
            self
        }

        pub fn with_failing_listing(mut self) -> Self {
            self.fail_listing = true;
            self
        }

        /// Tables a delete was issued against
        pub fn deletes(&self) -> Vec<String> {
            self.deletes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ExpiryStore for InMemoryExpiryStore {
        async fn list_ttl_tables(&self) -> Result<Vec<TtlTable>> {
            if self.fail_listing {
                return Err(AppError::Database(
                    "relation \"pg_ttl_tables\" does not exist".to_string(),
                ));
            }
            Ok(self.tables.clone())
        }

        async fn delete_expired(&self, table: &TtlTable) -> Result<u64> {
            let key = table.to_string();
            self.deletes.lock().unwrap().push(key.clone());
            if self.failing.contains(&key) {
                return Err(AppError::Database(format!("permission denied for {}", key)));
            }
            Ok(self.expired_rows.get(&key).copied().unwrap_or(0))
        }
    }
}
