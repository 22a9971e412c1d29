// Catalog Port (Interface)

use crate::domain::TableRef;
use crate::error::Result;
use async_trait::async_trait;

/// A relation together with the age of its frozen transaction horizon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgedTable {
    pub table: TableRef,
    pub age: i64,
}

/// Read access to the cluster catalog
///
/// Every method is a single query; failures are fatal to the cycle that
/// asked, so implementations must not substitute defaults.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Databases to maintain (templates and excluded databases filtered out)
    async fn list_databases(&self) -> Result<Vec<String>>;

    /// User tables of one database
    async fn list_user_tables(&self, database: &str) -> Result<Vec<TableRef>>;

    /// Ordinary and TOAST relations of one database with their transaction age,
    /// oldest first
    async fn list_tables_by_age(&self, database: &str) -> Result<Vec<AgedTable>>;

    /// Oldest `datfrozenxid` age across every database in the cluster
    async fn max_database_age(&self) -> Result<i64>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory catalog with call counters
    #[derive(Default)]
    pub struct InMemoryCatalog {
        user_tables: Mutex<BTreeMap<String, Vec<TableRef>>>,
        aged_tables: Mutex<BTreeMap<String, Vec<AgedTable>>>,
        max_age: Mutex<Option<i64>>,
        fail_listing: Mutex<bool>,
        list_calls: AtomicUsize,
        age_calls: AtomicUsize,
    }

    impl InMemoryCatalog {
        pub fn new() -> Self {
            let catalog = Self::default();
            *catalog.max_age.lock().unwrap() = Some(0);
            catalog
        }

        /// Register a table; it appears in both the user-table and age listings
        pub fn with_table(self, database: &str, schema: &str, name: &str, age: i64) -> Self {
            let table = TableRef::new(schema, name);
            self.user_tables
                .lock()
                .unwrap()
                .entry(database.to_string())
                .or_default()
                .push(table.clone());
            self.aged_tables
                .lock()
                .unwrap()
                .entry(database.to_string())
                .or_default()
                .push(AgedTable { table, age });
            self
        }

        pub fn with_max_age(self, age: i64) -> Self {
            *self.max_age.lock().unwrap() = Some(age);
            self
        }

        /// Make the wraparound query fail
        pub fn with_failing_age_query(self) -> Self {
            *self.max_age.lock().unwrap() = None;
            self
        }

        /// Make database and table listings fail
        pub fn with_failing_listing(self) -> Self {
            *self.fail_listing.lock().unwrap() = true;
            self
        }

        /// Number of listing calls (databases and tables)
        pub fn list_calls(&self) -> usize {
            self.list_calls.load(Ordering::SeqCst)
        }

        pub fn age_calls(&self) -> usize {
            self.age_calls.load(Ordering::SeqCst)
        }

        fn check_listing(&self) -> Result<()> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            if *self.fail_listing.lock().unwrap() {
                return Err(AppError::Database("catalog unavailable".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Catalog for InMemoryCatalog {
        async fn list_databases(&self) -> Result<Vec<String>> {
            self.check_listing()?;
            Ok(self.user_tables.lock().unwrap().keys().cloned().collect())
        }

        async fn list_user_tables(&self, database: &str) -> Result<Vec<TableRef>> {
            self.check_listing()?;
            Ok(self
                .user_tables
                .lock()
                .unwrap()
                .get(database)
                .cloned()
                .unwrap_or_default())
        }

        async fn list_tables_by_age(&self, database: &str) -> Result<Vec<AgedTable>> {
            self.check_listing()?;
            let mut tables = self
                .aged_tables
                .lock()
                .unwrap()
                .get(database)
                .cloned()
                .unwrap_or_default();
            tables.sort_by(|a, b| b.age.cmp(&a.age));
            Ok(tables)
        }

        async fn max_database_age(&self) -> Result<i64> {
            self.age_calls.fetch_add(1, Ordering::SeqCst);
            self.max_age
                .lock()
                .unwrap()
                .ok_or_else(|| AppError::Database("pg_database unreadable".to_string()))
        }
    }
}
