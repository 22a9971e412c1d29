// Queue Builder - turns catalog rows into the work queue for one mode

use crate::domain::{Mode, TableQueue, TableTask};
use crate::error::{AppError, Result};
use crate::port::Catalog;
use std::sync::Arc;
use tracing::{debug, info};

/// Flat priority for configuration modes
const CONFIGURE_PRIORITY: i64 = 1;

pub struct QueueBuilder {
    catalog: Arc<dyn Catalog>,
}

impl QueueBuilder {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self { catalog }
    }

    /// Enumerate every maintained database and build the queue for `mode`
    pub async fn build(&self, mode: Mode) -> Result<TableQueue> {
        let databases = self
            .catalog
            .list_databases()
            .await
            .map_err(|e| AppError::catalog("listing databases failed", e))?;
        self.build_for(mode, &databases).await
    }

    /// Build the queue for `mode` across the given databases
    ///
    /// RUN_VACUUM tasks carry their transaction age and the whole set is
    /// ordered oldest first across databases. Configuration modes use a
    /// flat priority and keep catalog order.
    pub async fn build_for(&self, mode: Mode, databases: &[String]) -> Result<TableQueue> {
        let mut tasks = Vec::new();

        for database in databases {
            let before = tasks.len();
            if mode.orders_by_age() {
                let tables = self
                    .catalog
                    .list_tables_by_age(database)
                    .await
                    .map_err(|e| AppError::catalog(&format!("listing tables of {}", database), e))?;
                tasks.extend(
                    tables
                        .into_iter()
                        .map(|t| TableTask::new(database.as_str(), t.table, t.age)),
                );
            } else {
                let tables = self
                    .catalog
                    .list_user_tables(database)
                    .await
                    .map_err(|e| AppError::catalog(&format!("listing tables of {}", database), e))?;
                tasks.extend(
                    tables
                        .into_iter()
                        .map(|t| TableTask::new(database.as_str(), t, CONFIGURE_PRIORITY)),
                );
            }
            debug!(database = %database, tables = tasks.len() - before, "Enumerated tables");
        }

        info!(
            mode = %mode,
            databases = databases.len(),
            tables = tasks.len(),
            "Built table queue"
        );

        Ok(TableQueue::by_priority(tasks))
    }
}
