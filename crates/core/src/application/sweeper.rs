// Row-expiry Sweeper - deletes expired rows from registered tables

use crate::domain::Settings;
use crate::error::Result;
use crate::port::ExpiryStore;
use std::sync::Arc;
use tracing::{error, info};

/// Totals for one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub tables: usize,
    pub failed: usize,
    pub rows_deleted: u64,
}

pub struct ExpirySweeper {
    store: Arc<dyn ExpiryStore>,
}

impl ExpirySweeper {
    pub fn new(store: Arc<dyn ExpiryStore>) -> Self {
        Self { store }
    }

    /// Sweep every registered table once
    ///
    /// Reading the registry is fatal to the sweep; a failing table is logged
    /// and the remaining tables are still swept.
    pub async fn run(&self, settings: &Settings) -> Result<SweepReport> {
        if !settings.enable_ttl_sweeper {
            info!("TTL sweeper disabled, skipping");
            return Ok(SweepReport::default());
        }

        let tables = self.store.list_ttl_tables().await?;
        info!(tables = tables.len(), "Sweeping expired rows");

        let mut report = SweepReport {
            tables: tables.len(),
            ..SweepReport::default()
        };
        for table in &tables {
            match self.store.delete_expired(table).await {
                Ok(rows) => {
                    info!(
                        database = %table.database,
                        table = %format!("{}.{}", table.schema, table.table),
                        rows_deleted = rows,
                        "Deleted expired rows"
                    );
                    report.rows_deleted += rows;
                }
                Err(e) => {
                    error!(table = %table, error = %e, "Expiry sweep failed for table");
                    report.failed += 1;
                }
            }
        }

        info!(
            tables = report.tables,
            failed = report.failed,
            rows_deleted = report.rows_deleted,
            "Sweep completed"
        );
        Ok(report)
    }
}
