// PostgreSQL Table Maintainer Implementation
//
// The hosted cluster does not allow server-level autovacuum tuning, so the
// posture is enforced with per-table storage parameters and manual VACUUM.

use crate::connection::{DatabaseSession, PgConnector};
use crate::error::map_sqlx_error;
use async_trait::async_trait;
use pgkeeper_core::application::worker::constants::{
    CONFIGURE_LOCK_TIMEOUT, VACUUM_LOCK_TIMEOUT,
};
use pgkeeper_core::domain::{Mode, Settings, TableOverrides, TableTask};
use pgkeeper_core::error::{AppError, Result};
use pgkeeper_core::port::TableMaintainer;
use tracing::debug;

/// Statements issued for one table, in order
///
/// Every statement runs on its own, outside a transaction block
/// (`VACUUM` refuses to run inside one).
pub fn maintenance_statements(task: &TableTask, mode: Mode, settings: &Settings) -> Vec<String> {
    let table = task.table.qualified();
    match mode {
        Mode::RunVacuum => vec![
            format!("SET lock_timeout = '{}ms'", VACUUM_LOCK_TIMEOUT.as_millis()),
            format!(
                "SET maintenance_work_mem = '{}MB'",
                settings.maintenance_work_mem_mb.max(1)
            ),
            format!("VACUUM {}", table),
        ],
        Mode::ConfigureAggressive => vec![
            format!("SET lock_timeout = '{}ms'", CONFIGURE_LOCK_TIMEOUT.as_millis()),
            format!(
                "ALTER TABLE {} SET ({})",
                table,
                TableOverrides::aggressive(settings).to_storage_params()
            ),
        ],
        Mode::ResetDefault => vec![
            format!("SET lock_timeout = '{}ms'", CONFIGURE_LOCK_TIMEOUT.as_millis()),
            format!(
                "ALTER TABLE {} SET ({})",
                table,
                TableOverrides::DEFAULT.to_storage_params()
            ),
        ],
    }
}

pub struct PgTableMaintainer {
    connector: PgConnector,
}

impl PgTableMaintainer {
    pub fn new(connector: PgConnector) -> Self {
        Self { connector }
    }
}

async fn execute_all(session: &mut DatabaseSession, statements: &[String]) -> Result<()> {
    let database = session.database().to_string();
    let conn = session.connection().await?;
    for statement in statements {
        debug!(database = %database, statement = %statement, "Executing");
        sqlx::Executor::execute(&mut *conn, sqlx::raw_sql(statement))
            .await
            .map_err(map_sqlx_error)?;
    }
    Ok(())
}

#[async_trait]
impl TableMaintainer for PgTableMaintainer {
    async fn apply(&self, task: &TableTask, mode: Mode, settings: &Settings) -> Result<()> {
        let statements = maintenance_statements(task, mode, settings);

        // Connection is scoped to the table's own database and closed on every path
        let mut session = self.connector.open(&task.database);
        let result = execute_all(&mut session, &statements).await;
        session.close_quietly().await;

        result.map_err(|e| AppError::Execution {
            table: format!("{}/{}", task.database, task.table),
            reason: e.to_string(),
        })
    }
}
