// Schema bootstrap for the configuration tables

use crate::connection::PgConnector;
use crate::error::map_sqlx_error;
use pgkeeper_core::error::Result;
use sqlx::Connection;
use tracing::info;

/// Create `pg_cron_config` and `pg_ttl_tables` on the maintenance database if missing
pub async fn run_migrations(connector: &PgConnector) -> Result<()> {
    info!(
        database = %connector.maintenance_database(),
        "Bootstrapping configuration tables..."
    );

    let mut session = connector.open_maintenance();
    let result = apply_migration(&mut session, include_str!("../migrations/001_bootstrap.sql")).await;
    session.close_quietly().await;
    result?;

    info!("Configuration tables ready");
    Ok(())
}

/// Apply a single migration SQL file inside one transaction
async fn apply_migration(session: &mut crate::DatabaseSession, sql: &str) -> Result<()> {
    let conn = session.connection().await?;
    let mut tx = conn.begin().await.map_err(map_sqlx_error)?;

    for statement in split_statements(sql) {
        sqlx::query(&statement)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
    }

    tx.commit().await.map_err(map_sqlx_error)?;
    Ok(())
}

/// Split on `;`, dropping comment lines and empty statements
fn split_statements(sql: &str) -> Vec<String> {
    sql.split(';')
        .map(|statement| {
            statement
                .lines()
                .filter(|line| !line.trim().starts_with("--"))
                .collect::<Vec<_>>()
                .join("\n")
                .trim()
                .to_string()
        })
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_has_both_tables() {
        let statements = split_statements(include_str!("../migrations/001_bootstrap.sql"));
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS pg_cron_config"));
        assert!(statements[1].starts_with("CREATE TABLE IF NOT EXISTS pg_ttl_tables"));
    }
}
