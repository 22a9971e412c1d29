// PostgreSQL Catalog Implementation

use crate::connection::{DatabaseSession, PgConnector};
use crate::error::map_sqlx_error;
use async_trait::async_trait;
use pgkeeper_core::domain::TableRef;
use pgkeeper_core::error::{AppError, Result};
use pgkeeper_core::port::{AgedTable, Catalog};
use tracing::debug;

/// Databases never maintained, besides templates and `datallowconn = false`
pub const DEFAULT_EXCLUDED_DATABASES: &[&str] = &["azure_maintenance"];

const LIST_DATABASES: &str = r#"
    SELECT datname::text
    FROM pg_database
    WHERE datallowconn
      AND NOT datistemplate
      AND datname <> ALL($1)
    ORDER BY datname
"#;

const LIST_USER_TABLES: &str = r#"
    SELECT quote_ident(schemaname), quote_ident(relname)
    FROM pg_stat_user_tables
    ORDER BY schemaname, relname
"#;

// Ordinary tables and their TOAST tables, oldest frozen horizon first
const LIST_TABLES_BY_AGE: &str = r#"
    SELECT quote_ident(n.nspname), quote_ident(c.relname), age(c.relfrozenxid)::bigint
    FROM pg_class c
    JOIN pg_namespace n ON n.oid = c.relnamespace
    WHERE c.relkind IN ('r', 't')
    ORDER BY 3 DESC
"#;

const MAX_DATABASE_AGE: &str = "SELECT max(age(datfrozenxid))::bigint FROM pg_database";

pub struct PgCatalog {
    connector: PgConnector,
    excluded: Vec<String>,
}

impl PgCatalog {
    pub fn new(connector: PgConnector, excluded: Vec<String>) -> Self {
        Self {
            connector,
            excluded,
        }
    }

    /// Catalog skipping only `DEFAULT_EXCLUDED_DATABASES`
    pub fn with_default_exclusions(connector: PgConnector) -> Self {
        let excluded = DEFAULT_EXCLUDED_DATABASES
            .iter()
            .map(|s| s.to_string())
            .collect();
        Self::new(connector, excluded)
    }
}

async fn query_databases(session: &mut DatabaseSession, excluded: &[String]) -> Result<Vec<String>> {
    let conn = session.connection().await?;
    sqlx::query_scalar(LIST_DATABASES)
        .bind(excluded)
        .fetch_all(conn)
        .await
        .map_err(map_sqlx_error)
}

async fn query_user_tables(session: &mut DatabaseSession) -> Result<Vec<(String, String)>> {
    let conn = session.connection().await?;
    sqlx::query_as(LIST_USER_TABLES)
        .fetch_all(conn)
        .await
        .map_err(map_sqlx_error)
}

async fn query_tables_by_age(session: &mut DatabaseSession) -> Result<Vec<(String, String, i64)>> {
    let conn = session.connection().await?;
    sqlx::query_as(LIST_TABLES_BY_AGE)
        .fetch_all(conn)
        .await
        .map_err(map_sqlx_error)
}

async fn query_max_age(session: &mut DatabaseSession) -> Result<Option<i64>> {
    let conn = session.connection().await?;
    sqlx::query_scalar(MAX_DATABASE_AGE)
        .fetch_one(conn)
        .await
        .map_err(map_sqlx_error)
}

// Every method opens its own session and closes it before returning,
// whatever the query outcome.
#[async_trait]
impl Catalog for PgCatalog {
    async fn list_databases(&self) -> Result<Vec<String>> {
        let mut session = self.connector.open_maintenance();
        let databases = query_databases(&mut session, &self.excluded).await;
        session.close_quietly().await;
        let databases = databases?;

        debug!(databases = ?databases, "Listed databases");
        Ok(databases)
    }

    async fn list_user_tables(&self, database: &str) -> Result<Vec<TableRef>> {
        let mut session = self.connector.open(database);
        let rows = query_user_tables(&mut session).await;
        session.close_quietly().await;

        Ok(rows?
            .into_iter()
            .map(|(schema, name)| TableRef::new(schema, name))
            .collect())
    }

    async fn list_tables_by_age(&self, database: &str) -> Result<Vec<AgedTable>> {
        let mut session = self.connector.open(database);
        let rows = query_tables_by_age(&mut session).await;
        session.close_quietly().await;

        Ok(rows?
            .into_iter()
            .map(|(schema, name, age)| AgedTable {
                table: TableRef::new(schema, name),
                age,
            })
            .collect())
    }

    async fn max_database_age(&self) -> Result<i64> {
        let mut session = self.connector.open_maintenance();
        let age = query_max_age(&mut session).await;
        session.close_quietly().await;

        age?.ok_or_else(|| AppError::Catalog("pg_database returned no age".to_string()))
    }
}
