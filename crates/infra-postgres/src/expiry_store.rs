// PostgreSQL Row-expiry Store Implementation

use crate::connection::{DatabaseSession, PgConnector};
use crate::error::map_sqlx_error;
use async_trait::async_trait;
use pgkeeper_core::domain::TtlTable;
use pgkeeper_core::error::Result;
use pgkeeper_core::port::ExpiryStore;

const LIST_TTL_TABLES: &str = r#"
    SELECT database_name, schema_name, table_name, col_name, expiry_in_sec::bigint
    FROM pg_ttl_tables
"#;

/// Quote an identifier the way `quote_ident` would for a non-keyword
///
/// Always quotes, so mixed case and reserved words survive.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// `DELETE` removing rows whose timestamp column is older than the expiry
pub fn expiry_delete_sql(table: &TtlTable) -> String {
    format!(
        "DELETE FROM {}.{} WHERE (EXTRACT(EPOCH FROM current_timestamp) - EXTRACT(EPOCH FROM {})) > {}",
        quote_ident(&table.schema),
        quote_ident(&table.table),
        quote_ident(&table.column),
        table.expiry_secs
    )
}

/// Registry on the maintenance database, deletes in each table's own database
pub struct PgExpiryStore {
    connector: PgConnector,
}

impl PgExpiryStore {
    pub fn new(connector: PgConnector) -> Self {
        Self { connector }
    }
}

type TtlRow = (String, String, String, String, i64);

async fn list(session: &mut DatabaseSession) -> Result<Vec<TtlRow>> {
    let conn = session.connection().await?;
    sqlx::query_as(LIST_TTL_TABLES)
        .fetch_all(conn)
        .await
        .map_err(map_sqlx_error)
}

async fn delete(session: &mut DatabaseSession, sql: &str) -> Result<u64> {
    let conn = session.connection().await?;
    let result = sqlx::Executor::execute(conn, sqlx::raw_sql(sql))
        .await
        .map_err(map_sqlx_error)?;
    Ok(result.rows_affected())
}

#[async_trait]
impl ExpiryStore for PgExpiryStore {
    async fn list_ttl_tables(&self) -> Result<Vec<TtlTable>> {
        let mut session = self.connector.open_maintenance();
        let rows = list(&mut session).await;
        session.close_quietly().await;

        Ok(rows?
            .into_iter()
            .map(|(database, schema, table, column, expiry_secs)| TtlTable {
                database,
                schema,
                table,
                column,
                expiry_secs,
            })
            .collect())
    }

    async fn delete_expired(&self, table: &TtlTable) -> Result<u64> {
        let sql = expiry_delete_sql(table);
        let mut session = self.connector.open(&table.database);
        let deleted = delete(&mut session, &sql).await;
        session.close_quietly().await;
        deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("events"), "\"events\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_delete_sql() {
        let table = TtlTable {
            database: "app".to_string(),
            schema: "public".to_string(),
            table: "Sessions".to_string(),
            column: "created_at".to_string(),
            expiry_secs: 86400,
        };
        assert_eq!(
            expiry_delete_sql(&table),
            "DELETE FROM \"public\".\"Sessions\" WHERE (EXTRACT(EPOCH FROM current_timestamp) - EXTRACT(EPOCH FROM \"created_at\")) > 86400"
        );
    }
}
