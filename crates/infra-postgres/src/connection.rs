// PostgreSQL Connection Provider
//
// One physical connection per session, keyed by database name. Pools are
// deliberately not used: a pooled connection cannot span databases and the
// advisory lock must stay on the session that took it.

use crate::error::map_sqlx_error;
use pgkeeper_core::error::{AppError, Result};
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;
use std::str::FromStr;
use tracing::debug;

/// Database the connector falls back to for cluster-wide queries
const DEFAULT_MAINTENANCE_DATABASE: &str = "postgres";

/// Hands out sessions to any database of one cluster
#[derive(Debug, Clone)]
pub struct PgConnector {
    options: PgConnectOptions,
    maintenance_database: String,
}

impl PgConnector {
    /// Build a connector from a `postgres://` URL
    ///
    /// The database named in the URL (default `postgres`) is used for
    /// cluster-wide queries and the settings table. The advisory lock always
    /// lives on `LOCK_DATABASE`.
    pub fn from_url(database_url: &str) -> Result<Self> {
        let options = PgConnectOptions::from_str(database_url)
            .map_err(|e| AppError::Config(format!("Invalid database URL: {}", e)))?
            .application_name("pgkeeper");

        let maintenance_database = options
            .get_database()
            .unwrap_or(DEFAULT_MAINTENANCE_DATABASE)
            .to_string();

        Ok(Self {
            options,
            maintenance_database,
        })
    }

    pub fn maintenance_database(&self) -> &str {
        &self.maintenance_database
    }

    /// Session on the maintenance database
    pub fn open_maintenance(&self) -> DatabaseSession {
        self.open(&self.maintenance_database)
    }

    /// Session scoped to `database`; nothing is connected until first use
    pub fn open(&self, database: &str) -> DatabaseSession {
        DatabaseSession {
            database: database.to_string(),
            options: self.options.clone().database(database),
            conn: None,
        }
    }
}

/// A lazily connected, explicitly closed connection to one database
pub struct DatabaseSession {
    database: String,
    options: PgConnectOptions,
    conn: Option<PgConnection>,
}

impl DatabaseSession {
    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// The underlying connection, connecting on first call
    pub async fn connection(&mut self) -> Result<&mut PgConnection> {
        if self.conn.is_none() {
            debug!(database = %self.database, "Opening connection");
            let conn = PgConnection::connect_with(&self.options)
                .await
                .map_err(map_sqlx_error)?;
            self.conn = Some(conn);
        }
        self.conn
            .as_mut()
            .ok_or_else(|| AppError::Internal("connection vanished after connect".to_string()))
    }

    /// Close the connection; calling it again (or before connecting) is a no-op
    pub async fn close(&mut self) -> Result<()> {
        match self.conn.take() {
            Some(conn) => {
                debug!(database = %self.database, "Closing connection");
                conn.close().await.map_err(map_sqlx_error)
            }
            None => Ok(()),
        }
    }

    /// Close and log instead of returning the error
    pub(crate) async fn close_quietly(&mut self) {
        if let Err(e) = self.close().await {
            debug!(database = %self.database, error = %e, "Connection close failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maintenance_database_from_url() {
        let connector = PgConnector::from_url("postgres://admin@db.example.com/ops").unwrap();
        assert_eq!(connector.maintenance_database(), "ops");

        let connector = PgConnector::from_url("postgres://admin@db.example.com").unwrap();
        assert_eq!(connector.maintenance_database(), "postgres");
    }

    #[test]
    fn test_sessions_are_keyed_by_database() {
        let connector = PgConnector::from_url("postgres://admin@localhost/postgres").unwrap();
        let session = connector.open("billing");
        assert_eq!(session.database(), "billing");
        assert!(!session.is_connected());
    }

    #[test]
    fn test_close_is_idempotent_without_connecting() {
        let connector = PgConnector::from_url("postgres://admin@localhost/postgres").unwrap();
        let mut session = connector.open("app");
        tokio_test::assert_ok!(tokio_test::block_on(session.close()));
        tokio_test::assert_ok!(tokio_test::block_on(session.close()));
        assert!(!session.is_connected());
    }

    #[test]
    fn test_invalid_url_is_config_error() {
        let err = PgConnector::from_url("not a url").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
