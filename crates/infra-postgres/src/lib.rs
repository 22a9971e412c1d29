// pgkeeper Infrastructure - PostgreSQL Adapter
// Implements: Catalog, LockCoordinator, TableMaintainer, SettingsStore, ExpiryStore

mod catalog;
mod connection;
mod error;
mod expiry_store;
mod lock;
mod maintainer;
mod migration;
mod settings_store;

pub use catalog::{PgCatalog, DEFAULT_EXCLUDED_DATABASES};
pub use connection::{DatabaseSession, PgConnector};
pub use expiry_store::{expiry_delete_sql, quote_ident, PgExpiryStore};
pub use lock::{PgAdvisoryLock, LOCK_DATABASE, MAINTENANCE_LOCK_KEY};
pub use maintainer::{maintenance_statements, PgTableMaintainer};
pub use migration::run_migrations;
pub use settings_store::PgSettingsStore;

// Note: sqlx::Error conversion is handled by error::map_sqlx_error
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)
