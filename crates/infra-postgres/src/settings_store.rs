// PostgreSQL Settings Store Implementation

use crate::connection::{DatabaseSession, PgConnector};
use crate::error::map_sqlx_error;
use async_trait::async_trait;
use pgkeeper_core::error::Result;
use pgkeeper_core::port::SettingsStore;

const LOAD_SETTINGS: &str = r#"
    SELECT name::text, COALESCE(setting, '')::text
    FROM pg_cron_config
    WHERE name IS NOT NULL
"#;

/// Reads `pg_cron_config` on the maintenance database
pub struct PgSettingsStore {
    connector: PgConnector,
}

impl PgSettingsStore {
    pub fn new(connector: PgConnector) -> Self {
        Self { connector }
    }
}

async fn load(session: &mut DatabaseSession) -> Result<Vec<(String, String)>> {
    let conn = session.connection().await?;
    sqlx::query_as(LOAD_SETTINGS)
        .fetch_all(conn)
        .await
        .map_err(map_sqlx_error)
}

#[async_trait]
impl SettingsStore for PgSettingsStore {
    async fn load_rows(&self) -> Result<Vec<(String, String)>> {
        let mut session = self.connector.open_maintenance();
        let rows = load(&mut session).await;
        session.close_quietly().await;
        rows
    }
}
