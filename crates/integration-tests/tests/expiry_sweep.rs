//! Row-expiry sweeps driven by the settings table

use pgkeeper_core::application::{ExpirySweeper, SettingsLoader};
use pgkeeper_core::domain::{Settings, TtlTable};
use pgkeeper_core::port::expiry_store::mocks::InMemoryExpiryStore;
use pgkeeper_core::port::settings_store::mocks::StaticSettingsStore;
use pgkeeper_infra_postgres::expiry_delete_sql;
use std::sync::Arc;

fn ttl(database: &str, table: &str, expiry_secs: i64) -> TtlTable {
    TtlTable {
        database: database.to_string(),
        schema: "public".to_string(),
        table: table.to_string(),
        column: "created_at".to_string(),
        expiry_secs,
    }
}

async fn settings(rows: Vec<(&str, &str)>) -> Settings {
    SettingsLoader::new(Arc::new(StaticSettingsStore::new(rows)))
        .refresh(&Settings::default())
        .await
}

#[tokio::test]
async fn test_sweep_spans_databases_and_survives_failures() {
    let store = Arc::new(
        InMemoryExpiryStore::new()
            .with_table(ttl("app", "sessions", 3600), 12)
            .with_failing_table(ttl("app", "locked", 60))
            .with_table(ttl("billing", "events", 86400), 30),
    );

    let report = ExpirySweeper::new(store.clone())
        .run(&settings(vec![]).await)
        .await
        .unwrap();

    assert_eq!(report.tables, 3);
    assert_eq!(report.failed, 1);
    assert_eq!(report.rows_deleted, 42);
    assert_eq!(
        store.deletes(),
        vec![
            "app.public.sessions",
            "app.public.locked",
            "billing.public.events"
        ]
    );
}

#[tokio::test]
async fn test_disabled_sweeper_reads_nothing() {
    let store = Arc::new(InMemoryExpiryStore::new().with_failing_listing());

    let report = ExpirySweeper::new(store.clone())
        .run(&settings(vec![("enable_ttl_sweeper", "false")]).await)
        .await
        .unwrap();

    assert_eq!(report.tables, 0);
    assert!(store.deletes().is_empty());
}

#[tokio::test]
async fn test_missing_registry_fails_the_sweep() {
    let store = Arc::new(InMemoryExpiryStore::new().with_failing_listing());
    let result = ExpirySweeper::new(store)
        .run(&settings(vec![]).await)
        .await;
    assert!(result.is_err());
}

#[test]
fn test_delete_statement_targets_registered_column() {
    let sql = expiry_delete_sql(&ttl("app", "sessions", 3600));
    assert!(sql.starts_with("DELETE FROM \"public\".\"sessions\""));
    assert!(sql.contains("EXTRACT(EPOCH FROM \"created_at\")"));
    assert!(sql.ends_with("> 3600"));
}
