// Settings Loader - refreshes the settings snapshot once per invocation

use crate::domain::Settings;
use crate::port::SettingsStore;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct SettingsLoader {
    store: Arc<dyn SettingsStore>,
}

impl SettingsLoader {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    /// Build the snapshot for the next cycle on top of `previous`
    ///
    /// Never fails. A malformed row keeps the previous value of that one
    /// setting; an unreachable store keeps the whole previous snapshot.
    pub async fn refresh(&self, previous: &Settings) -> Settings {
        let rows = match self.store.load_rows().await {
            Ok(rows) => rows,
            Err(e) => {
                error!(error = %e, "Failed to load settings, keeping previous values");
                return previous.clone();
            }
        };

        let mut settings = previous.clone();
        let mut applied = 0;
        for (key, value) in &rows {
            match settings.apply(key, value) {
                Ok(true) => applied += 1,
                Ok(false) => debug!(key = %key, "Ignoring unknown setting"),
                Err(e) => warn!(key = %key, value = %value, error = %e, "Rejected setting"),
            }
        }

        info!(
            rows = rows.len(),
            applied,
            max_workers = settings.autovacuum_max_workers,
            window_start = settings.vacuum_schedule_hour,
            window_hours = settings.run_vacuum_hours,
            "Settings loaded"
        );
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::settings_store::mocks::StaticSettingsStore;

    #[tokio::test]
    async fn test_rows_override_defaults() {
        let store = StaticSettingsStore::new(vec![
            ("autovacuum_max_workers", "2"),
            ("vacuum_schedule_hour", "22"),
            ("run_vacuum_hours", "6"),
        ]);
        let loader = SettingsLoader::new(Arc::new(store));

        let settings = loader.refresh(&Settings::default()).await;
        assert_eq!(settings.autovacuum_max_workers, 2);
        assert_eq!(settings.vacuum_schedule_hour, 22);
    }

    #[tokio::test]
    async fn test_bad_row_keeps_previous_value_only_for_that_key() {
        let store = StaticSettingsStore::new(vec![
            ("tx_wraparound_vacuum", "not-a-number"),
            ("maintenance_work_mem_mb", "256"),
        ]);
        let loader = SettingsLoader::new(Arc::new(store));

        let previous = Settings {
            tx_wraparound_vacuum: 42,
            ..Settings::default()
        };
        let settings = loader.refresh(&previous).await;
        assert_eq!(settings.tx_wraparound_vacuum, 42);
        assert_eq!(settings.maintenance_work_mem_mb, 256);
    }

    #[tokio::test]
    async fn test_unreachable_store_keeps_previous_snapshot() {
        let loader = SettingsLoader::new(Arc::new(StaticSettingsStore::unreachable()));
        let previous = Settings {
            enable_manual_vacuum: false,
            ..Settings::default()
        };
        assert_eq!(loader.refresh(&previous).await, previous);
    }
}
