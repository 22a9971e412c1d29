// Settings Store Port

use crate::error::Result;
use async_trait::async_trait;

/// Persistent key/value store backing the settings snapshot
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Read every `(name, setting)` row
    ///
    /// Values are returned raw; parsing and validation happen in the
    /// settings loader so one bad row cannot hide the others.
    async fn load_rows(&self) -> Result<Vec<(String, String)>>;
}

pub mod mocks {
    use super::*;
    use crate::error::AppError;

    /// Settings store serving fixed rows, or failing every read
    pub struct StaticSettingsStore {
        rows: Option<Vec<(String, String)>>,
    }

    impl StaticSettingsStore {
        pub fn new(rows: Vec<(&str, &str)>) -> Self {
            Self {
                rows: Some(
                    rows.into_iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                ),
            }
        }

        pub fn unreachable() -> Self {
            Self { rows: None }
        }
    }

    #[async_trait]
    impl SettingsStore for StaticSettingsStore {
        async fn load_rows(&self) -> Result<Vec<(String, String)>> {
            self.rows
                .clone()
                .ok_or_else(|| AppError::Database("connection refused".to_string()))
        }
    }
}
