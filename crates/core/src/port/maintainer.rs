// Table Maintainer Port (Interface)

use crate::domain::{Mode, Settings, TableTask};
use crate::error::Result;
use async_trait::async_trait;

/// Performs the mode-specific action on a single table
///
/// Implementations open a connection scoped to `task.database`; one
/// connection never spans databases.
#[async_trait]
pub trait TableMaintainer: Send + Sync {
    /// # Errors
    /// Any SQL, lock-timeout or connection failure. The worker pool decides
    /// whether the table is retried.
    async fn apply(&self, task: &TableTask, mode: Mode, settings: &Settings) -> Result<()>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;
    use std::time::Duration;

    /// How the mock treats one table
    #[derive(Debug, Clone)]
    pub enum TableBehavior {
        /// Fail the first N attempts, then succeed
        FailTimes(u32),
        /// Fail every attempt
        FailAlways,
        /// Panic inside the action
        Panic,
    }

    /// Maintainer that records every attempt
    #[derive(Default)]
    pub struct RecordingMaintainer {
        behaviors: Mutex<HashMap<String, TableBehavior>>,
        attempts: Mutex<Vec<(String, Mode)>>,
        failures_so_far: Mutex<HashMap<String, u32>>,
        in_flight: Mutex<HashSet<String>>,
        overlaps: Mutex<usize>,
        work_time: Option<Duration>,
    }

    impl RecordingMaintainer {
        pub fn new() -> Self {
            Self::default()
        }

        /// Hold each table for `work_time` to force workers to overlap
        pub fn with_work_time(mut self, work_time: Duration) -> Self {
            self.work_time = Some(work_time);
            self
        }

        /// Set behavior for a table, keyed by `TableRef::qualified()`
        pub fn with_behavior(self, table: &str, behavior: TableBehavior) -> Self {
            self.behaviors
                .lock()
                .unwrap()
                .insert(table.to_string(), behavior);
            self
        }

        /// Every attempt in the order it started
        pub fn attempts(&self) -> Vec<(String, Mode)> {
            self.attempts.lock().unwrap().clone()
        }

        pub fn attempts_for(&self, table: &str) -> usize {
            self.attempts
                .lock()
                .unwrap()
                .iter()
                .filter(|(t, _)| t == table)
                .count()
        }

        /// Times a table was worked on by two workers at once
        pub fn overlaps(&self) -> usize {
            *self.overlaps.lock().unwrap()
        }
    }

    #[async_trait]
    impl TableMaintainer for RecordingMaintainer {
        async fn apply(&self, task: &TableTask, mode: Mode, _settings: &Settings) -> Result<()> {
            let key = task.table.qualified();
            self.attempts.lock().unwrap().push((key.clone(), mode));
            if !self.in_flight.lock().unwrap().insert(key.clone()) {
                *self.overlaps.lock().unwrap() += 1;
            }

            if let Some(work_time) = self.work_time {
                tokio::time::sleep(work_time).await;
            }
            self.in_flight.lock().unwrap().remove(&key);

            let behavior = self.behaviors.lock().unwrap().get(&key).cloned();
            match behavior {
                None => Ok(()),
                Some(TableBehavior::FailAlways) => Err(AppError::Execution {
                    table: key,
                    reason: "canceling statement due to lock timeout".to_string(),
                }),
                Some(TableBehavior::FailTimes(n)) => {
                    let mut failures = self.failures_so_far.lock().unwrap();
                    let seen = failures.entry(key.clone()).or_insert(0);
                    if *seen < n {
                        *seen += 1;
                        Err(AppError::Execution {
                            table: key,
                            reason: "could not obtain lock".to_string(),
                        })
                    } else {
                        Ok(())
                    }
                }
                Some(TableBehavior::Panic) => panic!("maintainer panicked on {}", key),
            }
        }
    }
}
