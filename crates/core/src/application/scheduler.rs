//! Vacuum Scheduler - one maintenance cycle
//!
//! Per invocation:
//! 1. read the UTC hour and the cluster's oldest database age
//! 2. select the modes to run
//! 3. for each mode, under the cluster-wide advisory lock: build the table
//!    queue and drain it with the worker pool, then release the lock
//!
//! A mode whose lock is held elsewhere is skipped. Catalog and wraparound
//! failures abort the cycle.

use crate::application::mode_selector::{aggressive_window_active, select_modes};
use crate::application::queue_builder::QueueBuilder;
use crate::application::worker::{DrainReport, WorkerPool};
use crate::application::wraparound::WraparoundGuard;
use crate::domain::{Mode, Settings};
use crate::error::Result;
use crate::port::{Catalog, LockCoordinator, TableMaintainer, TimeProvider};
use chrono::Timelike;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

/// What happened to one selected mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeOutcome {
    /// Another instance held the maintenance lock
    Skipped,
    Completed(DrainReport),
}

/// Summary of one cycle, logged at the end of the invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub hour: u32,
    pub max_database_age: i64,
    pub modes: Vec<(Mode, ModeOutcome)>,
}

impl CycleReport {
    pub fn skipped(&self) -> usize {
        self.modes
            .iter()
            .filter(|(_, o)| *o == ModeOutcome::Skipped)
            .count()
    }
}

/// Modes a cycle would run, without executing anything
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CyclePlan {
    pub hour: u32,
    pub aggressive_window: bool,
    pub max_database_age: i64,
    pub modes: Vec<Mode>,
}

pub struct VacuumScheduler {
    lock: Arc<dyn LockCoordinator>,
    guard: WraparoundGuard,
    queue_builder: QueueBuilder,
    pool: WorkerPool,
    time_provider: Arc<dyn TimeProvider>,
}

impl VacuumScheduler {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        lock: Arc<dyn LockCoordinator>,
        maintainer: Arc<dyn TableMaintainer>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            lock,
            guard: WraparoundGuard::new(Arc::clone(&catalog)),
            queue_builder: QueueBuilder::new(catalog),
            pool: WorkerPool::new(maintainer),
            time_provider,
        }
    }

    /// Decide the modes for `hour` (defaults to the current UTC hour)
    pub async fn plan(&self, settings: &Settings, hour: Option<u32>) -> Result<CyclePlan> {
        let hour = match hour {
            Some(h) if h > 23 => return Err(crate::domain::DomainError::InvalidHour(h).into()),
            Some(h) => h,
            None => self.time_provider.now().hour(),
        };
        let status = self.guard.check(settings).await?;

        Ok(CyclePlan {
            hour,
            aggressive_window: aggressive_window_active(
                hour,
                settings.vacuum_schedule_hour,
                settings.run_vacuum_hours,
            ),
            max_database_age: status.max_database_age,
            modes: select_modes(hour, settings, status.max_database_age),
        })
    }

    /// Run one full maintenance cycle
    ///
    /// Modes execute strictly one after another; each releases the lock
    /// before the next starts.
    pub async fn run_cycle(&self, settings: &Settings) -> Result<CycleReport> {
        let plan = self.plan(settings, None).await?;
        info!(
            hour = plan.hour,
            aggressive_window = plan.aggressive_window,
            max_database_age = plan.max_database_age,
            modes = ?plan.modes,
            "Vacuum cycle started"
        );

        let settings = Arc::new(settings.clone());
        let mut report = CycleReport {
            hour: plan.hour,
            max_database_age: plan.max_database_age,
            modes: Vec::with_capacity(plan.modes.len()),
        };

        for mode in plan.modes {
            let outcome = self.run_mode(mode, &settings).await?;
            report.modes.push((mode, outcome));
        }

        info!(
            modes = report.modes.len(),
            skipped = report.skipped(),
            "Vacuum cycle finished"
        );
        Ok(report)
    }

    /// Execute one mode under the advisory lock
    async fn run_mode(&self, mode: Mode, settings: &Arc<Settings>) -> Result<ModeOutcome> {
        let mut lock = match self.lock.try_acquire().await? {
            Some(lock) => lock,
            None => {
                info!(mode = %mode, "Vacuum process in progress elsewhere, skipping mode");
                return Ok(ModeOutcome::Skipped);
            }
        };
        info!(mode = %mode, "Acquired maintenance lock");

        let drained = match self.queue_builder.build(mode).await {
            Ok(queue) => {
                let queue = Arc::new(queue);
                let workers = settings.worker_count(queue.len().await);
                Ok(self
                    .pool
                    .drain(queue, mode, Arc::clone(settings), workers)
                    .await)
            }
            Err(e) => Err(e),
        };

        // Released on every path; a lost session drops the lock server-side
        match lock.release().await {
            Ok(()) => info!(mode = %mode, "Released maintenance lock"),
            Err(e) => error!(mode = %mode, error = %e, "Failed to release maintenance lock"),
        }

        drained.map(ModeOutcome::Completed)
    }
}
