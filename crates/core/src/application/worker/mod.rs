// Worker Pool - drains a table queue with bounded concurrency

pub mod constants;
mod shutdown;

pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use crate::domain::{Mode, Settings, TableQueue, TableTask};
use crate::port::TableMaintainer;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Totals for one drained queue
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Tasks that reached a terminal state
    pub processed: usize,
    pub succeeded: usize,
    /// Tasks dropped after exhausting their attempts
    pub dropped: usize,
    /// Every attempt, including retries
    pub attempts: usize,
}

impl DrainReport {
    fn merge(&mut self, other: &DrainReport) {
        self.processed += other.processed;
        self.succeeded += other.succeeded;
        self.dropped += other.dropped;
        self.attempts += other.attempts;
    }
}

/// Spawns workers over a shared queue and waits for all of them
pub struct WorkerPool {
    maintainer: Arc<dyn TableMaintainer>,
}

impl WorkerPool {
    pub fn new(maintainer: Arc<dyn TableMaintainer>) -> Self {
        Self { maintainer }
    }

    /// Drain `queue` with `worker_count` concurrent workers
    ///
    /// Returns once the queue is empty and every worker has exited. Table
    /// failures never escape: they are retried or dropped inside the worker.
    pub async fn drain(
        &self,
        queue: Arc<TableQueue>,
        mode: Mode,
        settings: Arc<Settings>,
        worker_count: usize,
    ) -> DrainReport {
        let worker_count = worker_count.max(1);
        info!(mode = %mode, workers = worker_count, "Starting worker pool");

        let mut workers = JoinSet::new();
        for id in 0..worker_count {
            let worker = Worker {
                id,
                mode,
                queue: Arc::clone(&queue),
                maintainer: Arc::clone(&self.maintainer),
                settings: Arc::clone(&settings),
            };
            workers.spawn(worker.run());
        }

        let mut report = DrainReport::default();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(stats) => report.merge(&stats),
                Err(e) => error!(mode = %mode, error = ?e, "Worker task aborted"),
            }
        }

        info!(
            mode = %mode,
            processed = report.processed,
            succeeded = report.succeeded,
            dropped = report.dropped,
            attempts = report.attempts,
            "Worker pool drained"
        );
        report
    }
}

/// One worker loop: dequeue, apply, retry or drop, until the queue is empty
struct Worker {
    id: usize,
    mode: Mode,
    queue: Arc<TableQueue>,
    maintainer: Arc<dyn TableMaintainer>,
    settings: Arc<Settings>,
}

impl Worker {
    async fn run(self) -> DrainReport {
        let mut stats = DrainReport::default();

        while let Some(mut task) = self.queue.dequeue().await {
            stats.attempts += 1;
            match self.attempt(&task).await {
                Ok(()) => {
                    info!(
                        worker = self.id,
                        mode = %self.mode,
                        database = %task.database,
                        table = %task.table,
                        "Table maintained"
                    );
                    stats.processed += 1;
                    stats.succeeded += 1;
                }
                Err(reason) => {
                    if task.record_failure() {
                        warn!(
                            worker = self.id,
                            mode = %self.mode,
                            database = %task.database,
                            table = %task.table,
                            attempts_left = task.attempts_left,
                            error = %reason,
                            "Table maintenance failed, requeuing"
                        );
                        self.queue.requeue(task).await;
                    } else {
                        error!(
                            worker = self.id,
                            mode = %self.mode,
                            database = %task.database,
                            table = %task.table,
                            error = %reason,
                            "Table maintenance failed, attempts exhausted"
                        );
                        stats.processed += 1;
                        stats.dropped += 1;
                    }
                }
            }
        }

        stats
    }

    /// Run the action in its own task so a panic only fails this attempt
    async fn attempt(&self, task: &TableTask) -> Result<(), String> {
        let maintainer = Arc::clone(&self.maintainer);
        let settings = Arc::clone(&self.settings);
        let task = task.clone();
        let mode = self.mode;

        let handle =
            tokio::spawn(async move { maintainer.apply(&task, mode, &settings).await });

        match handle.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(join_err) if join_err.is_panic() => {
                Err(format!("maintenance action panicked: {:?}", join_err))
            }
            Err(join_err) => Err(format!("maintenance action cancelled: {:?}", join_err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TableRef, DEFAULT_ATTEMPT_BUDGET};
    use crate::port::maintainer::mocks::{RecordingMaintainer, TableBehavior};
    use std::collections::HashMap;
    use std::time::Duration;

    fn queue_of(n: usize) -> Arc<TableQueue> {
        let tasks = (0..n)
            .map(|i| TableTask::new("app", TableRef::new("public", format!("t{}", i)), 1))
            .collect();
        Arc::new(TableQueue::from_ordered(tasks))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_every_task_processed_exactly_once() {
        let maintainer = Arc::new(RecordingMaintainer::new().with_work_time(Duration::from_millis(2)));
        let pool = WorkerPool::new(maintainer.clone());
        let queue = queue_of(40);

        let report = pool
            .drain(queue.clone(), Mode::ResetDefault, Arc::new(Settings::default()), 5)
            .await;

        assert_eq!(report.processed, 40);
        assert_eq!(report.succeeded, 40);
        assert_eq!(report.attempts, 40);
        assert!(queue.is_empty().await);
        assert_eq!(maintainer.overlaps(), 0);

        let mut per_table: HashMap<String, usize> = HashMap::new();
        for (table, mode) in maintainer.attempts() {
            assert_eq!(mode, Mode::ResetDefault);
            *per_table.entry(table).or_default() += 1;
        }
        assert_eq!(per_table.len(), 40);
        assert!(per_table.values().all(|n| *n == 1));
    }

    #[tokio::test]
    async fn test_permanent_failure_uses_whole_budget_then_drops() {
        let maintainer = Arc::new(
            RecordingMaintainer::new().with_behavior("public.t1", TableBehavior::FailAlways),
        );
        let pool = WorkerPool::new(maintainer.clone());

        let report = pool
            .drain(queue_of(3), Mode::ConfigureAggressive, Arc::new(Settings::default()), 2)
            .await;

        assert_eq!(maintainer.attempts_for("public.t1"), DEFAULT_ATTEMPT_BUDGET as usize);
        assert_eq!(report.dropped, 1);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.processed, 3);
        assert_eq!(report.attempts, 2 + DEFAULT_ATTEMPT_BUDGET as usize);
    }

    #[tokio::test]
    async fn test_transient_failure_recovers() {
        let maintainer = Arc::new(
            RecordingMaintainer::new().with_behavior("public.t0", TableBehavior::FailTimes(2)),
        );
        let pool = WorkerPool::new(maintainer.clone());

        let report = pool
            .drain(queue_of(1), Mode::RunVacuum, Arc::new(Settings::default()), 1)
            .await;

        assert_eq!(maintainer.attempts_for("public.t0"), 3);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.dropped, 0);
    }

    #[tokio::test]
    async fn test_panicking_table_does_not_stop_pool() {
        let maintainer = Arc::new(
            RecordingMaintainer::new().with_behavior("public.t2", TableBehavior::Panic),
        );
        let pool = WorkerPool::new(maintainer.clone());

        let report = pool
            .drain(queue_of(5), Mode::ResetDefault, Arc::new(Settings::default()), 3)
            .await;

        assert_eq!(report.succeeded, 4);
        assert_eq!(report.dropped, 1);
        assert_eq!(maintainer.attempts_for("public.t2"), DEFAULT_ATTEMPT_BUDGET as usize);
    }

    #[tokio::test]
    async fn test_empty_queue_returns_immediately() {
        let maintainer = Arc::new(RecordingMaintainer::new());
        let pool = WorkerPool::new(maintainer.clone());

        let report = pool
            .drain(queue_of(0), Mode::RunVacuum, Arc::new(Settings::default()), 4)
            .await;

        assert_eq!(report, DrainReport::default());
        assert!(maintainer.attempts().is_empty());
    }
}
