// Table Queue Domain Model

use super::table::TableTask;
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// Work queue shared by the worker pool of one mode execution
///
/// Populated completely before draining starts. Dequeue and requeue are
/// serialized by one async mutex, so no task is ever handed to two workers.
#[derive(Debug, Default)]
pub struct TableQueue {
    tasks: Mutex<VecDeque<TableTask>>,
}

impl TableQueue {
    /// Build a queue that hands tasks out in the given order
    pub fn from_ordered(tasks: Vec<TableTask>) -> Self {
        Self {
            tasks: Mutex::new(tasks.into()),
        }
    }

    /// Build a queue ordered by descending priority
    ///
    /// The sort is stable: tasks with equal priority keep catalog order.
    pub fn by_priority(mut tasks: Vec<TableTask>) -> Self {
        tasks.sort_by(|a, b| b.priority.cmp(&a.priority));
        Self::from_ordered(tasks)
    }

    /// Take the next task, or `None` once the queue is drained
    pub async fn dequeue(&self) -> Option<TableTask> {
        self.tasks.lock().await.pop_front()
    }

    /// Put a task back for a later attempt
    pub async fn requeue(&self, task: TableTask) {
        self.tasks.lock().await.push_back(task);
    }

    pub async fn len(&self) -> usize {
        self.tasks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TableRef;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn task(name: &str, priority: i64) -> TableTask {
        TableTask::new("db", TableRef::new("public", name), priority)
    }

    #[tokio::test]
    async fn test_priority_order_descending() {
        let queue = TableQueue::by_priority(vec![
            task("a", 50),
            task("b", 10),
            task("c", 90),
            task("d", 30),
        ]);

        let mut ages = Vec::new();
        while let Some(t) = queue.dequeue().await {
            ages.push(t.priority);
        }
        assert_eq!(ages, vec![90, 50, 30, 10]);
    }

    #[tokio::test]
    async fn test_requeue_goes_to_back() {
        let queue = TableQueue::from_ordered(vec![task("a", 1), task("b", 1)]);
        let first = queue.dequeue().await.unwrap();
        queue.requeue(first).await;

        assert_eq!(queue.dequeue().await.unwrap().table.name, "b");
        assert_eq!(queue.dequeue().await.unwrap().table.name, "a");
        assert!(queue.is_empty().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_dequeue_no_duplicates() {
        let tasks: Vec<_> = (0..200).map(|i| task(&format!("t{}", i), 1)).collect();
        let queue = Arc::new(TableQueue::from_ordered(tasks));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let queue = Arc::clone(&queue);
            handles.push(tokio::spawn(async move {
                let mut taken = Vec::new();
                while let Some(t) = queue.dequeue().await {
                    taken.push(t.table.name);
                    tokio::task::yield_now().await;
                }
                taken
            }));
        }

        let mut seen = HashSet::new();
        let mut total = 0;
        for handle in handles {
            for name in handle.await.unwrap() {
                total += 1;
                assert!(seen.insert(name), "task handed out twice");
            }
        }
        assert_eq!(total, 200);
        assert_eq!(queue.len().await, 0);
    }
}
