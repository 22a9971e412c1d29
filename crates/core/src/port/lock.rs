// Advisory Lock Port (Interface)

use crate::error::Result;
use async_trait::async_trait;

/// Cluster-wide advisory lock used as the maintenance mutex
#[async_trait]
pub trait LockCoordinator: Send + Sync {
    /// Try once to take the lock without waiting
    ///
    /// # Returns
    /// `Some(lock)` when this caller now holds it, `None` when another
    /// session already does.
    async fn try_acquire(&self) -> Result<Option<Box<dyn HeldLock>>>;
}

/// A held advisory lock
///
/// Only the holder can release it. Releasing twice is a no-op.
#[async_trait]
pub trait HeldLock: Send {
    async fn release(&mut self) -> Result<()>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct LockState {
        held: AtomicBool,
        acquisitions: AtomicUsize,
        releases: AtomicUsize,
        fail_release: AtomicBool,
    }

    /// Process-local stand-in for `pg_try_advisory_lock`
    ///
    /// Clones share the same lock, like several daemons talking to one cluster.
    #[derive(Clone, Default)]
    pub struct InMemoryLock {
        state: Arc<LockState>,
    }

    impl InMemoryLock {
        pub fn new() -> Self {
            Self::default()
        }

        /// A lock some other instance already holds
        pub fn held_elsewhere() -> Self {
            let lock = Self::new();
            lock.state.held.store(true, Ordering::SeqCst);
            lock
        }

        pub fn with_failing_release(self) -> Self {
            self.state.fail_release.store(true, Ordering::SeqCst);
            self
        }

        pub fn is_held(&self) -> bool {
            self.state.held.load(Ordering::SeqCst)
        }

        pub fn acquisitions(&self) -> usize {
            self.state.acquisitions.load(Ordering::SeqCst)
        }

        pub fn releases(&self) -> usize {
            self.state.releases.load(Ordering::SeqCst)
        }
    }

    struct InMemoryHeldLock {
        state: Arc<LockState>,
        released: bool,
    }

    #[async_trait]
    impl LockCoordinator for InMemoryLock {
        async fn try_acquire(&self) -> Result<Option<Box<dyn HeldLock>>> {
            if self
                .state
                .held
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                return Ok(None);
            }
            self.state.acquisitions.fetch_add(1, Ordering::SeqCst);
            Ok(Some(Box::new(InMemoryHeldLock {
                state: Arc::clone(&self.state),
                released: false,
            })))
        }
    }

    #[async_trait]
    impl HeldLock for InMemoryHeldLock {
        async fn release(&mut self) -> Result<()> {
            if self.released {
                return Ok(());
            }
            self.released = true;
            self.state.releases.fetch_add(1, Ordering::SeqCst);
            if self.state.fail_release.load(Ordering::SeqCst) {
                // Session lost: the server drops the lock with it
                self.state.held.store(false, Ordering::SeqCst);
                return Err(AppError::Lock("connection closed".to_string()));
            }
            self.state.held.store(false, Ordering::SeqCst);
            Ok(())
        }
    }
}
