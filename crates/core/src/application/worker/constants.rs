// Worker constants (no magic values)
use std::time::Duration;

/// Lock wait before giving up on a `VACUUM` (RUN_VACUUM)
///
/// Kept tiny so a busy table is retried later instead of queueing behind
/// application locks.
pub const VACUUM_LOCK_TIMEOUT: Duration = Duration::from_millis(5);

/// Lock wait before giving up on an `ALTER TABLE ... SET` (configuration modes)
pub const CONFIGURE_LOCK_TIMEOUT: Duration = Duration::from_millis(5000);

/// Default interval between two maintenance invocations (5 minutes)
pub const DEFAULT_CYCLE_INTERVAL: Duration = Duration::from_secs(5 * 60);
