// Time Provider Port (for testability)

use chrono::{DateTime, Utc};

/// Time provider interface (allows fixing the hour in tests)
pub trait TimeProvider: Send + Sync {
    /// Current wall-clock time in UTC
    fn now(&self) -> DateTime<Utc>;
}

/// System time provider (production)
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub mod mocks {
    use super::*;
    use chrono::TimeZone;

    /// Clock pinned to one instant
    pub struct FixedTimeProvider {
        now: DateTime<Utc>,
    }

    impl FixedTimeProvider {
        pub fn new(now: DateTime<Utc>) -> Self {
            Self { now }
        }

        /// A clock reading `hour:00` UTC on an arbitrary day
        pub fn at_hour(hour: u32) -> Self {
            Self::new(Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap())
        }
    }

    impl TimeProvider for FixedTimeProvider {
        fn now(&self) -> DateTime<Utc> {
            self.now
        }
    }
}
