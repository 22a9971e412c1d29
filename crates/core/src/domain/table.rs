// Table Task Domain Model

use serde::{Deserialize, Serialize};

/// Attempts granted to each table before it is dropped for the cycle
pub const DEFAULT_ATTEMPT_BUDGET: u32 = 5;

/// Schema-qualified table identifier
///
/// Both parts are stored already identifier-quoted (as `quote_ident` returns
/// them), so `qualified()` is safe to splice into a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    pub fn qualified(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// One unit of work for the worker pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableTask {
    /// Database the table lives in; the worker connects here
    pub database: String,
    pub table: TableRef,
    /// Transaction age for RUN_VACUUM, 1 otherwise (higher = earlier)
    pub priority: i64,
    pub attempts_left: u32,
}

impl TableTask {
    pub fn new(database: impl Into<String>, table: TableRef, priority: i64) -> Self {
        Self {
            database: database.into(),
            table,
            priority,
            attempts_left: DEFAULT_ATTEMPT_BUDGET,
        }
    }

    /// Record one failed attempt
    ///
    /// Returns true while the task still has attempts left and should be
    /// requeued.
    pub fn record_failure(&mut self) -> bool {
        self.attempts_left = self.attempts_left.saturating_sub(1);
        self.attempts_left > 0
    }
}
