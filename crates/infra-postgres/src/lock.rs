// PostgreSQL Advisory Lock Implementation

use crate::connection::{DatabaseSession, PgConnector};
use crate::error::map_sqlx_error;
use async_trait::async_trait;
use pgkeeper_core::error::{AppError, Result};
use pgkeeper_core::port::{HeldLock, LockCoordinator};
use tracing::{debug, warn};

/// Session advisory lock key shared by every pgkeeper instance
pub const MAINTENANCE_LOCK_KEY: i64 = 1000;

/// Database every instance takes the lock on
///
/// Advisory locks are scoped per database, so this stays fixed whatever
/// database the connection URL names.
pub const LOCK_DATABASE: &str = "postgres";

/// Cluster-wide maintenance mutex on `pg_try_advisory_lock`
///
/// The lock is session-scoped, so the acquiring session is kept open inside
/// the returned guard and used again for the unlock.
pub struct PgAdvisoryLock {
    connector: PgConnector,
    key: i64,
}

impl PgAdvisoryLock {
    pub fn new(connector: PgConnector) -> Self {
        Self::with_key(connector, MAINTENANCE_LOCK_KEY)
    }

    pub fn with_key(connector: PgConnector, key: i64) -> Self {
        Self { connector, key }
    }

    fn lock_session(&self) -> DatabaseSession {
        self.connector.open(LOCK_DATABASE)
    }
}

async fn try_lock(session: &mut DatabaseSession, key: i64) -> Result<bool> {
    let conn = session.connection().await?;
    sqlx::query_scalar("SELECT pg_try_advisory_lock($1)")
        .bind(key)
        .fetch_one(conn)
        .await
        .map_err(map_sqlx_error)
}

async fn unlock(session: &mut DatabaseSession, key: i64) -> Result<bool> {
    let conn = session.connection().await?;
    sqlx::query_scalar("SELECT pg_advisory_unlock($1)")
        .bind(key)
        .fetch_one(conn)
        .await
        .map_err(map_sqlx_error)
}

#[async_trait]
impl LockCoordinator for PgAdvisoryLock {
    async fn try_acquire(&self) -> Result<Option<Box<dyn HeldLock>>> {
        let mut session = self.lock_session();
        match try_lock(&mut session, self.key).await {
            Ok(true) => {
                debug!(key = self.key, "Advisory lock acquired");
                Ok(Some(Box::new(PgHeldLock {
                    session,
                    key: self.key,
                    released: false,
                })))
            }
            Ok(false) => {
                session.close_quietly().await;
                Ok(None)
            }
            Err(e) => {
                session.close_quietly().await;
                Err(AppError::Lock(format!("pg_try_advisory_lock failed: {}", e)))
            }
        }
    }
}

/// Holds the session that owns the advisory lock
struct PgHeldLock {
    session: DatabaseSession,
    key: i64,
    released: bool,
}

#[async_trait]
impl HeldLock for PgHeldLock {
    async fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        let unlocked = unlock(&mut self.session, self.key).await;
        // Closing the session drops any session lock server-side
        self.session.close_quietly().await;

        match unlocked {
            Ok(true) => Ok(()),
            Ok(false) => {
                warn!(key = self.key, "Advisory lock was not held at release");
                Ok(())
            }
            Err(e) => Err(AppError::Lock(format!("pg_advisory_unlock failed: {}", e))),
        }
    }
}
