// Wraparound Guard - transaction-ID age check feeding the mode selector

use crate::domain::Settings;
use crate::error::{AppError, Result};
use crate::port::Catalog;
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of one wraparound check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WraparoundStatus {
    pub max_database_age: i64,
    pub at_risk: bool,
}

pub struct WraparoundGuard {
    catalog: Arc<dyn Catalog>,
}

impl WraparoundGuard {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self { catalog }
    }

    /// Read the oldest database age and compare it with the threshold
    ///
    /// A failed query is an error, never "no risk": without the age the
    /// cycle cannot tell whether emergency vacuuming is needed.
    pub async fn check(&self, settings: &Settings) -> Result<WraparoundStatus> {
        let max_database_age = self
            .catalog
            .max_database_age()
            .await
            .map_err(|e| AppError::catalog("wraparound age query failed", e))?;

        let at_risk = max_database_age >= settings.tx_wraparound_vacuum;
        if at_risk {
            warn!(
                max_database_age,
                threshold = settings.tx_wraparound_vacuum,
                "Transaction wraparound threshold reached, forcing vacuum"
            );
        } else {
            info!(
                max_database_age,
                threshold = settings.tx_wraparound_vacuum,
                "Database age below wraparound threshold"
            );
        }

        Ok(WraparoundStatus {
            max_database_age,
            at_risk,
        })
    }
}
