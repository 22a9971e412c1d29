// Vacuum Mode Domain Model

use serde::{Deserialize, Serialize};

/// Operating mode of one maintenance pass
///
/// A cycle may run several modes one after another, never two at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    /// Issue `VACUUM` against every relation, oldest transaction age first
    RunVacuum,
    /// Tighten per-table autovacuum parameters
    ConfigureAggressive,
    /// Restore the stock per-table autovacuum parameters
    ResetDefault,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::RunVacuum => write!(f, "RUN_VACUUM"),
            Mode::ConfigureAggressive => write!(f, "CONFIGURE_AGGRESSIVE"),
            Mode::ResetDefault => write!(f, "RESET_DEFAULT"),
        }
    }
}

impl Mode {
    /// Whether the queue for this mode is ordered by transaction age
    pub fn orders_by_age(&self) -> bool {
        matches!(self, Mode::RunVacuum)
    }
}

/// Per-table autovacuum storage parameters written by `ALTER TABLE ... SET (...)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableOverrides {
    pub cost_limit: i64,
    pub cost_delay: i64,
    pub threshold: i64,
    pub scale_factor: f64,
}

impl TableOverrides {
    /// PostgreSQL's stock autovacuum parameters
    pub const DEFAULT: TableOverrides = TableOverrides {
        cost_limit: 200,
        cost_delay: 20,
        threshold: 50,
        scale_factor: 0.2,
    };

    /// Aggressive parameters: no throttling, vacuum on almost any dead-row count.
    pub fn aggressive(settings: &crate::domain::Settings) -> Self {
        Self {
            cost_limit: settings.autovacuum_vacuum_cost_limit,
            cost_delay: 0,
            threshold: settings.autovacuum_vacuum_threshold,
            scale_factor: 0.0,
        }
    }

    /// Render the `SET (...)` parameter list
    pub fn to_storage_params(&self) -> String {
        format!(
            "autovacuum_vacuum_cost_limit={}, autovacuum_vacuum_cost_delay={}, autovacuum_vacuum_threshold={}, autovacuum_vacuum_scale_factor={}",
            self.cost_limit, self.cost_delay, self.threshold, self.scale_factor
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Settings;

    #[test]
    fn test_default_overrides_render() {
        assert_eq!(
            TableOverrides::DEFAULT.to_storage_params(),
            "autovacuum_vacuum_cost_limit=200, autovacuum_vacuum_cost_delay=20, autovacuum_vacuum_threshold=50, autovacuum_vacuum_scale_factor=0.2"
        );
    }

    #[test]
    fn test_aggressive_overrides_disable_throttling() {
        let overrides = TableOverrides::aggressive(&Settings::default());
        assert_eq!(overrides.cost_delay, 0);
        assert_eq!(overrides.scale_factor, 0.0);
        assert_eq!(overrides.cost_limit, 1000);
        assert_eq!(overrides.threshold, 1000);
        assert!(overrides.to_storage_params().contains("autovacuum_vacuum_scale_factor=0"));
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(Mode::RunVacuum.to_string(), "RUN_VACUUM");
        assert_eq!(Mode::ResetDefault.to_string(), "RESET_DEFAULT");
        assert!(Mode::RunVacuum.orders_by_age());
        assert!(!Mode::ConfigureAggressive.orders_by_age());
    }
}
