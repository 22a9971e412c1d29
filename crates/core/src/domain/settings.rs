// Settings Snapshot Domain Model

use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Largest `maintenance_work_mem` PostgreSQL accepts, in MB
pub const MAX_MAINTENANCE_WORK_MEM_MB: i64 = 2_097_151;

/// Immutable cluster maintenance settings for one cycle
///
/// Loaded from the `pg_cron_config` key/value table at the start of every
/// invocation and passed by reference to every component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Seconds before an idle session is considered stale
    pub idle_session_timeout: i64,
    pub autovacuum_vacuum_analyze_scale_factor: f64,
    pub autovacuum_vacuum_cost_delay: i64,
    pub autovacuum_vacuum_cost_limit: i64,
    pub autovacuum_vacuum_scale_factor: f64,
    pub autovacuum_vacuum_threshold: i64,
    /// Upper bound on concurrent table workers
    pub autovacuum_max_workers: i64,
    /// Database age (in transactions) that forces emergency vacuuming
    pub tx_wraparound_vacuum: i64,
    pub maintenance_work_mem_mb: i64,
    /// UTC hour the aggressive window opens, in [0, 23]
    pub vacuum_schedule_hour: u32,
    /// Length of the aggressive window in hours
    pub run_vacuum_hours: u32,
    pub enable_manual_vacuum: bool,
    pub enable_ttl_sweeper: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            idle_session_timeout: 900,
            autovacuum_vacuum_analyze_scale_factor: 0.05,
            autovacuum_vacuum_cost_delay: 10,
            autovacuum_vacuum_cost_limit: 1000,
            autovacuum_vacuum_scale_factor: 0.01,
            autovacuum_vacuum_threshold: 1000,
            autovacuum_max_workers: 5,
            tx_wraparound_vacuum: 750_000_000,
            maintenance_work_mem_mb: 1024,
            vacuum_schedule_hour: 0,
            run_vacuum_hours: 6,
            enable_manual_vacuum: true,
            enable_ttl_sweeper: true,
        }
    }
}

impl Settings {
    /// Apply one `(name, setting)` row in place
    ///
    /// Returns `Ok(false)` for keys this version does not know. On error the
    /// snapshot is left untouched, so the previous value of that key survives.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<bool> {
        let raw = value.trim();
        match key {
            "idle_session_timeout" => self.idle_session_timeout = parse_count(key, raw)?,
            "autovacuum_vacuum_analyze_scale_factor" => {
                self.autovacuum_vacuum_analyze_scale_factor = parse_ratio(key, raw)?
            }
            "autovacuum_vacuum_cost_delay" => {
                self.autovacuum_vacuum_cost_delay = parse_count(key, raw)?
            }
            "autovacuum_vacuum_cost_limit" => {
                self.autovacuum_vacuum_cost_limit = parse_count(key, raw)?
            }
            "autovacuum_vacuum_scale_factor" => {
                self.autovacuum_vacuum_scale_factor = parse_ratio(key, raw)?
            }
            "autovacuum_vacuum_threshold" => {
                self.autovacuum_vacuum_threshold = parse_count(key, raw)?
            }
            "autovacuum_max_workers" => self.autovacuum_max_workers = parse_count(key, raw)?,
            "tx_wraparound_vacuum" => self.tx_wraparound_vacuum = parse_count(key, raw)?,
            "maintenance_work_mem_mb" => {
                let mb = parse_count(key, raw)?;
                if mb > MAX_MAINTENANCE_WORK_MEM_MB {
                    return Err(invalid(key, raw, "above the server limit of 2097151 MB"));
                }
                self.maintenance_work_mem_mb = mb;
            }
            "vacuum_schedule_hour" => {
                let hour = parse_count(key, raw)?;
                if hour > 23 {
                    return Err(invalid(key, raw, "hour must be in [0, 23]"));
                }
                self.vacuum_schedule_hour = hour as u32;
            }
            // Older deployments stored the window length under the misspelled key
            "run_vacuum_hours" | "vacuum_agressive_disable_hour" => {
                let hours = parse_count(key, raw)?;
                self.run_vacuum_hours =
                    u32::try_from(hours).map_err(|_| invalid(key, raw, "too large"))?;
            }
            "enable_manual_vacuum" => self.enable_manual_vacuum = parse_flag(key, raw)?,
            "enable_ttl_sweeper" => self.enable_ttl_sweeper = parse_flag(key, raw)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Number of workers to spawn for a queue of `queue_len` tasks
    ///
    /// Never zero for a non-empty queue, never more workers than tasks.
    pub fn worker_count(&self, queue_len: usize) -> usize {
        let configured = usize::try_from(self.autovacuum_max_workers).unwrap_or(1).max(1);
        configured.min(queue_len.max(1))
    }
}

fn invalid(key: &str, value: &str, reason: &str) -> DomainError {
    DomainError::InvalidSetting {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_count(key: &str, raw: &str) -> Result<i64> {
    let n: i64 = raw
        .parse()
        .map_err(|_| invalid(key, raw, "expected an integer"))?;
    if n < 0 {
        return Err(invalid(key, raw, "must be non-negative"));
    }
    Ok(n)
}

fn parse_ratio(key: &str, raw: &str) -> Result<f64> {
    let n: f64 = raw
        .parse()
        .map_err(|_| invalid(key, raw, "expected a number"))?;
    if !n.is_finite() || n < 0.0 {
        return Err(invalid(key, raw, "must be a non-negative number"));
    }
    Ok(n)
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "on" | "1" => Ok(true),
        "false" | "off" | "0" => Ok(false),
        _ => Err(invalid(key, raw, "expected true or false")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_known_keys() {
        let mut settings = Settings::default();
        assert_eq!(settings.apply("autovacuum_max_workers", "8"), Ok(true));
        assert_eq!(settings.apply("autovacuum_vacuum_scale_factor", " 0.5 "), Ok(true));
        assert_eq!(settings.apply("enable_manual_vacuum", "False"), Ok(true));
        assert_eq!(settings.apply("vacuum_schedule_hour", "22"), Ok(true));

        assert_eq!(settings.autovacuum_max_workers, 8);
        assert_eq!(settings.autovacuum_vacuum_scale_factor, 0.5);
        assert!(!settings.enable_manual_vacuum);
        assert_eq!(settings.vacuum_schedule_hour, 22);
    }

    #[test]
    fn test_legacy_window_key() {
        let mut settings = Settings::default();
        assert_eq!(settings.apply("vacuum_agressive_disable_hour", "4"), Ok(true));
        assert_eq!(settings.run_vacuum_hours, 4);
    }

    #[test]
    fn test_unknown_key_is_ignored() {
        let mut settings = Settings::default();
        assert_eq!(settings.apply("shared_buffers", "1GB"), Ok(false));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_malformed_value_keeps_previous() {
        let mut settings = Settings::default();
        settings.apply("autovacuum_vacuum_threshold", "5000").unwrap();

        let err = settings.apply("autovacuum_vacuum_threshold", "lots").unwrap_err();
        assert!(matches!(err, DomainError::InvalidSetting { .. }));
        assert_eq!(settings.autovacuum_vacuum_threshold, 5000);
    }

    #[test]
    fn test_negative_and_out_of_range_rejected() {
        let mut settings = Settings::default();
        assert!(settings.apply("tx_wraparound_vacuum", "-1").is_err());
        assert!(settings.apply("autovacuum_vacuum_scale_factor", "-0.1").is_err());
        assert!(settings.apply("vacuum_schedule_hour", "24").is_err());
        assert!(settings.apply("enable_ttl_sweeper", "maybe").is_err());
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_work_mem_above_server_limit_keeps_previous() {
        let mut settings = Settings::default();
        assert_eq!(settings.apply("maintenance_work_mem_mb", "2097151"), Ok(true));
        assert_eq!(settings.maintenance_work_mem_mb, MAX_MAINTENANCE_WORK_MEM_MB);

        assert!(settings.apply("maintenance_work_mem_mb", "2097152").is_err());
        assert_eq!(settings.maintenance_work_mem_mb, MAX_MAINTENANCE_WORK_MEM_MB);
    }

    #[test]
    fn test_worker_count_bounds() {
        let mut settings = Settings::default();
        assert_eq!(settings.worker_count(100), 5);
        assert_eq!(settings.worker_count(3), 3);
        assert_eq!(settings.worker_count(0), 1);

        settings.autovacuum_max_workers = 0;
        assert_eq!(settings.worker_count(10), 1);
    }
}
