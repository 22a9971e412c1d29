//! Mode Selector - decides which maintenance modes a cycle runs
//!
//! Policy, evaluated in this order:
//! 1. inside the aggressive window: CONFIGURE_AGGRESSIVE, otherwise RESET_DEFAULT
//! 2. database age at or past the wraparound threshold: CONFIGURE_AGGRESSIVE
//!    then RUN_VACUUM, whatever the hour
//! 3. inside the window with manual vacuum enabled: RUN_VACUUM

use crate::domain::{Mode, Settings};

/// Whether `hour` falls in `[start, start + duration)` modulo 24
///
/// A zero-length window is never active; a window of 24 hours or more
/// always is.
pub fn aggressive_window_active(hour: u32, start: u32, duration: u32) -> bool {
    if duration == 0 {
        return false;
    }
    if duration >= 24 {
        return true;
    }
    let end = (start + duration) % 24;
    if start < end {
        hour >= start && hour < end
    } else {
        // Window wraps past midnight
        hour >= start || hour < end
    }
}

/// Ordered list of modes to execute this cycle
pub fn select_modes(hour: u32, settings: &Settings, max_database_age: i64) -> Vec<Mode> {
    let in_window = aggressive_window_active(
        hour,
        settings.vacuum_schedule_hour,
        settings.run_vacuum_hours,
    );

    let mut modes = Vec::with_capacity(3);
    if in_window {
        modes.push(Mode::ConfigureAggressive);
    } else {
        modes.push(Mode::ResetDefault);
    }

    if max_database_age >= settings.tx_wraparound_vacuum {
        modes.push(Mode::ConfigureAggressive);
        modes.push(Mode::RunVacuum);
    }

    if in_window && settings.enable_manual_vacuum {
        modes.push(Mode::RunVacuum);
    }

    modes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(hour: u32, start: u32, duration: u32) -> bool {
        duration >= 24 || (hour + 24 - start) % 24 < duration
    }

    fn window(start: u32, duration: u32, manual: bool) -> Settings {
        Settings {
            vacuum_schedule_hour: start,
            run_vacuum_hours: duration,
            enable_manual_vacuum: manual,
            ..Settings::default()
        }
    }

    #[test]
    fn test_window_matches_modular_reference() {
        for start in 0..24 {
            for duration in 0..=26 {
                for hour in 0..24 {
                    assert_eq!(
                        aggressive_window_active(hour, start, duration),
                        reference(hour, start, duration),
                        "hour={} start={} duration={}",
                        hour,
                        start,
                        duration
                    );
                }
            }
        }
    }

    #[test]
    fn test_window_wraps_past_midnight() {
        // 22:00 for six hours -> 22, 23, 0, 1, 2, 3
        let active: Vec<u32> = (0..24)
            .filter(|h| aggressive_window_active(*h, 22, 6))
            .collect();
        assert_eq!(active, vec![0, 1, 2, 3, 22, 23]);
    }

    #[test]
    fn test_window_includes_start_hour() {
        assert!(aggressive_window_active(0, 0, 6));
        assert!(!aggressive_window_active(6, 0, 6));
    }

    #[test]
    fn test_inside_window_configures_and_vacuums() {
        let settings = window(0, 6, true);
        assert_eq!(
            select_modes(2, &settings, 0),
            vec![Mode::ConfigureAggressive, Mode::RunVacuum]
        );
    }

    #[test]
    fn test_inside_window_without_manual_vacuum() {
        let settings = window(0, 6, false);
        assert_eq!(select_modes(2, &settings, 0), vec![Mode::ConfigureAggressive]);
    }

    #[test]
    fn test_outside_window_resets_only() {
        let settings = window(0, 6, true);
        assert_eq!(select_modes(12, &settings, 0), vec![Mode::ResetDefault]);
    }

    #[test]
    fn test_wraparound_overrides_schedule() {
        let settings = window(0, 6, true);
        let threshold = settings.tx_wraparound_vacuum;

        for hour in 0..24 {
            for age in [threshold, threshold + 1, i64::from(u32::MAX)] {
                let modes = select_modes(hour, &settings, age);
                let forced = modes
                    .windows(2)
                    .any(|w| w == [Mode::ConfigureAggressive, Mode::RunVacuum]);
                assert!(forced, "hour={} age={} modes={:?}", hour, age, modes);
            }
        }

        assert_eq!(
            select_modes(12, &settings, threshold),
            vec![Mode::ResetDefault, Mode::ConfigureAggressive, Mode::RunVacuum]
        );
        assert_eq!(
            select_modes(12, &settings, threshold - 1),
            vec![Mode::ResetDefault]
        );
    }

    #[test]
    fn test_wraparound_inside_window_runs_vacuum_twice() {
        let settings = window(0, 6, true);
        assert_eq!(
            select_modes(1, &settings, settings.tx_wraparound_vacuum),
            vec![
                Mode::ConfigureAggressive,
                Mode::ConfigureAggressive,
                Mode::RunVacuum,
                Mode::RunVacuum
            ]
        );
    }
}
