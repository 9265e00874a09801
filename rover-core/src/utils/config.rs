//! Drive tuning constants and the runtime `DriveConfig`.
//!
//! Everything here is compile-time defaults; nothing is persisted. A
//! `DriveConfig` is handed to the control loop once at startup.

use embassy_time::Duration;

/// Hardware PWM ceiling (10-bit resolution).
pub const DUTY_MAX: u16 = 1023;

/// A command older than this forces both wheels to stop.
pub const WATCHDOG_TIMEOUT_MS: u64 = 400;

/// Share of `DUTY_MAX` used for in-place pivot turns.
pub const PIVOT_DUTY_FRACTION: f32 = 0.8;

/// Control loop period.
pub const DEFAULT_TICK_MS: u64 = 20;

/// Which wheel runs forward when pivoting to the right.
///
/// This depends on how the motors are wired to the H-bridges, so it is a
/// calibration value rather than part of the control law.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PivotPolarity {
    /// Right pivot: left wheel forward, right wheel reverse.
    #[default]
    LeftForward,
    /// Right pivot: right wheel forward, left wheel reverse.
    RightForward,
}

/// Tunables for the motion controller and the command watchdog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveConfig {
    pub duty_max: u16,
    pub pivot_duty_fraction: f32,
    pub pivot_polarity: PivotPolarity,
    pub watchdog_timeout: Duration,
    pub tick_period: Duration,
}

impl DriveConfig {
    /// Build a config, falling back to the defaults for any `None`.
    pub fn new(
        duty_max: Option<u16>,
        pivot_duty_fraction: Option<f32>,
        pivot_polarity: Option<PivotPolarity>,
        watchdog_timeout_ms: Option<u64>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            duty_max: duty_max.unwrap_or(defaults.duty_max),
            pivot_duty_fraction: pivot_duty_fraction.unwrap_or(defaults.pivot_duty_fraction),
            pivot_polarity: pivot_polarity.unwrap_or(defaults.pivot_polarity),
            watchdog_timeout: watchdog_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.watchdog_timeout),
            tick_period: defaults.tick_period,
        }
    }

    pub fn with_tick_period(
        mut self,
        tick_period: Duration,
    ) -> Self {
        self.tick_period = tick_period;
        self
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            duty_max: DUTY_MAX,
            pivot_duty_fraction: PIVOT_DUTY_FRACTION,
            pivot_polarity: PivotPolarity::default(),
            watchdog_timeout: Duration::from_millis(WATCHDOG_TIMEOUT_MS),
            tick_period: Duration::from_millis(DEFAULT_TICK_MS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_fall_back_to_defaults() {
        let cfg = DriveConfig::new(Some(255), None, Some(PivotPolarity::RightForward), None);
        assert_eq!(cfg.duty_max, 255);
        assert_eq!(cfg.pivot_duty_fraction, PIVOT_DUTY_FRACTION);
        assert_eq!(cfg.pivot_polarity, PivotPolarity::RightForward);
        assert_eq!(cfg.watchdog_timeout, Duration::from_millis(WATCHDOG_TIMEOUT_MS));
    }

    #[test]
    fn test_tick_period_override() {
        let cfg = DriveConfig::default();
        assert_eq!(cfg.tick_period, Duration::from_millis(DEFAULT_TICK_MS));
        let cfg = cfg.with_tick_period(Duration::from_millis(5));
        assert_eq!(cfg.tick_period, Duration::from_millis(5));
        assert_eq!(cfg.watchdog_timeout, Duration::from_millis(WATCHDOG_TIMEOUT_MS));
    }
}
