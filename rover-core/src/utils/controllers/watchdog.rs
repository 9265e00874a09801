//! Command staleness watchdog.
//!
//! Holds the arrival time of the last accepted command. The control loop asks
//! it on every tick whether the command stream has gone stale; while it has,
//! the loop keeps forcing both wheels to stop.

use embassy_time::{Duration, Instant};

/// Result of a single watchdog check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogState {
    Fresh,
    Stale,
}

pub struct CommandWatchdog {
    timeout: Duration,
    last_command: Option<Instant>,
    state: WatchdogState,
}

impl CommandWatchdog {
    /// Starts stale: nothing may move until the first command arrives.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            last_command: None,
            state: WatchdogState::Stale,
        }
    }

    pub fn last_command(&self) -> Option<Instant> {
        self.last_command
    }

    /// Record an accepted command. Any command counts, `(0, 0)` included.
    pub fn feed(
        &mut self,
        received_at: Instant,
    ) {
        self.last_command = Some(received_at);
    }

    /// Time since the last command, zero if `now` precedes it.
    pub fn elapsed(
        &self,
        now: Instant,
    ) -> Option<Duration> {
        self.last_command
            .map(|last| now.saturating_duration_since(last))
    }

    pub fn is_stale(
        &self,
        now: Instant,
    ) -> bool {
        match self.elapsed(now) {
            Some(elapsed) => elapsed > self.timeout,
            None => true,
        }
    }

    /// Evaluate staleness at `now`.
    ///
    /// Returns the current state and whether it differs from the previous check.
    pub fn check(
        &mut self,
        now: Instant,
    ) -> (WatchdogState, bool) {
        let state = if self.is_stale(now) {
            WatchdogState::Stale
        } else {
            WatchdogState::Fresh
        };
        let changed = state != self.state;
        self.state = state;
        (state, changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Instant {
        Instant::from_millis(v)
    }

    #[test]
    fn test_stale_before_first_command() {
        let wd = CommandWatchdog::new(Duration::from_millis(400));
        assert!(wd.is_stale(ms(0)));
        assert!(wd.elapsed(ms(0)).is_none());
    }

    #[test]
    fn test_timeout_is_exclusive() {
        let mut wd = CommandWatchdog::new(Duration::from_millis(400));
        wd.feed(ms(1_000));
        assert!(!wd.is_stale(ms(1_000)));
        assert!(!wd.is_stale(ms(1_400)));
        assert!(wd.is_stale(ms(1_401)));
    }

    #[test]
    fn test_feed_resets_clock() {
        let mut wd = CommandWatchdog::new(Duration::from_millis(400));
        wd.feed(ms(0));
        assert!(wd.is_stale(ms(500)));
        wd.feed(ms(500));
        assert!(!wd.is_stale(ms(600)));
        assert_eq!(wd.elapsed(ms(600)), Some(Duration::from_millis(100)));
    }

    #[test]
    fn test_check_reports_transitions_once() {
        let mut wd = CommandWatchdog::new(Duration::from_millis(400));
        assert_eq!(wd.check(ms(0)), (WatchdogState::Stale, false));
        wd.feed(ms(10));
        assert_eq!(wd.check(ms(20)), (WatchdogState::Fresh, true));
        assert_eq!(wd.check(ms(30)), (WatchdogState::Fresh, false));
        assert_eq!(wd.check(ms(500)), (WatchdogState::Stale, true));
        assert_eq!(wd.check(ms(520)), (WatchdogState::Stale, false));
    }

    #[test]
    fn test_clock_behind_last_command_is_not_stale() {
        let mut wd = CommandWatchdog::new(Duration::from_millis(400));
        wd.feed(ms(1_000));
        assert_eq!(wd.elapsed(ms(900)), Some(Duration::from_millis(0)));
        assert!(!wd.is_stale(ms(900)));
    }
}
