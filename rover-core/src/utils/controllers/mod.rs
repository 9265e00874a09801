//! Module Exports
//!
//! This file exports the drive control loop and the modules it ties together.
//!
//! - `bridge`: H-bridge actuation ports (PWM pins or PCA9685 over I2C).
//! - `intake`: command signal shared with the network transports.
//! - `watchdog`: stale-command detection.

pub mod bridge;
pub mod intake;
pub mod watchdog;

use embassy_time::{with_timeout, Instant};

pub use bridge::{ActuationPort, Pca9685Bridge, PwmBridge};
pub use intake::{submit, TimedCommand, DRIVE_SIGNAL};
pub use watchdog::{CommandWatchdog, WatchdogState};

use crate::utils::{
    config::DriveConfig,
    math::drive::{DifferentialDrive, SteeringVector, WheelPair},
};

/// The control loop: owns the watchdog, the motion mapping and the actuation port.
///
/// Every tick it applies any fresh command, then checks the watchdog. A stale
/// watchdog re-applies stop on every tick until a new command arrives.
pub struct DriveController<P> {
    port: P,
    drive: DifferentialDrive,
    watchdog: CommandWatchdog,
    config: DriveConfig,
    last_applied: WheelPair,
}

impl<P> DriveController<P>
where
    P: ActuationPort,
{
    /// Build the loop and put the wheels in a known stopped state.
    pub fn new(
        mut port: P,
        config: DriveConfig,
    ) -> Self {
        port.apply_pair(&WheelPair::STOP);
        Self {
            port,
            drive: DifferentialDrive::new(&config),
            watchdog: CommandWatchdog::new(config.watchdog_timeout),
            config,
            last_applied: WheelPair::STOP,
        }
    }

    pub fn watchdog(&self) -> &CommandWatchdog {
        &self.watchdog
    }

    /// Wheel commands most recently written to the port.
    pub fn last_applied(&self) -> WheelPair {
        self.last_applied
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    /// Accept a command: reset the watchdog and drive the wheels.
    pub fn on_command(
        &mut self,
        vector: SteeringVector,
        received_at: Instant,
    ) -> WheelPair {
        self.watchdog.feed(received_at);
        let wheels = self.drive.compute(vector);
        self.apply(wheels);
        wheels
    }

    /// Watchdog check for one tick. Returns `true` if stop was forced.
    pub fn tick(
        &mut self,
        now: Instant,
    ) -> bool {
        let (state, changed) = self.watchdog.check(now);
        if changed {
            match state {
                WatchdogState::Stale => tracing::debug!("command stream stale, holding stop"),
                WatchdogState::Fresh => tracing::debug!("command stream resumed"),
            }
        }

        match state {
            WatchdogState::Stale => {
                let stop = self.drive.compute(SteeringVector::NEUTRAL);
                self.apply(stop);
                true
            }
            WatchdogState::Fresh => false,
        }
    }

    fn apply(
        &mut self,
        wheels: WheelPair,
    ) {
        self.port.apply_pair(&wheels);
        self.last_applied = wheels;
    }

    /// Run the control loop forever, fed by `DRIVE_SIGNAL`.
    pub async fn run(&mut self) -> ! {
        tracing::info!(
            tick_ms = self.config.tick_period.as_millis(),
            timeout_ms = self.config.watchdog_timeout.as_millis(),
            "drive loop started"
        );
        loop {
            if let Ok(cmd) = with_timeout(self.config.tick_period, DRIVE_SIGNAL.wait()).await {
                self.on_command(cmd.vector, cmd.received_at);
            }
            self.tick(Instant::now());
        }
    }
}
