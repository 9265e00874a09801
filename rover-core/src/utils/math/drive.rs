//! Differential-drive mapping from a joystick vector to wheel commands.
//!
//! `DifferentialDrive` turns a normalized `(x, y)` steering vector into one
//! `(direction, duty)` command per wheel. The input is first classified into a
//! single `DriveMode`, then each mode is mapped on its own:
//!
//! - `Neutral`: both wheels stopped.
//! - `Translate`: both wheels share the throttle direction; the wheel on the
//!   steering side is slowed by `(1 - |x|)` to carve an arc.
//! - `Pivot`: no throttle, both wheels at a fixed duty in opposite directions.
//!
//! # Example
//! ```rust
//! use rover_core::utils::config::DriveConfig;
//! use rover_core::utils::math::drive::{DifferentialDrive, Direction, SteeringVector};
//!
//! let drive = DifferentialDrive::new(&DriveConfig::default());
//! let wheels = drive.compute(SteeringVector::new(0.0, 1.0));
//! assert_eq!(wheels.left.direction, Direction::Forward);
//! assert_eq!(wheels.left.duty, 1023);
//! ```

use libm::{fabsf, fminf, roundf};
use serde::Deserialize;

use crate::utils::config::{DriveConfig, PivotPolarity};

/// Operator input. `x` steers (negative = left), `y` is throttle (positive = forward).
///
/// Nominally both axes lie in `[-1.0, 1.0]`; larger values are tolerated and
/// clamped on the output side.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct SteeringVector {
    pub x: f32,
    pub y: f32,
}

impl SteeringVector {
    pub const NEUTRAL: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(
        x: f32,
        y: f32,
    ) -> Self {
        Self { x, y }
    }
}

/// Rotation sense of a single wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wheel {
    Left,
    Right,
}

/// Drive signal for one H-bridge channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelCommand {
    pub direction: Direction,
    pub duty: u16,
}

impl WheelCommand {
    pub const STOP: Self = Self {
        direction: Direction::Stop,
        duty: 0,
    };

    /// A `Stop` command never carries a duty.
    pub const fn new(
        direction: Direction,
        duty: u16,
    ) -> Self {
        match direction {
            Direction::Stop => Self::STOP,
            _ => Self { direction, duty },
        }
    }

    /// Duty to put on the bridge, zero whenever the wheel is stopped.
    pub fn effective_duty(&self) -> u16 {
        match self.direction {
            Direction::Stop => 0,
            _ => self.duty,
        }
    }
}

/// Commands for both wheels, computed together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelPair {
    pub left: WheelCommand,
    pub right: WheelCommand,
}

impl WheelPair {
    pub const STOP: Self = Self {
        left: WheelCommand::STOP,
        right: WheelCommand::STOP,
    };

    pub fn is_stopped(&self) -> bool {
        self.left.effective_duty() == 0 && self.right.effective_duty() == 0
    }
}

/// Side the vehicle rotates towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    Left,
    Right,
}

/// Exactly one of these applies to any steering vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriveMode {
    /// `x == 0` and `y == 0`.
    Neutral,
    /// `y != 0`: arc or straight line. `throttle` is `|y|`.
    Translate {
        direction: Direction,
        throttle: f32,
        steer: f32,
    },
    /// `y == 0`, `x != 0`: rotate in place.
    Pivot { turn: Turn },
}

impl DriveMode {
    /// Classify a steering vector. A NaN axis reads as zero.
    pub fn classify(vector: SteeringVector) -> Self {
        let x = finite_or_zero(vector.x);
        let y = finite_or_zero(vector.y);

        if y != 0.0 {
            DriveMode::Translate {
                direction: if y > 0.0 {
                    Direction::Forward
                } else {
                    Direction::Reverse
                },
                throttle: fabsf(y),
                steer: x,
            }
        } else if x > 0.0 {
            DriveMode::Pivot { turn: Turn::Right }
        } else if x < 0.0 {
            DriveMode::Pivot { turn: Turn::Left }
        } else {
            DriveMode::Neutral
        }
    }
}

/// Stateless steering-to-wheels mapper for a two-wheeled chassis.
#[derive(Debug, Clone, Copy)]
pub struct DifferentialDrive {
    duty_max: u16,
    pivot_duty: u16,
    polarity: PivotPolarity,
}

impl DifferentialDrive {
    pub fn new(config: &DriveConfig) -> Self {
        let duty_max = config.duty_max;
        let pivot_duty = clamp_duty(
            roundf(config.pivot_duty_fraction * duty_max as f32),
            duty_max,
        );
        Self {
            duty_max,
            pivot_duty,
            polarity: config.pivot_polarity,
        }
    }

    /// Map a steering vector to wheel commands.
    pub fn compute(
        &self,
        vector: SteeringVector,
    ) -> WheelPair {
        match DriveMode::classify(vector) {
            DriveMode::Neutral => WheelPair::STOP,
            DriveMode::Translate {
                direction,
                throttle,
                steer,
            } => self.translate(direction, throttle, steer),
            DriveMode::Pivot { turn } => self.pivot(turn),
        }
    }

    fn translate(
        &self,
        direction: Direction,
        throttle: f32,
        steer: f32,
    ) -> WheelPair {
        let throttle = fminf(throttle, 1.0) * self.duty_max as f32;
        let full = clamp_duty(roundf(throttle), self.duty_max);

        // inner wheel scales the unrounded throttle, then truncates
        let (left, right) = if steer > 0.0 {
            (full, clamp_duty(throttle * (1.0 - steer), self.duty_max))
        } else if steer < 0.0 {
            (clamp_duty(throttle * (1.0 + steer), self.duty_max), full)
        } else {
            (full, full)
        };

        WheelPair {
            left: WheelCommand::new(direction, left),
            right: WheelCommand::new(direction, right),
        }
    }

    fn pivot(
        &self,
        turn: Turn,
    ) -> WheelPair {
        let forward = WheelCommand::new(Direction::Forward, self.pivot_duty);
        let reverse = WheelCommand::new(Direction::Reverse, self.pivot_duty);

        let left_leads = matches!(
            (turn, self.polarity),
            (Turn::Right, PivotPolarity::LeftForward) | (Turn::Left, PivotPolarity::RightForward)
        );

        if left_leads {
            WheelPair {
                left: forward,
                right: reverse,
            }
        } else {
            WheelPair {
                left: reverse,
                right: forward,
            }
        }
    }
}

fn finite_or_zero(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v
    }
}

/// Truncate to an integer duty inside `[0, duty_max]`. NaN maps to 0.
fn clamp_duty(
    value: f32,
    duty_max: u16,
) -> u16 {
    if !(value > 0.0) {
        0
    } else if value >= duty_max as f32 {
        duty_max
    } else {
        value as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::config::DUTY_MAX;

    fn drive() -> DifferentialDrive {
        DifferentialDrive::new(&DriveConfig::default())
    }

    fn run(
        x: f32,
        y: f32,
    ) -> WheelPair {
        drive().compute(SteeringVector::new(x, y))
    }

    #[test]
    fn test_classify_is_exhaustive() {
        assert_eq!(DriveMode::classify(SteeringVector::NEUTRAL), DriveMode::Neutral);
        assert_eq!(
            DriveMode::classify(SteeringVector::new(0.3, 0.0)),
            DriveMode::Pivot { turn: Turn::Right }
        );
        assert_eq!(
            DriveMode::classify(SteeringVector::new(-0.3, 0.0)),
            DriveMode::Pivot { turn: Turn::Left }
        );
        assert_eq!(
            DriveMode::classify(SteeringVector::new(0.2, -0.5)),
            DriveMode::Translate {
                direction: Direction::Reverse,
                throttle: 0.5,
                steer: 0.2,
            }
        );
    }

    #[test]
    fn test_straight_forward_equal_duty() {
        for &y in &[0.1f32, 0.25, 0.5, 0.75, 1.0] {
            let w = run(0.0, y);
            let expected = roundf(y * DUTY_MAX as f32) as u16;
            assert_eq!(w.left, WheelCommand::new(Direction::Forward, expected));
            assert_eq!(w.right, w.left);
        }
        assert_eq!(run(0.0, 0.5).left.duty, 512);
    }

    #[test]
    fn test_arc_right_slows_right_wheel() {
        for &(x, y) in &[(0.1f32, 0.3f32), (0.5, 1.0), (0.9, 0.6)] {
            let w = run(x, y);
            assert_eq!(w.left.direction, Direction::Forward);
            assert_eq!(w.right.direction, Direction::Forward);
            assert!(w.right.duty <= w.left.duty);
        }
        let w = run(0.5, 1.0);
        assert_eq!(w.left.duty, 1023);
        assert_eq!(w.right.duty, 511);
    }

    #[test]
    fn test_arc_inner_wheel_truncates_unrounded_throttle() {
        // 0.5 * 1023 * 0.5 = 255.75, while the straight wheel rounds 511.5 up
        let w = run(0.5, 0.5);
        assert_eq!(w.left.duty, 512);
        assert_eq!(w.right.duty, 255);

        let w = run(-0.5, 0.5);
        assert_eq!(w.left.duty, 255);
        assert_eq!(w.right.duty, 512);
    }

    #[test]
    fn test_arc_left_slows_left_wheel() {
        let w = run(-0.5, 1.0);
        assert_eq!(w.left.duty, 511);
        assert_eq!(w.right.duty, 1023);
    }

    #[test]
    fn test_full_steer_cuts_inner_wheel() {
        let w = run(1.0, 0.7);
        assert_eq!(w.right.duty, 0);
        assert_eq!(w.right.direction, Direction::Forward);
        assert_eq!(w.left.duty, roundf(0.7 * DUTY_MAX as f32) as u16);
    }

    #[test]
    fn test_reverse_mirrors_forward() {
        let fwd = run(0.4, 0.8);
        let rev = run(0.4, -0.8);
        assert_eq!(rev.left.direction, Direction::Reverse);
        assert_eq!(rev.right.direction, Direction::Reverse);
        assert_eq!(rev.left.duty, fwd.left.duty);
        assert_eq!(rev.right.duty, fwd.right.duty);
    }

    #[test]
    fn test_neutral_stops_both() {
        let d = drive();
        let _ = d.compute(SteeringVector::new(1.0, 1.0));
        let w = d.compute(SteeringVector::NEUTRAL);
        assert_eq!(w, WheelPair::STOP);
        assert!(w.is_stopped());
    }

    #[test]
    fn test_pivot_fixed_duty_opposite_directions() {
        let expected = roundf(0.8 * DUTY_MAX as f32) as u16;
        assert_eq!(expected, 818);

        let right = run(0.5, 0.0);
        assert_eq!(right.left, WheelCommand::new(Direction::Forward, expected));
        assert_eq!(right.right, WheelCommand::new(Direction::Reverse, expected));

        let left = run(-0.5, 0.0);
        assert_eq!(left.left, WheelCommand::new(Direction::Reverse, expected));
        assert_eq!(left.right, WheelCommand::new(Direction::Forward, expected));

        // binary: magnitude of x does not matter
        assert_eq!(run(0.05, 0.0), right);
    }

    #[test]
    fn test_pivot_polarity_is_configurable() {
        let mut cfg = DriveConfig::default();
        cfg.pivot_polarity = PivotPolarity::RightForward;
        let d = DifferentialDrive::new(&cfg);
        let w = d.compute(SteeringVector::new(0.5, 0.0));
        assert_eq!(w.left.direction, Direction::Reverse);
        assert_eq!(w.right.direction, Direction::Forward);
    }

    #[test]
    fn test_idempotent() {
        let d = drive();
        let v = SteeringVector::new(-0.3, 0.6);
        assert_eq!(d.compute(v), d.compute(v));
    }

    #[test]
    fn test_out_of_range_clamps() {
        let w = run(0.0, 1.0);
        assert_eq!(w.left.duty, DUTY_MAX);

        let w = run(0.0, -3.0);
        assert_eq!(w.left, WheelCommand::new(Direction::Reverse, DUTY_MAX));

        let w = run(2.0, 1.5);
        assert_eq!(w.left.duty, DUTY_MAX);
        assert_eq!(w.right.duty, 0);

        let w = run(-1.0, -1.0);
        assert_eq!(w.left.duty, 0);
        assert_eq!(w.right.duty, DUTY_MAX);
    }

    #[test]
    fn test_nan_reads_as_zero() {
        assert_eq!(run(f32::NAN, f32::NAN), WheelPair::STOP);
        let w = run(f32::NAN, 1.0);
        assert_eq!(w.left.duty, w.right.duty);
    }

    #[test]
    fn test_stop_command_drops_duty() {
        let cmd = WheelCommand::new(Direction::Stop, 500);
        assert_eq!(cmd, WheelCommand::STOP);
        let raw = WheelCommand {
            direction: Direction::Stop,
            duty: 500,
        };
        assert_eq!(raw.effective_duty(), 0);
    }
}
