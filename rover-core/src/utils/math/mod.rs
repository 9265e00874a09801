//! Math utilities for the rover.
//!
//! This module provides the differential-drive mapping from joystick input to
//! per-wheel drive commands.

pub mod drive;
