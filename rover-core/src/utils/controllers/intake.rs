//! Command intake: the boundary between the network transports and the
//! control loop.
//!
//! Transports decode their payload into a `SteeringVector` and call
//! [`submit`], which stamps the arrival time and publishes it on
//! `DRIVE_SIGNAL`. The signal holds a single value, so an unconsumed command
//! is simply replaced by a newer one.

use core::fmt;

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, signal::Signal};
use embassy_time::Instant;

use crate::utils::math::drive::SteeringVector;

/// Latest command waiting for the control loop.
pub static DRIVE_SIGNAL: Signal<CriticalSectionRawMutex, TimedCommand> = Signal::new();

/// A steering vector together with its arrival time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedCommand {
    pub vector: SteeringVector,
    pub received_at: Instant,
}

/// Hand a decoded command to the control loop.
pub fn submit(vector: SteeringVector) {
    tracing::debug!(x = vector.x, y = vector.y, "drive command");
    DRIVE_SIGNAL.signal(TimedCommand {
        vector,
        received_at: Instant::now(),
    });
}

/// Reasons a socket frame is dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum IntakeError {
    /// No `,` between the two axes (or nothing before it).
    MissingSeparator,
    /// Frame looked like JSON but did not decode.
    InvalidJson,
    /// Binary frame that is not UTF-8.
    NotUtf8,
}

impl fmt::Display for IntakeError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            IntakeError::MissingSeparator => f.write_str("expected \"<x>,<y>\""),
            IntakeError::InvalidJson => f.write_str("invalid JSON steering object"),
            IntakeError::NotUtf8 => f.write_str("payload is not UTF-8"),
        }
    }
}

/// Parse one axis, reading anything unparseable as `0.0`.
///
/// A bad axis must mean "no movement", never "keep the previous value".
pub fn parse_axis(raw: &str) -> f32 {
    match raw.trim().parse::<f32>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Decode the socket form `"<x>,<y>"`.
pub fn parse_pair(text: &str) -> Result<SteeringVector, IntakeError> {
    match text.split_once(',') {
        Some((x, y)) if !x.is_empty() => Ok(SteeringVector::new(parse_axis(x), parse_axis(y))),
        _ => Err(IntakeError::MissingSeparator),
    }
}

/// Decode `{"x": .., "y": ..}`; a missing field is `0.0`.
pub fn parse_json(text: &str) -> Result<SteeringVector, IntakeError> {
    let vector: SteeringVector =
        serde_json::from_str(text).map_err(|_| IntakeError::InvalidJson)?;
    Ok(SteeringVector::new(
        parse_finite(vector.x),
        parse_finite(vector.y),
    ))
}

/// Decode a WebSocket text frame in either accepted format.
pub fn decode_message(text: &str) -> Result<SteeringVector, IntakeError> {
    let trimmed = text.trim();
    if trimmed.starts_with('{') {
        parse_json(trimmed)
    } else {
        parse_pair(trimmed)
    }
}

/// Decode a WebSocket binary frame by treating it as text.
pub fn decode_bytes(data: &[u8]) -> Result<SteeringVector, IntakeError> {
    let text = core::str::from_utf8(data).map_err(|_| IntakeError::NotUtf8)?;
    decode_message(text)
}

fn parse_finite(v: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}
