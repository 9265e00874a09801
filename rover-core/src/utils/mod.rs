//! Utility re-exports and helper macros for the rover.
//!
//! This module re-exports the drive components, timing and the server:
//!
//! - `config`: drive constants and `DriveConfig`
//! - `connection`: HTTP / WebSocket command transports
//! - `controllers`: control loop, watchdog, intake and H-bridge drivers
//! - `math`: differential-drive mapping
//! - `frontend`: the operator control page
//!
//! The `mk_static!` macro simplifies static initialization in no-std contexts.

pub mod config;
pub mod connection;
pub mod controllers;
pub(crate) mod frontend;
pub mod math;

pub use config::DriveConfig;
pub use connection::server::run as wss;
pub use controllers::DriveController;
pub use embassy_time::*;

#[macro_export]
/// Initialize a no-std static cell and write the given value into it.
///
/// This macro creates a `static_cell::StaticCell` for type `$t` and initializes
/// it with `$val`, returning a mutable reference to the stored value.
macro_rules! mk_static {
    ($t:ty, $val:expr) => {{
        static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
        STATIC_CELL.uninit().write($val)
    }};
}
