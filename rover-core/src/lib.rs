//! Motion control and command safety for a Wi-Fi differential-drive rover on
//! no-std embedded platforms.
//!
//! For a host-side runnable build, see `rover-app/mock-mcu`.
#![no_std]

pub mod utils;
