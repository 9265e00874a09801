//! Module Exports
//!
//! This file exports the key modules used by the operator-facing server.
//!
//! # Modules
//! - `server`: routes the control page, `/joy` polling and the drive WebSocket.

/// Module for the HTTP / WebSocket server and its request extractors.
pub mod server;
