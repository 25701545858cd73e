//! Serial port communication module for the ground-station link
//!
//! This module provides functionality for:
//! - Opening the radio's serial port with a read timeout
//! - Reading newline-terminated telemetry lines as they arrive

pub mod port;

pub use port::{PortConfig, SerialConnection};
