//! LoRa Ground Logger
//!
//! Ground-station companion for a LoRa radiosonde link: reads
//! newline-terminated XDATA telemetry lines from the serial-attached
//! radio, timestamps each, echoes it to the console, and appends it to a
//! per-run log file named after the startup date and time.
//!
//! All link parameters are fixed constants. Any failure inside the
//! logging loop (radio unplugged, decode error, file write error) and any
//! Ctrl+C land on the same boundary: a fixed exit message, a flushed log
//! file, and a clean exit. Only a startup failure (port or file cannot be
//! opened) exits non-zero.

mod interrupt;
mod logger;
mod serial;

use anyhow::Result;
use std::time::Duration;

use logger::{LinkLogger, LoggerConfig};
use serial::{PortConfig, SerialConnection};

/// Serial device the radio is attached to
const LINK_PORT: &str = "COM18";

/// Read timeout for the serial link; also bounds Ctrl+C latency
const READ_TIMEOUT: Duration = Duration::from_secs(1);

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    interrupt::install()?;

    // Startup failures propagate: no port or no file means nothing to log
    let connection = SerialConnection::open(PortConfig::new(LINK_PORT).with_timeout(READ_TIMEOUT))?;
    let mut logger = LinkLogger::start(connection, LoggerConfig::default())?;

    // Single exit boundary: any loop failure or an interrupt ends the run
    // with the same fixed message and a flushed, closed file
    if let Err(e) = logger.run() {
        log::debug!("logging loop terminated: {e:#}");
    }

    println!("\nExiting and closing file");
    drop(logger);

    Ok(())
}
