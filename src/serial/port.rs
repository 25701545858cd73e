//! Serial port configuration and connection management
//!
//! Opens the telemetry radio's serial port and reads newline-terminated
//! text from it with timeout-bounded blocking reads.

use anyhow::{Context, Result};
use std::io::Read;
use std::time::Duration;

/// Baud rate used for the radio link. Framing (8N1, no flow control) is
/// left at the library defaults.
pub const LINK_BAUD: u32 = 9600;

/// Configuration for the serial port connection
#[derive(Debug, Clone)]
pub struct PortConfig {
    /// Serial port path (e.g., COM18, /dev/ttyUSB0)
    pub port_path: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Read timeout
    pub timeout: Duration,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            port_path: String::from("COM18"),
            baud_rate: LINK_BAUD,
            timeout: Duration::from_secs(1),
        }
    }
}

impl PortConfig {
    /// Create a new configuration for the given port with default settings
    pub fn new(port_path: &str) -> Self {
        Self {
            port_path: port_path.to_string(),
            ..Default::default()
        }
    }

    /// Set the baud rate
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set the read timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Wrapper around the open serial port
pub struct SerialConnection {
    port: Box<dyn serialport::SerialPort>,
    config: PortConfig,
}

impl SerialConnection {
    /// Open a serial connection with the given configuration
    pub fn open(config: PortConfig) -> Result<Self> {
        let port = serialport::new(&config.port_path, config.baud_rate)
            .timeout(config.timeout)
            .open()
            .with_context(|| format!("Failed to open serial port: {}", config.port_path))?;

        Ok(Self { port, config })
    }

    /// Get the port configuration
    pub fn config(&self) -> &PortConfig {
        &self.config
    }

    /// Read one line from the serial port.
    ///
    /// Returns `Ok(None)` when the read timed out with nothing buffered.
    /// The trailing `\n` (and any `\r` before it) is kept in the returned
    /// text; the logger decides how much terminator to strip.
    pub fn read_line(&mut self) -> Result<Option<String>> {
        read_line_raw(&mut self.port)
    }
}

/// Accumulate bytes from `reader` until a `\n` arrives (kept in the
/// result), the read times out, or the stream ends.
///
/// A timeout or end-of-stream with nothing buffered yields `Ok(None)`; a
/// timeout mid-line yields the partial text. An interrupted syscall is
/// treated like a timeout so a SIGINT while blocked in `read` funnels back
/// to the caller's loop instead of surfacing as an error. The bytes must
/// be valid UTF-8; anything else is an error.
pub fn read_line_raw<R: Read>(reader: &mut R) -> Result<Option<String>> {
    let mut buffer = Vec::new();
    let mut byte = [0u8; 1];

    loop {
        match reader.read(&mut byte) {
            Ok(1) => {
                buffer.push(byte[0]);
                if byte[0] == b'\n' {
                    break;
                }
            }
            Ok(_) => {
                if buffer.is_empty() {
                    return Ok(None);
                }
                break;
            }
            Err(ref e)
                if e.kind() == std::io::ErrorKind::TimedOut
                    || e.kind() == std::io::ErrorKind::Interrupted =>
            {
                if buffer.is_empty() {
                    return Ok(None);
                }
                break;
            }
            Err(e) => return Err(e).with_context(|| "Failed to read from serial port"),
        }
    }

    let line = String::from_utf8(buffer).with_context(|| "Received malformed UTF-8 on link")?;
    Ok(Some(line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io;

    /// io::Read that replays a script of byte chunks and errors
    struct ScriptedReader {
        script: VecDeque<io::Result<Vec<u8>>>,
    }

    impl ScriptedReader {
        fn new(script: Vec<io::Result<Vec<u8>>>) -> Self {
            Self {
                script: script.into(),
            }
        }
    }

    impl Read for ScriptedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.script.pop_front() {
                Some(Ok(bytes)) => {
                    let n = bytes.len().min(buf.len());
                    buf[..n].copy_from_slice(&bytes[..n]);
                    if n < bytes.len() {
                        self.script.push_front(Ok(bytes[n..].to_vec()));
                    }
                    Ok(n)
                }
                Some(Err(e)) => Err(e),
                None => Ok(0),
            }
        }
    }

    fn timeout() -> io::Result<Vec<u8>> {
        Err(io::Error::new(io::ErrorKind::TimedOut, "timed out"))
    }

    #[test]
    fn test_default_config() {
        let config = PortConfig::default();
        assert_eq!(config.port_path, "COM18");
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_config_builder() {
        let config = PortConfig::new("/dev/ttyUSB0")
            .with_baud_rate(115200)
            .with_timeout(Duration::from_millis(100));

        assert_eq!(config.port_path, "/dev/ttyUSB0");
        assert_eq!(config.baud_rate, 115200);
        assert_eq!(config.timeout, Duration::from_millis(100));
    }

    #[test]
    fn test_read_line_keeps_terminator() {
        let mut reader = ScriptedReader::new(vec![Ok(b"Altitude: 100m\r\n".to_vec())]);
        let line = read_line_raw(&mut reader).unwrap();
        assert_eq!(line.as_deref(), Some("Altitude: 100m\r\n"));
    }

    #[test]
    fn test_read_line_timeout_empty() {
        let mut reader = ScriptedReader::new(vec![timeout()]);
        assert_eq!(read_line_raw(&mut reader).unwrap(), None);
    }

    #[test]
    fn test_read_line_timeout_mid_line_returns_partial() {
        let mut reader = ScriptedReader::new(vec![Ok(b"Altit".to_vec()), timeout()]);
        let line = read_line_raw(&mut reader).unwrap();
        assert_eq!(line.as_deref(), Some("Altit"));
    }

    #[test]
    fn test_read_line_stops_at_newline() {
        let mut reader = ScriptedReader::new(vec![Ok(b"one\r\ntwo\r\n".to_vec())]);
        assert_eq!(
            read_line_raw(&mut reader).unwrap().as_deref(),
            Some("one\r\n")
        );
        assert_eq!(
            read_line_raw(&mut reader).unwrap().as_deref(),
            Some("two\r\n")
        );
    }

    #[test]
    fn test_read_line_end_of_stream() {
        let mut reader = ScriptedReader::new(vec![]);
        assert_eq!(read_line_raw(&mut reader).unwrap(), None);
    }

    #[test]
    fn test_read_line_interrupted_treated_as_timeout() {
        let mut reader = ScriptedReader::new(vec![Err(io::Error::new(
            io::ErrorKind::Interrupted,
            "interrupted",
        ))]);
        assert_eq!(read_line_raw(&mut reader).unwrap(), None);
    }

    #[test]
    fn test_read_line_rejects_malformed_utf8() {
        let mut reader = ScriptedReader::new(vec![Ok(vec![0xff, 0xfe, b'\n'])]);
        assert!(read_line_raw(&mut reader).is_err());
    }
}
