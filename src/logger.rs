//! XDATA link logger
//!
//! The single component of the ground station: owns the serial connection
//! and the per-run log file, and runs the read-print-write loop. Each line
//! received from the radio becomes one [`Record`] that is rendered
//! identically to the console and the log file.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveTime};
use colored::Colorize;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::interrupt;
use crate::serial::SerialConnection;

/// Trailing characters stripped from each received line, assuming a CR+LF
/// terminator. Known fragility inherited from the original deployment: the
/// strip is a fixed-offset truncation, not terminator detection, so a line
/// terminated any other way truncates incorrectly.
pub const DEFAULT_TERMINATOR_STRIP: usize = 2;

/// Something the logger can pull telemetry lines from.
///
/// `Ok(None)` means a read timeout with no data; the loop skips the
/// iteration. The serial connection is the production implementation;
/// tests substitute scripted sources.
pub trait LineSource {
    fn next_line(&mut self) -> Result<Option<String>>;
}

impl LineSource for SerialConnection {
    fn next_line(&mut self) -> Result<Option<String>> {
        self.read_line()
    }
}

/// Configuration for the link logger
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Directory the log file is created in
    pub log_dir: PathBuf,
    /// Number of trailing characters stripped from each line
    pub terminator_strip: usize,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("."),
            terminator_strip: DEFAULT_TERMINATOR_STRIP,
        }
    }
}

/// One timestamped line of received telemetry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Wall-clock receipt time, whole seconds
    pub time: NaiveTime,
    /// Line text with the terminator characters stripped
    pub payload: String,
}

impl Record {
    /// Build a record from a raw line, stamped with the current time
    pub fn capture(raw: &str, terminator_strip: usize) -> Self {
        Self::at(Local::now().time(), raw, terminator_strip)
    }

    /// Build a record with an explicit receipt time
    pub fn at(time: NaiveTime, raw: &str, terminator_strip: usize) -> Self {
        Self {
            time,
            payload: strip_trailing_chars(raw, terminator_strip),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.time.format("%H:%M:%S"), self.payload)
    }
}

/// Drop exactly `n` characters from the end of `line`.
///
/// A line shorter than `n` characters collapses to the empty string,
/// matching the historical fixed-offset truncation.
fn strip_trailing_chars(line: &str, n: usize) -> String {
    let keep = line.chars().count().saturating_sub(n);
    line.chars().take(keep).collect()
}

/// The ground-station link logger.
///
/// Owns the line source and the log file for the lifetime of the run;
/// dropping it flushes and closes the file, on every exit path.
pub struct LinkLogger<S: LineSource> {
    source: S,
    writer: BufWriter<File>,
    file_path: PathBuf,
    terminator_strip: usize,
}

impl<S: LineSource> LinkLogger<S> {
    /// Create the per-run log file, write its header, and print the
    /// startup banner. Fails if the file cannot be created.
    pub fn start(source: S, config: LoggerConfig) -> Result<Self> {
        Self::start_at(source, config, Local::now())
    }

    fn start_at(source: S, config: LoggerConfig, started: DateTime<Local>) -> Result<Self> {
        let date = started.format("%d-%b-%y").to_string();
        // Colons are invalid in filenames on some platforms
        let start_time = started.format("%H-%M-%S").to_string();
        let file_name = format!("lora_data_{date}_{start_time}.txt");
        let file_path = config.log_dir.join(&file_name);

        let file = File::create(&file_path)
            .with_context(|| format!("Failed to create log file: {}", file_path.display()))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "XDATA Log {date}")
            .with_context(|| "Failed to write log file header")?;

        println!();
        println!("{}   {}", "Startup:".cyan().bold(), date);
        println!("{} {}", "Data File:".cyan().bold(), file_name.white());
        println!();

        Ok(Self {
            source,
            writer,
            file_path,
            terminator_strip: config.terminator_strip,
        })
    }

    /// Path of the log file this run writes to
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Run the read-print-write loop until a read or write fails or an
    /// interrupt is requested. Timeouts with no data skip the iteration.
    pub fn run(&mut self) -> Result<()> {
        while !interrupt::triggered() {
            let Some(line) = self.source.next_line()? else {
                continue;
            };

            let record = Record::capture(&line, self.terminator_strip);
            println!("{record}");
            writeln!(self.writer, "{record}")
                .with_context(|| "Failed to write record to log file")?;
        }

        log::debug!("interrupt requested, leaving logging loop");
        Ok(())
    }
}

impl<S: LineSource> Drop for LinkLogger<S> {
    fn drop(&mut self) {
        // Flush whatever the run buffered so the file is readable even
        // when the loop ended on an error path
        let _ = self.writer.flush();
    }
}
