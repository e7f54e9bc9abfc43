//! # Stderr Backend Module
//!
//! Minimal human-readable backend; the default platform hands this out
//! so the crate works without any setup.

use chrono::DateTime;
use std::io::{self, Write};
use std::sync::Mutex;

use crate::backend::{BackendError, LoggerBackend};
use crate::formatter;
use crate::level::Level;
use crate::log_data::LogData;

const RESET: &str = "\x1b[0m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const BLUE: &str = "\x1b[34m";
const CYAN: &str = "\x1b[36m";

pub struct StderrBackend {
  name: String,
  min_level: Level,
  buffer: Mutex<String>,
}

impl StderrBackend {
  pub fn new(name: impl Into<String>) -> Self {
    Self::with_min_level(name, Level::Info)
  }

  pub fn with_min_level(name: impl Into<String>, min_level: Level) -> Self {
    Self {
      name: name.into(),
      min_level,
      buffer: Mutex::new(String::with_capacity(256)),
    }
  }
}

fn color_level(level: Level) -> String {
  let color = match level {
    Level::Error => RED,
    Level::Warn => YELLOW,
    Level::Info => GREEN,
    Level::Debug => BLUE,
    Level::Trace => CYAN,
  };
  format!("{}[{}]{}", color, level.as_str(), RESET)
}

impl LoggerBackend for StderrBackend {
  fn name(&self) -> &str {
    &self.name
  }

  fn is_loggable(&self, level: Level) -> bool {
    level >= self.min_level
  }

  fn log(&self, data: &LogData) -> Result<(), BackendError> {
    let message = formatter::format(data).map_err(|e| Box::new(e) as BackendError)?;

    let timestamp = data.timestamp_nanos();
    let date_time = DateTime::from_timestamp(
      timestamp.div_euclid(1_000_000_000),
      timestamp.rem_euclid(1_000_000_000) as u32,
    )
    .unwrap_or_default();

    let mut buf = match self.buffer.lock() {
      Ok(buf) => buf,
      Err(poisoned) => poisoned.into_inner(),
    };
    buf.clear();

    {
      use std::fmt::Write as FmtWrite;
      let _ = write!(
        buf,
        "{}[{}]{} {} {} {}: {}",
        GREEN,
        date_time.format("%H:%M:%S%.3f"),
        RESET,
        color_level(data.level()),
        data.logger_name(),
        data.log_site(),
        message,
      );
    }
    formatter::append_metadata_suffix(&mut buf, data.scope_metadata(), data.metadata());
    buf.push('\n');

    io::stderr().write_all(buf.as_bytes())?;
    Ok(())
  }
}
