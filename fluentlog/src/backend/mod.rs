//! # Backend Module
//!
//! The seam between the logging frontend and whatever consumes records.
//!
//! Backends are shared across threads and must be internally
//! thread-safe. A backend may fail its `log` call; the write path then
//! gives it one chance to handle the failure, and only the
//! [`LoggingException`] sentinel can escape the core from there.


use std::error::Error;
use std::fmt;

use crate::level::Level;
use crate::log_data::LogData;

/// Error type at the backend boundary.
pub type BackendError = Box<dyn Error + Send + Sync>;

/// The one error that is allowed to escape the logging core.
///
/// When `handle_error` returns this sentinel the write path re-raises
/// it instead of swallowing; everything else is reported to the
/// diagnostic stream and absorbed.
#[derive(Debug, Clone)]
pub struct LoggingException {
  message: String,
}

impl LoggingException {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
    }
  }

  pub fn message(&self) -> &str {
    &self.message
  }
}

impl fmt::Display for LoggingException {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "logging exception: {}", self.message)
  }
}

impl Error for LoggingException {}

/// A sink for finished log records.
pub trait LoggerBackend: Send + Sync {
  /// The name records are attributed to (usually the logger name).
  fn name(&self) -> &str;

  /// Level filtering; statements below this are discarded before any
  /// work happens, unless forced.
  fn is_loggable(&self, level: Level) -> bool;

  /// Deliver one record. May fail.
  fn log(&self, data: &LogData) -> Result<(), BackendError>;

  /// Second stage for a failed `log` call. The default rethrows, which
  /// makes the write path report the error and carry on.
  fn handle_error(&self, error: BackendError, _data: &LogData) -> Result<(), BackendError> {
    Err(error)
  }
}
