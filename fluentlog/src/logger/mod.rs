//! # Logger Module
//!
//! The user-facing logger and the guarded write path.
//!
//! `FluentLogger::at(level)` starts the fluent chain; when the
//! statement is disabled and not forced it returns the no-op facade and
//! no further work happens. The write path is protected by a
//! thread-local recursion counter (a backend that logs from inside its
//! own `log` call cannot recurse more than
//! [`MAX_ALLOWED_RECURSION_DEPTH`] deep) and by the two-stage backend
//! error handler; only the [`LoggingException`] sentinel can escape.

mod __test__;

use std::cell::Cell;
use std::panic::Location;
use std::sync::Arc;

use crate::backend::{LoggerBackend, LoggingException};
use crate::context::{LogBuilder, LogContext};
use crate::error;
use crate::level::Level;
use crate::log_data::LogData;
use crate::platform::{default_platform, Platform};
use crate::rate_limit::RateLimitRegistry;

/// Hard bound on nested `write` calls per thread.
pub const MAX_ALLOWED_RECURSION_DEPTH: u32 = 100;

thread_local! {
  static RECURSION_DEPTH: Cell<u32> = const { Cell::new(0) };
}

/// Shared logger state; the fluent context borrows this for the
/// duration of one statement.
pub(crate) struct LoggerInner {
  pub(crate) name: String,
  pub(crate) backend: Arc<dyn LoggerBackend>,
  pub(crate) platform: Arc<dyn Platform>,
  pub(crate) limits: RateLimitRegistry,
}

impl LoggerInner {
  /// Delivers one record to the backend.
  ///
  /// The depth counter is restored on every exit path by the drop
  /// guard, including unwinds out of the backend.
  pub(crate) fn write(&self, data: &LogData) {
    struct DepthGuard;
    impl Drop for DepthGuard {
      fn drop(&mut self) {
        RECURSION_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
      }
    }

    let depth = RECURSION_DEPTH.with(|depth| {
      let next = depth.get() + 1;
      depth.set(next);
      next
    });
    let _guard = DepthGuard;

    if depth > MAX_ALLOWED_RECURSION_DEPTH {
      error::report_recursion(data);
      return;
    }

    if let Err(log_error) = self.backend.log(data) {
      match self.backend.handle_error(log_error, data) {
        Ok(()) => {},
        Err(handler_error) => match handler_error.downcast::<LoggingException>() {
          // The sentinel is the one sanctioned escape from the core.
          Ok(sentinel) => std::panic::panic_any(*sentinel),
          Err(other) => error::report("backend error handler failed", other.as_ref()),
        },
      }
    }
  }
}

/// A named logger bound to a backend and platform.
///
/// Cheap to clone; clones share per-site limiter state.
#[derive(Clone)]
pub struct FluentLogger {
  inner: Arc<LoggerInner>,
}

impl FluentLogger {
  /// Creates a logger whose backend comes from the platform.
  pub fn new(name: impl Into<String>, platform: Arc<dyn Platform>) -> Self {
    let name = name.into();
    let backend = platform.backend(&name);
    Self::with_backend(name, backend, platform)
  }

  /// Creates a logger with an explicit backend (used heavily in tests).
  pub fn with_backend(
    name: impl Into<String>,
    backend: Arc<dyn LoggerBackend>,
    platform: Arc<dyn Platform>,
  ) -> Self {
    Self {
      inner: Arc::new(LoggerInner {
        name: name.into(),
        backend,
        platform,
        limits: RateLimitRegistry::new(),
      }),
    }
  }

  /// Convenience constructor on the shared default platform.
  pub fn create(name: impl Into<String>) -> Self {
    let platform: Arc<dyn Platform> = default_platform();
    Self::new(name, platform)
  }

  pub fn name(&self) -> &str {
    &self.inner.name
  }

  pub(crate) fn inner(&self) -> &LoggerInner {
    self.inner.as_ref()
  }

  /// Starts a fluent statement at `level`. Returns the no-op facade
  /// when the level is disabled and the data provider does not force
  /// logging.
  #[track_caller]
  pub fn at(&self, level: Level) -> LogBuilder<'_> {
    let enabled = self.inner.backend.is_loggable(level);
    let forced = self
      .inner
      .platform
      .data_provider()
      .should_force_logging(&self.inner.name, level, enabled);
    if !enabled && !forced {
      return LogBuilder::NoOp;
    }
    LogBuilder::active(LogContext::new(
      self.inner.as_ref(),
      level,
      Location::caller(),
      forced,
    ))
  }

  #[track_caller]
  pub fn at_error(&self) -> LogBuilder<'_> {
    self.at(Level::Error)
  }

  #[track_caller]
  pub fn at_warn(&self) -> LogBuilder<'_> {
    self.at(Level::Warn)
  }

  #[track_caller]
  pub fn at_info(&self) -> LogBuilder<'_> {
    self.at(Level::Info)
  }

  #[track_caller]
  pub fn at_debug(&self) -> LogBuilder<'_> {
    self.at(Level::Debug)
  }

  #[track_caller]
  pub fn at_trace(&self) -> LogBuilder<'_> {
    self.at(Level::Trace)
  }
}
