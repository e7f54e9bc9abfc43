#[cfg(test)]
mod __test__ {

  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::{Arc, OnceLock};

  use crate::backend::{BackendError, LoggerBackend, LoggingException};
  use crate::level::Level;
  use crate::log_data::LogData;
  use crate::logger::{FluentLogger, MAX_ALLOWED_RECURSION_DEPTH};
  use crate::memory_backend::MemoryBackend;
  use crate::platform::{default_platform, Platform};

  fn logger_with(backend: Arc<dyn LoggerBackend>) -> FluentLogger {
    let platform: Arc<dyn Platform> = default_platform();
    FluentLogger::with_backend("test.logger", backend, platform)
  }

  fn memory_logger() -> (FluentLogger, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::new("test"));
    let erased: Arc<dyn LoggerBackend> = backend.clone();
    (logger_with(erased), backend)
  }

  #[test]
  fn test_simple_info_statement() {
    let (logger, backend) = memory_logger();
    logger.at_info().logf("Hello %s", crate::args!["World"]);

    let records = backend.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].message, "Hello World");
    assert_eq!(records[0].level, Level::Info);
    assert_eq!(records[0].logger_name, "test.logger");
  }

  #[test]
  fn test_mismatched_type_does_not_escape() {
    let (logger, backend) = memory_logger();
    logger.at_info().logf("Hello %d", crate::args!["World"]);

    assert_eq!(
      backend.messages(),
      vec!["Hello [INVALID: format=%d, type=String, value=World]"]
    );
  }

  #[test]
  fn test_explicit_indices() {
    let (logger, backend) = memory_logger();
    logger
      .at_info()
      .logf("%2$s %1$s %<s", crate::args!["foo", "bar"]);
    assert_eq!(backend.messages(), vec!["bar foo foo"]);
  }

  #[test]
  fn test_literal_message_is_not_parsed() {
    let (logger, backend) = memory_logger();
    logger.at_info().log("coverage: 100% %s %d %<");
    assert_eq!(backend.messages(), vec!["coverage: 100% %s %d %<"]);
  }

  #[test]
  fn test_level_filtering() {
    let backend = Arc::new(MemoryBackend::with_min_level("test", Level::Warn));
    let erased: Arc<dyn LoggerBackend> = backend.clone();
    let logger = logger_with(erased);

    logger.at_debug().log("dropped");
    logger.at_info().log("dropped");
    logger.at_warn().log("kept");
    logger.at_error().log("kept");

    assert_eq!(backend.len(), 2);
  }

  #[test]
  fn test_template_parse_error_is_reported_not_thrown() {
    let (logger, backend) = memory_logger();
    // The backend fails to format the broken template; the write path
    // absorbs the error.
    logger.at_info().logf("broken %q", crate::args![1]);
    assert!(backend.is_empty());
  }

  /// Backend whose `log` re-enters the logger.
  struct ReentrantBackend {
    logger: OnceLock<FluentLogger>,
    calls: AtomicU32,
  }

  impl LoggerBackend for ReentrantBackend {
    fn name(&self) -> &str {
      "reentrant"
    }

    fn is_loggable(&self, _level: Level) -> bool {
      true
    }

    fn log(&self, _data: &LogData) -> Result<(), BackendError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      if let Some(logger) = self.logger.get() {
        logger.at_info().log("from inside the backend");
      }
      Ok(())
    }
  }

  #[test]
  fn test_reentrancy_is_bounded() {
    let backend = Arc::new(ReentrantBackend {
      logger: OnceLock::new(),
      calls: AtomicU32::new(0),
    });
    let erased: Arc<dyn LoggerBackend> = backend.clone();
    let logger = logger_with(erased);
    backend.logger.set(logger.clone()).ok().unwrap();

    logger.at_info().log("outer");

    // The depth guard allows exactly MAX_ALLOWED_RECURSION_DEPTH nested
    // writes; the next one reports a diagnostic and returns.
    assert_eq!(
      backend.calls.load(Ordering::SeqCst),
      MAX_ALLOWED_RECURSION_DEPTH
    );

    // The counter unwinds fully: a fresh statement logs again.
    backend.calls.store(0, Ordering::SeqCst);
    logger.at_info().log("outer again");
    assert_eq!(
      backend.calls.load(Ordering::SeqCst),
      MAX_ALLOWED_RECURSION_DEPTH
    );
  }

  /// Backend that always fails; the default handler rethrows.
  struct FailingBackend;

  impl LoggerBackend for FailingBackend {
    fn name(&self) -> &str {
      "failing"
    }

    fn is_loggable(&self, _level: Level) -> bool {
      true
    }

    fn log(&self, _data: &LogData) -> Result<(), BackendError> {
      Err(Box::new(std::io::Error::new(
        std::io::ErrorKind::Other,
        "sink unavailable",
      )))
    }
  }

  #[test]
  fn test_backend_errors_are_absorbed() {
    let logger = logger_with(Arc::new(FailingBackend));
    // Must not panic; the error is reported to stderr and swallowed.
    logger.at_error().log("does not crash");
  }

  /// Backend whose error handler escalates with the sentinel.
  struct EscalatingBackend;

  impl LoggerBackend for EscalatingBackend {
    fn name(&self) -> &str {
      "escalating"
    }

    fn is_loggable(&self, _level: Level) -> bool {
      true
    }

    fn log(&self, _data: &LogData) -> Result<(), BackendError> {
      Err(Box::new(std::io::Error::new(
        std::io::ErrorKind::Other,
        "sink unavailable",
      )))
    }

    fn handle_error(&self, _error: BackendError, _data: &LogData) -> Result<(), BackendError> {
      Err(Box::new(LoggingException::new("configured to escape")))
    }
  }

  #[test]
  fn test_logging_exception_escapes_the_core() {
    let logger = logger_with(Arc::new(EscalatingBackend));
    let unwind = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
      logger.at_error().log("escalates");
    }));
    let payload = unwind.expect_err("the sentinel must escape");
    let sentinel = payload
      .downcast_ref::<LoggingException>()
      .expect("payload is the sentinel");
    assert_eq!(sentinel.message(), "configured to escape");
  }

  /// Backend whose error handler substitutes a fallback record.
  struct RecoveringBackend {
    inner: MemoryBackend,
  }

  impl LoggerBackend for RecoveringBackend {
    fn name(&self) -> &str {
      "recovering"
    }

    fn is_loggable(&self, _level: Level) -> bool {
      true
    }

    fn log(&self, _data: &LogData) -> Result<(), BackendError> {
      Err(Box::new(std::io::Error::new(
        std::io::ErrorKind::Other,
        "first stage fails",
      )))
    }

    fn handle_error(&self, _error: BackendError, data: &LogData) -> Result<(), BackendError> {
      self.inner.log(data)
    }
  }

  #[test]
  fn test_handle_error_can_recover() {
    let backend = Arc::new(RecoveringBackend {
      inner: MemoryBackend::new("recovering"),
    });
    let erased: Arc<dyn LoggerBackend> = backend.clone();
    let logger = logger_with(erased);

    logger.at_warn().log("recovered");
    assert_eq!(backend.inner.messages(), vec!["recovered"]);
  }

  #[test]
  fn test_logger_clones_share_site_state() {
    let (logger, backend) = memory_logger();
    let clone = logger.clone();
    let site = crate::log_site::LogSite::new("app::shared", "run", 5, None);

    for n in 0..4 {
      let which = if n % 2 == 0 { &logger } else { &clone };
      which
        .at_info()
        .with_injected_log_site(site.clone())
        .every(4)
        .logf("n=%d", crate::args![n]);
    }
    // One shared counter across clones: only the first invocation logs.
    assert_eq!(backend.messages(), vec!["n=0"]);
  }
}
