//! # Platform Module
//!
//! The process-facing capabilities the core consumes: a nanosecond
//! clock, a caller finder, a backend factory and the context data
//! provider. Nothing in the core reaches for globals; the platform is
//! injected at logger construction, and the single process-wide piece
//! is the lazily created default platform used by the convenience
//! constructor.

mod __test__;

use once_cell::sync::Lazy;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::backend::LoggerBackend;
use crate::caller::{CallerFinder, StackCallerFinder};
use crate::level::Level;
use crate::metadata::{EmptyMetadata, Metadata};
use crate::scope::{LoggingScope, ScopeType};
use crate::stderr_backend::StderrBackend;
use crate::tags::Tags;

/// Ambient, per-request data injected into every record.
///
/// All methods have empty defaults so a provider only implements what
/// it actually supplies.
pub trait ContextDataProvider: Send + Sync {
  /// Tags to merge into every record.
  fn tags(&self) -> Tags {
    Tags::empty()
  }

  /// Scope metadata, merged under statement metadata at format time.
  fn metadata(&self) -> Arc<dyn Metadata> {
    Arc::new(EmptyMetadata)
  }

  /// Whether a statement should log even when disabled by level; also
  /// bypasses rate limiting.
  fn should_force_logging(&self, _name: &str, _level: Level, _is_enabled_by_level: bool) -> bool {
    false
  }

  /// The current scope of the given type, if one is active.
  fn current_scope(&self, _scope_type: &ScopeType) -> Option<LoggingScope> {
    None
  }
}

/// Provider with no tags, no metadata, no scopes and no forcing.
#[derive(Debug, Default)]
pub struct NoOpContextDataProvider;

impl ContextDataProvider for NoOpContextDataProvider {}

/// The capabilities a logger needs from its environment.
pub trait Platform: Send + Sync {
  /// Current wall time in nanoseconds since the epoch.
  fn now_nanos(&self) -> i64;

  fn caller_finder(&self) -> &dyn CallerFinder;

  /// Creates (or hands out) the backend for a logger name.
  fn backend(&self, name: &str) -> Arc<dyn LoggerBackend>;

  fn data_provider(&self) -> &dyn ContextDataProvider;
}

/// System-clock platform with stack-walking caller lookup and stderr
/// backends.
#[derive(Debug, Default)]
pub struct DefaultPlatform {
  finder: StackCallerFinder,
  provider: NoOpContextDataProvider,
}

impl DefaultPlatform {
  pub fn new() -> Self {
    Self::default()
  }
}

impl Platform for DefaultPlatform {
  fn now_nanos(&self) -> i64 {
    SystemTime::now()
      .duration_since(UNIX_EPOCH)
      .map(|elapsed| elapsed.as_nanos() as i64)
      .unwrap_or(0)
  }

  fn caller_finder(&self) -> &dyn CallerFinder {
    &self.finder
  }

  fn backend(&self, name: &str) -> Arc<dyn LoggerBackend> {
    Arc::new(StderrBackend::new(name))
  }

  fn data_provider(&self) -> &dyn ContextDataProvider {
    &self.provider
  }
}

static DEFAULT: Lazy<Arc<DefaultPlatform>> = Lazy::new(|| Arc::new(DefaultPlatform::new()));

/// The shared default platform.
pub fn default_platform() -> Arc<DefaultPlatform> {
  Arc::clone(&DEFAULT)
}
