//! # Context Module
//!
//! The one-shot fluent builder behind every log statement.
//!
//! `logger.at_info()` returns a [`LogBuilder`]: either an active
//! context that accumulates metadata and policy, or a no-op facade
//! (when the statement is disabled and not forced) that allocates
//! nothing and discards every call. The terminal `log`/`logf` call
//! resolves the log site, runs post-processing (scope specialization,
//! rate limiter algebra, skipped counts), builds the record and hands
//! it to the write path, then resets any pending limiter tokens.


use std::error::Error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use crate::arg::ArgList;
use crate::level::Level;
use crate::log_data::{LogData, Payload, TemplateContext};
use crate::log_site::{LogSite, LogSiteKey};
use crate::logger::LoggerInner;
use crate::metadata::{self, Metadata, MutableMetadata};
use crate::parser::printf_parser;
use crate::rate_limit::RateLimitStatus;
use crate::scope::{LoggingScope, ScopeType};

/// A captured cause, rendered through the error's `Display`.
#[derive(Clone)]
pub struct Cause(Arc<dyn Error + Send + Sync>);

impl Cause {
  pub fn new<E: Error + Send + Sync + 'static>(error: E) -> Self {
    Self(Arc::new(error))
  }

  pub fn error(&self) -> &(dyn Error + Send + Sync + 'static) {
    self.0.as_ref()
  }
}

impl fmt::Display for Cause {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl fmt::Debug for Cause {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Cause({})", self.0)
  }
}

/// Minimum interval for `at_most_every`, kept displayable for
/// metadata rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPeriod(Duration);

impl RateLimitPeriod {
  pub fn new(period: Duration) -> Self {
    Self(period)
  }

  pub fn nanos(&self) -> i64 {
    i64::try_from(self.0.as_nanos()).unwrap_or(i64::MAX)
  }
}

impl fmt::Display for RateLimitPeriod {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:?}", self.0)
  }
}

/// How much of the current stack `with_stack_trace` captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackSize {
  Small,
  Medium,
  Large,
  Full,
  None,
}

impl StackSize {
  /// Frame cap; `Full` is unbounded and `None` captures nothing.
  pub fn max_frames(self) -> Option<usize> {
    match self {
      StackSize::Small => Some(10),
      StackSize::Medium => Some(20),
      StackSize::Large => Some(50),
      StackSize::Full => Option::None,
      StackSize::None => Some(0),
    }
  }
}

/// A rendered stack capture attached as metadata.
#[derive(Debug, Clone)]
pub struct StackTrace(String);

impl StackTrace {
  pub fn text(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for StackTrace {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Well-known metadata keys used by the fluent chain. Process-wide
/// singletons; identity matters.
pub mod keys {
  use once_cell::sync::Lazy;

  use super::{Cause, RateLimitPeriod, StackTrace};
  use crate::metadata_key::MetadataKey;
  use crate::scope::LoggingScope;
  use crate::tags::Tags;

  pub static LOG_CAUSE: Lazy<MetadataKey<Cause>> = Lazy::new(|| MetadataKey::single("cause"));

  pub static LOG_EVERY_N: Lazy<MetadataKey<u32>> =
    Lazy::new(|| MetadataKey::single("ratelimit_count"));

  pub static LOG_SAMPLE_EVERY_N: Lazy<MetadataKey<u32>> =
    Lazy::new(|| MetadataKey::single("sampling_count"));

  pub static LOG_AT_MOST_EVERY: Lazy<MetadataKey<RateLimitPeriod>> =
    Lazy::new(|| MetadataKey::single("ratelimit_period"));

  /// Repeatable: one entry per `per(scope)` call, in call order.
  pub static LOG_SITE_GROUPING_KEY: Lazy<MetadataKey<LoggingScope>> =
    Lazy::new(|| MetadataKey::repeated("group_by"));

  pub static LOG_CONTEXT_STACK_TRACE: Lazy<MetadataKey<StackTrace>> =
    Lazy::new(|| MetadataKey::single("stack_trace"));

  /// Statements dropped by rate limiting since the last emission.
  pub static LOG_SKIPPED_COUNT: Lazy<MetadataKey<u64>> =
    Lazy::new(|| MetadataKey::single("skipped"));

  pub static TAGS: Lazy<MetadataKey<Tags>> = Lazy::new(|| MetadataKey::single("tags"));
}

/// Active statement state. One-shot: consumed by the terminal call.
pub struct LogContext<'a> {
  logger: &'a LoggerInner,
  level: Level,
  caller: Option<&'static Location<'static>>,
  injected_site: Option<LogSite>,
  metadata: MutableMetadata,
  was_forced: bool,
}

impl<'a> LogContext<'a> {
  pub(crate) fn new(
    logger: &'a LoggerInner,
    level: Level,
    caller: &'static Location<'static>,
    was_forced: bool,
  ) -> Self {
    Self {
      logger,
      level,
      caller: Some(caller),
      injected_site: None,
      metadata: MutableMetadata::new(),
      was_forced,
    }
  }

  /// Injected site, then the captured caller location, then the
  /// platform stack walk, then invalid.
  fn resolve_site(&mut self) -> LogSite {
    if let Some(site) = self.injected_site.take() {
      return site;
    }
    if let Some(location) = self.caller {
      return LogSite::for_caller(location);
    }
    self
      .logger
      .platform
      .caller_finder()
      .find_caller("fluentlog::", 0)
  }

  /// Post-processing per the rate-limit algebra. Returns `None` to
  /// drop the statement, otherwise the pending status to reset after
  /// the record is written.
  fn post_process(&mut self, site: &LogSite, now_nanos: i64) -> Option<Option<RateLimitStatus>> {
    // Forced statements bypass scope short-circuits and limiters.
    if self.was_forced {
      return Some(Option::None);
    }
    // An unknown site disables every stateful feature.
    if site.is_invalid() {
      return Some(Option::None);
    }

    let mut key = LogSiteKey::of(site.clone());
    let grouping = keys::LOG_SITE_GROUPING_KEY.erased();
    for n in 0..self.metadata.size() {
      if self.metadata.key_at(n) == grouping {
        let scope = keys::LOG_SITE_GROUPING_KEY.cast(self.metadata.value_at(n));
        if scope.is_closed() {
          return Option::None;
        }
        key = key.specialize(scope.qualifier());
      }
    }

    let limits = &self.logger.limits;
    let mut status: Option<RateLimitStatus> = Option::None;

    if let Some(&count) = metadata::find_value(&self.metadata, &keys::LOG_EVERY_N) {
      let limiter = limits.counting.get(&key, &self.metadata);
      status = RateLimitStatus::combine(
        status,
        Some(crate::rate_limit::CountingRateLimiter::check(&limiter, count)),
      );
    }
    if let Some(period) = metadata::find_value(&self.metadata, &keys::LOG_AT_MOST_EVERY) {
      let limiter = limits.timed.get(&key, &self.metadata);
      status = RateLimitStatus::combine(
        status,
        crate::rate_limit::TimedRateLimiter::check(&limiter, period.nanos(), now_nanos),
      );
    }
    if let Some(&count) = metadata::find_value(&self.metadata, &keys::LOG_SAMPLE_EVERY_N) {
      let limiter = limits.sampling.get(&key, &self.metadata);
      status = RateLimitStatus::combine(
        status,
        Some(crate::rate_limit::SamplingRateLimiter::check(&limiter, count)),
      );
    }

    match status {
      Option::None => Some(Option::None),
      Some(status) if status.is_allowed() => {
        let skipped = limits.skipped.get(&key, &self.metadata).take();
        if skipped > 0 {
          self.metadata.add_value(&keys::LOG_SKIPPED_COUNT, skipped);
        }
        match status {
          RateLimitStatus::Allow => Some(Option::None),
          pending => Some(Some(pending)),
        }
      },
      Some(_) => {
        limits.skipped.get(&key, &self.metadata).increment();
        Option::None
      },
    }
  }

  fn emit(mut self: Box<Self>, payload: Payload) {
    // The statement timestamp is read exactly once and shared with the
    // limiter checks and resets.
    let now_nanos = self.logger.platform.now_nanos();
    let site = self.resolve_site();

    let pending = match self.post_process(&site, now_nanos) {
      Some(pending) => pending,
      Option::None => return,
    };

    let provider = self.logger.platform.data_provider();
    let tags = provider.tags();
    if !tags.is_empty() {
      self.metadata.add_value(&keys::TAGS, tags);
    }

    let context = *self;
    let data = LogData::new(
      context.logger.name.clone(),
      context.level,
      now_nanos,
      site,
      payload,
      context.metadata,
      provider.metadata(),
      context.was_forced,
    );
    context.logger.write(&data);

    if let Some(status) = pending {
      status.reset(now_nanos);
    }
  }
}

/// The fluent handle for one statement: an active context or the
/// discard-everything facade.
pub enum LogBuilder<'a> {
  NoOp,
  Active(Box<LogContext<'a>>),
}

impl<'a> LogBuilder<'a> {
  pub(crate) fn active(context: LogContext<'a>) -> Self {
    LogBuilder::Active(Box::new(context))
  }

  /// False only for the no-op facade.
  pub fn is_enabled(&self) -> bool {
    matches!(self, LogBuilder::Active(_))
  }

  fn map(self, apply: impl FnOnce(&mut LogContext<'a>)) -> Self {
    match self {
      LogBuilder::NoOp => LogBuilder::NoOp,
      LogBuilder::Active(mut context) => {
        apply(&mut context);
        LogBuilder::Active(context)
      },
    }
  }

  /// Attaches a cause. `None` is equivalent to not calling.
  pub fn with_cause<E: Error + Send + Sync + 'static>(
    self,
    cause: impl Into<Option<E>>,
  ) -> Self {
    match cause.into() {
      Some(error) => self.map(|ctx| {
        ctx.metadata.add_value(&keys::LOG_CAUSE, Cause::new(error));
      }),
      None => self,
    }
  }

  /// Emits on the 1st, N+1st, 2N+1st... invocation at this site.
  /// `every(1)` is a no-op; zero is a defect and panics.
  pub fn every(self, n: u32) -> Self {
    if n == 0 {
      panic!("rate limit count must be positive");
    }
    if n == 1 {
      return self;
    }
    self.map(|ctx| ctx.metadata.add_value(&keys::LOG_EVERY_N, n))
  }

  /// Emits at most once per `period`. A zero period is a no-op.
  pub fn at_most_every(self, period: Duration) -> Self {
    if period.is_zero() {
      return self;
    }
    self.map(|ctx| {
      ctx
        .metadata
        .add_value(&keys::LOG_AT_MOST_EVERY, RateLimitPeriod::new(period))
    })
  }

  /// Emits with probability 1/N per invocation. `on_average_every(1)`
  /// is a no-op; zero is a defect and panics.
  pub fn on_average_every(self, n: u32) -> Self {
    if n == 0 {
      panic!("sample count must be positive");
    }
    if n == 1 {
      return self;
    }
    self.map(|ctx| ctx.metadata.add_value(&keys::LOG_SAMPLE_EVERY_N, n))
  }

  /// Specializes this statement's per-site state by `scope`.
  pub fn per(self, scope: &LoggingScope) -> Self {
    let scope = scope.clone();
    self.map(|ctx| {
      ctx
        .metadata
        .add_value(&keys::LOG_SITE_GROUPING_KEY, scope)
    })
  }

  /// Like [`per`], with the scope looked up from the context data
  /// provider; a missing scope makes this a no-op.
  ///
  /// [`per`]: LogBuilder::per
  pub fn per_type(self, scope_type: &ScopeType) -> Self {
    match self {
      LogBuilder::NoOp => LogBuilder::NoOp,
      LogBuilder::Active(context) => {
        let current = context
          .logger
          .platform
          .data_provider()
          .current_scope(scope_type);
        let builder = LogBuilder::Active(context);
        match current {
          Some(scope) => builder.per(&scope),
          None => builder,
        }
      },
    }
  }

  /// Captures the current stack and attaches it as metadata.
  /// `StackSize::None` is equivalent to not calling.
  pub fn with_stack_trace(self, size: StackSize) -> Self {
    if size == StackSize::None {
      return self;
    }
    self.map(|ctx| {
      let captured = format!("{:?}", backtrace::Backtrace::new());
      let text = match size.max_frames() {
        Some(max) => {
          let mut lines: Vec<&str> = captured.lines().take(max).collect();
          if captured.lines().count() > max {
            lines.push("  ...");
          }
          lines.join("\n")
        },
        Option::None => captured,
      };
      ctx
        .metadata
        .add_value(&keys::LOG_CONTEXT_STACK_TRACE, StackTrace(text));
    })
  }

  /// Attaches arbitrary typed metadata.
  pub fn with<T: fmt::Display + Send + Sync + 'static>(
    self,
    key: &crate::metadata_key::MetadataKey<T>,
    value: T,
  ) -> Self {
    self.map(|ctx| ctx.metadata.add_value(key, value))
  }

  /// Overrides site resolution with an explicit site. First call wins;
  /// later calls are ignored so external injection can take precedence
  /// over generated call sites.
  pub fn with_injected_log_site(self, site: LogSite) -> Self {
    self.map(|ctx| {
      if ctx.injected_site.is_none() {
        ctx.injected_site = Some(site);
      }
    })
  }

  /// Terminal: logs a literal message. The message is not parsed.
  pub fn log(self, message: &str) {
    if let LogBuilder::Active(context) = self {
      context.emit(Payload::Literal(message.to_string()));
    }
  }

  /// Terminal: logs a printf template with arguments.
  pub fn logf(self, template: &str, args: ArgList) {
    if let LogBuilder::Active(context) = self {
      let template_context = TemplateContext::new(printf_parser(), template);
      context.emit(Payload::Template {
        context: template_context,
        args,
      });
    }
  }
}
