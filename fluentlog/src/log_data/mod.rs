//! # Log Data Module
//!
//! The finished record handed to a backend.
//!
//! A record carries either a template context plus its argument vector,
//! or a single literal message; plus the statement metadata, a snapshot
//! of the scope metadata captured at write time, the log site and the
//! forced flag. Captured message strings are never mutated — backends
//! may use the template context as a cache key.


use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::arg::{Arg, ArgList};
use crate::level::Level;
use crate::log_site::LogSite;
use crate::metadata::{Metadata, MutableMetadata};
use crate::parser::TemplateParser;

/// A message template tied to the grammar that parses it.
///
/// Equality is parser *identity* plus message equality, which is what
/// makes this usable as a backend cache key.
#[derive(Clone)]
pub struct TemplateContext {
  parser: Arc<dyn TemplateParser>,
  message: String,
}

impl TemplateContext {
  pub fn new(parser: Arc<dyn TemplateParser>, message: impl Into<String>) -> Self {
    Self {
      parser,
      message: message.into(),
    }
  }

  pub fn parser(&self) -> &Arc<dyn TemplateParser> {
    &self.parser
  }

  pub fn message(&self) -> &str {
    &self.message
  }
}

impl PartialEq for TemplateContext {
  fn eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.parser, &other.parser) && self.message == other.message
  }
}

impl Eq for TemplateContext {}

impl Hash for TemplateContext {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.message.hash(state);
  }
}

impl fmt::Debug for TemplateContext {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "TemplateContext({:?})", self.message)
  }
}

/// Message payload: a parsed template with arguments, or a literal.
#[derive(Debug)]
pub enum Payload {
  Literal(String),
  Template {
    context: TemplateContext,
    args: ArgList,
  },
}

/// The record passed to [`LoggerBackend::log`].
///
/// [`LoggerBackend::log`]: crate::backend::LoggerBackend::log
pub struct LogData {
  logger_name: String,
  level: Level,
  timestamp_nanos: i64,
  log_site: LogSite,
  payload: Payload,
  metadata: MutableMetadata,
  scope_metadata: Arc<dyn Metadata>,
  was_forced: bool,
}

impl LogData {
  #[allow(clippy::too_many_arguments)]
  pub fn new(
    logger_name: impl Into<String>,
    level: Level,
    timestamp_nanos: i64,
    log_site: LogSite,
    payload: Payload,
    metadata: MutableMetadata,
    scope_metadata: Arc<dyn Metadata>,
    was_forced: bool,
  ) -> Self {
    Self {
      logger_name: logger_name.into(),
      level,
      timestamp_nanos,
      log_site,
      payload,
      metadata,
      scope_metadata,
      was_forced,
    }
  }

  pub fn logger_name(&self) -> &str {
    &self.logger_name
  }

  pub fn level(&self) -> Level {
    self.level
  }

  pub fn timestamp_nanos(&self) -> i64 {
    self.timestamp_nanos
  }

  pub fn log_site(&self) -> &LogSite {
    &self.log_site
  }

  pub fn payload(&self) -> &Payload {
    &self.payload
  }

  /// The template context, absent for literal records.
  pub fn template_context(&self) -> Option<&TemplateContext> {
    match &self.payload {
      Payload::Template { context, .. } => Some(context),
      Payload::Literal(_) => None,
    }
  }

  /// The literal message, absent for template records.
  pub fn literal_argument(&self) -> Option<&str> {
    match &self.payload {
      Payload::Literal(message) => Some(message),
      Payload::Template { .. } => None,
    }
  }

  /// Template arguments; empty for literal records.
  pub fn arguments(&self) -> &[Arg] {
    match &self.payload {
      Payload::Template { args, .. } => args,
      Payload::Literal(_) => &[],
    }
  }

  /// Metadata attached by the fluent chain, in insertion order.
  pub fn metadata(&self) -> &dyn Metadata {
    &self.metadata
  }

  /// Scope metadata captured from the context data provider when the
  /// record was written.
  pub fn scope_metadata(&self) -> &dyn Metadata {
    self.scope_metadata.as_ref()
  }

  pub fn was_forced(&self) -> bool {
    self.was_forced
  }
}

impl fmt::Debug for LogData {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("LogData")
      .field("logger_name", &self.logger_name)
      .field("level", &self.level)
      .field("timestamp_nanos", &self.timestamp_nanos)
      .field("log_site", &self.log_site)
      .field("payload", &self.payload)
      .field("metadata", &self.metadata)
      .field("was_forced", &self.was_forced)
      .finish()
  }
}
