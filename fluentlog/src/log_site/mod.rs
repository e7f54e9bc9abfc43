//! # Log Site Module
//!
//! Immutable identity of a source location, and the key types used to
//! address per-site state.
//!
//! A [`LogSite`] is equal and hashes identically across processes for the
//! same source position; the optional file name is carried for display
//! only and excluded from equality. [`LogSiteKey`] adds scope
//! specialization: a key specialized by one or more scopes is never equal
//! to its delegate, and the specialization order does not affect equality
//! or hashing (qualifiers are kept as a sorted set and hashes combine
//! with XOR).


use serde::Serialize;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::scope::ScopeQualifier;
use crate::utils;

/// Line numbers above this are clamped; equality only sees 16 bits.
pub const MAX_LINE: u32 = 0xFFFF;

/// Immutable value describing a source location.
#[derive(Debug, Clone, Serialize)]
pub struct LogSite {
  class_name: Cow<'static, str>,
  method_name: Cow<'static, str>,
  line: u32,
  #[serde(skip_serializing_if = "Option::is_none")]
  file: Option<Cow<'static, str>>,
}

impl LogSite {
  /// Singleton for "no site could be determined". Any per-site state
  /// lookup against this disables stateful features for the statement.
  pub const INVALID: LogSite = LogSite {
    class_name: Cow::Borrowed("<unknown>"),
    method_name: Cow::Borrowed("<unknown>"),
    line: 0,
    file: None,
  };

  pub fn new(
    class_name: impl Into<Cow<'static, str>>,
    method_name: impl Into<Cow<'static, str>>,
    line: u32,
    file: Option<Cow<'static, str>>,
  ) -> Self {
    Self {
      class_name: class_name.into(),
      method_name: method_name.into(),
      line: line & MAX_LINE,
      file,
    }
  }

  /// Site derived from a `#[track_caller]` location. The file path plays
  /// the class-name role so that equality stays file-distinct.
  pub fn for_caller(location: &'static std::panic::Location<'static>) -> Self {
    Self {
      class_name: Cow::Borrowed(location.file()),
      method_name: Cow::Borrowed(""),
      line: location.line() & MAX_LINE,
      file: Some(Cow::Borrowed(location.file())),
    }
  }

  pub fn class_name(&self) -> &str {
    &self.class_name
  }

  pub fn method_name(&self) -> &str {
    &self.method_name
  }

  pub fn line(&self) -> u32 {
    self.line
  }

  pub fn file(&self) -> Option<&str> {
    self.file.as_deref()
  }

  pub fn is_invalid(&self) -> bool {
    *self == Self::INVALID
  }

  /// Stable 64-bit hash over the identity fields (file excluded).
  pub fn hash64(&self) -> u64 {
    let mut hash = utils::fnv1a_64(self.class_name.as_bytes());
    hash ^= utils::mix64(utils::fnv1a_64(self.method_name.as_bytes()));
    hash ^= utils::mix64(self.line as u64);
    hash
  }
}

impl PartialEq for LogSite {
  fn eq(&self, other: &Self) -> bool {
    self.line == other.line
      && self.class_name == other.class_name
      && self.method_name == other.method_name
  }
}

impl Eq for LogSite {}

impl Hash for LogSite {
  fn hash<H: Hasher>(&self, state: &mut H) {
    state.write_u64(self.hash64());
  }
}

impl fmt::Display for LogSite {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.method_name.is_empty() {
      write!(f, "{}:{}", self.class_name, self.line)
    } else {
      write!(f, "{}#{}:{}", self.class_name, self.method_name, self.line)
    }
  }
}

/// A log site specialized by one or more scope qualifiers.
///
/// Qualifiers are kept sorted by scope id, so two keys built from the
/// same scopes in any order compare equal, and the hash obeys
/// `hash(specialize(k, q)) == hash64(k) ^ hash64(q)`.
#[derive(Debug, Clone)]
pub struct SpecializedLogSiteKey {
  delegate: LogSite,
  qualifiers: SmallVec<[ScopeQualifier; 2]>,
}

impl SpecializedLogSiteKey {
  fn new(delegate: LogSite, qualifier: ScopeQualifier) -> Self {
    let mut qualifiers = SmallVec::new();
    qualifiers.push(qualifier);
    Self {
      delegate,
      qualifiers,
    }
  }

  fn insert(&mut self, qualifier: ScopeQualifier) {
    match self
      .qualifiers
      .binary_search_by_key(&qualifier.id(), |q| q.id())
    {
      // Specializing twice by the same scope is idempotent.
      Ok(_) => {},
      Err(pos) => self.qualifiers.insert(pos, qualifier),
    }
  }

  pub fn delegate(&self) -> &LogSite {
    &self.delegate
  }

  pub fn qualifiers(&self) -> &[ScopeQualifier] {
    &self.qualifiers
  }

  pub fn hash64(&self) -> u64 {
    self
      .qualifiers
      .iter()
      .fold(self.delegate.hash64(), |hash, q| hash ^ q.hash64())
  }
}

impl PartialEq for SpecializedLogSiteKey {
  fn eq(&self, other: &Self) -> bool {
    self.delegate == other.delegate && self.qualifiers == other.qualifiers
  }
}

impl Eq for SpecializedLogSiteKey {}

/// Anything usable as a key into per-site state.
///
/// Distinct sites never compare equal, and a specialized key never
/// equals its unspecialized delegate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSiteKey {
  Site(LogSite),
  Specialized(SpecializedLogSiteKey),
}

impl LogSiteKey {
  pub fn of(site: LogSite) -> Self {
    LogSiteKey::Site(site)
  }

  /// The underlying source location, regardless of specialization.
  pub fn site(&self) -> &LogSite {
    match self {
      LogSiteKey::Site(site) => site,
      LogSiteKey::Specialized(key) => key.delegate(),
    }
  }

  /// Returns a key additionally qualified by `qualifier`.
  pub fn specialize(self, qualifier: ScopeQualifier) -> LogSiteKey {
    match self {
      LogSiteKey::Site(site) => {
        LogSiteKey::Specialized(SpecializedLogSiteKey::new(site, qualifier))
      },
      LogSiteKey::Specialized(mut key) => {
        key.insert(qualifier);
        LogSiteKey::Specialized(key)
      },
    }
  }

  pub fn hash64(&self) -> u64 {
    match self {
      LogSiteKey::Site(site) => site.hash64(),
      LogSiteKey::Specialized(key) => key.hash64(),
    }
  }
}

impl Hash for LogSiteKey {
  fn hash<H: Hasher>(&self, state: &mut H) {
    state.write_u64(self.hash64());
  }
}

/// Captures the enclosing module, file and line as an explicit
/// [`LogSite`] for injection via `with_injected_log_site`.
#[macro_export]
macro_rules! log_site {
  () => {
    $crate::log_site::LogSite::new(
      module_path!(),
      "",
      line!(),
      Some(::std::borrow::Cow::Borrowed(file!())),
    )
  };
}
