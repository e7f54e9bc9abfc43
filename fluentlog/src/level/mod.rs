//! # Level Module
//!
//! Log severity levels with a compact `u8` representation.
//!
//! Levels implement `Ord` with natural ordering: TRACE < DEBUG < INFO <
//! WARN < ERROR, which is what backend level filtering compares against.

mod __test__;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Log severity level.
///
/// Serializes as a lowercase string (`"trace"`, `"debug"`, ...) for
/// human-readable output while staying a single byte in memory.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
  Trace = 0,
  Debug = 1,
  Info = 2,
  Warn = 3,
  Error = 4,
}

impl Level {
  /// Upper-case display name, e.g. `"INFO"`.
  #[inline]
  pub fn as_str(&self) -> &'static str {
    match self {
      Level::Trace => "TRACE",
      Level::Debug => "DEBUG",
      Level::Info => "INFO",
      Level::Warn => "WARN",
      Level::Error => "ERROR",
    }
  }
}

impl fmt::Display for Level {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}
