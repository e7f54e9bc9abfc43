//! # Caller Finder Module
//!
//! Stack-walking fallback for computing a log site when no site was
//! injected and no caller location was captured.
//!
//! The finder walks the stack for the last frame belonging to the
//! logging API (matched by symbol prefix) and builds a site from the
//! frame immediately above it. Any failure — missing symbols, no
//! marker frame, stripped debug info — yields [`LogSite::INVALID`],
//! which disables stateful per-site features for the statement.


use backtrace::Backtrace;

use crate::log_site::LogSite;

pub trait CallerFinder: Send + Sync {
  /// Returns the site of the frame immediately above the last frame
  /// whose symbol starts with `api_marker`. `skip_frames` frames are
  /// dropped before the search starts, purely as an optimization.
  fn find_caller(&self, api_marker: &str, skip_frames: usize) -> LogSite;
}

/// Symbolized-backtrace implementation of [`CallerFinder`].
#[derive(Debug, Default)]
pub struct StackCallerFinder;

impl StackCallerFinder {
  pub fn new() -> Self {
    Self
  }
}

impl CallerFinder for StackCallerFinder {
  fn find_caller(&self, api_marker: &str, skip_frames: usize) -> LogSite {
    let backtrace = Backtrace::new();
    let mut seen_marker = false;
    for frame in backtrace.frames().iter().skip(skip_frames) {
      let symbol = match frame.symbols().first() {
        Some(symbol) => symbol,
        None => continue,
      };
      let name = match symbol.name() {
        Some(name) => name.to_string(),
        None => continue,
      };
      if demangled_base(&name).starts_with(api_marker) {
        seen_marker = true;
        continue;
      }
      if seen_marker {
        let (class_name, method_name) = split_symbol(&name);
        let line = symbol.lineno().unwrap_or(0);
        let file = symbol
          .filename()
          .map(|path| std::borrow::Cow::Owned(path.to_string_lossy().into_owned()));
        return LogSite::new(class_name, method_name, line, file);
      }
    }
    LogSite::INVALID
  }
}

/// Strips the trailing `::h<hash>` disambiguator from a demangled
/// symbol name.
fn demangled_base(name: &str) -> &str {
  match name.rsplit_once("::") {
    Some((base, tail))
      if tail.len() == 17
        && tail.starts_with('h')
        && tail[1..].bytes().all(|b| b.is_ascii_hexdigit()) =>
    {
      base
    },
    _ => name,
  }
}

/// Splits `app::module::function` into (`app::module`, `function`).
fn split_symbol(name: &str) -> (String, String) {
  let base = demangled_base(name);
  match base.rsplit_once("::") {
    Some((class_name, method_name)) => (class_name.to_string(), method_name.to_string()),
    None => (base.to_string(), String::new()),
  }
}
