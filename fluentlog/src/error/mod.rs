//! # Error Reporting Module
//!
//! Never-fail diagnostics. Everything here writes a single line to
//! stderr, ignores write failures and must not panic; this is the last
//! resort when the logging pipeline itself misbehaves.

use std::io::Write;

use crate::log_data::LogData;

/// Reports an error swallowed by the write path.
pub fn report(context: &str, error: &(dyn std::error::Error + 'static)) {
  let _ = writeln!(std::io::stderr(), "fluentlog: {}: {}", context, error);
}

/// Reports that the recursion depth limit stopped a write. Only
/// data-free fields are rendered; formatting the record could recurse
/// again.
pub fn report_recursion(data: &LogData) {
  let _ = writeln!(
    std::io::stderr(),
    "fluentlog: logging recursion depth exceeded; dropping {} record for logger {:?}",
    data.level(),
    data.logger_name(),
  );
}
