//! # Memory Backend Module
//!
//! A capturing backend for tests: records are resolved (message
//! formatted, metadata rendered) and stored behind a mutex so a test
//! can assert on exactly what the frontend delivered. Captured records
//! can also be rendered as newline-delimited JSON for structural
//! assertions.

mod __test__;

use std::sync::Mutex;

use crate::backend::{BackendError, LoggerBackend};
use crate::formatter;
use crate::level::Level;
use crate::log_data::LogData;
use crate::metadata_key::{AnyKey, AnyValue};
use crate::metadata_processor::{MetadataHandler, MetadataProcessor};

/// A delivered record, resolved to plain data.
#[derive(Debug, Clone)]
pub struct CapturedRecord {
  pub level: Level,
  pub logger_name: String,
  pub message: String,
  /// Merged scope + statement metadata as rendered (label, value) pairs;
  /// repeated keys render as `[a, b]`.
  pub metadata: Vec<(String, String)>,
  pub site_class: String,
  pub site_line: u32,
  pub was_forced: bool,
  pub timestamp_nanos: i64,
}

pub struct MemoryBackend {
  name: String,
  min_level: Level,
  records: Mutex<Vec<CapturedRecord>>,
}

impl MemoryBackend {
  pub fn new(name: impl Into<String>) -> Self {
    Self::with_min_level(name, Level::Trace)
  }

  pub fn with_min_level(name: impl Into<String>, min_level: Level) -> Self {
    Self {
      name: name.into(),
      min_level,
      records: Mutex::new(Vec::new()),
    }
  }

  pub fn records(&self) -> Vec<CapturedRecord> {
    match self.records.lock() {
      Ok(records) => records.clone(),
      Err(poisoned) => poisoned.into_inner().clone(),
    }
  }

  pub fn messages(&self) -> Vec<String> {
    self.records().into_iter().map(|r| r.message).collect()
  }

  pub fn len(&self) -> usize {
    self.records.lock().map(|r| r.len()).unwrap_or(0)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn clear(&self) {
    if let Ok(mut records) = self.records.lock() {
      records.clear();
    }
  }

  /// One compact JSON object per captured record.
  pub fn as_json_lines(&self) -> Vec<String> {
    self
      .records()
      .iter()
      .map(|record| {
        let metadata: serde_json::Map<String, serde_json::Value> = record
          .metadata
          .iter()
          .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
          .collect();
        serde_json::json!({
            "timestamp_nanos": record.timestamp_nanos,
            "level": record.level,
            "logger": record.logger_name,
            "site": format!("{}:{}", record.site_class, record.site_line),
            "message": record.message,
            "metadata": metadata,
            "forced": record.was_forced,
        })
        .to_string()
      })
      .collect()
  }
}

struct PairCollector {
  pairs: Vec<(String, String)>,
}

impl MetadataHandler<()> for PairCollector {
  fn handle_single(&mut self, key: &AnyKey, value: &AnyValue, _ctx: &mut ()) {
    self.pairs.push((key.label().to_string(), key.render(value)));
  }

  fn handle_repeated(
    &mut self,
    key: &AnyKey,
    values: &mut dyn Iterator<Item = &AnyValue>,
    _ctx: &mut (),
  ) {
    let rendered: Vec<String> = values.map(|v| key.render(v)).collect();
    self
      .pairs
      .push((key.label().to_string(), format!("[{}]", rendered.join(", "))));
  }
}

impl LoggerBackend for MemoryBackend {
  fn name(&self) -> &str {
    &self.name
  }

  fn is_loggable(&self, level: Level) -> bool {
    level >= self.min_level
  }

  fn log(&self, data: &LogData) -> Result<(), BackendError> {
    let message = formatter::format(data).map_err(|e| Box::new(e) as BackendError)?;

    let mut collector = PairCollector { pairs: Vec::new() };
    MetadataProcessor::of(data.scope_metadata(), data.metadata())
      .process(&mut collector, &mut ());

    let record = CapturedRecord {
      level: data.level(),
      logger_name: data.logger_name().to_string(),
      message,
      metadata: collector.pairs,
      site_class: data.log_site().class_name().to_string(),
      site_line: data.log_site().line(),
      was_forced: data.was_forced(),
      timestamp_nanos: data.timestamp_nanos(),
    };

    let mut records = match self.records.lock() {
      Ok(records) => records,
      Err(poisoned) => poisoned.into_inner(),
    };
    records.push(record);
    Ok(())
  }
}
