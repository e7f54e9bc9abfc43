#[cfg(test)]
mod __test__ {

  use std::sync::Arc;

  use crate::backend::LoggerBackend;
  use crate::level::Level;
  use crate::log_data::{LogData, Payload, TemplateContext};
  use crate::log_site::LogSite;
  use crate::memory_backend::MemoryBackend;
  use crate::metadata::MutableMetadata;
  use crate::metadata_key::MetadataKey;
  use crate::parser::printf_parser;

  fn sample_record() -> LogData {
    let user: MetadataKey<String> = MetadataKey::single("user");
    let mut metadata = MutableMetadata::new();
    metadata.add_value(&user, "alice".to_string());

    LogData::new(
      "app.db",
      Level::Warn,
      1_234,
      LogSite::new("app::db", "connect", 17, None),
      Payload::Template {
        context: TemplateContext::new(printf_parser(), "retry %d"),
        args: crate::args![3],
      },
      metadata,
      Arc::new(crate::metadata::EmptyMetadata),
      false,
    )
  }

  #[test]
  fn test_captures_resolved_record() {
    let backend = MemoryBackend::new("test");
    backend.log(&sample_record()).unwrap();

    let records = backend.records();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.message, "retry 3");
    assert_eq!(record.level, Level::Warn);
    assert_eq!(record.site_class, "app::db");
    assert_eq!(record.site_line, 17);
    assert_eq!(
      record.metadata,
      vec![("user".to_string(), "alice".to_string())]
    );
  }

  #[test]
  fn test_level_filtering() {
    let backend = MemoryBackend::with_min_level("test", Level::Warn);
    assert!(!backend.is_loggable(Level::Info));
    assert!(backend.is_loggable(Level::Warn));
    assert!(backend.is_loggable(Level::Error));
  }

  #[test]
  fn test_json_lines() {
    let backend = MemoryBackend::new("test");
    backend.log(&sample_record()).unwrap();

    let lines = backend.as_json_lines();
    assert_eq!(lines.len(), 1);
    let parsed: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(parsed["message"], "retry 3");
    assert_eq!(parsed["level"], "warn");
    assert_eq!(parsed["site"], "app::db:17");
    assert_eq!(parsed["metadata"]["user"], "alice");
  }

  #[test]
  fn test_clear() {
    let backend = MemoryBackend::new("test");
    backend.log(&sample_record()).unwrap();
    backend.clear();
    assert!(backend.is_empty());
  }
}
