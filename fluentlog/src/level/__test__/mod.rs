#[cfg(test)]
mod __test__ {

  use crate::level::Level;

  #[test]
  fn test_level_ordering() {
    assert!(Level::Trace < Level::Debug);
    assert!(Level::Debug < Level::Info);
    assert!(Level::Info < Level::Warn);
    assert!(Level::Warn < Level::Error);
  }

  #[test]
  fn test_level_serialization() {
    assert_eq!(serde_json::to_string(&Level::Info).unwrap(), "\"info\"");
    assert_eq!(serde_json::to_string(&Level::Error).unwrap(), "\"error\"");

    let level: Level = serde_json::from_str("\"warn\"").unwrap();
    assert_eq!(level, Level::Warn);
  }

  #[test]
  fn test_level_display() {
    assert_eq!(Level::Debug.to_string(), "DEBUG");
    assert_eq!(Level::Warn.as_str(), "WARN");
  }
}
