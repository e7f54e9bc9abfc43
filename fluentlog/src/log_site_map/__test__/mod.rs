#[cfg(test)]
mod __test__ {

  use std::collections::HashSet;
  use std::sync::atomic::AtomicU64;
  use std::thread;

  use crate::context::keys;
  use crate::log_site::{LogSite, LogSiteKey};
  use crate::log_site_map::LogSiteMap;
  use crate::metadata::MutableMetadata;
  use crate::scope::LoggingScope;

  fn key(line: u32) -> LogSiteKey {
    LogSiteKey::of(LogSite::new("app::mod", "run", line, None))
  }

  #[test]
  fn test_values_are_stable() {
    let map: LogSiteMap<AtomicU64> = LogSiteMap::new(AtomicU64::default);
    let empty = crate::metadata::empty();

    let first = map.get(&key(1), empty);
    let second = map.get(&key(1), empty);
    assert!(std::sync::Arc::ptr_eq(&first, &second));

    let other = map.get(&key(2), empty);
    assert!(!std::sync::Arc::ptr_eq(&first, &other));
  }

  #[test]
  fn test_concurrent_get_converges_to_one_value() {
    let map: LogSiteMap<AtomicU64> = LogSiteMap::new(AtomicU64::default);

    let pointers: HashSet<usize> = thread::scope(|s| {
      let handles: Vec<_> = (0..8)
        .map(|_| {
          let map = map.clone();
          s.spawn(move || {
            let value = map.get(&key(7), crate::metadata::empty());
            std::sync::Arc::as_ptr(&value) as usize
          })
        })
        .collect();
      handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(pointers.len(), 1);
  }

  #[test]
  fn test_scope_closure_removes_entry() {
    let map: LogSiteMap<AtomicU64> = LogSiteMap::new(AtomicU64::default);
    let scope = LoggingScope::create("request");

    let mut metadata = MutableMetadata::new();
    metadata.add_value(&keys::LOG_SITE_GROUPING_KEY, scope.clone());

    let grouped = key(3).specialize(scope.qualifier());
    let _ = map.get(&grouped, &metadata);
    assert!(map.contains(&grouped));

    scope.close();
    assert!(!map.contains(&grouped));
  }

  #[test]
  fn test_scope_closure_leaves_other_entries() {
    let map: LogSiteMap<AtomicU64> = LogSiteMap::new(AtomicU64::default);
    let a = LoggingScope::create("a");
    let b = LoggingScope::create("b");

    let mut md_a = MutableMetadata::new();
    md_a.add_value(&keys::LOG_SITE_GROUPING_KEY, a.clone());
    let mut md_b = MutableMetadata::new();
    md_b.add_value(&keys::LOG_SITE_GROUPING_KEY, b.clone());

    let key_a = key(3).specialize(a.qualifier());
    let key_b = key(3).specialize(b.qualifier());
    let _ = map.get(&key_a, &md_a);
    let _ = map.get(&key_b, &md_b);

    a.close();
    assert!(!map.contains(&key_a));
    assert!(map.contains(&key_b));
  }

  #[test]
  fn test_closing_twice_is_idempotent() {
    let map: LogSiteMap<AtomicU64> = LogSiteMap::new(AtomicU64::default);
    let scope = LoggingScope::create("request");

    let mut metadata = MutableMetadata::new();
    metadata.add_value(&keys::LOG_SITE_GROUPING_KEY, scope.clone());

    let grouped = key(9).specialize(scope.qualifier());
    let _ = map.get(&grouped, &metadata);

    scope.close();
    scope.close();
    assert!(!map.contains(&grouped));
  }

  #[test]
  fn test_reinsert_after_removal_creates_fresh_value() {
    let map: LogSiteMap<AtomicU64> = LogSiteMap::new(AtomicU64::default);
    let scope = LoggingScope::create("request");

    let mut metadata = MutableMetadata::new();
    metadata.add_value(&keys::LOG_SITE_GROUPING_KEY, scope.clone());

    let grouped = key(4).specialize(scope.qualifier());
    let first = map.get(&grouped, &metadata);
    scope.close();

    let second = map.get(&grouped, &metadata);
    assert!(!std::sync::Arc::ptr_eq(&first, &second));
  }
}
