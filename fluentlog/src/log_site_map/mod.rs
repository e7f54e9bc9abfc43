//! # Log Site Map Module
//!
//! Concurrent per-log-site state, keyed by [`LogSiteKey`].
//!
//! Values are created lazily on first access and stay stable until
//! scope closure removes the entry. Insertion uses the read-then-write
//! double-checked pattern: concurrent callers for the same key converge
//! on one value and losers discard theirs. Each access first drains a
//! bounded batch of pending scope cleanup work.

mod __test__;

use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};

use crate::context::keys;
use crate::log_site::LogSiteKey;
use crate::metadata::Metadata;
use crate::scope;

struct MapInner<V> {
  entries: RwLock<HashMap<LogSiteKey, Arc<V>>>,
  init: fn() -> V,
}

/// Concurrent mapping from log-site keys to shared state values.
///
/// The value type must be internally thread-safe; entries are handed out
/// as shared references to many statements at once.
pub struct LogSiteMap<V> {
  inner: Arc<MapInner<V>>,
}

impl<V: Send + Sync + 'static> LogSiteMap<V> {
  /// Creates a map whose entries are produced by `init` on first access.
  pub fn new(init: fn() -> V) -> Self {
    Self {
      inner: Arc::new(MapInner {
        entries: RwLock::new(HashMap::new()),
        init,
      }),
    }
  }

  /// Returns the stable value for `key`, creating it on first access.
  ///
  /// On first insertion, every logging scope found in `metadata` under
  /// the site-grouping key gets a removal hook that deletes this entry
  /// when the scope closes.
  pub fn get(&self, key: &LogSiteKey, metadata: &dyn Metadata) -> Arc<V> {
    scope::drain_pending(scope::CLEANUP_BATCH);

    if let Ok(entries) = self.inner.entries.read() {
      if let Some(value) = entries.get(key) {
        return Arc::clone(value);
      }
    }

    let (value, inserted) = {
      let mut entries = match self.inner.entries.write() {
        Ok(entries) => entries,
        Err(poisoned) => poisoned.into_inner(),
      };
      // Re-check after taking the write lock; a racing creator may have
      // inserted already, in which case their value wins.
      match entries.get(key) {
        Some(existing) => (Arc::clone(existing), false),
        None => {
          let value = Arc::new((self.inner.init)());
          entries.insert(key.clone(), Arc::clone(&value));
          (value, true)
        },
      }
    };

    if inserted {
      self.register_removal_hooks(key, metadata);
    }
    value
  }

  /// Hooks run outside the map lock; a hook firing for an already
  /// removed entry is a no-op, so they stay idempotent.
  fn register_removal_hooks(&self, key: &LogSiteKey, metadata: &dyn Metadata) {
    let grouping = keys::LOG_SITE_GROUPING_KEY.erased();
    for n in 0..metadata.size() {
      if metadata.key_at(n) == grouping {
        let logging_scope = keys::LOG_SITE_GROUPING_KEY.cast(metadata.value_at(n));
        let weak: Weak<MapInner<V>> = Arc::downgrade(&self.inner);
        let key = key.clone();
        logging_scope.on_close(Box::new(move || {
          if let Some(inner) = weak.upgrade() {
            let mut entries = match inner.entries.write() {
              Ok(entries) => entries,
              Err(poisoned) => poisoned.into_inner(),
            };
            entries.remove(&key);
          }
        }));
      }
    }
  }

  /// Test probe for scope-driven eviction.
  pub fn contains(&self, key: &LogSiteKey) -> bool {
    self
      .inner
      .entries
      .read()
      .map(|entries| entries.contains_key(key))
      .unwrap_or(false)
  }

  pub fn len(&self) -> usize {
    self.inner.entries.read().map(|e| e.len()).unwrap_or(0)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl<V> Clone for LogSiteMap<V> {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner),
    }
  }
}
