//! # Metadata Module
//!
//! Ordered (key, value) sequences attached to log statements and scopes.
//!
//! Order is insertion order. A non-repeating key appears at most once
//! (re-adding replaces the value in place, without reordering); a
//! repeating key may appear many times and keeps duplicate order.

mod __test__;

use smallvec::SmallVec;
use std::fmt;

use crate::metadata_key::{AnyKey, AnyValue, MetadataKey};

/// Read-only view over an ordered sequence of (key, value) pairs.
///
/// Indexed access panics out of bounds — callers iterate `0..size()`.
pub trait Metadata: Send + Sync {
  fn size(&self) -> usize;
  fn key_at(&self, n: usize) -> &AnyKey;
  fn value_at(&self, n: usize) -> &AnyValue;

  /// First value stored under `key`, if any.
  fn find_any(&self, key: &AnyKey) -> Option<&AnyValue> {
    (0..self.size())
      .find(|&n| self.key_at(n) == key)
      .map(|n| self.value_at(n))
  }
}

/// Typed lookup of the first value for `key`.
pub fn find_value<'a, T: fmt::Display + Send + Sync + 'static>(
  metadata: &'a dyn Metadata,
  key: &MetadataKey<T>,
) -> Option<&'a T> {
  metadata.find_any(key.erased()).map(|value| key.cast(value))
}

/// The shared empty view.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyMetadata;

impl Metadata for EmptyMetadata {
  fn size(&self) -> usize {
    0
  }

  fn key_at(&self, n: usize) -> &AnyKey {
    panic!("empty metadata has no entry {}", n)
  }

  fn value_at(&self, n: usize) -> &AnyValue {
    panic!("empty metadata has no entry {}", n)
  }
}

static EMPTY: EmptyMetadata = EmptyMetadata;

pub fn empty() -> &'static EmptyMetadata {
  &EMPTY
}

/// Append-only metadata used while a statement (or scope) is being built.
///
/// Statement metadata is confined to the building thread; sharing across
/// threads happens only after it is frozen into a record.
#[derive(Default)]
pub struct MutableMetadata {
  entries: SmallVec<[(AnyKey, AnyValue); 8]>,
}

impl MutableMetadata {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Adds a typed value. For a non-repeating key that is already present
  /// the existing value is replaced in place; entry order is unchanged.
  pub fn add_value<T: fmt::Display + Send + Sync + 'static>(
    &mut self,
    key: &MetadataKey<T>,
    value: T,
  ) {
    self.add_any(key.erased().clone(), key.value(value));
  }

  /// Erased form of [`add_value`], used when the value is pre-wrapped.
  ///
  /// [`add_value`]: MutableMetadata::add_value
  pub fn add_any(&mut self, key: AnyKey, value: AnyValue) {
    if !key.can_repeat() {
      if let Some(pos) = self.entries.iter().position(|(k, _)| *k == key) {
        self.entries[pos].1 = value;
        return;
      }
    }
    self.entries.push((key, value));
  }

  /// Removes every entry for `key`, preserving the order of the rest.
  pub fn remove_all<T: fmt::Display + Send + Sync + 'static>(&mut self, key: &MetadataKey<T>) {
    let erased = key.erased();
    self.entries.retain(|(k, _)| k != erased);
  }
}

impl Metadata for MutableMetadata {
  fn size(&self) -> usize {
    self.entries.len()
  }

  fn key_at(&self, n: usize) -> &AnyKey {
    &self.entries[n].0
  }

  fn value_at(&self, n: usize) -> &AnyValue {
    &self.entries[n].1
  }
}

impl fmt::Debug for MutableMetadata {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut map = f.debug_map();
    for (key, value) in &self.entries {
      map.entry(&key.label(), &key.render(value));
    }
    map.finish()
  }
}
