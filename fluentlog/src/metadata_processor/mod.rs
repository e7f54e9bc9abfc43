//! # Metadata Processor Module
//!
//! Merged view over scope metadata followed by log-site metadata.
//!
//! The merged key order is first-occurrence order across the
//! concatenation. Non-repeating keys from the log site shadow the scope;
//! repeating keys concatenate, scope values first.
//!
//! Construction has two contract-equivalent paths: a lightweight one that
//! folds the keys' Bloom masks into a 64-bit filter and only falls back
//! to a linear duplicate scan on a filter hit (at most
//! [`MAX_LIGHTWEIGHT_ELEMENTS`] entries), and a simple linear one for
//! larger inputs.


use smallvec::SmallVec;
use std::fmt;

use crate::metadata::Metadata;
use crate::metadata_key::{AnyKey, AnyValue, MetadataKey};

/// Entry budget of the Bloom-filtered construction path.
pub const MAX_LIGHTWEIGHT_ELEMENTS: usize = 28;

/// Receiver for merged metadata dispatch.
///
/// Repeating keys arrive through `handle_repeated` with a read-only
/// iterator over their values in merged order.
pub trait MetadataHandler<C> {
  fn handle_single(&mut self, key: &AnyKey, value: &AnyValue, ctx: &mut C);
  fn handle_repeated(
    &mut self,
    key: &AnyKey,
    values: &mut dyn Iterator<Item = &AnyValue>,
    ctx: &mut C,
  );
}

/// A merged, deduplicated view over `(scope, logged)` metadata.
pub struct MetadataProcessor<'a> {
  scope: &'a dyn Metadata,
  logged: &'a dyn Metadata,
  /// Concatenation index of each key's first occurrence, in order.
  first_indices: SmallVec<[u32; MAX_LIGHTWEIGHT_ELEMENTS]>,
}

impl<'a> MetadataProcessor<'a> {
  /// Picks the construction path by total entry count.
  pub fn of(scope: &'a dyn Metadata, logged: &'a dyn Metadata) -> Self {
    if scope.size() + logged.size() <= MAX_LIGHTWEIGHT_ELEMENTS {
      Self::lightweight(scope, logged)
    } else {
      Self::simple(scope, logged)
    }
  }

  /// Bloom-filtered construction: a missed filter lookup proves the key
  /// is new and skips duplicate detection entirely.
  pub fn lightweight(scope: &'a dyn Metadata, logged: &'a dyn Metadata) -> Self {
    let total = scope.size() + logged.size();
    debug_assert!(total <= MAX_LIGHTWEIGHT_ELEMENTS);

    let mut processor = Self {
      scope,
      logged,
      first_indices: SmallVec::new(),
    };
    let mut bloom = 0u64;
    for n in 0..total {
      let key = processor.key_at_concat(n);
      let mask = key.bloom_mask();
      if bloom & mask != mask {
        // Definitely unseen.
        bloom |= mask;
        processor.first_indices.push(n as u32);
      } else if !processor.seen(key) {
        // Filter false positive.
        processor.first_indices.push(n as u32);
      }
    }
    processor
  }

  /// Linear construction without the filter; no entry limit.
  pub fn simple(scope: &'a dyn Metadata, logged: &'a dyn Metadata) -> Self {
    let total = scope.size() + logged.size();
    let mut processor = Self {
      scope,
      logged,
      first_indices: SmallVec::new(),
    };
    for n in 0..total {
      let key = processor.key_at_concat(n);
      if !processor.seen(key) {
        processor.first_indices.push(n as u32);
      }
    }
    processor
  }

  fn seen(&self, key: &AnyKey) -> bool {
    self
      .first_indices
      .iter()
      .any(|&n| self.key_at_concat(n as usize) == key)
  }

  fn key_at_concat(&self, n: usize) -> &AnyKey {
    if n < self.scope.size() {
      self.scope.key_at(n)
    } else {
      self.logged.key_at(n - self.scope.size())
    }
  }

  /// Number of distinct keys in the merged view.
  pub fn key_count(&self) -> usize {
    self.first_indices.len()
  }

  /// Distinct keys in first-occurrence order.
  pub fn keys(&self) -> impl Iterator<Item = &AnyKey> + '_ {
    self
      .first_indices
      .iter()
      .map(move |&n| self.key_at_concat(n as usize))
  }

  /// Dispatches every distinct key to the handler in merged order.
  pub fn process<C>(&self, handler: &mut dyn MetadataHandler<C>, ctx: &mut C) {
    for &n in &self.first_indices {
      let key = self.key_at_concat(n as usize);
      self.dispatch(key, handler, ctx);
    }
  }

  /// Targeted dispatch for one key. Returns false when absent.
  pub fn handle<C>(&self, key: &AnyKey, handler: &mut dyn MetadataHandler<C>, ctx: &mut C) -> bool {
    if self.seen(key) {
      self.dispatch(key, handler, ctx);
      true
    } else {
      false
    }
  }

  fn dispatch<C>(&self, key: &AnyKey, handler: &mut dyn MetadataHandler<C>, ctx: &mut C) {
    if key.can_repeat() {
      let mut values = ValuesIter {
        scope: self.scope,
        logged: self.logged,
        key,
        pos: 0,
      };
      handler.handle_repeated(key, &mut values, ctx);
    } else {
      // Logged shadows scope for non-repeating keys.
      let value = self
        .logged
        .find_any(key)
        .or_else(|| self.scope.find_any(key))
        .expect("first-occurrence index points at a present key");
      handler.handle_single(key, value, ctx);
    }
  }

  /// The unique value for `key` in the merged view.
  ///
  /// Panics if `key` is repeatable and carries more than one value —
  /// that lookup is a defect in the calling code.
  pub fn single_value<'s, T: fmt::Display + Send + Sync + 'static>(
    &'s self,
    key: &MetadataKey<T>,
  ) -> Option<&'s T> {
    let erased = key.erased();
    if erased.can_repeat() {
      let count = self.count_values(erased);
      if count > 1 {
        panic!(
          "single-value lookup of repeated metadata key {:?} ({} values)",
          key.label(),
          count
        );
      }
    }
    self
      .logged
      .find_any(erased)
      .or_else(|| self.scope.find_any(erased))
      .map(|value| key.cast(value))
  }

  fn count_values(&self, key: &AnyKey) -> usize {
    let total = self.scope.size() + self.logged.size();
    (0..total).filter(|&n| self.key_at_concat(n) == key).count()
  }
}

/// Read-only iterator over a repeated key's merged values, scope first.
struct ValuesIter<'a, 'k> {
  scope: &'a dyn Metadata,
  logged: &'a dyn Metadata,
  key: &'k AnyKey,
  pos: usize,
}

impl<'a, 'k> Iterator for ValuesIter<'a, 'k> {
  type Item = &'a AnyValue;

  fn next(&mut self) -> Option<Self::Item> {
    let total = self.scope.size() + self.logged.size();
    while self.pos < total {
      let n = self.pos;
      self.pos += 1;
      let (key, value) = if n < self.scope.size() {
        (self.scope.key_at(n), self.scope.value_at(n))
      } else {
        let m = n - self.scope.size();
        (self.logged.key_at(m), self.logged.value_at(m))
      };
      if key == self.key {
        return Some(value);
      }
    }
    None
  }
}
