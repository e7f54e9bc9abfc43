//! # Tags Module
//!
//! Simple key/value pairs supplied by the context data provider and
//! merged into every record under the `tags` metadata key.
//!
//! Labels map to *sets* of values, so merging is commutative and
//! duplicate-free; a label with no values is a bare marker tag. Keys
//! and values render in sorted order, which keeps output deterministic.


use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A single tag value. Kept to totally ordered types so value sets
/// have a canonical order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum TagValue {
  Bool(bool),
  I64(i64),
  Str(String),
}

impl fmt::Display for TagValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TagValue::Bool(v) => write!(f, "{}", v),
      TagValue::I64(v) => write!(f, "{}", v),
      TagValue::Str(v) => write!(f, "{:?}", v),
    }
  }
}

/// An immutable set of tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tags {
  map: BTreeMap<String, BTreeSet<TagValue>>,
}

impl Tags {
  pub fn empty() -> Self {
    Self::default()
  }

  pub fn builder() -> TagsBuilder {
    TagsBuilder {
      map: BTreeMap::new(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.map.is_empty()
  }

  pub fn len(&self) -> usize {
    self.map.len()
  }

  pub fn contains(&self, label: &str) -> bool {
    self.map.contains_key(label)
  }

  pub fn values(&self, label: &str) -> Option<&BTreeSet<TagValue>> {
    self.map.get(label)
  }

  /// Set-union merge; both operands stay usable.
  pub fn merge(&self, other: &Tags) -> Tags {
    let mut merged = self.map.clone();
    for (label, values) in &other.map {
      merged
        .entry(label.clone())
        .or_default()
        .extend(values.iter().cloned());
    }
    Tags { map: merged }
  }
}

impl fmt::Display for Tags {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("[ ")?;
    let mut first = true;
    for (label, values) in &self.map {
      if values.is_empty() {
        if !first {
          f.write_str(", ")?;
        }
        first = false;
        f.write_str(label)?;
        continue;
      }
      for value in values {
        if !first {
          f.write_str(", ")?;
        }
        first = false;
        write!(f, "{}={}", label, value)?;
      }
    }
    f.write_str(" ]")
  }
}

/// Chainable builder for [`Tags`].
pub struct TagsBuilder {
  map: BTreeMap<String, BTreeSet<TagValue>>,
}

impl TagsBuilder {
  fn entry(&mut self, label: impl Into<String>) -> &mut BTreeSet<TagValue> {
    let label = label.into();
    if label.is_empty() {
      panic!("tag labels must not be empty");
    }
    self.map.entry(label).or_default()
  }

  /// A bare marker tag with no value.
  pub fn add(mut self, label: impl Into<String>) -> Self {
    self.entry(label);
    self
  }

  pub fn add_bool(mut self, label: impl Into<String>, value: bool) -> Self {
    self.entry(label).insert(TagValue::Bool(value));
    self
  }

  pub fn add_i64(mut self, label: impl Into<String>, value: i64) -> Self {
    self.entry(label).insert(TagValue::I64(value));
    self
  }

  pub fn add_str(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
    self.entry(label).insert(TagValue::Str(value.into()));
    self
  }

  pub fn build(self) -> Tags {
    Tags { map: self.map }
  }
}
