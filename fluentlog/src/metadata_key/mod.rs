//! # Metadata Key Module
//!
//! Typed, labeled identities for structured log attributes.
//!
//! Keys have *identity* semantics: two keys created with the same label
//! are different keys. Each key carries a 64-bit Bloom mask with exactly
//! 5 bits set, derived from its identity, which the metadata processor
//! uses to skip duplicate detection when no duplication is possible.
//! Canonical keys are process-wide singletons (see `context::keys`).

mod __test__;

use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::utils;

/// Type-erased metadata value. Typed access goes through
/// [`MetadataKey::cast`], which fails loudly when misused.
pub type AnyValue = Arc<dyn Any + Send + Sync>;

static NEXT_KEY_ID: AtomicU64 = AtomicU64::new(1);

struct KeyCore {
  label: Cow<'static, str>,
  repeatable: bool,
  id: u64,
  bloom_mask: u64,
  type_id: TypeId,
  type_name: &'static str,
  render: fn(&AnyValue) -> Option<String>,
}

/// Builds a mask with exactly 5 distinct bits by consuming successive
/// 6-bit slices of the mixed identity, re-mixing when a hash word runs
/// out of slices.
fn bloom_mask(id: u64) -> u64 {
  let mut mask = 0u64;
  let mut hash = utils::mix64(id);
  let mut remaining = 64u32;
  while mask.count_ones() < 5 {
    if remaining < 6 {
      hash = utils::mix64(hash);
      remaining = 64;
    }
    mask |= 1u64 << (hash & 0x3F);
    hash >>= 6;
    remaining -= 6;
  }
  mask
}

/// Labels must match `[a-z][a-z0-9_]*`; anything else is a defect in
/// logging code and panics at key construction.
fn validate_label(label: &str) {
  let mut chars = label.chars();
  let valid = match chars.next() {
    Some(first) => {
      first.is_ascii_lowercase()
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    },
    None => false,
  };
  if !valid {
    panic!("invalid metadata key label: {:?}", label);
  }
}

/// The erased form of a metadata key, used for storage and processing.
#[derive(Clone)]
pub struct AnyKey {
  core: Arc<KeyCore>,
}

impl AnyKey {
  pub fn label(&self) -> &str {
    &self.core.label
  }

  pub fn can_repeat(&self) -> bool {
    self.core.repeatable
  }

  pub fn bloom_mask(&self) -> u64 {
    self.core.bloom_mask
  }

  pub fn id(&self) -> u64 {
    self.core.id
  }

  /// Renders a value of this key's type for display. A value of the
  /// wrong type renders a placeholder instead of panicking; display
  /// paths must never fail.
  pub fn render(&self, value: &AnyValue) -> String {
    (self.core.render)(value).unwrap_or_else(|| format!("<{}>", self.core.type_name))
  }
}

impl PartialEq for AnyKey {
  fn eq(&self, other: &Self) -> bool {
    self.core.id == other.core.id
  }
}

impl Eq for AnyKey {}

impl Hash for AnyKey {
  fn hash<H: Hasher>(&self, state: &mut H) {
    state.write_u64(self.core.id);
  }
}

impl fmt::Debug for AnyKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "AnyKey({}#{})", self.core.label, self.core.id)
  }
}

/// A typed metadata key for values of type `T`.
pub struct MetadataKey<T> {
  erased: AnyKey,
  _marker: PhantomData<fn(T) -> T>,
}

impl<T: fmt::Display + Send + Sync + 'static> MetadataKey<T> {
  /// A key that holds at most one value; re-adding replaces in place.
  pub fn single(label: impl Into<Cow<'static, str>>) -> Self {
    Self::new(label, false)
  }

  /// A key that may appear multiple times, preserving insertion order.
  pub fn repeated(label: impl Into<Cow<'static, str>>) -> Self {
    Self::new(label, true)
  }

  fn new(label: impl Into<Cow<'static, str>>, repeatable: bool) -> Self {
    let label = label.into();
    validate_label(&label);
    let id = NEXT_KEY_ID.fetch_add(1, Ordering::Relaxed);
    Self {
      erased: AnyKey {
        core: Arc::new(KeyCore {
          label,
          repeatable,
          id,
          bloom_mask: bloom_mask(id),
          type_id: TypeId::of::<T>(),
          type_name: std::any::type_name::<T>(),
          render: render_value::<T>,
        }),
      },
      _marker: PhantomData,
    }
  }

  pub fn label(&self) -> &str {
    self.erased.label()
  }

  pub fn can_repeat(&self) -> bool {
    self.erased.can_repeat()
  }

  pub fn erased(&self) -> &AnyKey {
    &self.erased
  }

  /// Wraps a value for storage under this key.
  pub fn value(&self, value: T) -> AnyValue {
    Arc::new(value)
  }

  /// Typed view of a stored value. Panics if the value was not stored
  /// under this key's type; that is a defect in logging code, not in
  /// the logged data.
  pub fn cast<'a>(&self, value: &'a AnyValue) -> &'a T {
    debug_assert_eq!(self.erased.core.type_id, TypeId::of::<T>());
    value.downcast_ref::<T>().unwrap_or_else(|| {
      panic!(
        "metadata key {:?} used to read a value of the wrong type",
        self.erased.core.label
      )
    })
  }
}

fn render_value<T: fmt::Display + Send + Sync + 'static>(value: &AnyValue) -> Option<String> {
  value.downcast_ref::<T>().map(|v| v.to_string())
}

impl<T> Clone for MetadataKey<T> {
  fn clone(&self) -> Self {
    Self {
      erased: self.erased.clone(),
      _marker: PhantomData,
    }
  }
}

impl<T> PartialEq for MetadataKey<T> {
  fn eq(&self, other: &Self) -> bool {
    self.erased == other.erased
  }
}

impl<T> Eq for MetadataKey<T> {}

impl<T> fmt::Debug for MetadataKey<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "MetadataKey({})", self.erased.label())
  }
}
