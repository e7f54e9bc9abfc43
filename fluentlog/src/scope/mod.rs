//! # Logging Scope Module
//!
//! User-visible scope markers whose lifetime bounds per-log-site state.
//!
//! A scope has two identities: the user-owned [`LoggingScope`] handle and
//! the internal [`ScopeQualifier`] key part, which specialized log-site
//! keys hold only weakly. Closing a scope runs its registered removal
//! hooks immediately; a scope dropped without being closed pushes its
//! hooks onto a lock-free pending queue, which per-site maps drain in
//! bounded batches on later logging calls.


use crossbeam_queue::SegQueue;
use once_cell::sync::Lazy;
use std::borrow::Cow;
use std::fmt;
use std::mem;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::utils;

/// Callback run when a scope ends; removes per-site state tied to it.
pub type RemovalHook = Box<dyn FnOnce() + Send>;

/// Maximum number of pending hooks run per [`drain_pending`] call.
pub const CLEANUP_BATCH: usize = 16;

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// Hooks from scopes that became unreachable without an explicit close.
static PENDING_CLEANUP: Lazy<SegQueue<RemovalHook>> = Lazy::new(SegQueue::new);

/// Runs up to `max` queued removal hooks; returns how many ran.
///
/// Called opportunistically from hot paths, so cleanup cost is amortized
/// and bounded per call while still eventually completing.
pub fn drain_pending(max: usize) -> usize {
  let mut ran = 0;
  while ran < max {
    match PENDING_CLEANUP.pop() {
      Some(hook) => {
        hook();
        ran += 1;
      },
      None => break,
    }
  }
  ran
}

pub(crate) struct ScopeInner {
  label: Cow<'static, str>,
  id: u64,
  closed: AtomicBool,
  hooks: Mutex<Vec<RemovalHook>>,
}

impl Drop for ScopeInner {
  fn drop(&mut self) {
    // Unreachable without close(): defer remaining hooks to the queue.
    if !*self.closed.get_mut() {
      let hooks = match self.hooks.get_mut() {
        Ok(hooks) => mem::take(hooks),
        Err(poisoned) => mem::take(poisoned.into_inner()),
      };
      for hook in hooks {
        PENDING_CLEANUP.push(hook);
      }
    }
  }
}

/// An opaque marker with a human label, used to group per-site state.
///
/// Clones share the same identity. The scope ends when [`close`] is
/// called or when the last handle is dropped.
///
/// [`close`]: LoggingScope::close
#[derive(Clone)]
pub struct LoggingScope {
  inner: Arc<ScopeInner>,
}

impl LoggingScope {
  pub fn create(label: impl Into<Cow<'static, str>>) -> Self {
    Self {
      inner: Arc::new(ScopeInner {
        label: label.into(),
        id: NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed),
        closed: AtomicBool::new(false),
        hooks: Mutex::new(Vec::new()),
      }),
    }
  }

  pub fn label(&self) -> &str {
    &self.inner.label
  }

  pub fn is_closed(&self) -> bool {
    self.inner.closed.load(Ordering::Acquire)
  }

  /// Ends the scope and runs all registered removal hooks exactly once.
  pub fn close(&self) {
    if !self.inner.closed.swap(true, Ordering::AcqRel) {
      let hooks = {
        let mut guard = match self.inner.hooks.lock() {
          Ok(guard) => guard,
          Err(poisoned) => poisoned.into_inner(),
        };
        mem::take(&mut *guard)
      };
      for hook in hooks {
        hook();
      }
    }
  }

  /// Registers a hook to run when the scope ends.
  ///
  /// If the scope is already closed the hook runs immediately on the
  /// calling thread.
  pub fn on_close(&self, hook: RemovalHook) {
    {
      let mut guard = match self.inner.hooks.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
      };
      if !self.inner.closed.load(Ordering::Acquire) {
        guard.push(hook);
        return;
      }
    }
    // Already closed: run outside the lock.
    hook();
  }

  /// The weak key part that specialized log-site keys carry.
  pub fn qualifier(&self) -> ScopeQualifier {
    ScopeQualifier {
      id: self.inner.id,
      scope: Arc::downgrade(&self.inner),
    }
  }
}

impl fmt::Display for LoggingScope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.inner.label)
  }
}

impl fmt::Debug for LoggingScope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "LoggingScope({}#{})", self.inner.label, self.inner.id)
  }
}

/// Weak, identity-hashed reference to a scope, embedded in specialized
/// log-site keys. Holding a qualifier never keeps the scope alive.
#[derive(Clone)]
pub struct ScopeQualifier {
  id: u64,
  scope: Weak<ScopeInner>,
}

impl ScopeQualifier {
  pub fn id(&self) -> u64 {
    self.id
  }

  /// True while the scope is reachable and not closed.
  pub fn is_live(&self) -> bool {
    match self.scope.upgrade() {
      Some(inner) => !inner.closed.load(Ordering::Acquire),
      None => false,
    }
  }

  /// Stable hash used by the XOR-combining specialized key hash.
  pub fn hash64(&self) -> u64 {
    utils::mix64(self.id)
  }
}

impl PartialEq for ScopeQualifier {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
  }
}

impl Eq for ScopeQualifier {}

impl fmt::Debug for ScopeQualifier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "ScopeQualifier({})", self.id)
  }
}

/// A named scope kind, resolved to a concrete scope by the context data
/// provider (e.g. `ScopeType::of("request")`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeType {
  name: Cow<'static, str>,
}

impl ScopeType {
  pub fn of(name: impl Into<Cow<'static, str>>) -> Self {
    Self { name: name.into() }
  }

  pub fn name(&self) -> &str {
    &self.name
  }
}
