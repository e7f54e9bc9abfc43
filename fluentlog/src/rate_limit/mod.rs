//! # Rate Limit Module
//!
//! Per-log-site rate limiting policies and their combination algebra.
//!
//! Each limiter either has no opinion (not configured for the statement),
//! disallows, or returns a *pending* token: it has agreed to emit once
//! and expects exactly one reset after the record is delivered. A
//! statement is permitted iff at least one opinion was expressed and
//! none was a disallow; pending opinions merge into a composite token
//! that resets all constituents.
//!
//! All limiter state is lock-free atomics shared through
//! [`LogSiteMap`] entries.


use rand::Rng;
use smallvec::SmallVec;
use std::fmt;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use crate::log_site_map::LogSiteMap;

/// A limiter that granted a pending emission and awaits its reset.
pub trait LimiterReset: Send + Sync {
  fn reset(&self, now_nanos: i64);
}

/// Three-state outcome of consulting a limiter.
#[derive(Clone)]
pub enum RateLimitStatus {
  Allow,
  Disallow,
  /// Emission granted; the tokens must be reset exactly once after the
  /// record is delivered.
  Pending(SmallVec<[Arc<dyn LimiterReset>; 2]>),
}

impl RateLimitStatus {
  fn pending(token: Arc<dyn LimiterReset>) -> Self {
    let mut tokens = SmallVec::new();
    tokens.push(token);
    RateLimitStatus::Pending(tokens)
  }

  /// Combines two optional opinions: `None` is the identity,
  /// `Disallow` is absorbing, and pending tokens accumulate.
  pub fn combine(a: Option<Self>, b: Option<Self>) -> Option<Self> {
    use RateLimitStatus::*;
    match (a, b) {
      (None, b) => b,
      (a, None) => a,
      (Some(Disallow), _) | (_, Some(Disallow)) => Some(Disallow),
      (Some(Allow), Some(other)) => Some(other),
      (Some(other), Some(Allow)) => Some(other),
      (Some(Pending(mut left)), Some(Pending(right))) => {
        left.extend(right);
        Some(Pending(left))
      },
    }
  }

  pub fn is_allowed(&self) -> bool {
    !matches!(self, RateLimitStatus::Disallow)
  }

  /// Resets every constituent limiter. Call at most once per status.
  pub fn reset(&self, now_nanos: i64) {
    if let RateLimitStatus::Pending(tokens) = self {
      for token in tokens {
        token.reset(now_nanos);
      }
    }
  }
}

impl fmt::Debug for RateLimitStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RateLimitStatus::Allow => f.write_str("Allow"),
      RateLimitStatus::Disallow => f.write_str("Disallow"),
      RateLimitStatus::Pending(tokens) => write!(f, "Pending({})", tokens.len()),
    }
  }
}

/// "Every N" limiter.
///
/// Seeded at `i64::MAX` with saturating increments so the first check
/// always fires; reset stores zero, giving the {1, N+1, 2N+1, ...}
/// cadence.
pub struct CountingRateLimiter {
  invocation_count: AtomicI64,
}

impl CountingRateLimiter {
  pub fn new() -> Self {
    Self {
      invocation_count: AtomicI64::new(i64::MAX),
    }
  }

  pub fn check(this: &Arc<Self>, rate_limit_count: u32) -> RateLimitStatus {
    let previous = this
      .invocation_count
      .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
        Some(count.saturating_add(1))
      })
      .unwrap_or_else(|previous| previous);
    if previous.saturating_add(1) >= rate_limit_count as i64 {
      RateLimitStatus::pending(Arc::clone(this) as Arc<dyn LimiterReset>)
    } else {
      RateLimitStatus::Disallow
    }
  }
}

impl Default for CountingRateLimiter {
  fn default() -> Self {
    Self::new()
  }
}

impl LimiterReset for CountingRateLimiter {
  fn reset(&self, _now_nanos: i64) {
    self.invocation_count.store(0, Ordering::Release);
  }
}

/// "At most every Δ" limiter.
///
/// Stores the timestamp of the last permitted emission; a value of zero
/// or below means "never emitted".
pub struct TimedRateLimiter {
  last_timestamp_nanos: AtomicI64,
}

impl TimedRateLimiter {
  pub fn new() -> Self {
    Self {
      last_timestamp_nanos: AtomicI64::new(0),
    }
  }

  /// A non-positive period means the limiter is not configured and has
  /// no opinion.
  pub fn check(
    this: &Arc<Self>,
    period_nanos: i64,
    now_nanos: i64,
  ) -> Option<RateLimitStatus> {
    if period_nanos <= 0 {
      return None;
    }
    let last = this.last_timestamp_nanos.load(Ordering::Acquire);
    if last <= 0 || now_nanos.saturating_sub(last) >= period_nanos {
      Some(RateLimitStatus::pending(
        Arc::clone(this) as Arc<dyn LimiterReset>
      ))
    } else {
      Some(RateLimitStatus::Disallow)
    }
  }
}

impl Default for TimedRateLimiter {
  fn default() -> Self {
    Self::new()
  }
}

impl LimiterReset for TimedRateLimiter {
  /// The stored timestamp never moves backwards, so racing resets keep
  /// the latest emission time.
  fn reset(&self, now_nanos: i64) {
    self.last_timestamp_nanos.fetch_max(now_nanos, Ordering::AcqRel);
  }
}

/// "On average every N" limiter.
///
/// With probability 1/N a pending slot is added; checks succeed while
/// slots are outstanding and each reset consumes one. The RNG is the
/// thread-local generator.
pub struct SamplingRateLimiter {
  pending_count: AtomicI64,
}

impl SamplingRateLimiter {
  pub fn new() -> Self {
    Self {
      pending_count: AtomicI64::new(0),
    }
  }

  pub fn check(this: &Arc<Self>, sample_count: u32) -> RateLimitStatus {
    if rand::rng().random_range(0..sample_count) == 0 {
      this.pending_count.fetch_add(1, Ordering::AcqRel);
    }
    if this.pending_count.load(Ordering::Acquire) > 0 {
      RateLimitStatus::pending(Arc::clone(this) as Arc<dyn LimiterReset>)
    } else {
      RateLimitStatus::Disallow
    }
  }
}

impl Default for SamplingRateLimiter {
  fn default() -> Self {
    Self::new()
  }
}

impl LimiterReset for SamplingRateLimiter {
  fn reset(&self, _now_nanos: i64) {
    self.pending_count.fetch_sub(1, Ordering::AcqRel);
  }
}

/// Counts statements dropped by rate limiting at one effective key;
/// the tally is attached to the next permitted record.
pub struct SkippedLogCounter {
  count: AtomicU64,
}

impl SkippedLogCounter {
  pub fn new() -> Self {
    Self {
      count: AtomicU64::new(0),
    }
  }

  pub fn increment(&self) {
    self.count.fetch_add(1, Ordering::AcqRel);
  }

  /// Returns the accumulated count and starts a fresh window.
  pub fn take(&self) -> u64 {
    self.count.swap(0, Ordering::AcqRel)
  }
}

impl Default for SkippedLogCounter {
  fn default() -> Self {
    Self::new()
  }
}

/// Per-logger home of all limiter state maps. Owned by the logger so
/// the core keeps no process-wide state.
pub struct RateLimitRegistry {
  pub counting: LogSiteMap<CountingRateLimiter>,
  pub timed: LogSiteMap<TimedRateLimiter>,
  pub sampling: LogSiteMap<SamplingRateLimiter>,
  pub skipped: LogSiteMap<SkippedLogCounter>,
}

impl RateLimitRegistry {
  pub fn new() -> Self {
    Self {
      counting: LogSiteMap::new(CountingRateLimiter::new),
      timed: LogSiteMap::new(TimedRateLimiter::new),
      sampling: LogSiteMap::new(SamplingRateLimiter::new),
      skipped: LogSiteMap::new(SkippedLogCounter::new),
    }
  }
}

impl Default for RateLimitRegistry {
  fn default() -> Self {
    Self::new()
  }
}
