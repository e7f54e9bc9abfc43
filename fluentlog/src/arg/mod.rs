//! # Argument Module
//!
//! The value model for log statement arguments.
//!
//! Arguments are captured eagerly as cheap enum values (primitives are
//! stored inline, everything else behind an `Arc`) but rendered lazily:
//! a statement that is dropped by level filtering or rate limiting never
//! evaluates `Display`/`Debug` implementations or lazy closures.
//!
//! User rendering code is untrusted: a panicking `Display` impl or lazy
//! closure is caught and rendered inline as `{<type>@<hash>: <message>}`
//! instead of unwinding through the logging call.

mod __test__;

use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::format::FormatOptions;
use crate::utils;

/// Argument vector type used by the fluent API and the [`args!`] macro.
///
/// Four inline slots cover the overwhelming majority of log statements
/// without a heap allocation.
///
/// [`args!`]: crate::args!
pub type ArgList = SmallVec<[Arg; 4]>;

/// A value that knows how to render itself under explicit format options.
///
/// The formatter hands `Formattable` arguments their parsed options
/// directly instead of applying the built-in width/precision handling.
pub trait Formattable: Send + Sync {
  fn format_to(&self, options: &FormatOptions, out: &mut String);
}

/// A single captured log statement argument.
#[derive(Clone)]
pub enum Arg {
  Bool(bool),
  Char(char),
  I64(i64),
  U64(u64),
  F64(f64),
  Str(Cow<'static, str>),
  /// Rendered via `Display` at format time.
  Display(Arc<dyn fmt::Display + Send + Sync>),
  /// Rendered via `Debug` at format time.
  Debug(Arc<dyn fmt::Debug + Send + Sync>),
  /// Evaluated only when the statement is actually formatted.
  Lazy(Arc<dyn Fn() -> String + Send + Sync>),
  /// Self-formatting value; receives the parsed format options.
  Formattable(Arc<dyn Formattable>),
}

impl Arg {
  /// Wrap a `Display` value without converting it up front.
  pub fn display<T: fmt::Display + Send + Sync + 'static>(value: T) -> Self {
    Arg::Display(Arc::new(value))
  }

  /// Wrap a `Debug` value without converting it up front.
  pub fn debug<T: fmt::Debug + Send + Sync + 'static>(value: T) -> Self {
    Arg::Debug(Arc::new(value))
  }

  /// Defer evaluation until the statement is known to be emitted.
  pub fn lazy<F: Fn() -> String + Send + Sync + 'static>(f: F) -> Self {
    Arg::Lazy(Arc::new(f))
  }

  /// Wrap a [`Formattable`] value.
  pub fn formattable<T: Formattable + 'static>(value: T) -> Self {
    Arg::Formattable(Arc::new(value))
  }

  /// Short type label used in mismatch markers, e.g. `type=String`.
  pub fn type_label(&self) -> &'static str {
    match self {
      Arg::Bool(_) => "bool",
      Arg::Char(_) => "char",
      Arg::I64(_) => "i64",
      Arg::U64(_) => "u64",
      Arg::F64(_) => "f64",
      Arg::Str(_) => "String",
      Arg::Display(_) => "Display",
      Arg::Debug(_) => "Debug",
      Arg::Lazy(_) => "Lazy",
      Arg::Formattable(_) => "Formattable",
    }
  }

  /// Render the argument to a plain string, catching panics from user
  /// rendering code.
  pub fn render(&self) -> String {
    match self {
      Arg::Bool(v) => v.to_string(),
      Arg::Char(v) => v.to_string(),
      Arg::I64(v) => v.to_string(),
      Arg::U64(v) => v.to_string(),
      Arg::F64(v) => v.to_string(),
      Arg::Str(v) => v.to_string(),
      Arg::Display(v) => {
        let v = Arc::clone(v);
        guarded_render("Display", move || v.to_string())
      },
      Arg::Debug(v) => {
        let v = Arc::clone(v);
        guarded_render("Debug", move || format!("{:?}", v))
      },
      Arg::Lazy(f) => {
        let f = Arc::clone(f);
        guarded_render("Lazy", move || f())
      },
      Arg::Formattable(v) => {
        let v = Arc::clone(v);
        guarded_render("Formattable", move || {
          let mut out = String::new();
          v.format_to(&FormatOptions::DEFAULT, &mut out);
          out
        })
      },
    }
  }

  /// Stable 64-bit hash of the rendered form; the `%h`/`%H` term renders
  /// this in hex.
  pub fn identity_hash(&self) -> u64 {
    utils::fnv1a_64(self.render().as_bytes())
  }
}

/// Runs user rendering code under a panic guard.
///
/// The replacement text follows the `{<type>@<hash>: <message>}` shape so
/// a broken `Display` impl is visible in the output without taking the
/// process down.
fn guarded_render<F: FnOnce() -> String>(type_label: &str, f: F) -> String {
  match panic::catch_unwind(AssertUnwindSafe(f)) {
    Ok(rendered) => rendered,
    Err(payload) => {
      let message = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
      } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
      } else {
        "panic".to_string()
      };
      format!(
        "{{{}@{:x}: {}}}",
        type_label,
        utils::fnv1a_64(type_label.as_bytes()),
        message
      )
    },
  }
}

impl fmt::Debug for Arg {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Arg::Bool(v) => write!(f, "Bool({})", v),
      Arg::Char(v) => write!(f, "Char({:?})", v),
      Arg::I64(v) => write!(f, "I64({})", v),
      Arg::U64(v) => write!(f, "U64({})", v),
      Arg::F64(v) => write!(f, "F64({})", v),
      Arg::Str(v) => write!(f, "Str({:?})", v),
      Arg::Display(_) => f.write_str("Display(..)"),
      Arg::Debug(_) => f.write_str("Debug(..)"),
      Arg::Lazy(_) => f.write_str("Lazy(..)"),
      Arg::Formattable(_) => f.write_str("Formattable(..)"),
    }
  }
}

macro_rules! impl_from_signed {
  ($($t:ty),*) => {
    $(impl From<$t> for Arg {
      #[inline]
      fn from(value: $t) -> Self {
        Arg::I64(value as i64)
      }
    })*
  };
}

macro_rules! impl_from_unsigned {
  ($($t:ty),*) => {
    $(impl From<$t> for Arg {
      #[inline]
      fn from(value: $t) -> Self {
        Arg::U64(value as u64)
      }
    })*
  };
}

impl_from_signed!(i8, i16, i32, i64, isize);
impl_from_unsigned!(u8, u16, u32, u64, usize);

impl From<bool> for Arg {
  #[inline]
  fn from(value: bool) -> Self {
    Arg::Bool(value)
  }
}

impl From<char> for Arg {
  #[inline]
  fn from(value: char) -> Self {
    Arg::Char(value)
  }
}

impl From<f32> for Arg {
  #[inline]
  fn from(value: f32) -> Self {
    Arg::F64(value as f64)
  }
}

impl From<f64> for Arg {
  #[inline]
  fn from(value: f64) -> Self {
    Arg::F64(value)
  }
}

impl From<&'static str> for Arg {
  #[inline]
  fn from(value: &'static str) -> Self {
    Arg::Str(Cow::Borrowed(value))
  }
}

impl From<String> for Arg {
  #[inline]
  fn from(value: String) -> Self {
    Arg::Str(Cow::Owned(value))
  }
}

impl From<Cow<'static, str>> for Arg {
  #[inline]
  fn from(value: Cow<'static, str>) -> Self {
    Arg::Str(value)
  }
}

/// Builds an [`ArgList`] from anything convertible into [`Arg`].
///
/// ```rust,ignore
/// logger.at_info().logf("user %s retried %d times", fluentlog::args!["alice", 3]);
/// ```
#[macro_export]
macro_rules! args {
  () => {
    $crate::arg::ArgList::new()
  };
  ($($value:expr),+ $(,)?) => {{
    let mut list = $crate::arg::ArgList::new();
    $(list.push($crate::arg::Arg::from($value));)+
    list
  }};
}
