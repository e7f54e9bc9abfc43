#[cfg(test)]
mod __test__ {

  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Arc;

  use crate::arg::Arg;

  #[test]
  fn test_primitive_conversions() {
    assert!(matches!(Arg::from(42i32), Arg::I64(42)));
    assert!(matches!(Arg::from(42u16), Arg::U64(42)));
    assert!(matches!(Arg::from(true), Arg::Bool(true)));
    assert!(matches!(Arg::from('x'), Arg::Char('x')));
    assert!(matches!(Arg::from(1.5f64), Arg::F64(v) if v == 1.5));
  }

  #[test]
  fn test_string_conversions() {
    assert_eq!(Arg::from("hello").render(), "hello");
    assert_eq!(Arg::from(String::from("world")).render(), "world");
    assert_eq!(Arg::from("hello").type_label(), "String");
  }

  #[test]
  fn test_lazy_not_evaluated_until_rendered() {
    let evaluated = Arc::new(AtomicUsize::new(0));
    let probe = Arc::clone(&evaluated);
    let arg = Arg::lazy(move || {
      probe.fetch_add(1, Ordering::SeqCst);
      "lazy".to_string()
    });

    assert_eq!(evaluated.load(Ordering::SeqCst), 0);
    assert_eq!(arg.render(), "lazy");
    assert_eq!(evaluated.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn test_panicking_display_is_contained() {
    struct Broken;
    impl std::fmt::Display for Broken {
      fn fmt(&self, _f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        panic!("boom");
      }
    }

    let rendered = Arg::display(Broken).render();
    assert!(rendered.starts_with("{Display@"), "got {}", rendered);
    assert!(rendered.contains("boom"), "got {}", rendered);
  }

  #[test]
  fn test_identity_hash_is_stable() {
    let a = Arg::from("World").identity_hash();
    let b = Arg::from("World").identity_hash();
    assert_eq!(a, b);
    assert_ne!(a, Arg::from("world").identity_hash());
  }

  #[test]
  fn test_args_macro() {
    let list = crate::args!["a", 1, true];
    assert_eq!(list.len(), 3);
    assert!(matches!(list[1], Arg::I64(1)));

    let empty = crate::args![];
    assert!(empty.is_empty());
  }
}
