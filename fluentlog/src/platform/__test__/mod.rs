#[cfg(test)]
mod __test__ {

  use crate::level::Level;
  use crate::platform::{
    default_platform, ContextDataProvider, NoOpContextDataProvider, Platform,
  };
  use crate::scope::ScopeType;

  #[test]
  fn test_default_platform_clock_advances() {
    let platform = default_platform();
    let first = platform.now_nanos();
    assert!(first > 0);
    assert!(platform.now_nanos() >= first);
  }

  #[test]
  fn test_default_platform_is_shared() {
    let a = default_platform();
    let b = default_platform();
    assert!(std::sync::Arc::ptr_eq(&a, &b));
  }

  #[test]
  fn test_noop_provider_defaults() {
    let provider = NoOpContextDataProvider;
    assert!(provider.tags().is_empty());
    assert_eq!(provider.metadata().size(), 0);
    assert!(!provider.should_force_logging("any", Level::Error, false));
    assert!(provider.current_scope(&ScopeType::of("request")).is_none());
  }

  #[test]
  fn test_backend_carries_logger_name() {
    let backend = default_platform().backend("app.module");
    assert_eq!(backend.name(), "app.module");
  }
}
