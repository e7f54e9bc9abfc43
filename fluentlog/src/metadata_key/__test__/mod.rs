#[cfg(test)]
mod __test__ {

  use crate::metadata_key::MetadataKey;

  #[test]
  fn test_keys_have_identity_semantics() {
    let a: MetadataKey<u32> = MetadataKey::single("count");
    let b: MetadataKey<u32> = MetadataKey::single("count");
    assert_ne!(a, b);
    assert_eq!(a, a.clone());
    assert_ne!(a.erased(), b.erased());
  }

  #[test]
  fn test_bloom_mask_has_exactly_five_bits() {
    for _ in 0..64 {
      let key: MetadataKey<u32> = MetadataKey::single("mask_probe");
      assert_eq!(key.erased().bloom_mask().count_ones(), 5);
    }
  }

  #[test]
  fn test_cast_round_trip() {
    let key: MetadataKey<String> = MetadataKey::single("user");
    let value = key.value("alice".to_string());
    assert_eq!(key.cast(&value), "alice");
    assert_eq!(key.erased().render(&value), "alice");
  }

  #[test]
  #[should_panic(expected = "wrong type")]
  fn test_cast_fails_loudly_on_type_confusion() {
    let string_key: MetadataKey<String> = MetadataKey::single("user");
    let count_key: MetadataKey<u32> = MetadataKey::single("user");
    let value = count_key.value(7);
    let _ = string_key.cast(&value);
  }

  #[test]
  #[should_panic(expected = "invalid metadata key label")]
  fn test_label_must_be_lower_snake() {
    let _: MetadataKey<u32> = MetadataKey::single("BadLabel");
  }

  #[test]
  #[should_panic(expected = "invalid metadata key label")]
  fn test_label_must_not_start_with_digit() {
    let _: MetadataKey<u32> = MetadataKey::single("1count");
  }

  #[test]
  fn test_repeatable_flag() {
    let single: MetadataKey<u32> = MetadataKey::single("one");
    let repeated: MetadataKey<u32> = MetadataKey::repeated("many");
    assert!(!single.can_repeat());
    assert!(repeated.can_repeat());
  }
}
