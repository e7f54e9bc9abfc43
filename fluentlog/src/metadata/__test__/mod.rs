#[cfg(test)]
mod __test__ {

  use crate::metadata::{self, Metadata, MutableMetadata};
  use crate::metadata_key::MetadataKey;

  #[test]
  fn test_insertion_order_is_preserved() {
    let user: MetadataKey<String> = MetadataKey::single("user");
    let count: MetadataKey<u32> = MetadataKey::single("count");

    let mut md = MutableMetadata::new();
    md.add_value(&user, "alice".to_string());
    md.add_value(&count, 3);

    assert_eq!(md.size(), 2);
    assert_eq!(md.key_at(0), user.erased());
    assert_eq!(md.key_at(1), count.erased());
  }

  #[test]
  fn test_single_key_replaces_in_place() {
    let user: MetadataKey<String> = MetadataKey::single("user");
    let count: MetadataKey<u32> = MetadataKey::single("count");

    let mut md = MutableMetadata::new();
    md.add_value(&user, "alice".to_string());
    md.add_value(&count, 3);
    md.add_value(&user, "bob".to_string());

    // Replaced, not re-appended; order unchanged.
    assert_eq!(md.size(), 2);
    assert_eq!(md.key_at(0), user.erased());
    assert_eq!(metadata::find_value(&md, &user).unwrap(), "bob");
  }

  #[test]
  fn test_repeated_key_keeps_duplicates_in_order() {
    let tag: MetadataKey<String> = MetadataKey::repeated("tag");

    let mut md = MutableMetadata::new();
    md.add_value(&tag, "a".to_string());
    md.add_value(&tag, "b".to_string());

    assert_eq!(md.size(), 2);
    assert_eq!(tag.cast(md.value_at(0)), "a");
    assert_eq!(tag.cast(md.value_at(1)), "b");
    // find_value returns the first.
    assert_eq!(metadata::find_value(&md, &tag).unwrap(), "a");
  }

  #[test]
  fn test_remove_all_preserves_remaining_order() {
    let tag: MetadataKey<String> = MetadataKey::repeated("tag");
    let user: MetadataKey<String> = MetadataKey::single("user");
    let count: MetadataKey<u32> = MetadataKey::single("count");

    let mut md = MutableMetadata::new();
    md.add_value(&tag, "a".to_string());
    md.add_value(&user, "alice".to_string());
    md.add_value(&tag, "b".to_string());
    md.add_value(&count, 3);
    md.remove_all(&tag);

    assert_eq!(md.size(), 2);
    assert_eq!(md.key_at(0), user.erased());
    assert_eq!(md.key_at(1), count.erased());
  }

  #[test]
  fn test_same_label_different_key_identity() {
    let a: MetadataKey<u32> = MetadataKey::single("n");
    let b: MetadataKey<u32> = MetadataKey::single("n");

    let mut md = MutableMetadata::new();
    md.add_value(&a, 1);
    md.add_value(&b, 2);

    // Distinct identities do not shadow each other.
    assert_eq!(md.size(), 2);
    assert_eq!(*metadata::find_value(&md, &a).unwrap(), 1);
    assert_eq!(*metadata::find_value(&md, &b).unwrap(), 2);
  }

  #[test]
  fn test_empty_metadata() {
    let empty = metadata::empty();
    assert_eq!(empty.size(), 0);
    let user: MetadataKey<String> = MetadataKey::single("user");
    assert!(metadata::find_value(empty, &user).is_none());
  }
}
