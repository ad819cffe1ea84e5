mod common;

use common::build_test_cache;
use fibre_ttl::{Cache, CacheBuilder, CacheError, Ttl};
use std::time::{Duration, SystemTime};

fn new_test_cache() -> Cache<String, i32> {
  CacheBuilder::<String, i32>::new().build().unwrap()
}

#[test]
fn test_sync_set_and_get() {
  let cache = new_test_cache();
  cache.set("key1".to_string(), 10);

  assert_eq!(cache.get(&"key1".to_string()), Some(10));
  assert!(cache.get(&"non-existent".to_string()).is_none());

  let metrics = cache.metrics();
  assert_eq!(metrics.hits, 1);
  assert_eq!(metrics.misses, 1);
  assert_eq!(metrics.inserts, 1);
}

#[test]
fn test_sync_set_overwrites() {
  let cache = new_test_cache();
  cache.set("key1".to_string(), 10);
  cache.set("key1".to_string(), 20);

  assert_eq!(cache.get(&"key1".to_string()), Some(20));
  assert_eq!(cache.item_count(), 1);
}

#[test]
fn test_sync_add_fails_on_live_key() {
  let cache = new_test_cache();
  assert_eq!(cache.add("k".to_string(), 1), Ok(()));
  assert_eq!(cache.add("k".to_string(), 2), Err(CacheError::AlreadyExists));
  assert_eq!(cache.get(&"k".to_string()), Some(1));
}

#[test]
fn test_sync_add_succeeds_over_expired_entry() {
  let cache = new_test_cache();
  cache.set_with_ttl("k".to_string(), 1, Duration::from_millis(10));
  std::thread::sleep(Duration::from_millis(30));

  assert_eq!(cache.add("k".to_string(), 2), Ok(()));
  assert_eq!(cache.get(&"k".to_string()), Some(2));
}

#[test]
fn test_sync_replace_requires_live_key() {
  let cache = new_test_cache();
  assert_eq!(cache.replace("k".to_string(), 1), Err(CacheError::NotFound));
  assert!(cache.get(&"k".to_string()).is_none());

  cache.set("k".to_string(), 1);
  assert_eq!(cache.replace("k".to_string(), 2), Ok(()));
  assert_eq!(cache.get(&"k".to_string()), Some(2));

  cache.set_with_ttl("gone".to_string(), 1, Duration::from_millis(10));
  std::thread::sleep(Duration::from_millis(30));
  assert_eq!(cache.replace("gone".to_string(), 2), Err(CacheError::NotFound));
}

#[test]
fn test_sync_add_and_replace_are_complementary() {
  let cache = build_test_cache();
  for key in 0..20 {
    if key % 2 == 0 {
      cache.set(key, "present".to_string());
    }
  }

  for key in 0..20 {
    // Exactly one of the two conditional writes succeeds for any key.
    let replaced = cache.replace(key, "replaced".to_string()).is_ok();
    let added = cache.add(key, "added".to_string()).is_ok();
    assert_ne!(added, replaced, "key {}", key);
    assert_eq!(replaced, key % 2 == 0, "key {}", key);
  }

  assert_eq!(cache.get(&0).as_deref(), Some("replaced"));
  assert_eq!(cache.get(&1).as_deref(), Some("added"));
}

#[test]
fn test_sync_delete_and_pop() {
  let cache = build_test_cache();
  cache.set(1, "one".to_string());
  cache.set(2, "two".to_string());

  assert!(cache.delete(&1));
  assert!(!cache.delete(&1));
  assert!(cache.get(&1).is_none());

  assert_eq!(cache.pop(&2), Some("two".to_string()));
  assert_eq!(cache.pop(&2), None);
  assert_eq!(cache.item_count(), 0);

  let metrics = cache.metrics();
  assert_eq!(metrics.invalidations, 2);
}

#[test]
fn test_sync_pop_ignores_expired_entry() {
  let cache = build_test_cache();
  cache.set_with_ttl(1, "one".to_string(), Duration::from_millis(10));
  std::thread::sleep(Duration::from_millis(30));

  assert_eq!(cache.pop(&1), None);
  // The expired entry is still there until a sweep or delete.
  assert_eq!(cache.item_count(), 1);
  assert!(cache.delete(&1));
}

#[test]
fn test_sync_modify_and_compute() {
  let cache = build_test_cache();
  cache.set(1, "a".to_string());

  let updated = cache.modify(&1, |v| format!("{}b", v));
  assert_eq!(updated.as_deref(), Some("ab"));

  let len = cache.compute(&1, |v| {
    v.push('c');
    v.len()
  });
  assert_eq!(len, Some(3));
  assert_eq!(cache.get(&1).as_deref(), Some("abc"));

  let mut called = false;
  assert!(cache
    .modify(&2, |v| {
      called = true;
      v.clone()
    })
    .is_none());
  assert!(!called, "modify must not run for a missing key");

  assert_eq!(cache.metrics().updates, 2);
}

#[test]
fn test_sync_modify_keeps_expiry() {
  let cache = build_test_cache();
  cache.set_with_ttl(1, "a".to_string(), Duration::from_secs(60));
  let (_, before) = cache.get_with_expiry(&1).unwrap();

  cache.modify(&1, |_| "b".to_string());
  let (value, after) = cache.get_with_expiry(&1).unwrap();
  assert_eq!(value, "b");
  assert_eq!(before, after);
}

#[test]
fn test_sync_rename_moves_value_and_expiry() {
  let cache = build_test_cache();
  cache.set_with_ttl(1, "one".to_string(), Duration::from_secs(60));
  cache.set(2, "two".to_string());
  let (_, expiry) = cache.get_with_expiry(&1).unwrap();

  assert!(cache.rename(&1, 2));
  assert!(cache.get(&1).is_none());
  assert_eq!(cache.get_with_expiry(&2), Some(("one".to_string(), expiry)));
  assert_eq!(cache.item_count(), 1);

  assert!(!cache.rename(&1, 3), "renaming a missing key fails");
}

#[test]
fn test_sync_get_with_expiry() {
  let cache = build_test_cache();
  cache.set(1, "forever".to_string());
  assert_eq!(cache.get_with_expiry(&1), Some(("forever".to_string(), None)));

  let before = SystemTime::now();
  cache.set_with_ttl(2, "soon".to_string(), Duration::from_secs(10));
  let (_, expiry) = cache.get_with_expiry(&2).unwrap();
  let expiry = expiry.expect("a ttl entry has an expiry");
  assert!(expiry > before + Duration::from_secs(9));
  assert!(expiry < before + Duration::from_secs(11));
}

#[test]
fn test_sync_keys_and_items_skip_expired() {
  let cache = build_test_cache();
  cache.set(1, "one".to_string());
  cache.set(2, "two".to_string());
  cache.set_with_ttl(3, "three".to_string(), Duration::from_millis(10));
  std::thread::sleep(Duration::from_millis(30));

  let mut keys = cache.keys();
  keys.sort();
  assert_eq!(keys, vec![1, 2]);

  let items = cache.items();
  assert_eq!(items.len(), 2);
  assert_eq!(items[&1].value(), "one");
  assert!(items[&1].expires_at().is_none());

  // The map still holds the expired entry.
  assert_eq!(cache.item_count(), 3);
}

#[test]
fn test_sync_items_is_a_copy() {
  let cache = build_test_cache();
  cache.set(1, "one".to_string());
  let mut items = cache.items();
  items.clear();
  assert_eq!(cache.get(&1).as_deref(), Some("one"));
}

#[test]
fn test_sync_cloned_handles_share_entries() {
  let cache = build_test_cache();
  let other = cache.clone();
  cache.set(1, "one".to_string());
  assert_eq!(other.get(&1).as_deref(), Some("one"));
}

#[test]
fn test_sync_set_with_never_ignores_default() {
  let cache = CacheBuilder::<i32, i32>::new()
    .default_ttl(Duration::from_millis(10))
    .build()
    .unwrap();
  cache.set(1, 1);
  cache.set_with_ttl(2, 2, Ttl::Never);
  std::thread::sleep(Duration::from_millis(30));

  assert!(cache.get(&1).is_none());
  assert_eq!(cache.get(&2), Some(2));
}

#[test]
fn test_sync_adopted_items_are_used_as_backing_map() {
  let source = build_test_cache();
  source.set(1, "one".to_string());
  source.set_with_ttl(2, "two".to_string(), Duration::from_secs(60));

  let restored = CacheBuilder::new().items(source.items()).build().unwrap();
  assert_eq!(restored.get(&1).as_deref(), Some("one"));
  assert_eq!(
    restored.get_with_expiry(&2),
    source.get_with_expiry(&2),
    "the absolute expiry survives the round trip"
  );
}
