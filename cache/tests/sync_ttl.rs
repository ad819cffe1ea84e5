use fibre_ttl::{Cache, CacheBuilder, Item, Ttl};
use std::collections::HashMap;
use std::time::{Duration, SystemTime};
use std::{thread, time::Instant};

const TINY_TTL: Duration = Duration::from_millis(50);
const SLEEP_MARGIN: Duration = Duration::from_millis(60);

fn no_janitor() -> Cache<&'static str, i32> {
  Cache::new(Ttl::Never, Duration::ZERO).unwrap()
}

#[test]
fn test_sync_touch_extends_a_never_expiring_entry() {
  let cache = no_janitor();
  cache.set("a", 1);

  assert_eq!(cache.touch_with_ttl(&"a", TINY_TTL), Some(1));
  assert_eq!(cache.get(&"a"), Some(1));

  thread::sleep(SLEEP_MARGIN);
  assert_eq!(cache.get(&"a"), None, "touched entry should have expired");
}

#[test]
fn test_sync_touch_keeps_entry_alive() {
  let cache = CacheBuilder::<&str, i32>::new()
    .default_ttl(Duration::from_millis(150))
    .build()
    .unwrap();
  cache.set("a", 1);

  for _ in 0..4 {
    thread::sleep(Duration::from_millis(60));
    assert_eq!(cache.touch(&"a"), Some(1), "entry should still be live");
  }
}

#[test]
fn test_sync_touch_does_not_revive_expired_entry() {
  let cache = no_janitor();
  cache.set_with_ttl("a", 1, TINY_TTL);
  thread::sleep(SLEEP_MARGIN);

  assert_eq!(cache.touch(&"a"), None);
  assert_eq!(cache.get_stale(&"a"), Some((1, true)));
}

#[test]
fn test_sync_get_stale_reports_expiry() {
  let cache = no_janitor();
  cache.set_with_ttl("a", 1, TINY_TTL);
  assert_eq!(cache.get_stale(&"a"), Some((1, false)));

  thread::sleep(SLEEP_MARGIN);
  assert_eq!(cache.get(&"a"), None);
  assert_eq!(cache.get_stale(&"a"), Some((1, true)));

  cache.sweep_expired();
  assert_eq!(cache.get_stale(&"a"), None);
}

#[test]
fn test_sync_zero_ttl_expires_immediately() {
  let cache = no_janitor();
  cache.set_with_ttl("a", 1, Duration::ZERO);
  thread::sleep(Duration::from_millis(1));

  assert_eq!(cache.get(&"a"), None);
  assert!(cache.get_stale(&"a").is_some(), "zero is not the never sentinel");
}

#[test]
fn test_sync_expiry_is_monotonic() {
  let cache = no_janitor();
  cache.set_with_ttl("a", 1, Duration::from_millis(30));

  let started = Instant::now();
  let mut seen_expired = false;
  while started.elapsed() < Duration::from_millis(100) {
    let live = cache.get(&"a").is_some();
    if seen_expired {
      assert!(!live, "an expired entry must never become live again");
    }
    seen_expired |= !live;
  }
  assert!(seen_expired);
}

#[test]
fn test_sync_default_ttl_is_applied() {
  let cache = CacheBuilder::<&str, i32>::new()
    .default_ttl(TINY_TTL)
    .build()
    .unwrap();
  assert_eq!(cache.default_ttl(), Some(TINY_TTL));

  cache.set("a", 1);
  cache.set_with_ttl("b", 2, Duration::from_secs(60));
  thread::sleep(SLEEP_MARGIN);

  assert_eq!(cache.get(&"a"), None);
  assert_eq!(cache.get(&"b"), Some(2));
}

#[test]
fn test_sync_default_sentinel_as_default_means_never() {
  let cache = Cache::<&str, i32>::new(Ttl::Default, Duration::ZERO).unwrap();
  assert_eq!(cache.default_ttl(), None);
  cache.set("a", 1);
  assert_eq!(cache.get_with_expiry(&"a"), Some((1, None)));
}

#[test]
fn test_sync_adopted_expired_item_is_swept() {
  let mut items: HashMap<&str, Item<i32>> = HashMap::new();
  items.insert("old", Item::new(1, Some(SystemTime::now() - Duration::from_secs(1))));
  items.insert("new", Item::never(2));

  let cache = CacheBuilder::new().items(items).build().unwrap();
  assert_eq!(cache.get(&"old"), None);
  assert_eq!(cache.item_count(), 2);

  assert_eq!(cache.sweep_expired(), 1);
  assert_eq!(cache.item_count(), 1);
  assert_eq!(cache.get(&"new"), Some(2));
}
