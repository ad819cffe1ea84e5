use fibre_ttl::{CacheBuilder, EvictionReason};
use std::thread;
use std::time::Duration;

fn main() {
  let cache = CacheBuilder::default()
    .sweep_interval(Duration::from_millis(100))
    .eviction_listener(|key: String, value: u64, reason: EvictionReason| {
      println!("[listener] {} = {} removed: {}", key, value, reason);
    })
    .build()
    .expect("Failed to build cache");

  cache.set_with_ttl("short-lived".to_string(), 1, Duration::from_millis(200));
  cache.set("deleted".to_string(), 2);
  cache.set("renamed".to_string(), 3);
  cache.set("kept".to_string(), 4);

  // Explicit removal fires the listener; renaming and overwriting do not.
  cache.delete(&"deleted".to_string());
  cache.rename(&"renamed".to_string(), "moved".to_string());
  cache.set("kept".to_string(), 5);

  // Remove everything with an even value in one pass.
  let removed = cache.delete_where(|_, item| (item.value() % 2 == 0, false));
  println!("delete_where removed {} entries", removed.len());

  // Give the janitor time to sweep the short-lived entry.
  thread::sleep(Duration::from_millis(500));
  println!("left: {:?}", cache.keys());
  cache.close();
}
