use fibre_ttl::CacheBuilder;
use std::thread;
use std::time::Duration;

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  // Entries live for 2 seconds unless told otherwise; the janitor sweeps
  // every 500ms.
  let cache = CacheBuilder::default()
    .default_ttl(Duration::from_secs(2))
    .sweep_interval(Duration::from_millis(500))
    .build()
    .expect("Failed to build cache");

  println!("Setting ('key1', 100) with the default TTL.");
  cache.set("key1".to_string(), 100);

  match cache.get_with_expiry(&"key1".to_string()) {
    Some((value, expires_at)) => println!("Found value for key1: {} (expires at {:?})", value, expires_at),
    None => println!("Value for key1 not found."),
  }

  if let Err(e) = cache.add("key1".to_string(), 200) {
    println!("add refused to overwrite key1: {}", e);
  }

  println!("\nCache metrics: {:#?}", cache.metrics());

  println!("\nWaiting for 3 seconds for the item to expire...");
  thread::sleep(Duration::from_secs(3));

  // The janitor will have removed the expired item.
  match cache.get(&"key1".to_string()) {
    Some(value) => println!("Found value for key1: {}", value),
    None => println!("Value for key1 not found (as expected after TTL)."),
  }
  println!("Items left in the map: {}", cache.item_count());

  println!("\nCache metrics after expiration: {:#?}", cache.metrics());
  cache.close();
}
