use fibre_ttl::{Cache, Ttl};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

// Pretend this is a slow database lookup.
fn load_user(id: u32) -> String {
  println!("  [{:?}] loading user {} ...", thread::current().id(), id);
  thread::sleep(Duration::from_millis(200));
  format!("user-{}", id)
}

fn main() {
  let cache: Cache<u32, String> =
    Cache::new(Duration::from_secs(60), Duration::from_secs(10)).expect("Failed to build cache");

  let barrier = Arc::new(Barrier::new(8));
  let handles: Vec<_> = (0..8)
    .map(|_| {
      let cache = cache.clone();
      let barrier = barrier.clone();
      thread::spawn(move || {
        barrier.wait();
        cache.get_or_populate(&7, || load_user(7))
      })
    })
    .collect();

  for handle in handles {
    println!("got {}", handle.join().unwrap());
  }

  // The populate function can also choose the entry's TTL.
  let session = cache.get_or_populate_with_ttl(&99, || ("guest".to_string(), Ttl::After(Duration::from_secs(5))));
  println!("session: {}", session);

  let metrics = cache.metrics();
  println!(
    "populations: {}, coalesced waits: {}",
    metrics.populations, metrics.coalesced
  );
  cache.close();
}
