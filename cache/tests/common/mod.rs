#![allow(dead_code)]

use std::hash::{BuildHasher, Hasher};
use std::sync::{mpsc, Arc};

use fibre_ttl::{Cache, CacheBuilder, EvictionListener, EvictionReason};
use parking_lot::Mutex;

// A hasher that uses the integer value of the key as its hash, so tests do not
// depend on a random seed.
#[derive(Clone, Default)]
pub struct IdentityHasher;
impl BuildHasher for IdentityHasher {
  type Hasher = TestHasher;
  fn build_hasher(&self) -> Self::Hasher {
    TestHasher(0)
  }
}
pub struct TestHasher(u64);
impl Hasher for TestHasher {
  fn finish(&self) -> u64 {
    self.0
  }
  fn write(&mut self, _: &[u8]) {
    unimplemented!()
  }
  fn write_i32(&mut self, i: i32) {
    self.0 = i as u64;
  }
}

/// A cache without a janitor, so expired entries stay until swept by hand.
pub fn build_test_cache() -> Cache<i32, String, IdentityHasher> {
  CacheBuilder::new().hasher(IdentityHasher).build().unwrap()
}

// Forwards every eviction to a channel.
pub struct TestListener {
  pub sender: mpsc::Sender<(i32, String, EvictionReason)>,
}

impl EvictionListener<i32, String> for TestListener {
  fn on_evict(&self, key: i32, value: String, reason: EvictionReason) {
    let _ = self.sender.send((key, value, reason));
  }
}

pub type Recorded = Arc<Mutex<Vec<(i32, String, EvictionReason)>>>;

/// A listener that records every eviction in order.
pub fn recorder() -> (Recorded, impl Fn(i32, String, EvictionReason) + Send + Sync + 'static) {
  let seen: Recorded = Arc::new(Mutex::new(Vec::new()));
  let sink = seen.clone();
  let listener = move |key: i32, value: String, reason: EvictionReason| sink.lock().push((key, value, reason));
  (seen, listener)
}
