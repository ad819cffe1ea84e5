use crate::entry::Item;
use crate::error::BuildError;
use crate::expiry::{self, Ttl};
use crate::handles::Cache;
use crate::shared::CacheShared;
use crate::store::Store;
use crate::task::janitor::Janitor;
use crate::task::notifier::SharedListener;
use crate::EvictionListener;

use core::fmt;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;
use std::time::Duration;

/// A builder for creating `Cache` instances.
pub struct CacheBuilder<K, V, H = ahash::RandomState> {
  default_ttl: Ttl,
  sweep_interval: Option<Duration>,
  capacity: usize,
  pub(crate) hasher: H,
  items: Option<HashMap<K, Item<V>, H>>,
  listener: Option<SharedListener<K, V>>,
}

impl<K, V, H> fmt::Debug for CacheBuilder<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheBuilder")
      .field("default_ttl", &self.default_ttl)
      .field("sweep_interval", &self.sweep_interval)
      .field("capacity", &self.capacity)
      .field("adopted_items", &self.items.as_ref().map(HashMap::len))
      .field("has_listener", &self.listener.is_some())
      .finish_non_exhaustive()
  }
}

// --- General Configuration Methods ---
impl<K, V, H> CacheBuilder<K, V, H> {
  /// Sets the TTL used by writes that pass [`Ttl::Default`].
  ///
  /// Defaults to never expiring. Passing `Ttl::Default` here also means never.
  pub fn default_ttl(mut self, ttl: impl Into<Ttl>) -> Self {
    self.default_ttl = ttl.into();
    self
  }

  /// Sets how often the janitor sweeps expired entries.
  ///
  /// A zero interval (the default) starts no janitor.
  pub fn sweep_interval(mut self, interval: Duration) -> Self {
    self.sweep_interval = (!interval.is_zero()).then_some(interval);
    self
  }

  /// Sets the eviction listener for the cache.
  pub fn eviction_listener<Listener>(mut self, listener: Listener) -> Self
  where
    Listener: EvictionListener<K, V> + 'static,
  {
    self.listener = Some(Arc::new(listener));
    self
  }

  /// Sets the initial capacity of the backing map. This is only an
  /// allocation hint; the cache is never bounded.
  pub fn capacity(mut self, capacity: usize) -> Self {
    self.capacity = capacity;
    self
  }

  /// Sets the hasher for the backing map.
  ///
  /// Ignored when a map is adopted with [`items`](CacheBuilder::items), which
  /// brings its own hasher.
  pub fn hasher(mut self, hasher: H) -> Self {
    self.hasher = hasher;
    self
  }

  /// Adopts `items` as the backing map of the new cache.
  ///
  /// This is the restore half of [`Cache::items`]. Entries that have already
  /// expired are kept until the first sweep, just as if they had expired in
  /// place.
  pub fn items(mut self, items: HashMap<K, Item<V>, H>) -> Self {
    self.items = Some(items);
    self
  }
}

// --- Default Constructor ---
impl<K, V, H: BuildHasher + Default> CacheBuilder<K, V, H> {
  /// Creates a new `CacheBuilder` with default settings.
  pub fn new() -> Self {
    Self {
      default_ttl: Ttl::Never,
      sweep_interval: None,
      capacity: 0,
      hasher: H::default(),
      items: None,
      listener: None,
    }
  }
}

impl<K, V> Default for CacheBuilder<K, V, ahash::RandomState> {
  fn default() -> Self {
    Self::new()
  }
}

// --- Build Methods ---
impl<K, V, H> CacheBuilder<K, V, H>
where
  K: Eq + Hash + Clone + Send + Sync + 'static,
  V: Clone + Send + Sync + 'static,
  H: BuildHasher + Clone + Send + Sync + 'static,
{
  /// Builds a `Cache`, spawning the janitor if a sweep interval was set.
  pub fn build(self) -> Result<Cache<K, V, H>, BuildError> {
    let items = self
      .items
      .unwrap_or_else(|| HashMap::with_capacity_and_hasher(self.capacity, self.hasher));
    let store = Arc::new(Store::new(
      items,
      expiry::normalize_default(self.default_ttl),
      self.listener,
    ));

    let janitor = match self.sweep_interval {
      Some(interval) => Some(Janitor::spawn(store.clone(), interval).map_err(BuildError::JanitorSpawn)?),
      None => None,
    };

    Ok(Cache {
      shared: Arc::new(CacheShared::new(store, janitor)),
    })
  }
}
