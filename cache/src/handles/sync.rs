use crate::builder::CacheBuilder;
use crate::entry::Item;
use crate::error::{BuildError, CacheError};
use crate::expiry::Ttl;
use crate::gate::Turn;
use crate::metrics::Metrics;
use crate::shared::CacheShared;
use crate::{EvictionListener, MetricsSnapshot};

use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// A thread-safe key/value store with per-entry expiration.
///
/// `Cache` is a cheap handle: cloning it yields another handle to the same
/// entries. Values are handed out by clone, so store an `Arc<T>` when values
/// are expensive to copy.
///
/// A cache built with a sweep interval owns a background janitor thread.
/// Call [`Cache::close`] when done with it.
pub struct Cache<K, V, H = ahash::RandomState> {
  pub(crate) shared: Arc<CacheShared<K, V, H>>,
}

impl<K, V, H> Clone for Cache<K, V, H> {
  fn clone(&self) -> Self {
    Self {
      shared: self.shared.clone(),
    }
  }
}

impl<K, V, H> fmt::Debug for Cache<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Cache").field("shared", &self.shared).finish()
  }
}

impl<K, V> Cache<K, V>
where
  K: Eq + Hash + Clone + Send + Sync + 'static,
  V: Clone + Send + Sync + 'static,
{
  /// Creates a cache with the given default TTL and sweep interval.
  ///
  /// `default_ttl` of [`Ttl::Default`] or [`Ttl::Never`] means entries written
  /// without an explicit TTL never expire. A zero `sweep_interval` starts no
  /// janitor; expired entries are then only reclaimed by
  /// [`sweep_expired`](Cache::sweep_expired) or by removal.
  pub fn new(default_ttl: impl Into<Ttl>, sweep_interval: Duration) -> Result<Self, BuildError> {
    CacheBuilder::new()
      .default_ttl(default_ttl)
      .sweep_interval(sweep_interval)
      .build()
  }
}

impl<K, V, H> Cache<K, V, H> {
  /// The default TTL entries get when written with [`Ttl::Default`].
  /// `None` means they never expire.
  pub fn default_ttl(&self) -> Option<Duration> {
    self.shared.store.default_ttl()
  }

  /// The number of entries in the map, including expired entries that have
  /// not been swept yet.
  pub fn item_count(&self) -> usize {
    self.shared.store.item_count()
  }

  /// Registers `listener` to be called whenever an entry is evicted,
  /// replacing any previous listener.
  pub fn set_eviction_listener<L>(&self, listener: L)
  where
    L: EvictionListener<K, V> + 'static,
  {
    self.shared.store.set_listener(Some(Arc::new(listener)));
  }

  pub fn clear_eviction_listener(&self) {
    self.shared.store.set_listener(None);
  }

  pub fn metrics(&self) -> MetricsSnapshot {
    self.shared.store.metrics.snapshot()
  }

  /// Shuts the cache down: stops and joins the janitor thread, then detaches
  /// the eviction listener.
  ///
  /// A listener that captures a handle to its own cache keeps the cache alive
  /// through a reference cycle; `close` breaks that cycle. The entries stay
  /// readable and writable afterwards, but nothing sweeps them and nothing is
  /// notified. Calling `close` more than once is harmless.
  pub fn close(&self) {
    self.shared.stop_janitor();
    self.shared.store.set_listener(None);
  }
}

impl<K, V, H> Cache<K, V, H>
where
  K: Eq + Hash + Clone,
  V: Clone,
  H: BuildHasher + Clone,
{
  /// Stores `value` under `key` with the default TTL, replacing any existing
  /// entry. Overwriting never notifies the eviction listener.
  pub fn set(&self, key: K, value: V) {
    self.shared.store.set(key, value, Ttl::Default);
  }

  pub fn set_with_ttl(&self, key: K, value: V, ttl: impl Into<Ttl>) {
    self.shared.store.set(key, value, ttl.into());
  }

  /// Stores `value` only if `key` is absent or expired.
  ///
  /// # Errors
  ///
  /// [`CacheError::AlreadyExists`] if a live entry exists for `key`.
  pub fn add(&self, key: K, value: V) -> Result<(), CacheError> {
    self.shared.store.add(key, value, Ttl::Default)
  }

  pub fn add_with_ttl(&self, key: K, value: V, ttl: impl Into<Ttl>) -> Result<(), CacheError> {
    self.shared.store.add(key, value, ttl.into())
  }

  /// Stores `value` only if a live entry already exists for `key`. The new
  /// entry gets a fresh expiry.
  ///
  /// # Errors
  ///
  /// [`CacheError::NotFound`] if `key` is absent or expired.
  pub fn replace(&self, key: K, value: V) -> Result<(), CacheError> {
    self.shared.store.replace(key, value, Ttl::Default)
  }

  pub fn replace_with_ttl(&self, key: K, value: V, ttl: impl Into<Ttl>) -> Result<(), CacheError> {
    self.shared.store.replace(key, value, ttl.into())
  }

  /// Retrieves a clone of the value for `key`.
  ///
  /// Returns `None` if the key is absent or its entry has expired. Expired
  /// entries are left in place for the janitor.
  pub fn get(&self, key: &K) -> Option<V> {
    self.shared.store.get(key)
  }

  /// Retrieves the value for `key` even if it has expired but has not been
  /// swept yet. The flag is `true` when the entry is expired.
  pub fn get_stale(&self, key: &K) -> Option<(V, bool)> {
    self.shared.store.get_stale(key)
  }

  /// Like [`get`](Cache::get), also returning the absolute expiry (`None` if
  /// the entry never expires).
  pub fn get_with_expiry(&self, key: &K) -> Option<(V, Option<SystemTime>)> {
    self.shared.store.get_with_expiry(key)
  }

  /// Resets the expiry of a live entry to the default TTL, counted from now.
  /// The value is untouched and returned.
  pub fn touch(&self, key: &K) -> Option<V> {
    self.shared.store.touch(key, Ttl::Default)
  }

  pub fn touch_with_ttl(&self, key: &K, ttl: impl Into<Ttl>) -> Option<V> {
    self.shared.store.touch(key, ttl.into())
  }

  /// Atomically replaces the value of a live entry with `f(&value)` and
  /// returns the new value. The expiry is unchanged.
  ///
  /// `f` runs under the cache's write lock, so it must be quick and must not
  /// call back into this cache. It is not called if the key is absent or
  /// expired.
  pub fn modify<F>(&self, key: &K, f: F) -> Option<V>
  where
    F: FnOnce(&V) -> V,
  {
    self.shared.store.modify(key, f)
  }

  /// Atomically mutates the value of a live entry in place, returning what
  /// `f` returns. The same locking rules as [`modify`](Cache::modify) apply.
  pub fn compute<F, R>(&self, key: &K, f: F) -> Option<R>
  where
    F: FnOnce(&mut V) -> R,
  {
    self.shared.store.compute(key, f)
  }

  /// Removes `key`, returning `true` if an entry (live or expired) was
  /// removed. The eviction listener is called for the removed value.
  pub fn delete(&self, key: &K) -> bool {
    self.shared.store.delete(key)
  }

  /// Atomically removes a live entry and returns its value.
  pub fn pop(&self, key: &K) -> Option<V> {
    self.shared.store.pop(key)
  }

  /// Moves the live entry at `src` to `dst` with its value and expiry,
  /// overwriting anything at `dst`. Returns `false` if `src` is absent or
  /// expired. Never notifies the eviction listener.
  pub fn rename(&self, src: &K, dst: K) -> bool {
    self.shared.store.rename(src, dst)
  }

  /// All unexpired keys, in no particular order.
  pub fn keys(&self) -> Vec<K> {
    self.shared.store.keys()
  }

  /// A copy of every unexpired entry.
  ///
  /// The result can be handed back to [`CacheBuilder::items`] to restore the
  /// cache later.
  pub fn items(&self) -> HashMap<K, Item<V>, H> {
    self.shared.store.items()
  }

  /// Removes every entry without notifying the eviction listener.
  pub fn reset(&self) {
    self.shared.store.reset();
  }

  /// Removes every entry and returns them. The eviction listener is called
  /// once per removed entry.
  pub fn delete_all(&self) -> HashMap<K, Item<V>, H> {
    self.shared.store.delete_all()
  }

  /// Removes entries selected by `filter` in a single pass and returns them.
  ///
  /// Entries are visited oldest write first, expired entries included. The
  /// filter returns `(remove, stop)`; `stop` ends the pass after the current
  /// entry. The eviction listener is called after the pass, in visit order.
  ///
  /// `filter` runs under the cache's write lock, so it must not call back
  /// into this cache; doing so deadlocks.
  pub fn delete_where<F>(&self, filter: F) -> HashMap<K, Item<V>, H>
  where
    F: FnMut(&K, &Item<V>) -> (bool, bool),
  {
    self.shared.store.delete_where(filter)
  }

  /// Removes every expired entry now, returning how many were removed. This
  /// is what the janitor runs on each tick.
  pub fn sweep_expired(&self) -> usize {
    self.shared.store.sweep_expired()
  }

  /// Returns the value for `key`, computing and storing it with the default
  /// TTL on a miss. See [`get_or_populate_with_ttl`](Cache::get_or_populate_with_ttl).
  pub fn get_or_populate<F>(&self, key: &K, populate: F) -> V
  where
    F: FnOnce() -> V,
  {
    self.get_or_populate_with_ttl(key, || (populate(), Ttl::Default))
  }

  /// Returns the value for `key`, computing it on a miss.
  ///
  /// Concurrent callers for the same absent key are coalesced: one of them
  /// runs `populate` while the rest wait and then read what it stored. If the
  /// entry is gone again by then (expired or deleted), a waiter populates
  /// it itself. `populate` runs without any cache lock held, but it must not
  /// call `get_or_populate` for the same key.
  ///
  /// If `populate` panics, the panic propagates to this caller and waiting
  /// callers are released to try again.
  pub fn get_or_populate_with_ttl<F>(&self, key: &K, populate: F) -> V
  where
    F: FnOnce() -> (V, Ttl),
  {
    let store = &self.shared.store;

    let guard = loop {
      if let Some(value) = store.get(key) {
        return value;
      }
      match self.shared.gate.enter(key) {
        Turn::Lead(guard) => break guard,
        Turn::Followed => {
          Metrics::add(&store.metrics.coalesced, 1);
          tracing::trace!("populate finished elsewhere, re-reading");
        }
      }
    };

    // Another leader may have stored the value between our miss and entering
    // the gate.
    if let Some(value) = store.peek(key) {
      return value;
    }

    tracing::trace!("populating on miss");
    let (value, ttl) = populate();
    store.set(key.clone(), value.clone(), ttl);
    drop(guard);

    Metrics::add(&store.metrics.populations, 1);
    value
  }
}
