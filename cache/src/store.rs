use crate::entry::Item;
use crate::error::CacheError;
use crate::expiry::{self, Ttl};
use crate::listener::EvictionReason;
use crate::metrics::Metrics;
use crate::task::notifier::{Notifier, SharedListener};
use crate::time;

use core::fmt;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};
use std::mem;
use std::time::{Duration, SystemTime};

use parking_lot::RwLock;

/// The precondition of a batch write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteIf {
  Always,
  /// Every key must be absent or expired.
  Absent,
  /// Every key must be present and unexpired.
  Present,
}

/// Everything guarded by the store lock: the map and the listener reference.
pub(crate) struct StoreInner<K, V, H> {
  items: HashMap<K, Item<V>, H>,
  listener: Option<SharedListener<K, V>>,
  next_seq: u64,
}

impl<K, V, H> StoreInner<K, V, H>
where
  K: Eq + Hash,
  H: BuildHasher,
{
  #[inline]
  fn next_seq(&mut self) -> u64 {
    let seq = self.next_seq;
    self.next_seq += 1;
    seq
  }

  /// The entry for `key` if it exists and has not expired as of `now`.
  #[inline]
  fn live(&self, key: &K, now: u64) -> Option<&Item<V>> {
    self.items.get(key).filter(|item| !item.is_expired_at(now))
  }

  #[inline]
  fn live_mut(&mut self, key: &K, now: u64) -> Option<&mut Item<V>> {
    self.items.get_mut(key).filter(|item| !item.is_expired_at(now))
  }

  /// Stores a fresh entry, returning whatever it replaced.
  #[inline]
  fn write(&mut self, key: K, value: V, expires_at: u64) -> Option<Item<V>> {
    let seq = self.next_seq();
    self.items.insert(key, Item::with_deadline(value, expires_at, seq))
  }

  /// Keys in write order (oldest entry first).
  fn keys_in_write_order(&self) -> Vec<K>
  where
    K: Clone,
  {
    let mut order: Vec<(u64, &K)> = self.items.iter().map(|(k, item)| (item.seq, k)).collect();
    order.sort_unstable_by_key(|(seq, _)| *seq);
    order.into_iter().map(|(_, k)| k.clone()).collect()
  }

  fn empty_map(&self) -> HashMap<K, Item<V>, H>
  where
    H: Clone,
  {
    HashMap::with_hasher(self.items.hasher().clone())
  }
}

/// The guarded mapping from key to entry, with the full operation set.
///
/// A single reader/writer lock guards the map and the listener. Lookups take
/// the shared lock; everything that mutates takes the exclusive lock for its
/// whole critical section. Eviction callbacks are always delivered after the
/// lock has been released.
pub(crate) struct Store<K, V, H> {
  inner: RwLock<StoreInner<K, V, H>>,
  default_ttl: Option<Duration>,
  pub(crate) metrics: Metrics,
}

impl<K, V, H> fmt::Debug for Store<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Store")
      .field("default_ttl", &self.default_ttl)
      .field("len", &self.inner.read().items.len())
      .finish_non_exhaustive()
  }
}

impl<K, V, H> Store<K, V, H> {
  /// Creates a store that adopts `items` as its backing map.
  ///
  /// Adopted entries keep the relative order of their sequence numbers (an
  /// item exported by `items()` carries its own, one made with `Item::new`
  /// has none). Ties are broken by the iteration order of the map.
  pub(crate) fn new(
    mut items: HashMap<K, Item<V>, H>,
    default_ttl: Option<Duration>,
    listener: Option<SharedListener<K, V>>,
  ) -> Self {
    let mut order: Vec<&mut Item<V>> = items.values_mut().collect();
    order.sort_by_key(|item| item.seq);
    for (seq, item) in order.into_iter().enumerate() {
      item.seq = seq as u64;
    }
    let next_seq = items.len() as u64;

    Self {
      inner: RwLock::new(StoreInner {
        items,
        listener,
        next_seq,
      }),
      default_ttl,
      metrics: Metrics::new(),
    }
  }

  #[inline]
  pub(crate) fn default_ttl(&self) -> Option<Duration> {
    self.default_ttl
  }

  /// Replaces (or clears) the eviction listener.
  pub(crate) fn set_listener(&self, listener: Option<SharedListener<K, V>>) {
    let previous = mem::replace(&mut self.inner.write().listener, listener);
    tracing::trace!(
      replaced = previous.is_some(),
      "eviction listener updated"
    );
  }

  pub(crate) fn item_count(&self) -> usize {
    self.inner.read().items.len()
  }

  #[inline]
  fn write_deadline(&self, ttl: Ttl, now: u64) -> u64 {
    expiry::deadline(expiry::resolve_ttl(ttl, self.default_ttl), now)
  }
}

impl<K, V, H> Store<K, V, H>
where
  K: Eq + Hash + Clone,
  V: Clone,
  H: BuildHasher + Clone,
{
  pub(crate) fn get(&self, key: &K) -> Option<V> {
    let now = time::now_nanos();
    let value = self.inner.read().live(key, now).map(|item| item.value.clone());
    self.metrics.record_lookup(value.is_some());
    value
  }

  /// Like `get`, but leaves the hit/miss counters alone.
  pub(crate) fn peek(&self, key: &K) -> Option<V> {
    let now = time::now_nanos();
    self.inner.read().live(key, now).map(|item| item.value.clone())
  }

  pub(crate) fn get_stale(&self, key: &K) -> Option<(V, bool)> {
    let now = time::now_nanos();
    let guard = self.inner.read();
    guard
      .items
      .get(key)
      .map(|item| (item.value.clone(), item.is_expired_at(now)))
  }

  pub(crate) fn get_with_expiry(&self, key: &K) -> Option<(V, Option<SystemTime>)> {
    let now = time::now_nanos();
    let found = self
      .inner
      .read()
      .live(key, now)
      .map(|item| (item.value.clone(), item.expires_at()));
    self.metrics.record_lookup(found.is_some());
    found
  }

  pub(crate) fn set(&self, key: K, value: V, ttl: Ttl) {
    let expires_at = self.write_deadline(ttl, time::now_nanos());
    let replaced = self.inner.write().write(key, value, expires_at);
    Metrics::add(&self.metrics.inserts, 1);
    // The overwritten value is dropped here, outside the lock. Overwrites are
    // not evictions, so the listener is not involved.
    drop(replaced);
  }

  pub(crate) fn add(&self, key: K, value: V, ttl: Ttl) -> Result<(), CacheError> {
    let now = time::now_nanos();
    let expires_at = self.write_deadline(ttl, now);
    let replaced = {
      let mut guard = self.inner.write();
      if guard.live(&key, now).is_some() {
        return Err(CacheError::AlreadyExists);
      }
      guard.write(key, value, expires_at)
    };
    Metrics::add(&self.metrics.inserts, 1);
    drop(replaced);
    Ok(())
  }

  pub(crate) fn replace(&self, key: K, value: V, ttl: Ttl) -> Result<(), CacheError> {
    let now = time::now_nanos();
    let expires_at = self.write_deadline(ttl, now);
    let replaced = {
      let mut guard = self.inner.write();
      if guard.live(&key, now).is_none() {
        return Err(CacheError::NotFound);
      }
      guard.write(key, value, expires_at)
    };
    Metrics::add(&self.metrics.inserts, 1);
    drop(replaced);
    Ok(())
  }

  /// Writes every pair under a single lock acquisition.
  ///
  /// Conditional batches are all-or-nothing: if any key fails the condition,
  /// nothing is written.
  pub(crate) fn write_batch(&self, entries: Vec<(K, V)>, ttl: Ttl, cond: WriteIf) -> Result<(), CacheError> {
    let now = time::now_nanos();
    let expires_at = self.write_deadline(ttl, now);
    let written = entries.len() as u64;
    let replaced: Vec<Item<V>> = {
      let mut guard = self.inner.write();
      match cond {
        WriteIf::Always => {}
        WriteIf::Absent => {
          if entries.iter().any(|(key, _)| guard.live(key, now).is_some()) {
            return Err(CacheError::AlreadyExists);
          }
        }
        WriteIf::Present => {
          if entries.iter().any(|(key, _)| guard.live(key, now).is_none()) {
            return Err(CacheError::NotFound);
          }
        }
      }
      entries
        .into_iter()
        .filter_map(|(key, value)| guard.write(key, value, expires_at))
        .collect()
    };
    Metrics::add(&self.metrics.inserts, written);
    drop(replaced);
    Ok(())
  }

  pub(crate) fn touch(&self, key: &K, ttl: Ttl) -> Option<V> {
    let now = time::now_nanos();
    let expires_at = self.write_deadline(ttl, now);
    let value = {
      let mut guard = self.inner.write();
      let item = guard.live_mut(key, now)?;
      item.expires_at = expires_at;
      item.value.clone()
    };
    Metrics::add(&self.metrics.updates, 1);
    Some(value)
  }

  pub(crate) fn modify<F>(&self, key: &K, f: F) -> Option<V>
  where
    F: FnOnce(&V) -> V,
  {
    let now = time::now_nanos();
    let value = {
      let mut guard = self.inner.write();
      let item = guard.live_mut(key, now)?;
      item.value = f(&item.value);
      item.value.clone()
    };
    Metrics::add(&self.metrics.updates, 1);
    Some(value)
  }

  pub(crate) fn compute<F, R>(&self, key: &K, f: F) -> Option<R>
  where
    F: FnOnce(&mut V) -> R,
  {
    let now = time::now_nanos();
    let result = {
      let mut guard = self.inner.write();
      let item = guard.live_mut(key, now)?;
      f(&mut item.value)
    };
    Metrics::add(&self.metrics.updates, 1);
    Some(result)
  }

  pub(crate) fn delete(&self, key: &K) -> bool {
    let (removed, mut notifier) = {
      let mut guard = self.inner.write();
      let notifier = Notifier::capture(&guard.listener, EvictionReason::Invalidated);
      (guard.items.remove(key), notifier)
    };

    match removed {
      Some(item) => {
        Metrics::add(&self.metrics.invalidations, 1);
        notifier.push(key.clone(), item.value);
        notifier.fire();
        true
      }
      None => false,
    }
  }

  pub(crate) fn pop(&self, key: &K) -> Option<V> {
    let now = time::now_nanos();
    let (item, mut notifier) = {
      let mut guard = self.inner.write();
      guard.live(key, now)?;
      let notifier = Notifier::capture(&guard.listener, EvictionReason::Invalidated);
      (guard.items.remove(key)?, notifier)
    };

    Metrics::add(&self.metrics.invalidations, 1);
    if notifier.is_listening() {
      notifier.push(key.clone(), item.value.clone());
      notifier.fire();
    }
    Some(item.value)
  }

  pub(crate) fn rename(&self, src: &K, dst: K) -> bool {
    let now = time::now_nanos();
    let replaced = {
      let mut guard = self.inner.write();
      if guard.live(src, now).is_none() {
        return false;
      }
      let Some(item) = guard.items.remove(src) else {
        return false;
      };
      // The entry keeps its value, expiry and write order.
      guard.items.insert(dst, item)
    };
    drop(replaced);
    true
  }

  pub(crate) fn keys(&self) -> Vec<K> {
    let now = time::now_nanos();
    let guard = self.inner.read();
    guard
      .items
      .iter()
      .filter(|(_, item)| !item.is_expired_at(now))
      .map(|(k, _)| k.clone())
      .collect()
  }

  pub(crate) fn items(&self) -> HashMap<K, Item<V>, H> {
    let now = time::now_nanos();
    let guard = self.inner.read();
    let mut copy = HashMap::with_capacity_and_hasher(guard.items.len(), guard.items.hasher().clone());
    copy.extend(
      guard
        .items
        .iter()
        .filter(|(_, item)| !item.is_expired_at(now))
        .map(|(k, item)| (k.clone(), item.clone())),
    );
    copy
  }

  /// Unexpired keys selected by `filter`, visited in write order.
  ///
  /// The live entries are copied out under the read lock and the filter runs
  /// after it is released, so the filter may call back into the cache.
  pub(crate) fn find<F>(&self, mut filter: F) -> Vec<K>
  where
    F: FnMut(&K, &Item<V>) -> (bool, bool),
  {
    let mut found = Vec::new();
    for (key, item) in self.entries_in_write_order() {
      let (include, stop) = filter(&key, &item);
      if include {
        found.push(key);
      }
      if stop {
        break;
      }
    }
    found
  }

  /// Unexpired entries, oldest write first.
  pub(crate) fn entries_in_write_order(&self) -> Vec<(K, Item<V>)> {
    let now = time::now_nanos();
    let guard = self.inner.read();
    let mut entries: Vec<(K, Item<V>)> = guard
      .items
      .iter()
      .filter(|(_, item)| !item.is_expired_at(now))
      .map(|(k, item)| (k.clone(), item.clone()))
      .collect();
    entries.sort_unstable_by_key(|(_, item)| item.seq);
    entries
  }

  pub(crate) fn reset(&self) {
    let cleared = {
      let mut guard = self.inner.write();
      let empty = guard.empty_map();
      mem::replace(&mut guard.items, empty)
    };
    drop(cleared);
  }

  pub(crate) fn delete_all(&self) -> HashMap<K, Item<V>, H> {
    let (removed, mut notifier) = {
      let mut guard = self.inner.write();
      let empty = guard.empty_map();
      let notifier = Notifier::capture(&guard.listener, EvictionReason::Invalidated);
      (mem::replace(&mut guard.items, empty), notifier)
    };

    Metrics::add(&self.metrics.invalidations, removed.len() as u64);
    if notifier.is_listening() {
      for (key, item) in &removed {
        notifier.push(key.clone(), item.value.clone());
      }
      notifier.fire();
    }
    removed
  }

  pub(crate) fn delete_where<F>(&self, mut filter: F) -> HashMap<K, Item<V>, H>
  where
    F: FnMut(&K, &Item<V>) -> (bool, bool),
  {
    let (removed, notifier) = {
      let mut guard = self.inner.write();
      let mut removed = guard.empty_map();
      let mut notifier = Notifier::capture(&guard.listener, EvictionReason::Invalidated);

      for key in guard.keys_in_write_order() {
        let Some(item) = guard.items.get(&key) else {
          continue;
        };
        let (remove, stop) = filter(&key, item);
        if remove {
          if let Some(item) = guard.items.remove(&key) {
            if notifier.is_listening() {
              notifier.push(key.clone(), item.value.clone());
            }
            removed.insert(key, item);
          }
        }
        if stop {
          break;
        }
      }
      (removed, notifier)
    };

    Metrics::add(&self.metrics.invalidations, removed.len() as u64);
    notifier.fire();
    removed
  }

  /// Removes every expired entry and notifies the listener for each one.
  /// Returns how many entries were removed.
  pub(crate) fn sweep_expired(&self) -> usize {
    let now = time::now_nanos();
    let (removed, notifier) = {
      let mut guard = self.inner.write();
      let mut notifier = Notifier::capture(&guard.listener, EvictionReason::Expired);
      let expired: Vec<K> = guard
        .items
        .iter()
        .filter(|(_, item)| item.is_expired_at(now))
        .map(|(k, _)| k.clone())
        .collect();

      let mut removed = 0;
      for key in expired {
        if let Some(item) = guard.items.remove(&key) {
          notifier.push(key, item.value);
          removed += 1;
        }
      }
      (removed, notifier)
    };

    if removed > 0 {
      Metrics::add(&self.metrics.evicted_by_ttl, removed as u64);
      tracing::debug!(removed, "swept expired entries");
    }
    notifier.fire();
    removed
  }
}
