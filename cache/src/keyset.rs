use crate::error::CacheError;
use crate::expiry::Ttl;
use crate::store::WriteIf;
use crate::{Cache, Item};

use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::time::SystemTime;

use parking_lot::RwLock;

/// A set of keys of one cache, with every single-key operation run over all
/// of them.
///
/// Results come back in key order, one per key. Batch writes take exactly one
/// value per key.
///
/// ```
/// use fibre_ttl::{Cache, Ttl};
/// use std::time::Duration;
///
/// let cache: Cache<&str, u32> = Cache::new(Ttl::Never, Duration::ZERO).unwrap();
/// let set = cache.keyset(["a", "b"]);
/// set.set(vec![1, 2]).unwrap();
/// assert_eq!(set.get(), vec![Some(1), Some(2)]);
/// ```
pub struct Keyset<K, V, H = ahash::RandomState> {
  cache: Cache<K, V, H>,
  keys: RwLock<Vec<K>>,
}

impl<K: fmt::Debug, V, H> fmt::Debug for Keyset<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Keyset").field("keys", &*self.keys.read()).finish()
  }
}

impl<K, V, H> Cache<K, V, H>
where
  K: Eq + Hash + Clone,
  V: Clone,
  H: BuildHasher + Clone,
{
  /// Creates a keyset over `keys`. The keys need not exist yet.
  pub fn keyset(&self, keys: impl IntoIterator<Item = K>) -> Keyset<K, V, H> {
    Keyset {
      cache: self.clone(),
      keys: RwLock::new(keys.into_iter().collect()),
    }
  }

  /// Creates a keyset from the unexpired keys selected by `filter`.
  ///
  /// Entries are visited oldest write first. The filter returns
  /// `(include, stop)`; `stop` ends the scan after the current entry. The
  /// filter sees a copy of the live entries taken under the read lock and
  /// runs after it is released, so it may call back into the cache. Entries
  /// written during the scan are not visited.
  pub fn find<F>(&self, filter: F) -> Keyset<K, V, H>
  where
    F: FnMut(&K, &Item<V>) -> (bool, bool),
  {
    self.keyset(self.shared.store.find(filter))
  }
}

impl<K, V, H> Keyset<K, V, H>
where
  K: Eq + Hash + Clone,
  V: Clone,
  H: BuildHasher + Clone,
{
  pub fn keys(&self) -> Vec<K> {
    self.keys.read().clone()
  }

  pub fn len(&self) -> usize {
    self.keys.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.keys.read().is_empty()
  }

  pub fn append(&self, keys: impl IntoIterator<Item = K>) {
    self.keys.write().extend(keys);
  }

  /// Empties the keyset. The cache is not touched.
  pub fn reset(&self) {
    self.keys.write().clear();
  }

  pub fn get(&self) -> Vec<Option<V>> {
    self.each(|cache, key| cache.get(key))
  }

  pub fn get_stale(&self) -> Vec<Option<(V, bool)>> {
    self.each(|cache, key| cache.get_stale(key))
  }

  pub fn get_with_expiry(&self) -> Vec<Option<(V, Option<SystemTime>)>> {
    self.each(|cache, key| cache.get_with_expiry(key))
  }

  pub fn touch(&self) -> Vec<Option<V>> {
    self.each(|cache, key| cache.touch(key))
  }

  pub fn touch_with_ttl(&self, ttl: impl Into<Ttl>) -> Vec<Option<V>> {
    let ttl = ttl.into();
    self.each(|cache, key| cache.touch_with_ttl(key, ttl))
  }

  /// Deletes every key, returning how many entries were removed.
  pub fn delete(&self) -> usize {
    self
      .each(|cache, key| cache.delete(key))
      .into_iter()
      .filter(|removed| *removed)
      .count()
  }

  pub fn pop(&self) -> Vec<Option<V>> {
    self.each(|cache, key| cache.pop(key))
  }

  /// Applies `f` to the value of every live key, see [`Cache::modify`].
  pub fn modify<F>(&self, mut f: F) -> Vec<Option<V>>
  where
    F: FnMut(&K, &V) -> V,
  {
    self.each(|cache, key| cache.modify(key, |value| f(key, value)))
  }

  /// Stores one value per key with the default TTL.
  pub fn set(&self, values: Vec<V>) -> Result<(), CacheError> {
    self.write(values, Ttl::Default, WriteIf::Always)
  }

  pub fn set_with_ttl(&self, ttl: impl Into<Ttl>, values: Vec<V>) -> Result<(), CacheError> {
    self.write(values, ttl.into(), WriteIf::Always)
  }

  /// Stores one value per key if none of the keys has a live entry. Nothing
  /// is written if any of them does.
  pub fn add(&self, values: Vec<V>) -> Result<(), CacheError> {
    self.write(values, Ttl::Default, WriteIf::Absent)
  }

  pub fn add_with_ttl(&self, ttl: impl Into<Ttl>, values: Vec<V>) -> Result<(), CacheError> {
    self.write(values, ttl.into(), WriteIf::Absent)
  }

  /// Stores one value per key if every key has a live entry. Nothing is
  /// written if any of them does not.
  pub fn replace(&self, values: Vec<V>) -> Result<(), CacheError> {
    self.write(values, Ttl::Default, WriteIf::Present)
  }

  pub fn replace_with_ttl(&self, ttl: impl Into<Ttl>, values: Vec<V>) -> Result<(), CacheError> {
    self.write(values, ttl.into(), WriteIf::Present)
  }

  /// Renames each key to the destination at the same position.
  ///
  /// Keys that were renamed are replaced by their destination in this
  /// keyset. Returns, per key, whether it was renamed.
  pub fn rename(&self, destinations: Vec<K>) -> Result<Vec<bool>, CacheError> {
    let mut keys = self.keys.write();
    check_count(keys.len(), destinations.len())?;

    let renamed = keys
      .iter_mut()
      .zip(destinations)
      .map(|(key, dst)| {
        let moved = self.cache.rename(key, dst.clone());
        if moved {
          *key = dst;
        }
        moved
      })
      .collect();
    Ok(renamed)
  }

  fn each<R>(&self, mut op: impl FnMut(&Cache<K, V, H>, &K) -> R) -> Vec<R> {
    self.keys().iter().map(|key| op(&self.cache, key)).collect()
  }

  fn write(&self, values: Vec<V>, ttl: Ttl, cond: WriteIf) -> Result<(), CacheError> {
    let keys = self.keys();
    check_count(keys.len(), values.len())?;
    let entries = keys.into_iter().zip(values).collect();
    self.cache.shared.store.write_batch(entries, ttl, cond)
  }
}

fn check_count(keys: usize, values: usize) -> Result<(), CacheError> {
  if keys == values {
    Ok(())
  } else {
    Err(CacheError::KeyCountMismatch { keys, values })
  }
}
