use crate::Cache;

use std::fmt;
use std::hash::{BuildHasher, Hash};

use ahash::{HashMap, HashMapExt};
use parking_lot::RwLock;

/// Gives entries of a cache additional alias keys.
///
/// Useful when the same entry is looked up by different keys in different
/// code paths, for example a site by its ID or by its hostname. Aliases never
/// expire and are never removed automatically; the entries they point to
/// expire and are deleted as usual, after which the alias simply misses.
pub struct Proxy<P, K, V, H = ahash::RandomState> {
  cache: Cache<K, V, H>,
  aliases: RwLock<HashMap<P, K>>,
}

impl<P, K, V, H> fmt::Debug for Proxy<P, K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Proxy")
      .field("aliases", &self.aliases.read().len())
      .field("cache", &self.cache)
      .finish()
  }
}

impl<P, K, V, H> Proxy<P, K, V, H>
where
  P: Eq + Hash + Clone,
  K: Eq + Hash + Clone,
  V: Clone,
  H: BuildHasher + Clone,
{
  pub fn new(cache: Cache<K, V, H>) -> Self {
    Self {
      cache,
      aliases: RwLock::new(HashMap::new()),
    }
  }

  /// Makes `alias` resolve to `main`, replacing any previous target.
  pub fn proxy(&self, main: K, alias: P) {
    self.aliases.write().insert(alias, main);
  }

  /// Removes the alias. The entry in the cache is left alone.
  pub fn remove(&self, alias: &P) -> Option<K> {
    self.aliases.write().remove(alias)
  }

  /// Removes every alias.
  pub fn reset(&self) {
    self.aliases.write().clear();
  }

  /// The key `alias` resolves to.
  pub fn key(&self, alias: &P) -> Option<K> {
    self.aliases.read().get(alias).cloned()
  }

  pub fn cache(&self) -> &Cache<K, V, H> {
    &self.cache
  }

  /// Stores `value` under `main` with the default TTL and points `alias` at
  /// it.
  pub fn set(&self, main: K, alias: P, value: V) {
    self.aliases.write().insert(alias, main.clone());
    self.cache.set(main, value);
  }

  /// Looks up the entry `alias` resolves to.
  pub fn get(&self, alias: &P) -> Option<V> {
    // Resolve first so the alias lock is not held across the cache lookup.
    let main = self.key(alias)?;
    self.cache.get(&main)
  }

  /// A copy of every alias, mapped to the key it resolves to.
  pub fn aliases(&self) -> HashMap<P, K> {
    self.aliases.read().clone()
  }
}
