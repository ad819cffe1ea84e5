// This entire module is only compiled when the 'serde' feature is enabled.
#![cfg(feature = "serde")]

use crate::entry::Item;
use crate::error::BuildError;
use crate::{Cache, CacheBuilder};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};

/// An internal, serializable representation of a single cache entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct PersistentEntry<K, V> {
  pub(crate) key: K,
  pub(crate) value: V,
  /// Absolute expiry in nanoseconds since the UNIX epoch. 0 means never.
  pub(crate) expires_at: u64,
}

/// A serializable, point-in-time snapshot of the cache's data.
///
/// This struct can be created with [`Cache::to_snapshot()`] and used to
/// restore a cache with [`CacheBuilder::build_from_snapshot()`].
///
/// Expiry is stored as an absolute timestamp, so time spent between saving
/// and restoring counts against each entry's TTL. Entries are kept in write
/// order, which the restored cache preserves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSnapshot<K, V> {
  pub(crate) entries: Vec<PersistentEntry<K, V>>,
}

impl<K, V> CacheSnapshot<K, V> {
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

impl<K, V, H> CacheBuilder<K, V, H>
where
  K: Eq + Hash + Clone + Send + Sync + DeserializeOwned + 'static,
  V: Clone + Send + Sync + DeserializeOwned + 'static,
  H: BuildHasher + Clone + Send + Sync + 'static,
{
  /// Builds a new cache pre-populated with the entries of a snapshot.
  ///
  /// Any map passed to [`items`](CacheBuilder::items) is replaced. Entries
  /// that expired while the snapshot was stored are kept until the first
  /// sweep.
  pub fn build_from_snapshot(self, snapshot: CacheSnapshot<K, V>) -> Result<Cache<K, V, H>, BuildError> {
    let mut items = HashMap::with_capacity_and_hasher(snapshot.entries.len(), self.hasher.clone());
    for (seq, entry) in snapshot.entries.into_iter().enumerate() {
      items.insert(
        entry.key,
        Item::with_deadline(entry.value, entry.expires_at, seq as u64),
      );
    }
    self.items(items).build()
  }
}

impl<K, V, H> Cache<K, V, H>
where
  K: Eq + Hash + Clone + Serialize,
  V: Clone + Serialize,
  H: BuildHasher + Clone,
{
  /// Creates a serializable snapshot of the cache's current state.
  ///
  /// Expired items are not included in the snapshot.
  pub fn to_snapshot(&self) -> CacheSnapshot<K, V> {
    let entries = self
      .shared
      .store
      .entries_in_write_order()
      .into_iter()
      .map(|(key, item)| PersistentEntry {
        key,
        expires_at: item.expires_at,
        value: item.value,
      })
      .collect();

    CacheSnapshot { entries }
  }
}
