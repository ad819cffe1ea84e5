use std::fmt;

/// Describes the reason an entry was removed from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
  /// The entry was removed by a sweep because its time-to-live (TTL) expired.
  Expired,
  /// The entry was removed explicitly (`delete`, `pop`, `delete_all` or
  /// `delete_where`).
  Invalidated,
}

impl fmt::Display for EvictionReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      EvictionReason::Expired => write!(f, "evicted due to expiration (TTL)"),
      EvictionReason::Invalidated => write!(f, "manually invalidated"),
    }
  }
}

/// A listener that can be registered with the cache to receive notifications
/// when entries are evicted.
///
/// `on_evict` runs after the cache lock has been released, on the thread that
/// caused the eviction (the janitor thread for sweeps). It may call back into
/// the cache. It is never called for overwrites via `set`, for `rename`, or
/// for `reset`.
///
/// Any `Fn(K, V, EvictionReason) + Send + Sync` closure is a listener.
pub trait EvictionListener<K, V>: Send + Sync {
  fn on_evict(&self, key: K, value: V, reason: EvictionReason);
}

impl<K, V, F> EvictionListener<K, V> for F
where
  F: Fn(K, V, EvictionReason) + Send + Sync,
{
  #[inline]
  fn on_evict(&self, key: K, value: V, reason: EvictionReason) {
    self(key, value, reason)
  }
}
