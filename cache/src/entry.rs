use crate::{expiry, time};

use std::time::SystemTime;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A value stored in the cache together with its absolute expiration time.
///
/// This is the unit handed out by [`Cache::items`](crate::Cache::items) and
/// accepted by [`CacheBuilder::items`](crate::CacheBuilder::items), so a
/// captured map can be handed to any external encoder and later restored.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Item<V> {
  pub(crate) value: V,
  /// Expiration timestamp in nanoseconds since the UNIX epoch. 0 means never.
  pub(crate) expires_at: u64,
  /// Write order, used to give `delete_where` a deterministic visit order.
  /// Serialized so an encoded `items()` map restores in the same order.
  #[cfg_attr(feature = "serde", serde(default))]
  pub(crate) seq: u64,
}

impl<V> Item<V> {
  /// Creates an item expiring at `expires_at`, or never when `None`.
  pub fn new(value: V, expires_at: Option<SystemTime>) -> Self {
    Self {
      value,
      expires_at: expires_at.map_or(0, time::system_time_to_nanos),
      seq: 0,
    }
  }

  /// Creates an item that never expires.
  pub fn never(value: V) -> Self {
    Self::new(value, None)
  }

  #[inline]
  pub(crate) fn with_deadline(value: V, expires_at: u64, seq: u64) -> Self {
    Self {
      value,
      expires_at,
      seq,
    }
  }

  #[inline]
  pub fn value(&self) -> &V {
    &self.value
  }

  #[inline]
  pub fn into_value(self) -> V {
    self.value
  }

  /// The absolute expiration time, or `None` if the item never expires.
  pub fn expires_at(&self) -> Option<SystemTime> {
    (self.expires_at > 0).then(|| time::nanos_to_system_time(self.expires_at))
  }

  /// Reports whether the item has expired as of now.
  pub fn is_expired(&self) -> bool {
    self.is_expired_at(time::now_nanos())
  }

  #[inline]
  pub(crate) fn is_expired_at(&self, now: u64) -> bool {
    expiry::is_expired(self.expires_at, now)
  }
}
