use crate::listener::{EvictionListener, EvictionReason};

use std::sync::Arc;

/// The registered listener, as stored under the cache lock.
pub(crate) type SharedListener<K, V> = Arc<dyn EvictionListener<K, V>>;

/// A batch of evictions collected while the store lock is held and delivered
/// after it has been released.
///
/// The listener is captured together with the batch, so a concurrent
/// replacement of the listener only affects evictions that start later.
pub(crate) struct Notifier<K, V> {
  listener: Option<SharedListener<K, V>>,
  reason: EvictionReason,
  pending: Vec<(K, V)>,
}

impl<K, V> Notifier<K, V> {
  /// Captures the listener. Must be called while the store lock is held.
  pub(crate) fn capture(listener: &Option<SharedListener<K, V>>, reason: EvictionReason) -> Self {
    Self {
      listener: listener.clone(),
      reason,
      pending: Vec::new(),
    }
  }

  #[inline]
  pub(crate) fn is_listening(&self) -> bool {
    self.listener.is_some()
  }

  /// Queues an eviction. Without a listener the pair is simply dropped.
  #[inline]
  pub(crate) fn push(&mut self, key: K, value: V) {
    if self.listener.is_some() {
      self.pending.push((key, value));
    }
  }

  /// Delivers every queued eviction, in the order they were pushed.
  ///
  /// Callers must have released the store lock before calling this.
  pub(crate) fn fire(self) {
    let Some(listener) = self.listener else {
      return;
    };
    for (key, value) in self.pending {
      listener.on_evict(key, value, self.reason);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use parking_lot::Mutex;

  #[test]
  fn fires_in_push_order_with_reason() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let listener: SharedListener<u32, String> = {
      let seen = seen.clone();
      Arc::new(move |k: u32, v: String, r: EvictionReason| seen.lock().push((k, v, r)))
    };

    let mut notifier = Notifier::capture(&Some(listener), EvictionReason::Expired);
    assert!(notifier.is_listening());
    notifier.push(2, "b".to_string());
    notifier.push(1, "a".to_string());
    notifier.fire();

    assert_eq!(
      *seen.lock(),
      vec![
        (2, "b".to_string(), EvictionReason::Expired),
        (1, "a".to_string(), EvictionReason::Expired)
      ]
    );
  }

  #[test]
  fn without_listener_nothing_is_queued() {
    let mut notifier: Notifier<u32, String> = Notifier::capture(&None, EvictionReason::Invalidated);
    assert!(!notifier.is_listening());
    notifier.push(1, "one".to_string());
    assert!(notifier.pending.is_empty());
    notifier.fire();
  }
}
