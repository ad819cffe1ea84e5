use crate::gate::Gate;
use crate::store::Store;
use crate::task::janitor::Janitor;

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// The internal, thread-safe core shared by every handle to one cache.
pub(crate) struct CacheShared<K, V, H> {
  pub(crate) store: Arc<Store<K, V, H>>,
  pub(crate) gate: Gate<K>,
  pub(crate) janitor: Mutex<Option<Janitor>>,
}

impl<K, V, H> fmt::Debug for CacheShared<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheShared")
      .field("store", &self.store)
      .field("gate", &self.gate)
      .field("janitor_running", &self.janitor.lock().is_some())
      .finish()
  }
}

impl<K, V, H> CacheShared<K, V, H> {
  pub(crate) fn new(store: Arc<Store<K, V, H>>, janitor: Option<Janitor>) -> Self {
    Self {
      store,
      gate: Gate::default(),
      janitor: Mutex::new(janitor),
    }
  }

  /// Stops the janitor if it is still running. Safe to call more than once.
  pub(crate) fn stop_janitor(&self) {
    // Take it out first so the join happens without holding the mutex.
    let janitor = self.janitor.lock().take();
    if let Some(janitor) = janitor {
      janitor.stop();
    }
  }
}

impl<K, V, H> Drop for CacheShared<K, V, H> {
  fn drop(&mut self) {
    if let Some(janitor) = self.janitor.get_mut().take() {
      janitor.stop();
    }
  }
}
