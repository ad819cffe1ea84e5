use crate::store::Store;

use std::any::Any;
use std::hash::{BuildHasher, Hash};
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// The stop signal shared between a `Janitor` handle and its thread.
#[derive(Default)]
struct StopSignal {
  stopped: Mutex<bool>,
  wake: Condvar,
}

impl StopSignal {
  /// Sleeps until `deadline` or until stopped. Returns `true` if stopped.
  fn wait_until(&self, deadline: Instant) -> bool {
    let mut stopped = self.stopped.lock();
    while !*stopped {
      if self.wake.wait_until(&mut stopped, deadline).timed_out() {
        break;
      }
    }
    *stopped
  }

  fn stop(&self) {
    *self.stopped.lock() = true;
    self.wake.notify_all();
  }
}

/// The background task that periodically sweeps expired entries.
///
/// It must be stopped explicitly; `Cache::close` does this, and dropping the
/// last cache handle does it as well.
pub(crate) struct Janitor {
  handle: Option<JoinHandle<()>>,
  signal: Arc<StopSignal>,
}

impl Janitor {
  /// Spawns a new janitor thread that calls `sweep_expired` every `interval`.
  pub(crate) fn spawn<K, V, H>(store: Arc<Store<K, V, H>>, interval: Duration) -> io::Result<Self>
  where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    H: BuildHasher + Clone + Send + Sync + 'static,
  {
    let signal = Arc::new(StopSignal::default());
    let thread_signal = signal.clone();

    let handle = thread::Builder::new()
      .name("fibre-ttl-janitor".into())
      .spawn(move || {
        tracing::debug!(interval_ms = interval.as_millis() as u64, "janitor started");
        let mut next_tick = Instant::now() + interval;
        while !thread_signal.wait_until(next_tick) {
          // A panicking eviction listener must not end the janitor. The store
          // lock is already released when the listener runs.
          if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| store.sweep_expired())) {
            tracing::error!(panic = panic_message(&*payload), "eviction listener panicked during sweep");
          }
          // A slow sweep (or slow listener) delays the next tick instead of
          // making sweeps pile up back to back.
          next_tick = Instant::now() + interval;
        }
        tracing::debug!("janitor stopped");
      })?;

    Ok(Self {
      handle: Some(handle),
      signal,
    })
  }

  /// Signals the janitor thread to stop and waits for it to exit.
  ///
  /// When called from the janitor thread itself (for example from an eviction
  /// listener running inside a sweep) the thread is only signalled.
  pub(crate) fn stop(mut self) {
    self.signal.stop();
    if let Some(handle) = self.handle.take() {
      if handle.thread().id() != thread::current().id() {
        if let Err(payload) = handle.join() {
          tracing::error!(panic = panic_message(&*payload), "janitor thread panicked");
        }
      }
    }
  }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
  if let Some(msg) = payload.downcast_ref::<&'static str>() {
    msg
  } else if let Some(msg) = payload.downcast_ref::<String>() {
    msg
  } else {
    "non-string panic payload"
  }
}

impl Drop for Janitor {
  fn drop(&mut self) {
    self.signal.stop();
  }
}
