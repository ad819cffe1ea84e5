use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

/// The internal state of a populate call in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
  Running,
  Done,
}

/// One populate call in flight. Followers block on it until the leader is
/// finished, whether the leader returned or panicked.
struct Flight {
  state: Mutex<State>,
  done: Condvar,
}

impl Flight {
  fn new() -> Self {
    Self {
      state: Mutex::new(State::Running),
      done: Condvar::new(),
    }
  }

  fn wait(&self) {
    let mut state = self.state.lock();
    while *state == State::Running {
      self.done.wait(&mut state);
    }
  }

  fn complete(&self) {
    *self.state.lock() = State::Done;
    self.done.notify_all();
  }
}

/// What a caller of [`Gate::enter`] should do next.
pub(crate) enum Turn<'a, K: Eq + Hash> {
  /// The caller owns the key until the guard is dropped.
  Lead(LeaderGuard<'a, K>),
  /// Another caller was running for the key and has since finished. The
  /// caller must re-read the store; a miss means "populate again".
  Followed,
}

/// Ensures only one populate-on-miss computation runs per key at a time.
///
/// Each cache owns its own gate. A key is present in `in_flight` exactly while
/// its leader is running.
pub(crate) struct Gate<K> {
  in_flight: Mutex<HashMap<K, Arc<Flight>, ahash::RandomState>>,
}

impl<K> fmt::Debug for Gate<K> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Gate")
      .field("in_flight", &self.in_flight.lock().len())
      .finish()
  }
}

impl<K> Default for Gate<K> {
  fn default() -> Self {
    Self {
      in_flight: Mutex::new(HashMap::default()),
    }
  }
}

impl<K: Eq + Hash + Clone> Gate<K> {
  /// Becomes the leader for `key`, or waits for the current leader to finish.
  ///
  /// The gate lock is only held to look up or register the flight; a follower
  /// waits on the flight itself.
  pub(crate) fn enter(&self, key: &K) -> Turn<'_, K> {
    let flight = {
      let mut in_flight = self.in_flight.lock();
      match in_flight.get(key) {
        Some(flight) => flight.clone(),
        None => {
          let flight = Arc::new(Flight::new());
          in_flight.insert(key.clone(), flight.clone());
          return Turn::Lead(LeaderGuard {
            gate: self,
            key: key.clone(),
            flight,
          });
        }
      }
    };

    flight.wait();
    Turn::Followed
  }

  #[cfg(test)]
  fn is_running(&self, key: &K) -> bool {
    self.in_flight.lock().contains_key(key)
  }
}

/// Marks the key idle and wakes followers when dropped, including during a
/// panic unwinding out of the populate function.
pub(crate) struct LeaderGuard<'a, K: Eq + Hash> {
  gate: &'a Gate<K>,
  key: K,
  flight: Arc<Flight>,
}

impl<K: Eq + Hash> Drop for LeaderGuard<'_, K> {
  fn drop(&mut self) {
    self.gate.in_flight.lock().remove(&self.key);
    self.flight.complete();
  }
}
