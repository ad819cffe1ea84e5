use std::io;

use thiserror::Error;

/// Errors returned by conditional writes.
///
/// These are expected, recoverable outcomes. The cache never retries; the
/// caller decides what to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CacheError {
  /// `add` found a live (unexpired) entry for the key.
  #[error("item already exists")]
  AlreadyExists,
  /// `replace` found no live entry for the key.
  #[error("item doesn't exist")]
  NotFound,
  /// A keyset batch write was given a different number of values than keys.
  #[error("keyset has {keys} keys, but {values} values were given")]
  KeyCountMismatch { keys: usize, values: usize },
}

/// Errors that can occur when building a cache.
#[derive(Debug, Error)]
pub enum BuildError {
  /// The background janitor thread could not be started.
  #[error("failed to spawn the janitor thread")]
  JanitorSpawn(#[source] io::Error),
}
