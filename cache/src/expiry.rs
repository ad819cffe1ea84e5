//! The expiration policy shared by every cache operation.
//!
//! Expiry is always stored as an absolute timestamp in nanoseconds since the
//! UNIX epoch, with `0` meaning "never expires". An entry is valid through the
//! exact instant of its deadline and expired on the first observation
//! strictly after it.

use crate::time;

use std::time::Duration;

/// The lifetime requested for a write.
///
/// `Default` and `Never` are sentinels and are distinct from any duration,
/// including `After(Duration::ZERO)`, which is accepted and means the entry
/// expires essentially immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Ttl {
  /// Use the default TTL the cache was built with.
  #[default]
  Default,
  /// The entry never expires.
  Never,
  /// The entry expires this long after the write.
  After(Duration),
}

impl From<Duration> for Ttl {
  fn from(duration: Duration) -> Self {
    Ttl::After(duration)
  }
}

impl From<Option<Duration>> for Ttl {
  /// `None` maps to [`Ttl::Never`].
  fn from(duration: Option<Duration>) -> Self {
    duration.map_or(Ttl::Never, Ttl::After)
  }
}

/// Normalizes a cache-wide default. Asking for "the default" as the default
/// itself means "never".
#[inline]
pub(crate) fn normalize_default(ttl: Ttl) -> Option<Duration> {
  match ttl {
    Ttl::Default | Ttl::Never => None,
    Ttl::After(d) => Some(d),
  }
}

/// Resolves a requested TTL against the store default. `None` means the entry
/// gets no absolute expiry.
#[inline]
pub(crate) fn resolve_ttl(requested: Ttl, store_default: Option<Duration>) -> Option<Duration> {
  match requested {
    Ttl::Default => store_default,
    Ttl::Never => None,
    Ttl::After(d) => Some(d),
  }
}

/// Computes the absolute deadline for an effective TTL, read against `now`.
#[inline]
pub(crate) fn deadline(ttl: Option<Duration>, now: u64) -> u64 {
  match ttl {
    None => 0,
    // `now` is always positive, so a zero duration still yields a real
    // deadline rather than the "never" marker.
    Some(d) => now.saturating_add(time::saturating_nanos(d)).max(1),
  }
}

#[inline]
pub(crate) fn is_expired(expires_at: u64, now: u64) -> bool {
  expires_at > 0 && now > expires_at
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn expiry_is_strict() {
    assert!(!is_expired(0, u64::MAX), "zero means never");
    assert!(!is_expired(100, 99));
    assert!(!is_expired(100, 100), "valid through the exact deadline");
    assert!(is_expired(100, 101));
  }

  #[test]
  fn resolve_substitutes_default_only_for_default() {
    let five = Some(Duration::from_secs(5));
    assert_eq!(resolve_ttl(Ttl::Default, five), five);
    assert_eq!(resolve_ttl(Ttl::Default, None), None);
    assert_eq!(resolve_ttl(Ttl::Never, five), None);
    assert_eq!(
      resolve_ttl(Ttl::After(Duration::ZERO), five),
      Some(Duration::ZERO)
    );
  }

  #[test]
  fn default_ttl_normalizes_to_never() {
    assert_eq!(normalize_default(Ttl::Default), None);
    assert_eq!(normalize_default(Ttl::Never), None);
    assert_eq!(
      normalize_default(Ttl::After(Duration::from_millis(3))),
      Some(Duration::from_millis(3))
    );
  }

  #[test]
  fn deadline_saturates_and_never_collides_with_zero() {
    assert_eq!(deadline(None, 42), 0);
    assert_eq!(deadline(Some(Duration::ZERO), 42), 42);
    assert_eq!(deadline(Some(Duration::from_nanos(8)), 42), 50);
    assert_eq!(deadline(Some(Duration::MAX), 42), u64::MAX);
  }

  #[test]
  fn zero_ttl_expires_on_next_observation() {
    let written_at = time::now_nanos();
    let expires_at = deadline(Some(Duration::ZERO), written_at);
    assert!(!is_expired(expires_at, written_at));
    assert!(is_expired(expires_at, written_at + 1));
  }

  #[test]
  fn conversions() {
    assert_eq!(Ttl::from(Duration::from_secs(1)), Ttl::After(Duration::from_secs(1)));
    assert_eq!(Ttl::from(None::<Duration>), Ttl::Never);
    assert_eq!(Ttl::default(), Ttl::Default);
  }
}
