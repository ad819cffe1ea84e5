use once_cell::sync::Lazy;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

// The single reference point for all time calculations in the cache. It pairs
// a monotonic `Instant` with the wall clock reading taken at the same moment,
// so timestamps are absolute (UNIX nanoseconds) but never run backwards.
static CLOCK_ANCHOR: Lazy<(Instant, u64)> = Lazy::new(|| {
  let wall = SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map_or(0, saturating_nanos);
  (Instant::now(), wall)
});

/// Converts a `Duration` to nanoseconds, saturating at `u64::MAX`.
#[inline]
pub(crate) fn saturating_nanos(duration: Duration) -> u64 {
  u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

/// The current time as nanoseconds since the UNIX epoch.
#[inline]
pub(crate) fn now_nanos() -> u64 {
  let (instant, wall) = *CLOCK_ANCHOR;
  wall.saturating_add(saturating_nanos(instant.elapsed()))
}

/// Converts a stored nanosecond timestamp back into a `SystemTime`.
#[inline]
pub(crate) fn nanos_to_system_time(nanos: u64) -> SystemTime {
  UNIX_EPOCH + Duration::from_nanos(nanos)
}

/// Converts a `SystemTime` into a nanosecond timestamp. Times before the epoch
/// clamp to 1 so they still read as "already expired" rather than "never".
#[inline]
pub(crate) fn system_time_to_nanos(time: SystemTime) -> u64 {
  time
    .duration_since(UNIX_EPOCH)
    .map_or(1, |d| saturating_nanos(d).max(1))
}
