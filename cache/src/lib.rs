//! An in-process, thread-safe key/value store with per-entry expiration.
//!
//! # Features
//! - **Per-entry TTL**: Every write can carry its own time-to-live, fall back
//!   to the cache default, or never expire.
//! - **Race-free compound operations**: add-if-absent, replace-if-present,
//!   atomic modify and bulk delete-by-predicate each run under one lock.
//! - **Get-or-populate**: Concurrent misses on the same key are coalesced so
//!   the expensive computation runs once.
//! - **Background sweeping**: An optional janitor thread reclaims expired
//!   entries so no foreground caller pays for it.
//! - **Eviction listener**: Notified outside the lock whenever an entry is
//!   deleted or swept.
//! - **Observability**: Exposes hit/miss and throughput metrics.
//! - **Persistence**: Optional `serde` feature for saving and loading cache state.
//!
//! ```
//! use fibre_ttl::{Cache, Ttl};
//! use std::time::Duration;
//!
//! let cache = Cache::new(Duration::from_secs(300), Duration::from_secs(60)).unwrap();
//! cache.set("greeting", "hello".to_string());
//! cache.set_with_ttl("pinned", "forever".to_string(), Ttl::Never);
//!
//! assert_eq!(cache.get(&"greeting").as_deref(), Some("hello"));
//! cache.close();
//! ```

// Public modules that form the API
pub mod builder;
pub mod error;
pub mod handles;
pub mod listener;
pub mod metrics;

// Internal, crate-only modules
mod entry;
mod expiry;
mod gate;
mod keyset;
mod proxy;
mod shared;
mod store;
mod task;
mod time;

#[cfg(feature = "serde")]
pub mod snapshot;

// Re-export the primary user-facing types for convenience
pub use builder::CacheBuilder;
pub use entry::Item;
pub use error::{BuildError, CacheError};
pub use expiry::Ttl;
pub use handles::Cache;
pub use keyset::Keyset;
pub use listener::{EvictionListener, EvictionReason};
pub use metrics::MetricsSnapshot;
pub use proxy::Proxy;
#[cfg(feature = "serde")]
pub use snapshot::CacheSnapshot;
