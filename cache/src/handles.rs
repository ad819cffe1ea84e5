//! The user-facing cache handle.

mod sync;

pub use sync::Cache;
