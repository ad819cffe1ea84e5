//! Background work and deferred callbacks: the janitor that sweeps expired
//! entries and the notifier that delivers evictions outside the store lock.

pub(crate) mod janitor;
pub(crate) mod notifier;
