//! REVDECK Query - client-side data synchronization.
//!
//! A keyed cache for asynchronous query results with in-flight request
//! deduplication, staleness tracking, and mutation-driven invalidation.
//!
//! The cache is a pure state machine: it performs no I/O and spawns no
//! tasks. Callers drive it from a single event loop and act on the effect
//! values its methods return (start a fetch, start or stop a poll timer,
//! refetch a set of keys). All reads and writes to an entry happen on that
//! one loop, so the "at most one in-flight fetch per key" invariant is a
//! presence check, not a mutex.

pub mod cache;
pub mod key;
pub mod mutation;

pub use cache::{CacheEntry, FetchError, QueryCache, QueryStatus, SubscribeEffect, UnsubscribeEffect};
pub use key::QueryKey;
pub use mutation::{InvalidationRule, MutationState, MutationStatus};
