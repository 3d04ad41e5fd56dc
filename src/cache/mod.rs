// Cache module for query results.
// Holds fetched data in memory, keyed by query, and refreshes it when mutations stale its tags.

pub mod entry;
pub mod store;
pub mod tags;

pub use entry::{CacheEntry, EntryStatus};
pub use store::{Callback, DEFAULT_KEEP_UNUSED_FOR, QueryCache, Subscription};
pub use tags::Tag;
