// Cache backend access.
// The store trait is the seam between the cache-aside flow and redis.

mod store;

pub use store::{CacheStore, RedisStore};

#[cfg(test)]
pub use store::MemoryStore;
