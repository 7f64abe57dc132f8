//! Cache layer for the collection snapshot

mod memory;
mod redis_cache;

pub use memory::MemoryCache;
pub use redis_cache::RedisCache;

use crate::CacheError;
use async_trait::async_trait;
use std::time::Duration;

/// Key-value store with expiring string entries
#[async_trait]
pub trait SnapshotCache: Send + Sync {
    /// Get a live entry
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Set an entry that expires after `ttl`
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Remove an entry; removing a missing key is not an error
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Round-trip to the backend
    async fn ping(&self) -> Result<(), CacheError>;
}
