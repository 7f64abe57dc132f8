//! Redis cache backend
//!
//! The connection is opened on first use and shared (multiplexed) across
//! requests. Connection-level failures drop it so the next call reconnects.
//! Connecting happens outside the slot lock, so a slow or dead Redis never
//! makes one request wait on another's connect attempt.

use crate::CacheError;
use crate::cache::SnapshotCache;
use crate::config::RedisConfig;
use async_trait::async_trait;
use parking_lot::Mutex;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, RedisResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Installed connection, tagged so a stale failure cannot evict a newer one
struct Slot {
    generation: u64,
    conn: MultiplexedConnection,
}

/// Redis-backed snapshot cache
pub struct RedisCache {
    client: redis::Client,
    connect_timeout: Duration,
    slot: Mutex<Option<Slot>>,
    next_generation: AtomicU64,
}

impl RedisCache {
    /// Create a cache handle; no connection is made yet
    pub fn new(config: &RedisConfig) -> Result<Self, CacheError> {
        let client = redis::Client::open(config.url())?;
        Ok(Self {
            client,
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            slot: Mutex::new(None),
            next_generation: AtomicU64::new(1),
        })
    }

    fn installed(&self) -> Option<(u64, MultiplexedConnection)> {
        self.slot
            .lock()
            .as_ref()
            .map(|slot| (slot.generation, slot.conn.clone()))
    }

    async fn connection(&self) -> Result<(u64, MultiplexedConnection), CacheError> {
        if let Some(installed) = self.installed() {
            return Ok(installed);
        }

        let conn = tokio::time::timeout(
            self.connect_timeout,
            self.client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| CacheError::ConnectTimeout(self.connect_timeout))??;

        let mut slot = self.slot.lock();
        // Another task may have connected while we were waiting
        if let Some(existing) = slot.as_ref() {
            return Ok((existing.generation, existing.conn.clone()));
        }
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        *slot = Some(Slot {
            generation,
            conn: conn.clone(),
        });
        debug!("Connected to Redis");
        Ok((generation, conn))
    }

    /// Pass a command result through, forgetting the connection if it broke
    fn check<T>(&self, generation: u64, result: RedisResult<T>) -> Result<T, CacheError> {
        match result {
            Ok(v) => Ok(v),
            Err(e) => {
                if e.is_connection_dropped() || e.is_io_error() || e.is_timeout() {
                    let mut slot = self.slot.lock();
                    if slot.as_ref().is_some_and(|s| s.generation == generation) {
                        warn!("Redis connection lost: {}", e);
                        *slot = None;
                    }
                }
                Err(e.into())
            }
        }
    }
}

#[async_trait]
impl SnapshotCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let (generation, mut conn) = self.connection().await?;
        let result = conn.get::<_, Option<String>>(key).await;
        self.check(generation, result)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let (generation, mut conn) = self.connection().await?;
        // SETEX rejects a zero expiry
        let seconds = ttl.as_secs().max(1);
        let result = conn.set_ex::<_, _, ()>(key, value, seconds).await;
        self.check(generation, result)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let (generation, mut conn) = self.connection().await?;
        let result = conn.del::<_, ()>(key).await;
        self.check(generation, result)
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let (generation, mut conn) = self.connection().await?;
        let result = redis::cmd("PING").query_async::<String>(&mut conn).await;
        self.check(generation, result).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future::join_all;
    use std::sync::Arc;
    use std::time::Instant;
    use tokio::net::TcpListener;

    fn config_for(port: u16) -> RedisConfig {
        RedisConfig {
            host: "127.0.0.1".to_string(),
            port,
            ..RedisConfig::default()
        }
    }

    /// A server that accepts, stalls for `hold`, then hangs up
    async fn stalling_server(hold: Duration) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    tokio::time::sleep(hold).await;
                    drop(socket);
                });
            }
        });
        port
    }

    #[test]
    fn test_new_does_not_connect() {
        assert!(RedisCache::new(&config_for(1)).is_ok());
    }

    #[tokio::test]
    async fn test_ping_unreachable() {
        // Nothing listens on port 1
        let cache = RedisCache::new(&config_for(1)).unwrap();
        assert!(cache.ping().await.is_err());
        assert!(cache.installed().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_calls_do_not_queue_on_a_stalled_server() {
        let hold = Duration::from_millis(500);
        let port = stalling_server(hold).await;
        let cache = Arc::new(RedisCache::new(&config_for(port)).unwrap());

        let start = Instant::now();
        let results = join_all((0..4).map(|_| {
            let cache = Arc::clone(&cache);
            async move { cache.ping().await }
        }))
        .await;
        let elapsed = start.elapsed();

        assert!(results.iter().all(Result::is_err));
        // Serialized attempts would take about 4 * hold
        assert!(elapsed < hold * 2, "took {elapsed:?}");
    }
}
