//! Dependency health probes
//!
//! Probe failures are reported as data, never as an HTTP failure.

use crate::cache::SnapshotCache;
use crate::storage::RecordStore;
use serde::Serialize;
use tracing::debug;

/// Live status of one dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Connected,
    Disconnected,
}

impl ServiceStatus {
    fn from_probe<E: std::fmt::Display>(name: &str, result: Result<(), E>) -> Self {
        match result {
            Ok(()) => ServiceStatus::Connected,
            Err(e) => {
                debug!("{} health probe failed: {}", name, e);
                ServiceStatus::Disconnected
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Services {
    pub mongo: ServiceStatus,
    pub redis: ServiceStatus,
}

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub services: Services,
}

/// Ping both dependencies concurrently
pub async fn probe(store: &dyn RecordStore, cache: &dyn SnapshotCache) -> HealthReport {
    let (mongo, redis) = tokio::join!(store.ping(), cache.ping());

    HealthReport {
        status: "healthy",
        services: Services {
            mongo: ServiceStatus::from_probe("mongo", mongo),
            redis: ServiceStatus::from_probe("redis", redis),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::storage::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_all_connected() {
        let store = MemoryStore::new();
        let cache = MemoryCache::new();

        let report = probe(&store, &cache).await;
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({
                "status": "healthy",
                "services": { "mongo": "connected", "redis": "connected" }
            })
        );
    }

    #[tokio::test]
    async fn test_degraded_fields() {
        let store = MemoryStore::new();
        let cache = MemoryCache::new();
        cache.set_available(false);

        let report = probe(&store, &cache).await;
        assert_eq!(report.status, "healthy");
        assert_eq!(report.services.mongo, ServiceStatus::Connected);
        assert_eq!(report.services.redis, ServiceStatus::Disconnected);

        store.set_available(false);
        let report = probe(&store, &cache).await;
        assert_eq!(report.services.mongo, ServiceStatus::Disconnected);
    }
}
