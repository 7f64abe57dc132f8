//! Prelude module for common imports.
//!
//! This module re-exports commonly used types and traits for convenience.
//!
//! # Usage
//!
//! ```ignore
//! use datasvc::prelude::*;
//! ```

// Error types
pub use crate::error::{CacheError, ProcessError, Result, ServiceError, StoreError};

// Configuration
pub use crate::config::{CacheConfig, Config, MongoConfig, RedisConfig, ServerConfig};

// Backends
pub use crate::cache::{MemoryCache, RedisCache, SnapshotCache};
pub use crate::storage::{MemoryStore, MongoStore, Record, RecordStore};

// Metrics
pub use crate::metrics::Metrics;

// Server
pub use crate::server::{AppState, Server};

// Common external crates
pub use std::sync::Arc;
pub use tracing::{debug, error, info, trace, warn};
