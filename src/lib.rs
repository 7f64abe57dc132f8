//! # datasvc
//!
//! Small JSON data service: a document collection in MongoDB, a read-through
//! Redis snapshot of that collection, and Prometheus request metrics.
//!
//! ## Endpoints
//!
//! - `GET /` - welcome message
//! - `GET /health` - live MongoDB/Redis probes, always 200
//! - `GET /metrics` - Prometheus text exposition
//! - `GET /api/data` - every record, served from a 60s cached snapshot
//! - `POST /api/data` - insert one record and drop the snapshot
//! - `POST /api/process` - sum/avg/min/max over a list of numbers
//!
//! ## Example
//!
//! ```ignore
//! use datasvc::prelude::*;
//!
//! let state = AppState::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(MemoryCache::new()),
//!     Arc::new(Metrics::new()?),
//!     CacheConfig::default(),
//! );
//! let app = datasvc::server::router(state);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌────────┐    ┌──────────────────────────┐    ┌─────────┐
//! │ client │───▶│ datasvc (axum)           │───▶│ MongoDB │
//! └────────┘    │  ├─ request timing       │    └─────────┘
//!               │  ├─ catch-panic -> 500   │    ┌─────────┐
//!               │  └─ handlers             │───▶│ Redis   │
//!               └──────────────────────────┘    └─────────┘
//! ```

// Modules
pub mod cache;
pub mod config;
pub mod error;
pub mod health;
pub mod metrics;
pub mod prelude;
pub mod process;
pub mod server;
pub mod storage;

// Re-exports for convenience
pub use error::{CacheError, ProcessError, Result, ServiceError, StoreError};
