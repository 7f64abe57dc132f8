//! HTTP server: routing, shared state and lifecycle

mod handler;
mod middleware;

use crate::cache::SnapshotCache;
use crate::config::{CacheConfig, ServerConfig};
use crate::metrics::Metrics;
use crate::storage::RecordStore;
use axum::Router;
use axum::routing::{get, post};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::info;

/// Long-lived handles shared by every request
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub cache: Arc<dyn SnapshotCache>,
    pub metrics: Arc<Metrics>,
    cache_policy: Arc<CacheConfig>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RecordStore>,
        cache: Arc<dyn SnapshotCache>,
        metrics: Arc<Metrics>,
        cache_policy: CacheConfig,
    ) -> Self {
        Self {
            store,
            cache,
            metrics,
            cache_policy: Arc::new(cache_policy),
        }
    }

    pub(crate) fn cache_key(&self) -> &str {
        &self.cache_policy.key
    }

    pub(crate) fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_policy.ttl_secs)
    }
}

/// Build the application router.
///
/// Request timing wraps everything, including the 404 fallback and panics
/// converted to 500 by the catch-panic layer.
pub fn router(state: AppState) -> Router {
    let metrics = Arc::clone(&state.metrics);

    Router::new()
        .route("/", get(handler::index))
        .route("/health", get(handler::health))
        .route("/metrics", get(handler::metrics))
        .route("/api/data", get(handler::get_data).post(handler::add_data))
        .route("/api/process", post(handler::process_data))
        .fallback(handler::not_found)
        .layer(CatchPanicLayer::custom(middleware::panic_response))
        .layer(axum::middleware::from_fn_with_state(
            metrics,
            middleware::track_requests,
        ))
        .with_state(state)
}

/// Main server struct
pub struct Server {
    config: ServerConfig,
    state: AppState,
    cancel_token: CancellationToken,
}

impl Server {
    /// Create a new server
    pub fn new(config: ServerConfig, state: AppState, cancel_token: CancellationToken) -> Self {
        Self {
            config,
            state,
            cancel_token,
        }
    }

    /// Run the server until the cancel token fires, then drain in-flight requests
    pub async fn run(self) -> anyhow::Result<()> {
        let addr: SocketAddr = self.config.listen_addr.parse()?;
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", addr);

        let cancel_token = self.cancel_token.clone();
        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                info!("Server shutting down");
            })
            .await?;

        Ok(())
    }
}
