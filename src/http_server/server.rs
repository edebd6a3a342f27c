//! # HTTP Server
//!
//! Combines the endpoint routers and runs the retention sweeper.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth_routes::auth_routes;
use super::config::HttpServerConfig;
use super::file_routes::file_routes;
use super::observability_routes::health_routes;
use super::state::AppState;

/// HTTP server for file sharing
pub struct HttpServer {
    config: HttpServerConfig,
    state: Arc<AppState>,
    sweep_interval: Option<Duration>,
}

impl HttpServer {
    pub fn with_config(config: HttpServerConfig, state: Arc<AppState>) -> Self {
        Self {
            config,
            state,
            sweep_interval: None,
        }
    }

    /// Sweep expired files every `interval`; `None` disables sweeping
    pub fn with_sweep_interval(mut self, interval: Option<Duration>) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Build the combined router with all endpoints
    pub fn build_router(config: &HttpServerConfig, state: Arc<AppState>) -> Router {
        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .merge(health_routes())
            .nest("/api/auth", auth_routes(Arc::clone(&state)))
            .nest("/api/files", file_routes(state))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        Self::build_router(&self.config, self.state)
    }

    /// Serve until interrupted
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid socket address {}: {}", self.config.socket_addr(), e),
            )
        })?;

        let sweeper = self
            .sweep_interval
            .map(|every| spawn_retention_sweeper(Arc::clone(&self.state), every));

        let router = Self::build_router(&self.config, self.state);
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "filegate listening");

        let served = axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("shutdown requested");
            })
            .await;

        if let Some(handle) = sweeper {
            handle.abort();
        }
        served
    }
}

/// Periodically delete expired files on the blocking pool
pub fn spawn_retention_sweeper(state: Arc<AppState>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick fires immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let state = Arc::clone(&state);
            match tokio::task::spawn_blocking(move || state.engine.sweep_expired()).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => tracing::error!(error = %e, "retention sweep failed"),
                Err(e) => tracing::error!(error = %e, "retention sweep task failed"),
            }
        }
    })
}
