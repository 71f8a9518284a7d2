//! Server Implementation
//!
//! HTTP 服务器启动和管理

use axum::Router;
use http::{HeaderName, Method};
use shared::error::{AppError, AppResult};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::core::ServerState;

/// HTTP Server
pub struct Server {
    state: ServerState,
}

impl Server {
    pub fn new(state: ServerState) -> Self {
        Self { state }
    }

    /// 完整的应用路由 (测试中可直接 oneshot)
    pub fn app(state: ServerState) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([HeaderName::from_static("content-type")]);

        api::router()
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .with_state(state)
    }

    /// 运行直到 Ctrl+C
    pub async fn run(self) -> AppResult<()> {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.state.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

        tracing::info!("Catalog admin API listening on {}", addr);

        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        };

        axum::serve(listener, Self::app(self.state))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| AppError::internal(format!("Server error: {}", e)))
    }
}
