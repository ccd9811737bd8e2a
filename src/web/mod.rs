//! Web server module.

mod error;
mod handlers;
pub mod session;

use crate::backend::RecordStore;
use crate::config::ServerConfig;
use crate::workhours::{default_methods, WorkHoursMethod};

use axum::{middleware, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub store: Arc<dyn RecordStore>,
    pub methods: Arc<Vec<Box<dyn WorkHoursMethod>>>,
}

impl AppState {
    pub fn new(config: ServerConfig, store: Arc<dyn RecordStore>) -> Self {
        Self {
            config,
            store,
            methods: Arc::new(default_methods()),
        }
    }
}

/// Build the router with all routes.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any);

    Router::new()
        .route("/api/v1/reports", get(handlers::handle_get_reports))
        .route("/api/v1/work-hours", get(handlers::handle_get_work_hours))
        .route("/api/v1/session", get(handlers::handle_get_session))
        .route("/api/v1/backend/health", get(handlers::handle_backend_health))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::load_session,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Web server for the leak survey dashboard API.
pub struct Server {
    state: AppState,
}

impl Server {
    pub fn new(config: ServerConfig, store: Arc<dyn RecordStore>) -> Self {
        Self {
            state: AppState::new(config, store),
        }
    }

    /// Start the server on the configured port.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.http_port));
        let router = router(self.state.clone());

        tracing::info!("Web server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }
}
