//! REST API server for process endpoints

use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use axum::{
    routing::{get, put},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use super::handlers;
use super::state::AppState;
use crate::config::{CorsPolicy, ServerConfig};
use crate::store::MongoProcessStore;

/// API server for the process endpoints
pub struct ApiServer {
    state: AppState,
    config: ServerConfig,
}

impl ApiServer {
    pub fn new(state: AppState, config: ServerConfig) -> Self {
        Self { state, config }
    }

    /// Start the API server and run until `shutdown` resolves, then close
    /// the store
    pub async fn start<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.bind_address();
        let state = self.state.clone();
        let app = build_router(self.state, &self.config.cors);

        info!("Starting process API server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .context("HTTP server error")?;

        if let Some(store) = state.store() {
            store.close().await;
        }
        info!("Process API server stopped");
        Ok(())
    }
}

/// Build API router
pub fn build_router(state: AppState, cors: &CorsPolicy) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/processos", get(handlers::list_processes))
        .route("/api/processos/{nup}", put(handlers::update_process))
        .route(
            "/api/processos/{nup}/colaborador",
            put(handlers::assign_collaborator),
        )
        .route("/api/dashboard/resumo", get(handlers::dashboard_summary))
        .layer(cors_layer(cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub fn cors_layer(policy: &CorsPolicy) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::PUT, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    match policy {
        CorsPolicy::AllowAll => layer.allow_origin(AllowOrigin::mirror_request()),
        CorsPolicy::AllowList(origins) => {
            let origins = origins.iter().filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin {}", origin);
                    None
                }
            });
            layer.allow_origin(AllowOrigin::list(origins))
        }
    }
}

/// Connect to MongoDB in the background and attach the store to `state`
/// once it answers. Requests made before that receive 503.
pub fn spawn_store_connection(state: AppState, config: &ServerConfig) {
    let Some(uri) = config.mongodb_uri.clone() else {
        error!("MONGODB_URI is not set; the API will report the database as disconnected");
        return;
    };
    let database = config.database.clone();
    let collection = config.collection.clone();

    tokio::spawn(async move {
        match MongoProcessStore::connect(&uri, &database, &collection).await {
            Ok(store) => {
                if !state.attach(Arc::new(store)) {
                    warn!("A process store was already attached; dropping the new connection");
                }
            }
            Err(e) => error!("Failed to connect to MongoDB: {}", e),
        }
    });
}
