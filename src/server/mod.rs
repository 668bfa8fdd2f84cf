//! HTTP API over a shared learning engine
//!
//! The engine itself is synchronous and lock-free; here it sits behind a
//! mutex that every handler holds for the whole operation, so concurrent
//! requests never interleave pattern updates. Calls that write through to
//! storage run on the blocking pool via `ServerState::with_engine`.

pub mod http;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinError;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::learning::LearningEngine;

/// Shared server state
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub engine: Arc<Mutex<LearningEngine>>,
}

impl ServerState {
    pub fn new(config: Config, engine: LearningEngine) -> Self {
        Self {
            config: Arc::new(config),
            engine: Arc::new(Mutex::new(engine)),
        }
    }

    /// Run `f` against the engine on the blocking pool
    pub async fn with_engine<F, R>(&self, f: F) -> Result<R, JoinError>
    where
        F: FnOnce(&mut LearningEngine) -> R + Send + 'static,
        R: Send + 'static,
    {
        let engine = Arc::clone(&self.engine);
        tokio::task::spawn_blocking(move || {
            let mut engine = engine.blocking_lock();
            f(&mut engine)
        })
        .await
    }
}

/// All API routes with CORS and request tracing
pub fn router(state: ServerState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/status", get(http::status_handler))
        .route("/api/interactions", post(http::record_handler))
        .route("/api/metrics", get(http::metrics_handler))
        .route("/api/suggestions", get(http::suggestions_handler))
        .route("/api/classify", post(http::classify_handler))
        .route("/api/categories", get(http::categories_handler))
        .route("/api/users/{user_id}/recommendations", get(http::recommendations_handler))
        .route(
            "/api/users/{user_id}/preferences",
            get(http::get_preferences_handler).patch(http::update_preferences_handler),
        )
        .route("/api/export", get(http::export_handler))
        .route("/api/import", post(http::import_handler))
        .route("/api/reset", post(http::reset_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the web server
pub async fn start(config: Config, engine: LearningEngine) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = ServerState::new(config, engine);
    let app = router(state);

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("     Assistant Learning API");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();
    println!("Listening on http://{}", addr);
    println!();
    info!("Learning API bound to {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}
