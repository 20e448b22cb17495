//! Trialmatch Server - HTTP wrapper for Trialmatch Core
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    TrialMatchServer                       │
//! │  ┌────────────────────────────┐  ┌────────────────────┐  │
//! │  │ trialmatch-core::          │  │ trialmatch-extract:│  │
//! │  │   MatchingEngine           │  │  CriteriaExtractor │  │
//! │  │ (all eligibility logic)    │  │  (optional)        │  │
//! │  └────────────────────────────┘  └────────────────────┘  │
//! │        │            │               │            │        │
//! │        ▼            ▼               ▼            ▼        │
//! │  /v1/trials   /v1/match   /v1/trials/:key/match  /v1/extract
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The server is a thin wrapper: eligibility is decided in `trialmatch-core`.

mod config;
pub mod routes;

pub use config::{ServerConfig, ServerConfigBuilder, DEFAULT_PORT};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use trialmatch_core::MatchingEngine;
use trialmatch_extract::CriteriaExtractor;

/// Shared application state
pub struct AppState {
    /// The engine; swaps its own trial snapshot, so no outer lock
    pub engine: MatchingEngine,
    /// Document extraction, when an interpreter is configured
    pub extractor: Option<CriteriaExtractor>,
}

impl AppState {
    pub fn new(engine: MatchingEngine) -> Self {
        Self {
            engine,
            extractor: None,
        }
    }

    pub fn with_extractor(mut self, extractor: CriteriaExtractor) -> Self {
        self.extractor = Some(extractor);
        self
    }
}

/// Trialmatch HTTP Server
///
/// # Example
///
/// ```rust,ignore
/// use trialmatch_core::{MatchingEngine, TrialLoader};
/// use trialmatch_server::{ServerConfig, TrialMatchServer};
///
/// #[tokio::main]
/// async fn main() {
///     let config = ServerConfig::builder().port(8420).build();
///     let trials = TrialLoader::new(&config.data_dir).load().unwrap();
///
///     let server = TrialMatchServer::new(MatchingEngine::with_trials(trials), config);
///     server.run().await.unwrap();
/// }
/// ```
pub struct TrialMatchServer {
    state: Arc<AppState>,
    config: ServerConfig,
}

impl TrialMatchServer {
    pub fn new(engine: MatchingEngine, config: ServerConfig) -> Self {
        Self {
            state: Arc::new(AppState::new(engine)),
            config,
        }
    }

    /// Attach a document extractor; without one `/v1/extract` answers 503
    pub fn with_extractor(engine: MatchingEngine, extractor: CriteriaExtractor, config: ServerConfig) -> Self {
        Self {
            state: Arc::new(AppState::new(engine).with_extractor(extractor)),
            config,
        }
    }

    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Build the Axum router with all routes
    pub fn router(&self) -> Router {
        routes::create_router(Arc::clone(&self.state), self.config.cors_enabled)
    }

    /// Get the socket address for the server
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.config.port))
    }

    /// Run the server
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.router();
        let addr = self.addr();

        tracing::info!("Trialmatch Server listening on http://{}", addr);
        tracing::info!("Endpoints:");
        tracing::info!("  GET  /health");
        tracing::info!("  GET  /v1/trials");
        tracing::info!("  PUT  /v1/trials");
        tracing::info!("  POST /v1/match");
        tracing::info!("  POST /v1/trials/:trial_key/match");
        tracing::info!("  POST /v1/extract");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
