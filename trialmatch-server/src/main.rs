//! Trialmatch Server Binary
//!
//! ## Usage
//!
//! ```bash
//! # Start with defaults (port 8420, trials under ./data)
//! trialmatch-server
//!
//! # Custom port and data directory
//! TRIALMATCH_PORT=3000 TRIALMATCH_DATA_DIR=/srv/trials trialmatch-server
//!
//! # Enable /v1/extract
//! OPENAI_API_KEY=... trialmatch-server
//! ```

use std::sync::Arc;

use trialmatch_core::{MatchingEngine, TrialLoader};
use trialmatch_extract::{CriteriaExtractor, ExtractConfig, ExtractError, OpenAiInterpreter};
use trialmatch_server::{ServerConfig, TrialMatchServer, DEFAULT_PORT};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trialmatch_server=info,trialmatch_core=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port: u16 = std::env::var("TRIALMATCH_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let cors = std::env::var("TRIALMATCH_CORS")
        .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"))
        .unwrap_or(true);

    let mut builder = ServerConfig::builder().port(port).cors(cors);
    if let Ok(dir) = std::env::var("TRIALMATCH_DATA_DIR") {
        builder = builder.data_dir(dir);
    }
    let config = builder.build();

    // An empty registry is a hard stop
    let trials = TrialLoader::new(config.data_dir.clone())
        .with_trial_files(config.trial_files.iter().cloned())
        .load()?;
    let engine = MatchingEngine::with_trials(trials);

    tracing::info!("Starting Trialmatch Server v{}", env!("CARGO_PKG_VERSION"));

    let extract_config = ExtractConfig::from_env();
    let server = match OpenAiInterpreter::new(extract_config.clone()) {
        Ok(interpreter) => {
            tracing::info!(model = %extract_config.model, "criteria extraction enabled");
            let extractor = CriteriaExtractor::with_config(Arc::new(interpreter), &extract_config);
            TrialMatchServer::with_extractor(engine, extractor, config)
        }
        Err(ExtractError::MissingApiKey) => {
            tracing::warn!("no interpreter API key set; /v1/extract will answer 503");
            TrialMatchServer::new(engine, config)
        }
        Err(e) => return Err(e.into()),
    };

    server.run().await?;

    Ok(())
}
