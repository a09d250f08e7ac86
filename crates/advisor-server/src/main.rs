//! coin-advisor HTTP Server
//!
//! Axum server exposing reference resolution, the advisory chat built on
//! top of it, and the trending-coins list.

mod handlers;
mod routes;
mod state;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use advisor_runtime::provider_from_env;
use coin_resolver::{MemorySearchTracker, ResolutionPipeline, ResolverConfig, SearchTracker};

use crate::state::AppState;

/// Model used when neither the request nor the environment names one
fn default_model_for(provider: &str) -> &'static str {
    if provider.eq_ignore_ascii_case("gemini") {
        "gemini-pro"
    } else {
        "llama3.2"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    // Initialize LLM provider
    let provider = provider_from_env()?;
    match provider.health_check().await {
        Ok(true) => tracing::info!("✓ Connected to {}", provider.name()),
        Ok(false) | Err(_) => {
            tracing::warn!("⚠ {} not available - extraction and chat will fail", provider.name());
            tracing::warn!("  Mention extraction falls back to $symbol matching");
        }
    }

    let default_model = std::env::var("ADVISOR_MODEL")
        .unwrap_or_else(|_| default_model_for(provider.name()).to_string());

    // Resolver configuration
    let mut config = ResolverConfig::from_env();
    if std::env::var("EXTRACTION_MODEL").is_err() {
        config.extraction.model = default_model_for(provider.name()).to_string();
    }
    let keyed: Vec<&str> = config
        .explorers
        .iter()
        .filter(|e| e.api_key.is_some())
        .map(|e| e.chain.as_str())
        .collect();
    tracing::info!("Explorer fallbacks: {}", if keyed.is_empty() { "none".to_string() } else { keyed.join(", ") });
    if config.search_api_key.is_none() {
        tracing::warn!("⚠ SERPAPI_API_KEY not set - web search fallback disabled");
    }

    let tracker: Arc<dyn SearchTracker> = Arc::new(MemorySearchTracker::new());
    let pipeline = ResolutionPipeline::new(&config, provider.clone(), Some(tracker.clone()))?;

    let state = AppState {
        provider,
        pipeline: Arc::new(pipeline),
        tracker,
        default_model,
    };
    let app = routes::router(state);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 coin-advisor server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health        - Health check");
    tracing::info!("  POST /api/resolve   - Resolve a coin reference to a USD quote");
    tracing::info!("  POST /api/chat      - Advisory chat on the resolved coin");
    tracing::info!("  GET  /api/trending  - Most-searched coins");

    axum::serve(listener, app).await?;

    Ok(())
}
