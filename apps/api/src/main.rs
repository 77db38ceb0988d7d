mod config;
mod errors;
mod generation;
mod llm_client;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::generation::invoker::ModelInvoker;
use crate::generation::metrics::MetricsCollector;
use crate::generation::orchestrator::GenerationOrchestrator;
use crate::llm_client::{CompletionModel, LlmClient};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Postgen API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm: Arc<dyn CompletionModel> = Arc::new(LlmClient::new(
        config.anthropic_api_key.clone(),
        config.model_timeout,
    )?);
    info!(
        "LLM client initialized (model: {}, timeout: {:?}, retries: {})",
        llm.model_name(),
        config.model_timeout,
        config.retry.max_retries
    );

    let catalog = Arc::new(config.catalog());
    info!(
        "Catalog loaded: {} tones, {} audiences",
        catalog.tones().len(),
        catalog.audiences().len()
    );

    let invoker = ModelInvoker::new(
        llm,
        config.model_timeout,
        config.retry,
        config.sampling,
    );
    let metrics = MetricsCollector::new(config.pricing, invoker.model_name());
    let orchestrator = GenerationOrchestrator::new(
        catalog,
        config.limits,
        invoker,
        metrics,
        config.variant_concurrency,
    );

    // Build app state
    let state = AppState { orchestrator };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
